extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use regex::Regex;
use std::path::PathBuf;
use syn::Ident;
use walkdir::WalkDir;

// Directory scanned for tool declarations, relative to the crate being compiled
fn tools_dir() -> PathBuf {
    let root = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(root).join("src").join("tools")
}

/// Generates `register_tools(registry: &mut ToolRegistry)`.
///
/// Every `src/tools/<module>.rs` file is scanned for public unit structs
/// (`pub struct GetCustomerTool;`). Each one is imported from
/// `crate::tools::<module>` and registered. Files are visited in name order so
/// the registration order is stable across builds.
#[proc_macro]
pub fn auto_register_tools(_item: TokenStream) -> TokenStream {
    let struct_re = Regex::new(r"pub struct\s+(\w+)\s*;").unwrap();
    let mut registrations = Vec::new();

    for entry in WalkDir::new(tools_dir())
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("rs") {
            continue;
        }
        let module = match path.file_stem().and_then(|s| s.to_str()) {
            Some("mod") | None => continue,
            Some(stem) => stem.to_string(),
        };

        let content = std::fs::read_to_string(path).expect("Unable to read tool file");
        let module_ident = Ident::new(&module, Span::call_site());

        for cap in struct_re.captures_iter(&content) {
            let struct_ident = Ident::new(&cap[1], Span::call_site());

            registrations.push(quote! {
                registry.register(crate::tools::#module_ident::#struct_ident);
            });
        }
    }

    let expanded = quote! {
        pub fn register_tools(registry: &mut ToolRegistry) {
            #( #registrations )*
        }
    };

    expanded.into()
}
