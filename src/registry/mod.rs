pub mod tool_registry;
