pub mod apply_for_loan_tool;
pub mod get_accounts_tool;
pub mod get_customer_dti_tool;
pub mod get_customer_loans_tool;
pub mod get_customer_tool;
pub mod get_employment_score_tool;
pub mod list_customers_basic_tool;
pub mod transfer_funds_tool;
pub mod web_search_tool;
