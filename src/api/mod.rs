pub mod bank_client;
pub mod openai_service;
