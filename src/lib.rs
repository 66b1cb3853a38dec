pub mod cache;
pub mod content;
pub mod errors;
pub mod extractor;
pub mod history;
pub mod http;
pub mod llm_wrapper;
pub mod orchestrator;
pub mod prompts;
pub mod retry;
pub mod schemas;
pub mod service;
pub mod settings;
pub mod timeout_guard;
