pub mod llm_client;
pub mod text_generator;

pub use llm_client::LlmClient;
pub use text_generator::TextGenerator;
