pub mod prompt_builder;
pub mod question_generator;
pub mod quiz_store;
pub mod response_parser;
pub mod validation;
pub mod warn_writer;

pub use prompt_builder::{truncate_passage, PromptBuilder};
pub use question_generator::{QuestionGenerator, RawModelResponse, GENERATION_FAILED_SENTINEL};
pub use quiz_store::{QuizStore, SaveSummary};
pub use response_parser::ResponseParser;
pub use validation::ValidationPolicy;
pub use warn_writer::WarnWriter;
