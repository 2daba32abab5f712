pub mod generation_ctx;
pub mod quiz_flow;

pub use generation_ctx::GenerationCtx;
pub use quiz_flow::{GenerationOutcome, GenerationReport, QuizFlow};
