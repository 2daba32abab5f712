pub mod passage_loader;

pub use passage_loader::{load_all_passages, load_passage_document};
