pub mod document;
pub mod loaders;
pub mod question;

pub use document::{DocumentId, PassageDocument, PersistedAnswer, PersistedQuestion};
pub use loaders::{load_all_passages, load_passage_document};
pub use question::{ChoiceLetter, ParsedChoice, ParsedQuestion};
