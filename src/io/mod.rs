pub mod document;
pub mod file;

pub use document::Document;
pub use file::{load_document, save_document};
