//! Result parsing, quality filtering and projection.

pub mod document;
pub mod parse;
pub mod processor;
pub mod quality;

pub use self::document::{RawDocument, SearchResults};
pub use self::processor::{Response, process_documents, process_results};
pub use self::quality::quality_cutoff;
