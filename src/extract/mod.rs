//! Film page extraction
//!
//! This module turns a fetched film page into a [`MovieRecord`](crate::record::MovieRecord):
//! - `fields`: one extractor per field, each returning `Option<String>`
//! - `assembler`: runs the whole extractor set and builds the record

mod assembler;
pub mod fields;

pub use assembler::{assemble_record, labels, parse_record};
pub use fields::{imdb_score_from_text, join_truncated};
