//! CSV row parsing and record transformation.
//!
//! Everything in this crate is synchronous and side-effect free apart from
//! reading the input file; storage lives in `roster-storage`.

pub mod nested;
pub mod normalize;
pub mod parser;
pub mod tokenizer;

pub use nested::build_nested;
pub use normalize::{normalize, normalize_all, NormalizeError};
pub use parser::{CsvOptions, ParseError, ParsedFile, RecordParser, SkippedRow};
pub use tokenizer::tokenize_row;
