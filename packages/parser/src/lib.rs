pub mod ast;
pub mod error;
pub mod expression;
pub mod hash;
pub mod inline;
pub mod lexer;
pub mod parser;
pub mod tag;
pub mod toc;

#[cfg(test)]
mod tests_blocks;

pub use ast::*;
pub use error::{line_col, ParseError, ParseResult};
pub use expression::{parse_exports, parse_expression};
pub use hash::{source_hash, source_id};
pub use lexer::{tokenize, Token};
pub use parser::{parse, Parser, MAX_NESTING_DEPTH};
pub use toc::{extract_headings, slugify, TocEntry};
