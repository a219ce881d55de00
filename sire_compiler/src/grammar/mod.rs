//! Grammar definitions for sire: reserved words, the AST and its printer

pub mod ast;
pub mod keywords;
pub mod printer;

// Re-export AST types
pub use ast::*;

// Re-export keywords
pub use keywords::{Keyword, KeywordTable};
