//! Syntax analysis: source text to AST
//!
//! The parser pulls tokens from its own lexer; recoverable errors go to the
//! shared `Diagnostics`, fatal conditions end the parse.

mod error;
mod parser;

pub use error::SyntaxError;
pub use parser::Parser;

use crate::diagnostics::{Diagnostics, FatalError};
use crate::grammar::ast::Tree;
use crate::log_debug;

/// Parse a complete program
pub fn parse_program(source: &str, diagnostics: &mut Diagnostics) -> Result<Tree, FatalError> {
    log_debug!("Starting syntax analysis", "bytes" => source.len());
    let tree = Parser::new(source, diagnostics)?.parse_program()?;
    log_debug!("Syntax analysis finished",
        "specs" => tree.specs.len(),
        "errors" => diagnostics.error_count()
    );
    Ok(tree)
}
