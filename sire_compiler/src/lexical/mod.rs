//! Lexical analysis
//!
//! The parser pulls tokens one at a time from a `Lexer`; `tokenize` runs a
//! lexer to the end of input for the token dump.

mod context;
pub mod lexer;

pub use context::ContextBuffer;
pub use lexer::{Lexer, LexicalError};

use crate::diagnostics::{Diagnostics, FatalError};
use crate::logging::codes;
use crate::tokens::Token;
use crate::utils::Spanned;
use crate::log_success;

/// All tokens of `source`, end of input excluded
pub fn tokenize(
    source: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Spanned<Token>>, FatalError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token(diagnostics)?;
        if token.value == Token::Eof {
            break;
        }
        tokens.push(token);
    }

    log_success!(
        codes::success::TOKENIZATION_COMPLETE,
        "Tokenization complete",
        "tokens" => tokens.len(),
        "errors" => diagnostics.error_count()
    );
    Ok(tokens)
}
