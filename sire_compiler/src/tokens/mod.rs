//! Tokens and the token dump

pub mod token;

pub use token::Token;

/// Render the dump of a token sequence, one line per token
pub fn dump<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> String {
    tokens
        .into_iter()
        .map(|token| token.dump_line() + "\n")
        .collect()
}
