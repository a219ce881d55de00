//! Fixed language constants
//!
//! Limits that can vary per build profile live in `compile_time` (generated
//! by build.rs). The values here are properties of the language and of its
//! tool output and do not change between profiles.

pub use super::compile_time::diagnostics::{CONTEXT_WIDTH, MAX_ERRORS};
pub use super::compile_time::lexical::{CONTEXT_BUFFER_SIZE, MAX_NAME_LENGTH, MAX_STRING_LENGTH};
pub use super::compile_time::syntax::MAX_NESTING_DEPTH;

/// Number of reserved words in the language
pub const KEYWORD_COUNT: usize = 36;

/// Width of the numeric token code column in token dumps
pub const TOKEN_CODE_WIDTH: usize = 3;

/// Marker printed in front of the trailing character context
pub const CONTEXT_PREFIX: &str = "...";

/// Source name used when the program is read from standard input
pub const STDIN_SOURCE_NAME: &str = "<stdin>";

/// Characters that may continue a name after its first letter
pub fn is_name_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Characters that may start a name
pub fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic()
}
