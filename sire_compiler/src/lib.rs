// Internal modules
pub mod compile;
pub mod config;
pub mod diagnostics;
pub mod grammar;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod syntax;
pub mod tokens;
pub mod utils;

// Re-export the entry points and key types for library consumers
pub use compile::{parse_file, parse_source, read_source, read_stdin};
pub use diagnostics::{Diagnostics, FatalError};
pub use grammar::ast::Tree;
pub use lexical::tokenize;
