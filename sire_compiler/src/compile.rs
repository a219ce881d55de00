//! Front-end entry points: input to tokens or to a tree

use crate::config::constants::STDIN_SOURCE_NAME;
use crate::diagnostics::{Diagnostics, FatalError};
use crate::grammar::ast::Tree;
use crate::logging::{self, codes};
use crate::{log_debug, log_error, log_info};
use std::io::Read;
use std::path::Path;
use std::time::Instant;

/// Whole contents of an input file
pub fn read_source(path: &Path) -> Result<String, FatalError> {
    std::fs::read_to_string(path).map_err(|e| {
        let fatal = FatalError::input_unavailable(path.display().to_string(), &e);
        let code = if e.kind() == std::io::ErrorKind::InvalidData {
            codes::input::INVALID_ENCODING
        } else {
            fatal.error_code()
        };
        log_error!(code, "Cannot read input",
            "path" => path.display(),
            "reason" => e
        );
        fatal
    })
}

/// Whole of standard input
pub fn read_stdin() -> Result<String, FatalError> {
    let mut source = String::new();
    std::io::stdin()
        .read_to_string(&mut source)
        .map_err(|e| FatalError::input_unavailable(STDIN_SOURCE_NAME, e))?;
    log_debug!("Read standard input", "bytes" => source.len());
    Ok(source)
}

/// Parse program text
pub fn parse_source(source: &str, diagnostics: &mut Diagnostics) -> Result<Tree, FatalError> {
    let start = Instant::now();
    log_info!("Starting parse", "bytes" => source.len());

    let result = crate::syntax::parse_program(source, diagnostics);
    match &result {
        Ok(tree) => log_info!("Parse finished",
            "specs" => tree.specs.len(),
            "commands" => tree.commands.len(),
            "errors" => diagnostics.error_count(),
            "duration_ms" => start.elapsed().as_millis()
        ),
        Err(fatal) => log_error!(fatal.error_code(), "Parse abandoned",
            "error" => fatal,
            "errors" => diagnostics.error_count()
        ),
    }
    result
}

/// Read and parse a program file; log events carry the file name
pub fn parse_file(path: &Path, diagnostics: &mut Diagnostics) -> Result<Tree, FatalError> {
    let source = read_source(path)?;
    logging::with_file_context(path.display().to_string(), || {
        parse_source(&source, diagnostics)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_source_returns_tree_with_errors_below_threshold() {
        let mut diagnostics = Diagnostics::silent();
        let tree = parse_source("x := ; skip", &mut diagnostics).unwrap();
        assert_eq!(diagnostics.messages(), vec!["expecting expression"]);
        assert_eq!(tree.commands.len(), 2);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let mut diagnostics = Diagnostics::silent();
        let result = parse_file(Path::new("/nonexistent/program.sire"), &mut diagnostics);
        assert_matches!(result, Err(FatalError::InputUnavailable { ref path, .. }) if path.ends_with("program.sire"));
        assert!(!diagnostics.has_errors());
    }
}
