//! Error and success codes with their classification metadata
//!
//! Every code logged by the front end is declared here together with the
//! metadata used by log formatting and by `error_code()` consumers.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Code wrapper shared by error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Metadata for an error code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
    pub const INVALID_ARGUMENT: Code = Code::new("ERR003");
}

/// Input acquisition (file or standard input)
pub mod input {
    use super::Code;

    pub const INPUT_UNAVAILABLE: Code = Code::new("E005");
    pub const INVALID_ENCODING: Code = Code::new("E006");
}

pub mod lexical {
    use super::Code;

    pub const ILLEGAL_CHARACTER: Code = Code::new("E020");
    pub const UNTERMINATED_LITERAL: Code = Code::new("E021");
    pub const MALFORMED_NUMBER: Code = Code::new("E022");
    pub const NAME_TOO_LONG: Code = Code::new("E023");
    pub const STRING_TOO_LONG: Code = Code::new("E024");
    pub const BAD_ESCAPE: Code = Code::new("E025");
}

pub mod syntax {
    use super::Code;

    pub const INCORRECT_TERMINATION: Code = Code::new("E040");
    pub const VAL_ON_NON_VARIABLE: Code = Code::new("E044");
    pub const UNEXPECTED_TOKEN: Code = Code::new("E050");
    pub const MISSING_TOKEN: Code = Code::new("E051");
    pub const INVALID_SPECIFICATION: Code = Code::new("E052");
    pub const INVALID_COMMAND: Code = Code::new("E053");
    pub const INVALID_EXPRESSION: Code = Code::new("E054");
    pub const MAX_NESTING_DEPTH: Code = Code::new("E087");
}

pub mod diagnostics {
    use super::Code;

    pub const TOO_MANY_ERRORS: Code = Code::new("E090");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I020");
    pub const AST_CONSTRUCTION_COMPLETE: Code = Code::new("I040");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let entries = [
            // System
            ErrorMetadata::new(
                "ERR001",
                "System",
                Severity::Critical,
                false,
                true,
                "Internal front end error",
                "File a bug report with the input that triggered it",
            ),
            ErrorMetadata::new(
                "ERR002",
                "System",
                Severity::Critical,
                false,
                true,
                "Logging or configuration initialization failure",
                "Check SIRE_* environment variables and the runtime configuration file",
            ),
            ErrorMetadata::new(
                "ERR003",
                "System",
                Severity::High,
                false,
                true,
                "Unknown command-line option or extra input path",
                "Run sire -h for the accepted options",
            ),
            // Input
            ErrorMetadata::new(
                "E005",
                "Input",
                Severity::High,
                false,
                true,
                "Could not open the input file",
                "Check the input path and its permissions",
            ),
            ErrorMetadata::new(
                "E006",
                "Input",
                Severity::High,
                false,
                true,
                "Input is not valid UTF-8 text",
                "Convert the source file to UTF-8",
            ),
            // Lexical
            ErrorMetadata::new(
                "E020",
                "Lexical",
                Severity::Medium,
                true,
                false,
                "Character that cannot start any token",
                "Remove the character; the rest of the line is skipped",
            ),
            ErrorMetadata::new(
                "E021",
                "Lexical",
                Severity::Medium,
                true,
                false,
                "Character or string literal is not closed",
                "Add the closing quote on the same line",
            ),
            ErrorMetadata::new(
                "E022",
                "Lexical",
                Severity::Medium,
                true,
                false,
                "Numeric literal has no digits or does not fit in 64 bits",
                "Check the literal prefix (0x, 0o, 0b) and its digits",
            ),
            ErrorMetadata::new(
                "E023",
                "Lexical",
                Severity::Low,
                true,
                false,
                "Name exceeds the configured maximum length",
                "Use a shorter name",
            ),
            ErrorMetadata::new(
                "E024",
                "Lexical",
                Severity::Low,
                true,
                false,
                "String literal exceeds the configured maximum length",
                "Split the string",
            ),
            ErrorMetadata::new(
                "E025",
                "Lexical",
                Severity::Medium,
                true,
                false,
                "Unknown escape sequence in a character or string literal",
                "Use one of \\\\ \\' \\\" \\t \\r \\n",
            ),
            // Syntax
            ErrorMetadata::new(
                "E040",
                "Syntax",
                Severity::High,
                false,
                true,
                "Tokens remain after the end of the program",
                "Check for an unbalanced closing bracket",
            ),
            ErrorMetadata::new(
                "E044",
                "Syntax",
                Severity::High,
                false,
                true,
                "val qualifier applied to a non-variable specifier",
                "Only var specifiers may be qualified with val",
            ),
            ErrorMetadata::new(
                "E050",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Unexpected token",
                "Check the construct preceding the reported line",
            ),
            ErrorMetadata::new(
                "E051",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Required token missing",
                "Insert the missing token",
            ),
            ErrorMetadata::new(
                "E052",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Malformed specification",
                "Check the declaration, abbreviation or definition",
            ),
            ErrorMetadata::new(
                "E053",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Malformed command",
                "Check the command syntax",
            ),
            ErrorMetadata::new(
                "E054",
                "Syntax",
                Severity::Medium,
                true,
                false,
                "Malformed expression or element",
                "Parenthesise nested operators and check operands",
            ),
            ErrorMetadata::new(
                "E087",
                "Syntax",
                Severity::High,
                false,
                true,
                "Constructs nested deeper than the configured limit",
                "Flatten the program or raise syntax.max_nesting_depth",
            ),
            // Diagnostics
            ErrorMetadata::new(
                "E090",
                "Diagnostics",
                Severity::High,
                false,
                true,
                "Error threshold reached",
                "Fix the reported errors and compile again",
            ),
        ];

        entries
            .into_iter()
            .map(|metadata| (metadata.code, metadata))
            .collect()
    })
}

pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

pub fn requires_halt(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.requires_halt)
        .unwrap_or(false)
}

pub fn get_description(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

pub fn get_action(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_code_is_registered() {
        let codes = [
            system::INTERNAL_ERROR,
            system::INITIALIZATION_FAILURE,
            system::INVALID_ARGUMENT,
            input::INPUT_UNAVAILABLE,
            input::INVALID_ENCODING,
            lexical::ILLEGAL_CHARACTER,
            lexical::UNTERMINATED_LITERAL,
            lexical::MALFORMED_NUMBER,
            lexical::NAME_TOO_LONG,
            lexical::STRING_TOO_LONG,
            lexical::BAD_ESCAPE,
            syntax::INCORRECT_TERMINATION,
            syntax::VAL_ON_NON_VARIABLE,
            syntax::UNEXPECTED_TOKEN,
            syntax::MISSING_TOKEN,
            syntax::INVALID_SPECIFICATION,
            syntax::INVALID_COMMAND,
            syntax::INVALID_EXPRESSION,
            syntax::MAX_NESTING_DEPTH,
            diagnostics::TOO_MANY_ERRORS,
        ];

        for code in codes {
            assert!(
                get_error_metadata(code.as_str()).is_some(),
                "{} has no metadata",
                code
            );
            assert_ne!(get_description(code.as_str()), "Unknown error");
        }
    }

    #[test]
    fn test_recoverable_and_fatal_classification() {
        assert!(is_recoverable(lexical::ILLEGAL_CHARACTER.as_str()));
        assert!(!requires_halt(syntax::UNEXPECTED_TOKEN.as_str()));
        assert!(requires_halt(diagnostics::TOO_MANY_ERRORS.as_str()));
        assert!(requires_halt(syntax::INCORRECT_TERMINATION.as_str()));
        assert_eq!(get_category(syntax::MISSING_TOKEN.as_str()), "Syntax");
        assert_eq!(get_severity(system::INTERNAL_ERROR.as_str()), Severity::Critical);
    }

    #[test]
    fn test_unknown_code_fallbacks() {
        assert_eq!(get_description("X999"), "Unknown error");
        assert_eq!(get_category("X999"), "Unknown");
        assert_eq!(get_action("X999"), "No specific action available");
        assert!(is_recoverable("X999"));
    }
}
