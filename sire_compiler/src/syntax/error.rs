//! Recoverable syntax errors
//!
//! A `SyntaxError` is reported through `Diagnostics` and never returned to
//! the caller of the parser; fatal conditions are `FatalError`s.

use crate::logging::{codes, Code};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("bad separator for specification")]
    BadSeparator,

    #[error("cannot make a simultaneous declaration")]
    SimultaneousDeclaration,

    #[error("expecting definition")]
    ExpectingDefinition,

    #[error("invalid specifier")]
    InvalidSpecifier,

    /// A required token, by spelling
    #[error("'{0}' missing")]
    Missing(&'static str),

    #[error("invalid interface")]
    InvalidInterface,

    #[error("invalid argument")]
    InvalidArgument,

    #[error("bad command")]
    BadCommand,

    #[error("expecting assignment, input, output, instance or call")]
    ExpectingNameCommand,

    #[error("expecting 'do' or 'then'")]
    ExpectingDoOrThen,

    #[error("expecting '{{' or '['")]
    ExpectingBlockOrReplicator,

    #[error("expecting ';' or '|'")]
    ExpectingSeparator,

    #[error("expecting 'is' or 'inherits'")]
    ExpectingIsOrInherits,

    /// A definition where only declarations and abbreviations may appear
    #[error("definition in specification of {0}")]
    DefinitionInSpecification(&'static str),

    #[error("name expected")]
    NameExpected,

    #[error("expecting expression")]
    ExpectingExpression,

    #[error("expecting element")]
    ExpectingElement,
}

impl SyntaxError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::Missing(_) => codes::syntax::MISSING_TOKEN,
            Self::BadSeparator
            | Self::SimultaneousDeclaration
            | Self::ExpectingDefinition
            | Self::InvalidSpecifier
            | Self::InvalidInterface
            | Self::InvalidArgument
            | Self::ExpectingIsOrInherits
            | Self::DefinitionInSpecification(_) => codes::syntax::INVALID_SPECIFICATION,
            Self::BadCommand
            | Self::ExpectingNameCommand
            | Self::ExpectingDoOrThen
            | Self::ExpectingBlockOrReplicator
            | Self::ExpectingSeparator => codes::syntax::INVALID_COMMAND,
            Self::ExpectingExpression | Self::ExpectingElement => {
                codes::syntax::INVALID_EXPRESSION
            }
            Self::NameExpected => codes::syntax::UNEXPECTED_TOKEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(SyntaxError::Missing(":").to_string(), "':' missing");
        assert_eq!(SyntaxError::Missing("is").to_string(), "'is' missing");
        assert_eq!(
            SyntaxError::ExpectingBlockOrReplicator.to_string(),
            "expecting '{' or '['"
        );
        assert_eq!(
            SyntaxError::DefinitionInSpecification("command").to_string(),
            "definition in specification of command"
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(SyntaxError::Missing("]").error_code(), codes::syntax::MISSING_TOKEN);
        assert_eq!(SyntaxError::BadCommand.error_code(), codes::syntax::INVALID_COMMAND);
        assert_eq!(
            SyntaxError::SimultaneousDeclaration.error_code(),
            codes::syntax::INVALID_SPECIFICATION
        );
    }
}
