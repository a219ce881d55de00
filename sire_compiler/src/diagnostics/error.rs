//! Conditions that abort the whole front-end pass

use crate::logging::codes::{self, Code};
use thiserror::Error;

/// A fatal condition; unwinds to the driver through every parsing function
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FatalError {
    #[error("too many errors")]
    TooManyErrors { count: usize },

    #[error("incorrect termination")]
    IncorrectTermination { line: u32 },

    #[error("val qualifier on a non-variable specifier")]
    ValOnNonVariable { line: u32 },

    #[error("nesting too deep")]
    NestingTooDeep { line: u32 },

    #[error("Could not open the input file")]
    InputUnavailable { path: String, reason: String },
}

impl FatalError {
    pub fn input_unavailable(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::InputUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::TooManyErrors { .. } => codes::diagnostics::TOO_MANY_ERRORS,
            Self::IncorrectTermination { .. } => codes::syntax::INCORRECT_TERMINATION,
            Self::ValOnNonVariable { .. } => codes::syntax::VAL_ON_NON_VARIABLE,
            Self::NestingTooDeep { .. } => codes::syntax::MAX_NESTING_DEPTH,
            Self::InputUnavailable { .. } => codes::input::INPUT_UNAVAILABLE,
        }
    }

    /// Source line the condition was detected on, when it has one
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::IncorrectTermination { line }
            | Self::ValOnNonVariable { line }
            | Self::NestingTooDeep { line } => Some(*line),
            Self::TooManyErrors { .. } | Self::InputUnavailable { .. } => None,
        }
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_messages() {
        assert_eq!(FatalError::TooManyErrors { count: 8 }.to_string(), "too many errors");
        assert_eq!(
            FatalError::IncorrectTermination { line: 3 }.to_string(),
            "incorrect termination"
        );
        assert_eq!(
            FatalError::input_unavailable("missing.sire", "not found").to_string(),
            "Could not open the input file"
        );
    }

    #[test]
    fn test_every_fatal_error_halts() {
        let errors = [
            FatalError::TooManyErrors { count: 8 },
            FatalError::IncorrectTermination { line: 1 },
            FatalError::ValOnNonVariable { line: 1 },
            FatalError::NestingTooDeep { line: 1 },
            FatalError::input_unavailable("x", "y"),
        ];
        for error in errors {
            assert!(error.requires_halt(), "{:?} should halt", error);
        }
    }

    #[test]
    fn test_line_is_kept() {
        assert_eq!(FatalError::ValOnNonVariable { line: 7 }.line(), Some(7));
        assert_eq!(FatalError::TooManyErrors { count: 8 }.line(), None);
    }
}
