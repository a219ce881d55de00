//! Recoverable error reporting and the error threshold
//!
//! Both the lexer and the parser report through one `Diagnostics` value
//! owned by the compilation. Each report is printed at once as
//!
//! ```text
//! Error near line 4: ':' missing
//! ...var x
//! x := 5 skip
//! ```
//!
//! and counted. When the count reaches the threshold the report call
//! returns `FatalError::TooManyErrors`, which the caller propagates with `?`.

mod error;

pub use error::FatalError;

use crate::config::constants::{CONTEXT_PREFIX, CONTEXT_WIDTH, MAX_ERRORS};
use crate::config::runtime::DiagnosticPreferences;
use crate::logging::codes::{self, Code};
use crate::{log_debug, log_error};
use std::fmt;

/// One reported recoverable error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: Code,
    pub line: u32,
    pub message: String,
    /// Most recently read source characters, oldest first
    pub context: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error near line {}: {}", self.line, self.message)
    }
}

/// Where reports are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    Stderr,
    Silent,
}

#[derive(Debug)]
pub struct Diagnostics {
    count: usize,
    max_errors: usize,
    reports: Vec<Diagnostic>,
    emit: Emit,
    show_context: bool,
}

impl Diagnostics {
    /// Reports to stderr with the configured threshold
    pub fn new() -> Self {
        Self {
            count: 0,
            max_errors: MAX_ERRORS,
            reports: Vec::new(),
            emit: Emit::Stderr,
            show_context: true,
        }
    }

    /// Collects reports without printing them
    pub fn silent() -> Self {
        Self {
            emit: Emit::Silent,
            ..Self::new()
        }
    }

    pub fn from_preferences(preferences: &DiagnosticPreferences) -> Self {
        Self {
            emit: if preferences.emit_reports {
                Emit::Stderr
            } else {
                Emit::Silent
            },
            show_context: preferences.show_context,
            ..Self::new()
        }
    }

    pub fn with_threshold(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors.max(1);
        self
    }

    /// Print, keep and count one error
    pub fn report(
        &mut self,
        code: Code,
        line: u32,
        message: impl Into<String>,
        context: &str,
    ) -> Result<(), FatalError> {
        let diagnostic = Diagnostic {
            code,
            line,
            message: message.into(),
            context: trailing(context, CONTEXT_WIDTH),
        };

        if self.emit == Emit::Stderr {
            eprintln!("{}", diagnostic);
            if self.show_context {
                eprintln!("{}{}", CONTEXT_PREFIX, diagnostic.context);
            }
        }

        log_debug!("Recoverable error reported",
            "code" => code,
            "line" => line,
            "message" => diagnostic.message
        );

        self.reports.push(diagnostic);
        self.record()
    }

    /// Count one error; fatal once the threshold is reached
    pub fn record(&mut self) -> Result<(), FatalError> {
        self.count += 1;
        if self.count >= self.max_errors {
            log_error!(codes::diagnostics::TOO_MANY_ERRORS, "Error threshold reached",
                "count" => self.count,
                "threshold" => self.max_errors
            );
            return Err(FatalError::TooManyErrors { count: self.count });
        }
        Ok(())
    }

    pub fn error_count(&self) -> usize {
        self.count
    }

    pub fn has_errors(&self) -> bool {
        self.count > 0
    }

    pub fn threshold(&self) -> usize {
        self.max_errors
    }

    pub fn reports(&self) -> &[Diagnostic] {
        &self.reports
    }

    /// Messages of all reports, in order
    pub fn messages(&self) -> Vec<&str> {
        self.reports.iter().map(|d| d.message.as_str()).collect()
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

fn trailing(context: &str, width: usize) -> String {
    let skip = context.chars().count().saturating_sub(width);
    context.chars().skip(skip).collect()
}
