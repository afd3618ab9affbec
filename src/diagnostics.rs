//! Structured diagnostics collected while compiling and running commands.
//!
//! Command failures are never fatal: they become [`Diagnostic`] values on
//! the [`ErrorCollector`], annotated with the tick and source text of the
//! command being processed and the macro call stack that led there.

use thiserror::Error;

use crate::timeline::Tick;

/// Why a command could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CommandError {
    /// The arguments do not fit any registered handler of the command word.
    #[error("command arguments are invalid")]
    InvalidArguments,
    /// The command refers to a chart object that does not exist.
    #[error("referenced object not found")]
    ObjectNotFound,
    /// A numeric argument did not parse.
    #[error("argument is not a number")]
    NotANumber,
    /// A paired end command is missing.
    #[error("matching end command not found")]
    EndCommandNotFound,
    /// Macro expansion produced invalid commands.
    #[error("macro expansion failed: {0}")]
    MacroSyntax(String),
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The command still ran, but something looked wrong.
    Warning,
    /// The command failed and was moved to the failed queue.
    Error,
}

/// One collected diagnostic, with the context it was raised in.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity of the event.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Tick of the command being processed, when known.
    pub time: Option<Tick>,
    /// Source text of the command being processed, when known.
    pub command: Option<String>,
    /// Macro call stack, outermost first.
    pub call_stack: Vec<String>,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "warning: {}", self.message)?,
            Severity::Error => write!(f, "error: {}", self.message)?,
        }
        if let Some(time) = self.time {
            write!(f, " at tick {time}")?;
        }
        if let Some(command) = &self.command {
            write!(f, " in `{command}`")?;
        }
        if !self.call_stack.is_empty() {
            write!(f, " (via {})", self.call_stack.join(" > "))?;
        }
        Ok(())
    }
}

/// Accumulates diagnostics and tracks the current command context.
#[derive(Debug, Clone, Default)]
pub struct ErrorCollector {
    diagnostics: Vec<Diagnostic>,
    call_stack: Vec<String>,
    context: Option<(Tick, String)>,
}

impl ErrorCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the command context attached to subsequent diagnostics.
    pub fn set_context(&mut self, time: Tick, command: impl Into<String>) {
        self.context = Some((time, command.into()));
    }

    /// Clears the command context.
    pub fn clear_context(&mut self) {
        self.context = None;
    }

    /// Enters a macro frame named `frame`.
    pub fn push_call(&mut self, frame: impl Into<String>) {
        self.call_stack.push(frame.into());
    }

    /// Leaves the innermost macro frame.
    pub fn pop_call(&mut self) {
        self.call_stack.pop();
    }

    /// Records `error` with the current context.
    pub fn error(&mut self, error: &CommandError) {
        self.push(Severity::Error, error.to_string());
    }

    /// Records a free-form error with the current context.
    pub fn error_text(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message.into());
    }

    /// Records a warning with the current context.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message.into());
    }

    fn push(&mut self, severity: Severity, message: String) {
        let (time, command) = match &self.context {
            Some((time, command)) => (Some(*time), Some(command.clone())),
            None => (None, None),
        };
        self.diagnostics.push(Diagnostic {
            severity,
            message,
            time,
            command,
            call_stack: self.call_stack.clone(),
        });
    }

    /// Number of collected errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Number of collected warnings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// All collected diagnostics, in collection order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Takes the collected diagnostics, leaving the collector empty.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Clears diagnostics, call stack and context.
    pub fn reset(&mut self) {
        self.diagnostics.clear();
        self.call_stack.clear();
        self.context = None;
    }
}

/// Prints `diagnostics` as ariadne reports over each command's source text.
#[cfg(feature = "diagnostics")]
pub fn emit_diagnostics(diagnostics: &[Diagnostic]) {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    for diagnostic in diagnostics {
        let kind = match diagnostic.severity {
            Severity::Warning => ReportKind::Warning,
            Severity::Error => ReportKind::Error,
        };
        let name = diagnostic
            .time
            .map_or_else(|| "command".to_string(), |time| format!("tick {time}"));
        let source = diagnostic.command.clone().unwrap_or_default();
        let span = 0..source.len();
        let mut builder = Report::build(kind, (name.clone(), span.clone()))
            .with_message(diagnostic.message.clone())
            .with_label(
                Label::new((name.clone(), span))
                    .with_message(diagnostic.message.clone())
                    .with_color(Color::Cyan),
            );
        if !diagnostic.call_stack.is_empty() {
            builder = builder.with_note(format!("via {}", diagnostic.call_stack.join(" > ")));
        }
        let _ = builder.finish().print((name, Source::from(source)));
    }
}
