//! Terminal output for command results and diagnostics.

use console::{Style, Term};

/// Writer for the two standard streams.
///
/// Results go to stdout so they can be piped; diagnostics go to stderr.
pub(crate) struct Output {
    out: Term,
    err: Term,
    red: Style,
    dim: Style,
}

impl Output {
    /// Output bound to the process streams.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            red: Style::new().red(),
            dim: Style::new().dim(),
        }
    }

    /// Print a command result.
    pub(crate) fn result(&self, msg: &str) {
        let _ = self.out.write_line(msg);
    }

    /// Print a secondary note (dim).
    pub(crate) fn note(&self, msg: &str) {
        let _ = self.err.write_line(&self.dim.apply_to(msg).to_string());
    }

    /// Print a failure in red.
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.err.write_line(&self.red.apply_to(msg).to_string());
    }
}
