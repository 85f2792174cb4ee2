//! Diagnostic sink shared by every pipeline stage.
//!
//! Scan, parse and resolve errors are *accumulated* here so that later
//! stages can be skipped without aborting the process; runtime errors set a
//! separate flag because they map to a different exit code. Diagnostics go
//! to stderr as they arrive and are also retained in rendered form, which is
//! what the integration tests assert against.

use log::debug;

use crate::error::LoxError;

#[derive(Debug, Default)]
pub struct Reporter {
    had_error: bool,
    had_runtime_error: bool,
    diagnostics: Vec<String>,
}

impl Reporter {
    pub fn new() -> Self {
        Reporter::default()
    }

    /// Render `error` to stderr and record it under the appropriate flag.
    pub fn report(&mut self, error: &LoxError) {
        let rendered = error.to_string();
        debug!("reporting diagnostic: {rendered}");

        match error {
            LoxError::Runtime { .. } | LoxError::Io(_) => self.had_runtime_error = true,
            _ => self.had_error = true,
        }

        eprintln!("{rendered}");
        self.diagnostics.push(rendered);
    }

    /// True if any compile-time (scan/parse/resolve) diagnostic was reported.
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    /// True if a runtime error surfaced to the top level.
    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Rendered diagnostics, in report order.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }
}
