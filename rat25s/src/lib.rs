//! One-pass translator for simplified Rat25S.
//!
//! Source text is tokenized, then a recursive-descent parser checks
//! declarations and types while emitting stack machine instructions in the
//! same pass. The result is rendered as a textual report by [`report`].

pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod parser;
pub mod report;

pub use error::CompileError;
pub use parser::{Translation, translate};

/// Knobs for a single translation run.
#[derive(Debug, Clone)]
pub struct Options {
    /// Record the productions applied and the tokens they matched.
    pub trace: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { trace: true }
    }
}
