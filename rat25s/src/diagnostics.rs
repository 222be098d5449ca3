use log::trace;

use crate::parser::lexer::Token;

/// Records which productions were applied and which tokens they matched.
///
/// Recording is purely observational and never changes what gets translated.
#[derive(Debug, Default)]
pub struct Diagnostics {
    enabled: bool,
    trace: Vec<String>,
}

impl Diagnostics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            trace: Vec::new(),
        }
    }

    pub fn production(&mut self, rule: &str) {
        if self.enabled {
            trace!("{}", rule);
            self.trace.push(rule.to_string());
        }
    }

    pub fn token(&mut self, token: &Token) {
        if self.enabled {
            let line = format!("Token: {:<10} Lexeme: {}", token.kind.name(), token.lexeme);
            trace!("{}", line);
            self.trace.push(line);
        }
    }

    pub fn into_trace(self) -> Vec<String> {
        self.trace
    }
}
