use crate::error::CompileError;
use super::lexer::{Token, TokenKind};

/// One-token lookahead over a finished token sequence.
///
/// Past the last real token the cursor yields an end marker carrying the
/// line of the last token, so errors at end of input still have a location.
pub struct TokenCursor {
    tokens: Vec<Token>,
    position: usize,
    end: Token,
}

impl TokenCursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        let last_line = tokens.last().map_or(1, |t| t.line);
        Self {
            tokens,
            position: 0,
            end: Token::end_marker(last_line),
        }
    }

    pub fn peek(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&self.end)
    }

    pub fn advance(&mut self) -> Result<Token, CompileError> {
        match self.tokens.get(self.position) {
            Some(token) => {
                self.position += 1;
                Ok(token.clone())
            }
            None => Err(CompileError::UnexpectedEndOfInput {
                expected: "more input".to_string(),
                line: self.end.line,
            }),
        }
    }

    /// Consumes the current token if it satisfies `predicate`.
    ///
    /// `expected` describes what was wanted and ends up in the diagnostic.
    pub fn expect<P>(&mut self, predicate: P, expected: &str) -> Result<Token, CompileError>
    where
        P: Fn(&Token) -> bool,
    {
        if predicate(self.peek()) {
            return self.advance();
        }
        Err(self.unexpected(expected))
    }

    /// Error for a lookahead token that fits none of the expected alternatives.
    pub fn unexpected(&self, expected: &str) -> CompileError {
        let token = self.peek();
        if token.kind == TokenKind::EndOfInput {
            return CompileError::UnexpectedEndOfInput {
                expected: expected.to_string(),
                line: token.line,
            };
        }
        CompileError::SyntaxError {
            expected: expected.to_string(),
            found: token.lexeme.clone(),
            line: token.line,
        }
    }

    /// Tokens matched so far, in order.
    pub fn consumed(&self) -> &[Token] {
        &self.tokens[..self.position]
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }
}
