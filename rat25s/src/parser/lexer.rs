use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::CompileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Integer,
    Boolean,
    Real,
    Keyword,
    Operator,
    Separator,
    EndOfInput,
}

impl TokenKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Real => "real",
            Self::Keyword => "keyword",
            Self::Operator => "operator",
            Self::Separator => "separator",
            Self::EndOfInput => "end of input",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }

    pub fn end_marker(line: usize) -> Self {
        Self::new(TokenKind::EndOfInput, "", line)
    }

    /// Does this token have the given kind and lexeme?
    pub fn is(&self, kind: TokenKind, lexeme: &str) -> bool {
        self.kind == kind && self.lexeme == lexeme
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::EndOfInput => f.write_str("end of input"),
            _ => write!(f, "'{}'", self.lexeme),
        }
    }
}

const KEYWORDS: &[&str] = &[
    "while", "endwhile", "if", "endif", "else", "integer", "boolean", "real", "return", "print",
    "scan", "function",
];

pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1;

    while let Some(&ch) = chars.peek() {
        match ch {
            ' ' | '\t' | '\r' => {
                chars.next();
            }
            '\n' => {
                chars.next();
                line += 1;
            }
            '[' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    skip_comment(&mut chars, &mut line)?;
                } else {
                    return Err(CompileError::LexerError {
                        line,
                        message: "Unexpected character: '['".to_string(),
                    });
                }
            }
            '0'..='9' => {
                tokens.push(parse_number(&mut chars, line)?);
            }
            'a'..='z' | 'A'..='Z' => {
                let word = parse_identifier(&mut chars);
                let kind = match word.as_str() {
                    "true" | "false" => TokenKind::Boolean,
                    w if KEYWORDS.contains(&w) => TokenKind::Keyword,
                    _ => TokenKind::Identifier,
                };
                tokens.push(Token::new(kind, word, line));
            }
            '=' | '<' | '>' | '!' => {
                chars.next();
                let next = chars.peek().copied();
                let op = match (ch, next) {
                    (_, Some('=')) => {
                        chars.next();
                        format!("{}=", ch)
                    }
                    ('=', Some('>')) => {
                        chars.next();
                        "=>".to_string()
                    }
                    ('!', _) => {
                        return Err(CompileError::LexerError {
                            line,
                            message: "Expected '=' after '!'".to_string(),
                        });
                    }
                    _ => ch.to_string(),
                };
                tokens.push(Token::new(TokenKind::Operator, op, line));
            }
            '+' | '-' | '*' | '/' => {
                chars.next();
                tokens.push(Token::new(TokenKind::Operator, ch.to_string(), line));
            }
            '(' | ')' | '{' | '}' | ';' | ',' => {
                chars.next();
                tokens.push(Token::new(TokenKind::Separator, ch.to_string(), line));
            }
            '$' => {
                chars.next();
                if chars.peek() == Some(&'$') {
                    chars.next();
                    tokens.push(Token::new(TokenKind::Separator, "$$", line));
                } else {
                    return Err(CompileError::LexerError {
                        line,
                        message: "Expected '$$'".to_string(),
                    });
                }
            }
            _ => {
                return Err(CompileError::LexerError {
                    line,
                    message: format!("Unexpected character: '{}'", ch),
                });
            }
        }
    }

    Ok(tokens)
}

// Called after the opening "[*".
fn skip_comment(chars: &mut Peekable<Chars<'_>>, line: &mut usize) -> Result<(), CompileError> {
    let start = *line;
    while let Some(ch) = chars.next() {
        match ch {
            '\n' => *line += 1,
            '*' if chars.peek() == Some(&']') => {
                chars.next();
                return Ok(());
            }
            _ => {}
        }
    }
    Err(CompileError::LexerError {
        line: start,
        message: "Unterminated comment".to_string(),
    })
}

fn parse_number(chars: &mut Peekable<Chars<'_>>, line: usize) -> Result<Token, CompileError> {
    let mut digits = take_digits(chars);

    // A '.' only belongs to the number when digits follow it.
    let mut lookahead = chars.clone();
    if lookahead.next() == Some('.') && lookahead.peek().is_some_and(|c| c.is_ascii_digit()) {
        chars.next();
        digits.push('.');
        digits.push_str(&take_digits(chars));
        return Ok(Token::new(TokenKind::Real, digits, line));
    }

    if digits.parse::<i64>().is_err() {
        return Err(CompileError::LexerError {
            line,
            message: format!("Integer literal out of range: {}", digits),
        });
    }
    Ok(Token::new(TokenKind::Integer, digits, line))
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(&ch) = chars.peek() {
        if !ch.is_ascii_digit() {
            break;
        }
        digits.push(ch);
        chars.next();
    }
    digits
}

fn parse_identifier(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut ident = String::new();

    while let Some(&ch) = chars.peek() {
        match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' => {
                ident.push(ch);
                chars.next();
            }
            _ => break,
        }
    }

    ident
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_lexemes(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.lexeme))
            .collect()
    }

    #[test]
    fn classifies_words() {
        let toks = kinds_and_lexemes("while count_1 true endwhile false real");
        assert_eq!(
            toks,
            vec![
                (TokenKind::Keyword, "while".to_string()),
                (TokenKind::Identifier, "count_1".to_string()),
                (TokenKind::Boolean, "true".to_string()),
                (TokenKind::Keyword, "endwhile".to_string()),
                (TokenKind::Boolean, "false".to_string()),
                (TokenKind::Keyword, "real".to_string()),
            ]
        );
    }

    #[test]
    fn operators_and_separators() {
        let lexemes: Vec<String> = kinds_and_lexemes("$$ a<=b => c>=d != e == f = (g);{},")
            .into_iter()
            .map(|(_, l)| l)
            .collect();
        assert_eq!(
            lexemes,
            vec![
                "$$", "a", "<=", "b", "=>", "c", ">=", "d", "!=", "e", "==", "f", "=", "(", "g",
                ")", ";", "{", "}", ","
            ]
        );
    }

    #[test]
    fn numbers_and_reals() {
        let toks = kinds_and_lexemes("42 3.14 7");
        assert_eq!(toks[0], (TokenKind::Integer, "42".to_string()));
        assert_eq!(toks[1], (TokenKind::Real, "3.14".to_string()));
        assert_eq!(toks[2], (TokenKind::Integer, "7".to_string()));
        // a trailing '.' is not part of the number
        assert!(matches!(
            tokenize("7."),
            Err(CompileError::LexerError { line: 1, .. })
        ));
    }

    #[test]
    fn comments_are_skipped_and_lines_counted() {
        let toks = tokenize("a [* one\ntwo *]\nb").unwrap();
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[0].line, 1);
        assert_eq!(toks[1].line, 3);
    }

    #[test]
    fn lexer_errors() {
        assert!(matches!(
            tokenize("[* never closed"),
            Err(CompileError::LexerError { line: 1, .. })
        ));
        assert!(matches!(
            tokenize("a\n#"),
            Err(CompileError::LexerError { line: 2, .. })
        ));
        assert!(matches!(
            tokenize("$ x"),
            Err(CompileError::LexerError { .. })
        ));
        assert!(matches!(
            tokenize("99999999999999999999"),
            Err(CompileError::LexerError { .. })
        ));
    }
}
