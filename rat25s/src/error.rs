use thiserror::Error;

use crate::ir::instr::PatchError;
use crate::ir::symbols::Type;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexer error at line {line}: {message}")]
    LexerError { line: usize, message: String },

    #[error("Syntax error at line {line}: expected {expected}, found {found}")]
    SyntaxError {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("Undeclared identifier '{lexeme}' at line {line}")]
    UndeclaredIdentifier { lexeme: String, line: usize },

    #[error("Identifier '{lexeme}' at line {line} is already declared")]
    Redeclaration { lexeme: String, line: usize },

    #[error("Type mismatch at line {line}: '{lexeme}' expects {expected}, found {found}")]
    TypeMismatch {
        lexeme: String,
        line: usize,
        expected: Type,
        found: Type,
    },

    #[error("Unexpected end of input at line {line}: expected {expected}")]
    UnexpectedEndOfInput { expected: String, line: usize },

    #[error("Internal error: {0}")]
    Internal(#[from] PatchError),

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CompileError {
    /// Short name of the error kind, as shown in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LexerError { .. } => "LexerError",
            Self::SyntaxError { .. } => "SyntaxError",
            Self::UndeclaredIdentifier { .. } => "UndeclaredIdentifierError",
            Self::Redeclaration { .. } => "RedeclarationError",
            Self::TypeMismatch { .. } => "TypeMismatchError",
            Self::UnexpectedEndOfInput { .. } => "UnexpectedEndOfInput",
            Self::Internal(_) => "InternalError",
            Self::IoError { .. } => "IoError",
        }
    }

    /// The offending lexeme, if the error points at one.
    pub fn lexeme(&self) -> Option<&str> {
        match self {
            Self::SyntaxError { found, .. } => Some(found),
            Self::UndeclaredIdentifier { lexeme, .. }
            | Self::Redeclaration { lexeme, .. }
            | Self::TypeMismatch { lexeme, .. } => Some(lexeme),
            _ => None,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            Self::LexerError { line, .. }
            | Self::SyntaxError { line, .. }
            | Self::UndeclaredIdentifier { line, .. }
            | Self::Redeclaration { line, .. }
            | Self::TypeMismatch { line, .. }
            | Self::UnexpectedEndOfInput { line, .. } => Some(*line),
            Self::Internal(_) | Self::IoError { .. } => None,
        }
    }
}
