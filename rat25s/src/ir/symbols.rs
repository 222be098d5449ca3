//! Flat symbol table for declared identifiers.
//!
//! There is a single scope for the whole program: entries are created on
//! declaration, never shadowed and never removed. Addresses are handed out in
//! declaration order starting at [`BASE_ADDRESS`].

use std::fmt;

use indexmap::IndexMap;

use crate::error::CompileError;

/// Address of the first declared identifier.
pub const BASE_ADDRESS: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Integer,
    Boolean,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.pad("integer"),
            Self::Boolean => f.pad("boolean"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub lexeme: String,
    pub address: usize,
    pub ty: Type,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    tab: IndexMap<String, SymbolEntry>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `lexeme` and returns its address.
    ///
    /// Fails with [`CompileError::Redeclaration`] if the identifier is already known.
    pub fn declare(&mut self, lexeme: &str, ty: Type, line: usize) -> Result<usize, CompileError> {
        if self.tab.contains_key(lexeme) {
            return Err(CompileError::Redeclaration {
                lexeme: lexeme.to_string(),
                line,
            });
        }
        let address = BASE_ADDRESS + self.tab.len();
        self.tab.insert(
            lexeme.to_string(),
            SymbolEntry {
                lexeme: lexeme.to_string(),
                address,
                ty,
            },
        );
        Ok(address)
    }

    pub fn resolve(&self, lexeme: &str, line: usize) -> Result<&SymbolEntry, CompileError> {
        self.tab
            .get(lexeme)
            .ok_or_else(|| CompileError::UndeclaredIdentifier {
                lexeme: lexeme.to_string(),
                line,
            })
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.tab.values()
    }

    pub fn len(&self) -> usize {
        self.tab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tab.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_follow_declaration_order() {
        let mut symbols = SymbolTable::new();
        assert_eq!(symbols.declare("a", Type::Integer, 1).unwrap(), 5000);
        assert_eq!(symbols.declare("flag", Type::Boolean, 1).unwrap(), 5001);
        assert_eq!(symbols.declare("b", Type::Integer, 2).unwrap(), 5002);

        let names: Vec<&str> = symbols.entries().map(|e| e.lexeme.as_str()).collect();
        assert_eq!(names, vec!["a", "flag", "b"]);
        assert_eq!(symbols.len(), 3);
    }

    #[test]
    fn redeclaration_is_rejected_and_allocates_nothing() {
        let mut symbols = SymbolTable::new();
        symbols.declare("x", Type::Integer, 1).unwrap();
        let err = symbols.declare("x", Type::Boolean, 3).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Redeclaration { ref lexeme, line: 3 } if lexeme == "x"
        ));
        assert_eq!(symbols.declare("y", Type::Integer, 4).unwrap(), 5001);
    }

    #[test]
    fn resolve_returns_entry_or_undeclared() {
        let mut symbols = SymbolTable::new();
        symbols.declare("count", Type::Integer, 1).unwrap();
        let entry = symbols.resolve("count", 2).unwrap();
        assert_eq!(entry.address, 5000);
        assert_eq!(entry.ty, Type::Integer);

        let err = symbols.resolve("missing", 9).unwrap_err();
        assert!(matches!(
            err,
            CompileError::UndeclaredIdentifier { ref lexeme, line: 9 } if lexeme == "missing"
        ));
    }
}
