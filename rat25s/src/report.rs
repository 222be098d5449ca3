//! Textual listings of a translation run.
//!
//! A full report is, in order: the token listing, the production trace (when
//! one was recorded), the assembly listing and the symbol table.

use std::fmt::Write;

use crate::error::CompileError;
use crate::ir::instr::Instruction;
use crate::ir::symbols::SymbolEntry;
use crate::parser::Translation;
use crate::parser::lexer::Token;

pub fn render(translation: &Translation) -> String {
    let mut out = String::new();
    out.push_str(&render_tokens(&translation.tokens));
    out.push('\n');

    if !translation.trace.is_empty() {
        out.push_str("Parsing Output:\n");
        for line in &translation.trace {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }

    out.push_str(&render_instructions(&translation.instructions));
    out.push('\n');
    out.push_str(&render_symbols(&translation.symbols));
    out
}

pub fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Tokens:");
    let _ = writeln!(out, "{:<10} {}", "Token", "Lexeme");
    let _ = writeln!(out, "{}", "-".repeat(22));
    for token in tokens {
        let _ = writeln!(out, "{:<10} {}", token.kind.name(), token.lexeme);
    }
    out
}

pub fn render_instructions(instructions: &[Instruction]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Assembly Listing:");
    for instr in instructions {
        let _ = match instr.operand {
            Some(operand) => writeln!(out, "{:>4}  {:<6} {}", instr.index, instr.opcode, operand),
            None => writeln!(out, "{:>4}  {}", instr.index, instr.opcode),
        };
    }
    out
}

pub fn render_symbols(symbols: &[SymbolEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Symbol Table:");
    let _ = writeln!(out, "{:<15}{:<18}{}", "Identifier", "Memory Address", "Type");
    let _ = writeln!(out, "{}", "-".repeat(40));
    for entry in symbols {
        let _ = writeln!(out, "{:<15}{:<18}{}", entry.lexeme, entry.address, entry.ty);
    }
    out
}

/// One-line diagnostic for a failed run.
pub fn render_error(err: &CompileError) -> String {
    format!("error[{}]: {}", err.kind(), err)
}
