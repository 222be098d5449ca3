pub mod instr;
pub mod symbols;
