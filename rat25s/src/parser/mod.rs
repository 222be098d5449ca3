pub mod cursor;
pub mod lexer;
pub mod parser;

use crate::Options;
use crate::error::CompileError;

pub use parser::Translation;

/// Translates Rat25S source text into stack machine code.
pub fn translate(source: &str, options: &Options) -> Result<Translation, CompileError> {
    let tokens = lexer::tokenize(source)?;
    parser::translate_tokens(tokens, options.trace)
}
