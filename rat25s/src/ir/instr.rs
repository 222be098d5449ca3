use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Stack machine opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    PushI,
    PushM,
    PopM,
    Sin,
    Sout,
    A,
    S,
    M,
    D,
    Grt,
    Les,
    Equ,
    Neq,
    Geq,
    Leq,
    Jump,
    Jump0,
    Label,
}

impl Opcode {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::PushI => "PUSHI",
            Self::PushM => "PUSHM",
            Self::PopM => "POPM",
            Self::Sin => "SIN",
            Self::Sout => "SOUT",
            Self::A => "A",
            Self::S => "S",
            Self::M => "M",
            Self::D => "D",
            Self::Grt => "GRT",
            Self::Les => "LES",
            Self::Equ => "EQU",
            Self::Neq => "NEQ",
            Self::Geq => "GEQ",
            Self::Leq => "LEQ",
            Self::Jump => "JUMP",
            Self::Jump0 => "JUMP0",
            Self::Label => "LABEL",
        }
    }

    pub fn is_jump(&self) -> bool {
        matches!(self, Self::Jump | Self::Jump0)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.mnemonic())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// 1-based position in the stream.
    pub index: usize,
    pub opcode: Opcode,
    pub operand: Option<i64>,
}

/// Backpatching misuse. These are translator bugs, never user errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PatchError {
    #[error("instruction {index} does not exist (stream length {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("instruction {index} was not reserved for patching")]
    NotReserved { index: usize },

    #[error("instruction {index} was already patched")]
    AlreadyPatched { index: usize },

    #[error("instruction {index} was reserved but never patched")]
    Unpatched { index: usize },
}

/// Append-only instruction buffer with forward-jump reservations.
#[derive(Debug, Default)]
pub struct InstructionStream {
    code: Vec<Instruction>,
    // reserved index -> already patched?
    reservations: BTreeMap<usize, bool>,
}

impl InstructionStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an instruction and returns its index.
    pub fn emit(&mut self, opcode: Opcode, operand: Option<i64>) -> usize {
        let index = self.code.len() + 1;
        self.code.push(Instruction {
            index,
            opcode,
            operand,
        });
        index
    }

    /// Appends a placeholder whose operand is filled in later by [`patch`](Self::patch).
    pub fn reserve(&mut self, opcode: Opcode) -> usize {
        let index = self.emit(opcode, None);
        self.reservations.insert(index, false);
        index
    }

    pub fn patch(&mut self, index: usize, operand: i64) -> Result<(), PatchError> {
        let len = self.code.len();
        if index == 0 || index > len {
            return Err(PatchError::OutOfRange { index, len });
        }
        match self.reservations.get_mut(&index) {
            None => Err(PatchError::NotReserved { index }),
            Some(true) => Err(PatchError::AlreadyPatched { index }),
            Some(patched) => {
                *patched = true;
                self.code[index - 1].operand = Some(operand);
                Ok(())
            }
        }
    }

    /// Number of instructions emitted so far. The next instruction gets `length() + 1`.
    pub fn length(&self) -> usize {
        self.code.len()
    }

    /// Closes the stream, checking that every reservation was patched.
    pub fn finish(self) -> Result<Vec<Instruction>, PatchError> {
        if let Some((&index, _)) = self.reservations.iter().find(|(_, patched)| !**patched) {
            return Err(PatchError::Unpatched { index });
        }
        Ok(self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_start_at_one_and_are_contiguous() {
        let mut code = InstructionStream::new();
        assert_eq!(code.emit(Opcode::PushI, Some(7)), 1);
        assert_eq!(code.emit(Opcode::Sout, None), 2);
        assert_eq!(code.reserve(Opcode::Jump0), 3);
        assert_eq!(code.length(), 3);
        code.patch(3, 4).unwrap();
        let indices: Vec<usize> = code.finish().unwrap().iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn patch_fills_reserved_operand_once() {
        let mut code = InstructionStream::new();
        let slot = code.reserve(Opcode::Jump);
        code.emit(Opcode::Sin, None);
        code.patch(slot, 3).unwrap();
        assert_eq!(
            code.patch(slot, 4),
            Err(PatchError::AlreadyPatched { index: slot })
        );
        assert_eq!(code.finish().unwrap()[0].operand, Some(3));
    }

    #[test]
    fn patch_rejects_plain_instructions_and_bad_indices() {
        let mut code = InstructionStream::new();
        let back = code.emit(Opcode::Jump, Some(1));
        assert_eq!(code.patch(back, 2), Err(PatchError::NotReserved { index: 1 }));
        assert_eq!(
            code.patch(0, 1),
            Err(PatchError::OutOfRange { index: 0, len: 1 })
        );
        assert_eq!(
            code.patch(5, 1),
            Err(PatchError::OutOfRange { index: 5, len: 1 })
        );
    }

    #[test]
    fn finish_reports_dangling_reservation() {
        let mut code = InstructionStream::new();
        code.emit(Opcode::PushI, Some(1));
        code.reserve(Opcode::Jump0);
        assert_eq!(code.finish(), Err(PatchError::Unpatched { index: 2 }));
    }

    #[test]
    fn mnemonics() {
        assert_eq!(Opcode::Jump0.to_string(), "JUMP0");
        assert_eq!(Opcode::PushM.to_string(), "PUSHM");
        assert!(Opcode::Jump.is_jump());
        assert!(!Opcode::Label.is_jump());
    }
}
