use std::fmt;

use crate::mode::AddressingMode;

/// One instruction request as handed over by the front end.
///
/// The mnemonic is kept as text so an unknown name can be reported by the
/// encoder instead of being rejected while building the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub mnemonic: String,
    pub mode: AddressingMode,
    pub operand: i32,
}

impl Instruction {
    pub fn new(mnemonic: impl Into<String>, mode: AddressingMode, operand: i32) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            mode,
            operand,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            AddressingMode::NONE => write!(f, "{}", self.mnemonic),
            mode => write!(f, "{} {}", self.mnemonic, mode.format(self.operand)),
        }
    }
}

#[test]
fn test_display() {
    assert_eq!(
        Instruction::new("LDA", AddressingMode::IMM, 0x10).to_string(),
        "LDA #$10"
    );
    assert_eq!(
        Instruction::new("sta", AddressingMode::ABSX, 0x0400).to_string(),
        "sta $0400,x"
    );
    assert_eq!(
        Instruction::new("RTS", AddressingMode::NONE, 0).to_string(),
        "RTS"
    );
}
