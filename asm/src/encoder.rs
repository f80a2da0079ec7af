use std::fmt;

use arch::{opcodes, AddressingMode, Instruction, Mnemonic};

use crate::error::{Error, Result};
use crate::sections::Sections;

/// Outcome of encoding a single instruction.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsmResult {
    Ok,
    NoSuchOpcode,
    IllegalAddressingMode,
    /// Bytes were written, but the branch offset did not fit in 8 bits.
    Truncated,
}

impl fmt::Display for AsmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmResult::Ok => write!(f, "Ok"),
            AsmResult::NoSuchOpcode => write!(f, "No such opcode"),
            AsmResult::IllegalAddressingMode => write!(f, "Illegal addressing mode"),
            AsmResult::Truncated => write!(f, "Value truncated"),
        }
    }
}

/// Displacement of a branch at `pc` to `target`, counted from the end of
/// the two byte instruction.
pub fn branch_offset(target: i32, pc: i32) -> i64 {
    target as i64 - pc as i64 - 2
}

/// Resolve the mode an instruction is encoded with, and its operand.
///
/// Absolute modes are demoted to zero page when the operand fits in a byte
/// and the mnemonic has that form. Branches always use relative mode, with
/// the operand turned into an offset from the end of the instruction.
pub fn resolve(
    mnemonic: Mnemonic,
    mode: AddressingMode,
    operand: i32,
    pc: i32,
) -> (AddressingMode, i64) {
    if mnemonic.is_branch() {
        return (AddressingMode::REL, branch_offset(operand, pc));
    }
    match mode.zero_page() {
        Some(zp) if (0..=0xff).contains(&operand) && opcodes::has_mode(mnemonic, zp) => {
            (zp, operand as i64)
        }
        _ => (mode, operand as i64),
    }
}

impl Sections {
    /// Encode `instr` into the current section.
    ///
    /// Encoding problems are reported as an [`AsmResult`]. Only a section
    /// running out of address space is an error.
    pub fn assemble(&mut self, instr: &Instruction) -> Result<AsmResult> {
        let Ok(mnemonic) = Mnemonic::parse(&instr.mnemonic) else {
            return Ok(AsmResult::NoSuchOpcode);
        };

        let pc = self.pc();
        let (mode, val) = resolve(mnemonic, instr.mode, instr.operand, pc);
        let Some(code) = opcodes::opcode(mnemonic, mode) else {
            return Ok(AsmResult::IllegalAddressingMode);
        };

        if pc.checked_add(mode.size() as i32).is_none() {
            return Err(Error::AddressOverflow(self.current_section().name.clone()));
        }

        let mask = if mode.operand_size() == 1 { 0xff } else { 0xffff };
        let v = (val & mask) as i32;

        if let Some(listing) = &mut self.listing {
            let shown = match mode {
                AddressingMode::REL => {
                    (v as u8 as i8 as i32).wrapping_add(pc).wrapping_add(2) & 0xffff
                }
                _ => v,
            };
            listing.instruction(pc, &instr.mnemonic, mode, shown);
        }

        self.write_byte(code)?;
        if mode.operand_size() > 0 {
            self.write_byte((v & 0xff) as u8)?;
        }
        if mode.operand_size() > 1 {
            self.write_byte((v >> 8) as u8)?;
        }

        if mode == AddressingMode::REL && !(-128..=127).contains(&val) {
            return Ok(AsmResult::Truncated);
        }
        Ok(AsmResult::Ok)
    }
}
