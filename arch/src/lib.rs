//! 6502 instruction model: addressing modes, mnemonics, the opcode table and
//! a table driven disassembler.

pub mod disasm;
pub mod inst;
pub mod mode;
pub mod op;
pub mod opcodes;

pub use inst::Instruction;
pub use mode::AddressingMode;
pub use op::Mnemonic;
