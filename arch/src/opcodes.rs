//! Opcode table of the NMOS 6502.
//!
//! Every legal `(mnemonic, addressing mode)` pair maps to exactly one opcode
//! byte, and every opcode byte to exactly one pair, so the same table serves
//! the encoder and the disassembler.

use bimap::BiMap;
use once_cell::sync::Lazy;

use crate::mode::AddressingMode;
use crate::op::Mnemonic;

macro_rules! opcodes {
    ($($op:ident { $($mode:ident: $code:expr),* $(,)? })*) => {{
        let mut table = BiMap::new();
        $($(
            table.insert((Mnemonic::$op, AddressingMode::$mode), $code);
        )*)*
        table
    }};
}

static OPCODES: Lazy<BiMap<(Mnemonic, AddressingMode), u8>> = Lazy::new(|| {
    opcodes! {
        ADC { IMM: 0x69, ZP: 0x65, ZPX: 0x75, ABS: 0x6D, ABSX: 0x7D, ABSY: 0x79, INDX: 0x61, INDY: 0x71 }
        AND { IMM: 0x29, ZP: 0x25, ZPX: 0x35, ABS: 0x2D, ABSX: 0x3D, ABSY: 0x39, INDX: 0x21, INDY: 0x31 }
        ASL { ACC: 0x0A, ZP: 0x06, ZPX: 0x16, ABS: 0x0E, ABSX: 0x1E }
        BCC { REL: 0x90 }
        BCS { REL: 0xB0 }
        BEQ { REL: 0xF0 }
        BIT { ZP: 0x24, ABS: 0x2C }
        BMI { REL: 0x30 }
        BNE { REL: 0xD0 }
        BPL { REL: 0x10 }
        BRK { NONE: 0x00 }
        BVC { REL: 0x50 }
        BVS { REL: 0x70 }
        CLC { NONE: 0x18 }
        CLD { NONE: 0xD8 }
        CLI { NONE: 0x58 }
        CLV { NONE: 0xB8 }
        CMP { IMM: 0xC9, ZP: 0xC5, ZPX: 0xD5, ABS: 0xCD, ABSX: 0xDD, ABSY: 0xD9, INDX: 0xC1, INDY: 0xD1 }
        CPX { IMM: 0xE0, ZP: 0xE4, ABS: 0xEC }
        CPY { IMM: 0xC0, ZP: 0xC4, ABS: 0xCC }
        DEC { ZP: 0xC6, ZPX: 0xD6, ABS: 0xCE, ABSX: 0xDE }
        DEX { NONE: 0xCA }
        DEY { NONE: 0x88 }
        EOR { IMM: 0x49, ZP: 0x45, ZPX: 0x55, ABS: 0x4D, ABSX: 0x5D, ABSY: 0x59, INDX: 0x41, INDY: 0x51 }
        INC { ZP: 0xE6, ZPX: 0xF6, ABS: 0xEE, ABSX: 0xFE }
        INX { NONE: 0xE8 }
        INY { NONE: 0xC8 }
        JMP { ABS: 0x4C, IND: 0x6C }
        JSR { ABS: 0x20 }
        LDA { IMM: 0xA9, ZP: 0xA5, ZPX: 0xB5, ABS: 0xAD, ABSX: 0xBD, ABSY: 0xB9, INDX: 0xA1, INDY: 0xB1 }
        LDX { IMM: 0xA2, ZP: 0xA6, ZPY: 0xB6, ABS: 0xAE, ABSY: 0xBE }
        LDY { IMM: 0xA0, ZP: 0xA4, ZPX: 0xB4, ABS: 0xAC, ABSX: 0xBC }
        LSR { ACC: 0x4A, ZP: 0x46, ZPX: 0x56, ABS: 0x4E, ABSX: 0x5E }
        NOP { NONE: 0xEA }
        ORA { IMM: 0x09, ZP: 0x05, ZPX: 0x15, ABS: 0x0D, ABSX: 0x1D, ABSY: 0x19, INDX: 0x01, INDY: 0x11 }
        PHA { NONE: 0x48 }
        PHP { NONE: 0x08 }
        PLA { NONE: 0x68 }
        PLP { NONE: 0x28 }
        ROL { ACC: 0x2A, ZP: 0x26, ZPX: 0x36, ABS: 0x2E, ABSX: 0x3E }
        ROR { ACC: 0x6A, ZP: 0x66, ZPX: 0x76, ABS: 0x6E, ABSX: 0x7E }
        RTI { NONE: 0x40 }
        RTS { NONE: 0x60 }
        SBC { IMM: 0xE9, ZP: 0xE5, ZPX: 0xF5, ABS: 0xED, ABSX: 0xFD, ABSY: 0xF9, INDX: 0xE1, INDY: 0xF1 }
        SEC { NONE: 0x38 }
        SED { NONE: 0xF8 }
        SEI { NONE: 0x78 }
        STA { ZP: 0x85, ZPX: 0x95, ABS: 0x8D, ABSX: 0x9D, ABSY: 0x99, INDX: 0x81, INDY: 0x91 }
        STX { ZP: 0x86, ZPY: 0x96, ABS: 0x8E }
        STY { ZP: 0x84, ZPX: 0x94, ABS: 0x8C }
        TAX { NONE: 0xAA }
        TAY { NONE: 0xA8 }
        TSX { NONE: 0xBA }
        TXA { NONE: 0x8A }
        TXS { NONE: 0x9A }
        TYA { NONE: 0x98 }
    }
});

/// Opcode byte for `mnemonic` in `mode`, if the pair is legal.
pub fn opcode(mnemonic: Mnemonic, mode: AddressingMode) -> Option<u8> {
    OPCODES.get_by_left(&(mnemonic, mode)).copied()
}

pub fn has_mode(mnemonic: Mnemonic, mode: AddressingMode) -> bool {
    OPCODES.contains_left(&(mnemonic, mode))
}

/// All addressing modes legal for `mnemonic`, in no particular order.
pub fn modes(mnemonic: Mnemonic) -> Vec<AddressingMode> {
    OPCODES
        .left_values()
        .filter(|(m, _)| *m == mnemonic)
        .map(|(_, mode)| *mode)
        .collect()
}

pub fn decode(code: u8) -> Option<(Mnemonic, AddressingMode)> {
    OPCODES.get_by_right(&code).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    macro_rules! test_opcode {
        ($($name:ident: $op:ident $mode:ident => $code:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let pair = (Mnemonic::$op, AddressingMode::$mode);
                    assert_eq!(opcode(pair.0, pair.1), Some($code));
                    assert_eq!(decode($code), Some(pair));
                }
            )*
        }
    }

    test_opcode! {
        test_lda_imm: LDA IMM => 0xA9,
        test_lda_zp: LDA ZP => 0xA5,
        test_lda_abs: LDA ABS => 0xAD,
        test_ldx_zpy: LDX ZPY => 0xB6,
        test_sta_indy: STA INDY => 0x91,
        test_jmp_ind: JMP IND => 0x6C,
        test_jsr_abs: JSR ABS => 0x20,
        test_bne_rel: BNE REL => 0xD0,
        test_asl_acc: ASL ACC => 0x0A,
        test_brk: BRK NONE => 0x00,
        test_txs: TXS NONE => 0x9A,
    }

    #[test]
    fn table_is_complete() {
        assert_eq!(OPCODES.len(), 151);
        for m in Mnemonic::iter() {
            assert!(!modes(m).is_empty(), "{m} has no opcodes");
        }
    }

    #[test]
    fn branches_are_relative_only() {
        for m in Mnemonic::iter().filter(|m| m.is_branch()) {
            assert_eq!(modes(m), vec![AddressingMode::REL]);
        }
    }

    #[test]
    fn illegal_pairs() {
        assert_eq!(opcode(Mnemonic::STA, AddressingMode::IMM), None);
        assert_eq!(opcode(Mnemonic::STA, AddressingMode::ZPY), None);
        assert!(!has_mode(Mnemonic::JSR, AddressingMode::ZP));
        assert_eq!(decode(0x02), None);
    }
}
