use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Operand shape of a 6502 instruction.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    EnumString,
    EnumIter,
    Display,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum AddressingMode {
    #[default]
    NONE,
    ACC,
    IMM,
    REL,
    ZP,
    ZPX,
    ZPY,
    INDX,
    INDY,
    IND,
    ABS,
    ABSX,
    ABSY,
}

impl AddressingMode {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.parse::<Self>() {
            Ok(a) => Ok(a),
            Err(_) => Err(format!("Unknown addressing mode: {s}")),
        }
    }

    /// Number of operand bytes following the opcode.
    pub fn operand_size(&self) -> usize {
        use AddressingMode::*;
        match self {
            NONE | ACC => 0,
            IMM | REL | ZP | ZPX | ZPY | INDX | INDY => 1,
            IND | ABS | ABSX | ABSY => 2,
        }
    }

    /// Encoded size including the opcode byte.
    pub fn size(&self) -> usize {
        1 + self.operand_size()
    }

    /// The zero page form an absolute mode can be demoted to.
    pub fn zero_page(&self) -> Option<Self> {
        use AddressingMode::*;
        match self {
            ABS => Some(ZP),
            ABSX => Some(ZPX),
            ABSY => Some(ZPY),
            _ => None,
        }
    }

    /// Operand text as shown in listings. `value` is the encoded operand,
    /// except for `REL` where it is the branch target.
    pub fn format(&self, value: i32) -> String {
        use AddressingMode::*;
        match self {
            NONE => String::new(),
            ACC => "A".to_string(),
            IMM => format!("#${:02x}", value),
            REL => format!("${:04x}", value),
            ZP => format!("${:02x}", value),
            ZPX => format!("${:02x},x", value),
            ZPY => format!("${:02x},y", value),
            INDX => format!("(${:02x},x)", value),
            INDY => format!("(${:02x}),y", value),
            IND => format!("(${:04x})", value),
            ABS => format!("${:04x}", value),
            ABSX => format!("${:04x},x", value),
            ABSY => format!("${:04x},y", value),
        }
    }
}
