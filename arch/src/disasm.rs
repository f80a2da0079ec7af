use color_print::cformat;

use crate::mode::AddressingMode;
use crate::opcodes;

/// One decoded line of a disassembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub addr: u16,
    pub bytes: Vec<u8>,
    pub text: String,
}

impl Line {
    pub fn cformat(&self) -> String {
        let hex = self
            .bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ");
        cformat!("<c>{:04X}</> <y>{:<8}</> <r>{}</>", self.addr, hex, self.text)
    }
}

/// Decode `bytes` as code starting at address `pc`.
/// Bytes that are not opcodes, and a cut off final instruction, are shown as
/// `.byte` lines.
pub fn disassemble(bytes: &[u8], pc: u16) -> Vec<Line> {
    let mut lines = vec![];
    let mut idx = 0;
    while idx < bytes.len() {
        let addr = pc.wrapping_add(idx as u16);
        let decoded = opcodes::decode(bytes[idx])
            .filter(|(_, mode)| idx + mode.size() <= bytes.len());
        let Some((mnemonic, mode)) = decoded else {
            lines.push(Line {
                addr,
                bytes: vec![bytes[idx]],
                text: format!(".byte ${:02x}", bytes[idx]),
            });
            idx += 1;
            continue;
        };

        let raw = &bytes[idx..idx + mode.size()];
        let value = match mode.operand_size() {
            0 => 0,
            1 => raw[1] as i32,
            _ => raw[1] as i32 | (raw[2] as i32) << 8,
        };
        let value = match mode {
            AddressingMode::REL => (addr as i32 + 2 + raw[1] as i8 as i32) & 0xffff,
            _ => value,
        };
        let text = match mode {
            AddressingMode::NONE => mnemonic.to_string(),
            _ => format!("{} {}", mnemonic, mode.format(value)),
        };
        lines.push(Line {
            addr,
            bytes: raw.to_vec(),
            text,
        });
        idx += mode.size();
    }
    lines
}
