use std::fmt::Write;

use arch::AddressingMode;

/// Text trace of everything emitted in the current pass.
///
/// ```text
/// 0801 : LDA #$10
/// 0803 : "HELLO"
/// 0808 : BNE $0801
/// ```
#[derive(Debug, Default)]
pub struct Listing {
    text: String,
    in_data: bool,
}

impl Listing {
    pub fn instruction(&mut self, pc: i32, mnemonic: &str, mode: AddressingMode, value: i32) {
        self.close_data();
        let _ = write!(self.text, "{:04x} : {}", pc, mnemonic);
        if mode != AddressingMode::NONE {
            let _ = write!(self.text, " {}", mode.format(value));
        }
        self.text.push('\n');
    }

    pub fn char(&mut self, pc: i32, c: u8) {
        if !self.in_data {
            let _ = write!(self.text, "{:04x} : \"", pc);
            self.in_data = true;
        }
        self.text.push(c as char);
    }

    fn close_data(&mut self) {
        if self.in_data {
            self.text.push_str("\"\n");
            self.in_data = false;
        }
    }

    pub fn rewind(&mut self) {
        self.text.clear();
        self.in_data = false;
    }

    /// The listing so far, with a trailing text run closed.
    pub fn text(&self) -> String {
        let mut text = self.text.clone();
        if self.in_data {
            text.push_str("\"\n");
        }
        text
    }
}
