use log::{debug, info};

use crate::bus::Bus;
use crate::error::{Error, Result};
use crate::sections::Sections;

/// 6502 register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Regs {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sr: u8,
    pub sp: u8,
    pub pc: u16,
}

/// A CPU model able to execute assembled code against a [`Bus`].
pub trait Cpu {
    fn set_pc(&mut self, pc: u16);
    fn regs(&self) -> Regs;
    fn set_regs(&mut self, regs: Regs);
    /// Run until the program returns. Yields the number of cycles executed.
    fn run(&mut self, bus: &mut Bus) -> u32;
}

impl Sections {
    /// Copy every section inside the 16-bit address space into RAM.
    pub fn load_into(&self, bus: &mut Bus) {
        for s in self.iter().filter(|s| !s.data.is_empty()) {
            if !(0..=0xffff).contains(&s.start) {
                debug!("Not loading banked section {} at {:x}", s.name, s.start);
                continue;
            }
            bus.load(s.start as u16, &s.data);
        }
    }

    /// Map the section placed at `hi` in `bank` as ROM over `pages` pages.
    pub fn map_bank(&self, bus: &mut Bus, hi: u8, pages: usize, bank: u8) -> Result<()> {
        let addr = ((bank as i32) << 16) | ((hi as i32) << 8);
        let section = self
            .iter()
            .find(|s| s.start == addr)
            .ok_or(Error::BankNotMapped(bank, hi))?;
        let len = (pages * 0x100).min(section.data.len());
        bus.map_rom(hi, &section.data[..len]);
        Ok(())
    }

    /// Load all sections and run from `pc`.
    pub fn run(&self, cpu: &mut impl Cpu, bus: &mut Bus, pc: u16) -> u32 {
        self.load_into(bus);
        cpu.set_pc(pc);
        let cycles = cpu.run(bus);
        info!("Ran {} cycles from {:04x}", cycles, pc);
        cycles
    }
}
