use indexmap::IndexMap;
use log::{debug, info};

use crate::cpu::Regs;

pub type ReadFn = Box<dyn FnMut(u16) -> u8>;
pub type WriteFn = Box<dyn FnMut(u16, u8)>;
pub type BreakFn = Box<dyn FnMut(u8, &mut Regs)>;

const RAM_SIZE: usize = 0x10000;

/// Memory seen by the CPU: flat RAM, with 256-byte pages optionally routed
/// to callbacks.
///
/// Handlers are stored by the high address byte they were registered with,
/// so a handler covering several pages is called for all of them.
pub struct Bus {
    ram: Vec<u8>,
    read_pages: [Option<u8>; 256],
    write_pages: [Option<u8>; 256],
    readers: IndexMap<u8, ReadFn>,
    writers: IndexMap<u8, WriteFn>,
    breaks: IndexMap<u8, BreakFn>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        Self {
            ram: vec![0; RAM_SIZE],
            read_pages: [None; 256],
            write_pages: [None; 256],
            readers: IndexMap::new(),
            writers: IndexMap::new(),
            breaks: IndexMap::new(),
        }
    }

    /// Copy `bytes` into RAM at `addr`, bypassing page handlers.
    /// Bytes past the end of memory are dropped.
    pub fn load(&mut self, addr: u16, bytes: &[u8]) {
        let start = addr as usize;
        let end = (start + bytes.len()).min(RAM_SIZE);
        self.ram[start..end].copy_from_slice(&bytes[..end - start]);
    }

    pub fn read(&mut self, addr: u16) -> u8 {
        if let Some(key) = self.read_pages[(addr >> 8) as usize] {
            if let Some(f) = self.readers.get_mut(&key) {
                return f(addr);
            }
        }
        self.ram[addr as usize]
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        if let Some(key) = self.write_pages[(addr >> 8) as usize] {
            if let Some(f) = self.writers.get_mut(&key) {
                f(addr, val);
                return;
            }
        }
        self.ram[addr as usize] = val;
    }

    /// Snapshot of RAM. Mapped pages show what was last stored underneath.
    pub fn ram(&self) -> Vec<u8> {
        self.ram.clone()
    }

    pub fn map_read(&mut self, hi: u8, pages: usize, f: impl FnMut(u16) -> u8 + 'static) {
        debug!("Read handler at {:02x}00, {} pages", hi, pages);
        for page in pages_from(hi, pages) {
            self.read_pages[page] = Some(hi);
        }
        self.readers.insert(hi, Box::new(f));
    }

    pub fn map_write(&mut self, hi: u8, pages: usize, f: impl FnMut(u16, u8) + 'static) {
        debug!("Write handler at {:02x}00, {} pages", hi, pages);
        for page in pages_from(hi, pages) {
            self.write_pages[page] = Some(hi);
        }
        self.writers.insert(hi, Box::new(f));
    }

    /// Serve reads of the pages from `hi` on from a copy of `bytes`.
    /// Reads past the end of `bytes` return 0.
    pub fn map_rom(&mut self, hi: u8, bytes: &[u8]) {
        let pages = bytes.len().div_ceil(0x100).max(1);
        let rom = bytes.to_vec();
        let base = (hi as usize) << 8;
        self.map_read(hi, pages, move |addr| {
            rom.get(addr as usize - base).copied().unwrap_or(0)
        });
    }

    pub fn on_break(&mut self, key: u8, f: impl FnMut(u8, &mut Regs) + 'static) {
        self.breaks.insert(key, Box::new(f));
    }

    /// Dispatch a break with the given key. Without a handler the registers
    /// are traced.
    pub fn brk(&mut self, key: u8, regs: &mut Regs) {
        match self.breaks.get_mut(&key) {
            Some(f) => f(key, regs),
            None => info!("{}", trace(key, regs)),
        }
    }
}

fn pages_from(hi: u8, pages: usize) -> std::ops::Range<usize> {
    let first = hi as usize;
    first..(first + pages).min(256)
}

pub(crate) fn trace(key: u8, regs: &Regs) -> String {
    format!(
        "A:{:x} X:{:x} Y:{:x} {:x} {:x}",
        regs.a, regs.x, regs.y, key, regs.pc
    )
}
