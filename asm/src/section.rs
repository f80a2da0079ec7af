use std::ops::BitOr;

use crate::error::{Error, Result};

/// Placement and output flags of a [`Section`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionFlags(u32);

impl SectionFlags {
    pub const NONE: SectionFlags = SectionFlags(0);
    /// Start address is authoritative and never recomputed.
    pub const FIXED_START: SectionFlags = SectionFlags(1);
    /// Size is authoritative and never recomputed from children.
    pub const FIXED_SIZE: SectionFlags = SectionFlags(2);
    /// Written to a file of its own instead of the combined image.
    pub const WRITE_TO_DISK: SectionFlags = SectionFlags(4);
    /// Occupies addresses but is never written anywhere.
    pub const NO_STORAGE: SectionFlags = SectionFlags(8);

    pub fn contains(&self, other: SectionFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: SectionFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: SectionFlags) {
        self.0 &= !other.0;
    }
}

impl BitOr for SectionFlags {
    type Output = SectionFlags;

    fn bitor(self, rhs: SectionFlags) -> SectionFlags {
        SectionFlags(self.0 | rhs.0)
    }
}

/// A named memory region. Either a leaf holding bytes or a container holding
/// ordered children, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    /// Bits above 16 select a bank.
    pub start: i32,
    pub size: i32,
    pub flags: SectionFlags,
    pub parent: String,
    pub children: Vec<String>,
    pub data: Vec<u8>,
    /// Write cursor, `start + data.len()`.
    pub pc: i32,
    pub valid: bool,
}

impl Section {
    pub fn new(name: &str, start: i32) -> Self {
        Self {
            name: name.to_string(),
            start,
            size: 0,
            flags: SectionFlags::NONE,
            parent: String::new(),
            children: vec![],
            data: vec![],
            pc: start,
            valid: true,
        }
    }

    pub fn is_leaf(&self) -> bool {
        !self.data.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// First address after the section's bytes. Wider than `start`, since
    /// a section may end exactly at the top of the address space.
    pub fn end(&self) -> i64 {
        self.start as i64 + self.data.len() as i64
    }

    /// Append a byte and return the new cursor. Fails, without writing, when
    /// the cursor would leave the signed 32-bit address space.
    pub(crate) fn push(&mut self, byte: u8) -> Result<i32> {
        let pc = self
            .pc
            .checked_add(1)
            .ok_or_else(|| Error::AddressOverflow(self.name.clone()))?;
        self.data.push(byte);
        self.pc = pc;
        Ok(pc)
    }
}
