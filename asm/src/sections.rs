use log::debug;

use crate::error::{Error, Result};
use crate::listing::Listing;
use crate::section::{Section, SectionFlags};

pub const DEFAULT_SECTION: &str = "default";

/// Ordered registry of all sections plus the section currently written to.
///
/// Parent and child links are stored as names and resolved on demand, so a
/// section can be mutated while its relatives are looked up.
pub struct Sections {
    pub(crate) sections: Vec<Section>,
    current: usize,
    pub(crate) layout_ok: bool,
    pub(crate) listing: Option<Listing>,
}

impl Default for Sections {
    fn default() -> Self {
        Self::new()
    }
}

impl Sections {
    pub fn new() -> Self {
        let mut default = Section::new(DEFAULT_SECTION, 0);
        default.flags = SectionFlags::FIXED_START;
        Self {
            sections: vec![default],
            current: 0,
            layout_ok: true,
            listing: None,
        }
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.sections.iter().position(|s| s.name == name)
    }

    /// Create and select `name`, or re-declare it if it exists without data.
    /// An empty name always creates a new anonymous section.
    pub fn add_section(&mut self, name: &str, start: Option<i32>) -> Result<&mut Section> {
        match self.index_of(name) {
            None => {
                debug!("New section {:?}", name);
                self.sections
                    .push(Section::new(name, start.unwrap_or_default()));
                self.current = self.sections.len() - 1;
            }
            Some(idx) => {
                let s = &mut self.sections[idx];
                if !s.data.is_empty() {
                    return Err(Error::SectionExists(name.to_string()));
                }
                s.valid = true;
                if let Some(start) = start {
                    s.start = start;
                    s.pc = start;
                }
                self.current = idx;
            }
        }
        Ok(&mut self.sections[self.current])
    }

    /// Create and select `name`, linking it under `parent` the first time.
    /// An existing parent link is never changed.
    pub fn add_child(&mut self, name: &str, parent: &str) -> Result<&mut Section> {
        if name.is_empty() {
            return Err(Error::AnonymousChild(parent.to_string()));
        }
        self.add_section(name, None)?;
        let idx = self.current;
        if self.sections[idx].parent.is_empty() && !parent.is_empty() {
            let pidx = self
                .index_of(parent)
                .ok_or_else(|| Error::UnknownSection(parent.to_string()))?;
            if self.is_ancestor(idx, pidx) {
                return Err(Error::CyclicSection(name.to_string(), parent.to_string()));
            }
            self.sections[idx].parent = parent.to_string();
            self.sections[pidx].children.push(name.to_string());
        }
        Ok(&mut self.sections[idx])
    }

    // Whether `idx` is `of` or one of its ancestors.
    fn is_ancestor(&self, idx: usize, of: usize) -> bool {
        let mut cur = Some(of);
        let mut steps = 0;
        while let Some(c) = cur {
            if c == idx || steps > self.sections.len() {
                return true;
            }
            cur = self.index_of(&self.sections[c].parent);
            steps += 1;
        }
        false
    }

    pub fn set_section(&mut self, name: &str) -> Result<&mut Section> {
        let idx = self
            .index_of(name)
            .ok_or_else(|| Error::UnknownSection(name.to_string()))?;
        self.current = idx;
        Ok(&mut self.sections[idx])
    }

    pub fn remove_section(&mut self, name: &str) {
        let Some(idx) = self.index_of(name) else {
            return;
        };
        let removed = self.sections.remove(idx);
        debug!("Removed section {}", removed.name);
        if self.current == idx {
            self.current = self.default_index();
        } else if self.current > idx {
            self.current -= 1;
        }
    }

    // Index of the default section, recreating it if it was removed.
    fn default_index(&mut self) -> usize {
        match self.index_of(DEFAULT_SECTION) {
            Some(idx) => idx,
            None => {
                let mut default = Section::new(DEFAULT_SECTION, 0);
                default.flags = SectionFlags::FIXED_START;
                self.sections.push(default);
                self.sections.len() - 1
            }
        }
    }

    pub fn get_section(&self, name: &str) -> Result<&Section> {
        self.index_of(name)
            .map(|idx| &self.sections[idx])
            .ok_or_else(|| Error::UnknownSection(name.to_string()))
    }

    pub fn get_section_mut(&mut self, name: &str) -> Result<&mut Section> {
        match self.index_of(name) {
            Some(idx) => Ok(&mut self.sections[idx]),
            None => Err(Error::UnknownSection(name.to_string())),
        }
    }

    pub fn current_section(&self) -> &Section {
        &self.sections[self.current]
    }

    pub fn current_section_mut(&mut self) -> &mut Section {
        &mut self.sections[self.current]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Reset every section for a new pass. The registry itself is kept.
    pub fn clear(&mut self) {
        for s in &mut self.sections {
            s.data.clear();
            s.pc = s.start;
            s.valid = false;
        }
        if let Some(listing) = &mut self.listing {
            listing.rewind();
        }
        self.current = self.default_index();
        self.sections[self.current].valid = true;
    }

    /// Cursor of the current section.
    pub fn pc(&self) -> i32 {
        self.current_section().pc
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<i32> {
        self.current_section_mut().push(byte)
    }

    /// Like [`Sections::write_byte`], but traced as text in the listing.
    pub fn write_char(&mut self, byte: u8) -> Result<i32> {
        let pc = self.current_section_mut().push(byte)?;
        if let Some(listing) = &mut self.listing {
            listing.char(pc - 1, byte);
        }
        Ok(pc)
    }

    /// Append all of `bytes`, or none of them if they do not fit.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<i32> {
        let s = self.current_section_mut();
        let fits = i32::try_from(bytes.len())
            .ok()
            .and_then(|n| s.pc.checked_add(n))
            .is_some();
        if !fits {
            return Err(Error::AddressOverflow(s.name.clone()));
        }
        for &b in bytes {
            s.push(b)?;
        }
        Ok(s.pc)
    }

    pub fn enable_listing(&mut self) {
        self.listing.get_or_insert_with(Listing::default);
    }

    pub fn listing(&self) -> Option<String> {
        self.listing.as_ref().map(|l| l.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_section_is_selected() {
        let sections = Sections::new();
        let s = sections.current_section();
        assert_eq!(s.name, DEFAULT_SECTION);
        assert!(s.flags.contains(SectionFlags::FIXED_START));
        assert_eq!(sections.pc(), 0);
    }

    #[test]
    fn add_selects_new_section() {
        let mut sections = Sections::new();
        sections.add_section("code", Some(0x0801)).unwrap();
        assert_eq!(sections.write_byte(0xEA).unwrap(), 0x0802);
        assert_eq!(sections.get_section("code").unwrap().data, vec![0xEA]);
        assert!(sections.get_section(DEFAULT_SECTION).unwrap().data.is_empty());
    }

    #[test]
    fn redeclare_with_data_fails() {
        let mut sections = Sections::new();
        sections.add_section("code", Some(0x1000)).unwrap();
        sections.write_byte(0x60).unwrap();
        sections.set_section(DEFAULT_SECTION).unwrap();
        assert!(matches!(
            sections.add_section("code", Some(0x2000)),
            Err(Error::SectionExists(name)) if name == "code"
        ));
    }

    #[test]
    fn redeclare_empty_updates_start() {
        let mut sections = Sections::new();
        sections.add_section("bss", Some(0x1000)).unwrap();
        sections.set_section(DEFAULT_SECTION).unwrap();
        let s = sections.add_section("bss", Some(0x2000)).unwrap();
        assert_eq!(s.start, 0x2000);
        assert_eq!(s.pc, 0x2000);
        assert_eq!(sections.current_section().name, "bss");
        let s = sections.add_section("bss", None).unwrap();
        assert_eq!(s.start, 0x2000);
    }

    #[test]
    fn anonymous_sections_are_never_found() {
        let mut sections = Sections::new();
        sections.add_section("", Some(0x1000)).unwrap();
        sections.add_section("", Some(0x2000)).unwrap();
        assert_eq!(sections.len(), 3);
        assert!(matches!(
            sections.set_section(""),
            Err(Error::UnknownSection(_))
        ));
        assert!(sections.get_section("").is_err());
    }

    #[test]
    fn children_are_linked_once() {
        let mut sections = Sections::new();
        sections.add_section("main", Some(0x0800)).unwrap();
        sections.add_section("other", Some(0x4000)).unwrap();
        sections.add_child("text", "main").unwrap();
        sections.add_child("text", "other").unwrap();
        assert_eq!(sections.get_section("main").unwrap().children, vec!["text"]);
        assert!(sections.get_section("other").unwrap().children.is_empty());
        assert_eq!(sections.get_section("text").unwrap().parent, "main");
    }

    #[test]
    fn child_of_unknown_parent() {
        let mut sections = Sections::new();
        assert!(matches!(
            sections.add_child("text", "nowhere"),
            Err(Error::UnknownSection(name)) if name == "nowhere"
        ));
        assert!(matches!(
            sections.add_child("", DEFAULT_SECTION),
            Err(Error::AnonymousChild(_))
        ));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut sections = Sections::new();
        sections.add_section("a", None).unwrap();
        sections.add_child("b", "a").unwrap();
        assert!(matches!(
            sections.add_child("a", "b"),
            Err(Error::CyclicSection(..))
        ));
        assert!(matches!(
            sections.add_child("c", "c"),
            Err(Error::CyclicSection(..))
        ));
    }

    #[test]
    fn remove_current_falls_back_to_default() {
        let mut sections = Sections::new();
        sections.add_section("a", Some(0x1000)).unwrap();
        sections.add_section("b", Some(0x2000)).unwrap();
        sections.set_section("b").unwrap();
        sections.remove_section("a");
        assert_eq!(sections.current_section().name, "b");
        sections.remove_section("b");
        assert_eq!(sections.current_section().name, DEFAULT_SECTION);
        sections.remove_section("missing");
        assert_eq!(sections.len(), 1);
    }

    #[test]
    fn clear_keeps_registry() {
        let mut sections = Sections::new();
        sections.add_section("code", Some(0x0800)).unwrap();
        sections.write_bytes(&[1, 2, 3]).unwrap();
        sections.clear();
        let code = sections.get_section("code").unwrap();
        assert!(code.data.is_empty());
        assert_eq!(code.pc, 0x0800);
        assert!(!code.valid);
        assert!(sections.get_section(DEFAULT_SECTION).unwrap().valid);
        assert_eq!(sections.current_section().name, DEFAULT_SECTION);
        // Empty again, so it can be declared in the next pass
        assert!(sections.add_section("code", None).unwrap().valid);
    }

    #[test]
    fn writing_past_the_address_space_fails() {
        let mut sections = Sections::new();
        sections.add_section("hi", Some(i32::MAX - 1)).unwrap();
        assert!(matches!(
            sections.write_bytes(&[1, 2]),
            Err(Error::AddressOverflow(name)) if name == "hi"
        ));
        assert!(sections.current_section().data.is_empty());
        assert_eq!(sections.write_char(b'A').unwrap(), i32::MAX);
        assert!(sections.write_byte(0).is_err());
        assert_eq!(sections.current_section().data, vec![b'A']);
        assert_eq!(sections.pc(), i32::MAX);
    }

    #[test]
    fn clear_recreates_removed_default() {
        let mut sections = Sections::new();
        sections.add_section("code", Some(0x0800)).unwrap();
        sections.remove_section(DEFAULT_SECTION);
        sections.clear();
        assert_eq!(sections.current_section().name, DEFAULT_SECTION);
        assert!(sections.current_section().valid);
    }
}
