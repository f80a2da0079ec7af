use log::{debug, info};

use crate::error::{Error, Result};
use crate::section::SectionFlags;
use crate::sections::Sections;

impl Sections {
    /// Assign addresses to every section reachable from a root.
    ///
    /// Returns `Ok(false)` when a floating section moved. Anything encoded
    /// against the old address is stale then, so the caller must run another
    /// pass (and bound how many it runs).
    pub fn layout(&mut self) -> Result<bool> {
        self.layout_ok = true;
        for idx in 0..self.sections.len() {
            if self.sections[idx].is_root() {
                let start = self.sections[idx].start;
                self.layout_section(start, idx)?;
            }
        }
        Ok(self.layout_ok)
    }

    /// Place section `idx` at `address` if it floats, or check that its fixed
    /// start is not before `address`. Returns the address after the section.
    fn layout_section(&mut self, address: i32, idx: usize) -> Result<i32> {
        let s = &mut self.sections[idx];
        if !s.valid {
            info!("Skipping invalid section {}", s.name);
            return Ok(address);
        }

        debug!("Layout {}", s.name);
        if !s.flags.contains(SectionFlags::FIXED_START) {
            if s.start != address {
                debug!("{}: {:x} differs from {:x}", s.name, s.start, address);
                self.layout_ok = false;
            }
            s.start = address;
        }

        if s.start < address {
            return Err(Error::SectionRegression(s.name.clone(), s.start, address));
        }

        if !s.data.is_empty() {
            if !s.children.is_empty() {
                return Err(Error::DataSectionHasChildren(s.name.clone()));
            }
            let end = i32::try_from(s.end())
                .map_err(|_| Error::AddressOverflow(s.name.clone()))?;
            s.pc = end;
            return Ok(end);
        }

        let start = s.start;
        let mut address = address;
        for child in s.children.clone() {
            let cidx = self
                .index_of(&child)
                .ok_or_else(|| Error::UnknownSection(child.clone()))?;
            address = self.layout_section(address, cidx)?;
        }

        let s = &mut self.sections[idx];
        let Some(used) = address.checked_sub(start) else {
            return Err(Error::AddressOverflow(s.name.clone()));
        };
        if !s.flags.contains(SectionFlags::FIXED_SIZE) {
            s.size = used;
        }
        if used > s.size {
            return Err(Error::SectionTooLarge(s.name.clone()));
        }
        start
            .checked_add(s.size)
            .ok_or_else(|| Error::AddressOverflow(s.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(sections: &mut Sections, name: &str, start: i32) {
        sections.add_section(name, Some(start)).unwrap().flags = SectionFlags::FIXED_START;
    }

    #[test]
    fn fixed_roots_are_stable() {
        let mut sections = Sections::new();
        fixed(&mut sections, "code", 0x0800);
        sections.write_bytes(&[0xEA; 16]).unwrap();
        fixed(&mut sections, "data", 0x2000);
        sections.write_bytes(&[0; 4]).unwrap();
        assert!(sections.layout().unwrap());
        assert_eq!(sections.get_section("code").unwrap().start, 0x0800);
        assert_eq!(sections.get_section("data").unwrap().start, 0x2000);
    }

    #[test]
    fn children_are_placed_in_order() {
        let mut sections = Sections::new();
        fixed(&mut sections, "main", 0x1000);
        sections.add_child("a", "main").unwrap();
        sections.write_bytes(&[1; 0x10]).unwrap();
        sections.add_child("b", "main").unwrap();
        sections.write_bytes(&[2; 0x20]).unwrap();

        // Children start at 0, so the first pass moves them
        assert!(!sections.layout().unwrap());
        assert_eq!(sections.get_section("a").unwrap().start, 0x1000);
        assert_eq!(sections.get_section("b").unwrap().start, 0x1010);
        assert_eq!(sections.get_section("b").unwrap().pc, 0x1030);
        assert_eq!(sections.get_section("main").unwrap().size, 0x30);

        // Nothing moves the second time
        assert!(sections.layout().unwrap());
    }

    #[test]
    fn nested_containers_sum_children() {
        let mut sections = Sections::new();
        fixed(&mut sections, "root", 0x0800);
        sections.add_child("outer", "root").unwrap();
        sections.add_child("inner", "outer").unwrap();
        sections.add_child("x", "inner").unwrap();
        sections.write_bytes(&[0; 5]).unwrap();
        sections.add_child("y", "outer").unwrap();
        sections.write_bytes(&[0; 7]).unwrap();
        sections.layout().unwrap();
        assert!(sections.layout().unwrap());
        assert_eq!(sections.get_section("inner").unwrap().size, 5);
        assert_eq!(sections.get_section("outer").unwrap().size, 12);
        assert_eq!(sections.get_section("root").unwrap().size, 12);
        assert_eq!(sections.get_section("y").unwrap().start, 0x0805);
    }

    #[test]
    fn fixed_size_is_kept() {
        let mut sections = Sections::new();
        let s = sections.add_section("zp", Some(0x10)).unwrap();
        s.flags = SectionFlags::FIXED_START | SectionFlags::FIXED_SIZE;
        s.size = 0x20;
        sections.add_child("vars", "zp").unwrap();
        sections.write_bytes(&[0; 4]).unwrap();
        sections.layout().unwrap();
        assert_eq!(sections.get_section("zp").unwrap().size, 0x20);
    }

    #[test]
    fn fixed_size_overflow() {
        let mut sections = Sections::new();
        let s = sections.add_section("zp", Some(0x10)).unwrap();
        s.flags = SectionFlags::FIXED_START | SectionFlags::FIXED_SIZE;
        s.size = 2;
        sections.add_child("vars", "zp").unwrap();
        sections.write_bytes(&[0; 4]).unwrap();
        assert!(matches!(
            sections.layout(),
            Err(Error::SectionTooLarge(name)) if name == "zp"
        ));
    }

    #[test]
    fn fixed_child_before_address() {
        let mut sections = Sections::new();
        fixed(&mut sections, "main", 0x1000);
        sections.add_child("a", "main").unwrap();
        sections.write_bytes(&[0; 0x20]).unwrap();
        sections.add_child("b", "main").unwrap().flags = SectionFlags::FIXED_START;
        sections.get_section_mut("b").unwrap().start = 0x1010;
        sections.write_byte(0).unwrap();
        assert!(matches!(
            sections.layout(),
            Err(Error::SectionRegression(name, 0x1010, 0x1020)) if name == "b"
        ));
    }

    #[test]
    fn fixed_child_leaves_gap() {
        let mut sections = Sections::new();
        fixed(&mut sections, "main", 0x1000);
        sections.add_child("a", "main").unwrap();
        sections.write_bytes(&[0; 0x10]).unwrap();
        sections.add_child("b", "main").unwrap().flags = SectionFlags::FIXED_START;
        sections.get_section_mut("b").unwrap().start = 0x1100;
        sections.write_byte(0).unwrap();
        sections.layout().unwrap();
        assert_eq!(sections.get_section("main").unwrap().size, 0x101);
    }

    #[test]
    fn data_section_with_children() {
        let mut sections = Sections::new();
        fixed(&mut sections, "main", 0x1000);
        sections.write_byte(0).unwrap();
        sections.add_child("a", "main").unwrap();
        assert!(matches!(
            sections.layout(),
            Err(Error::DataSectionHasChildren(name)) if name == "main"
        ));
    }

    #[test]
    fn invalid_sections_take_no_space() {
        let mut sections = Sections::new();
        fixed(&mut sections, "main", 0x1000);
        sections.add_child("a", "main").unwrap();
        sections.add_child("b", "main").unwrap();
        sections.clear();
        sections.add_section("main", None).unwrap();
        sections.add_child("b", "main").unwrap();
        sections.write_bytes(&[0; 3]).unwrap();
        sections.layout().unwrap();
        assert_eq!(sections.get_section("b").unwrap().start, 0x1000);
        assert_eq!(sections.get_section("main").unwrap().size, 3);
    }

    #[test]
    fn size_past_the_address_space() {
        let mut sections = Sections::new();
        let s = sections.add_section("top", Some(i32::MAX - 0x10)).unwrap();
        s.flags = SectionFlags::FIXED_START | SectionFlags::FIXED_SIZE;
        s.size = 0x20;
        assert!(matches!(
            sections.layout(),
            Err(Error::AddressOverflow(name)) if name == "top"
        ));
    }

    #[test]
    fn leaf_ending_at_top_of_address_space() {
        let mut sections = Sections::new();
        fixed(&mut sections, "top", i32::MAX - 2);
        sections.write_bytes(&[1, 2]).unwrap();
        assert!(sections.layout().unwrap());
        assert_eq!(sections.get_section("top").unwrap().pc, i32::MAX);
    }
}
