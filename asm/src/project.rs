use std::collections::HashSet;
use std::path::Path;

use arch::{AddressingMode, Instruction};
use log::{debug, info};
use serde::Deserialize;

use crate::encoder::{branch_offset, AsmResult};
use crate::error::{Error, Result};
use crate::output::OutFmt;
use crate::section::SectionFlags;
use crate::sections::Sections;

/// An assembly project: sections and what goes into them.
///
/// ```yaml
/// format: prg
/// sections:
///   - name: main
///     start: 0x0801
///     flags: [fixed_start]
///   - name: code
///     parent: main
///     code:
///       - { op: LDA, mode: IMM, arg: 0x41 }
///       - { op: BNE, mode: REL, arg: { section: code } }
///       - { text: "HELLO" }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Project {
    #[serde(default)]
    pub format: OutFmt,
    pub sections: Vec<SectionDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionDef {
    pub name: String,
    /// Used for roots, and for children with `fixed_start`.
    #[serde(default)]
    pub start: Option<i32>,
    /// Must be declared earlier in the project.
    #[serde(default)]
    pub parent: Option<String>,
    /// Implies `fixed_size`.
    #[serde(default)]
    pub size: Option<i32>,
    #[serde(default)]
    pub flags: Vec<Flag>,
    #[serde(default)]
    pub code: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    FixedStart,
    FixedSize,
    WriteToDisk,
    NoStorage,
}

impl From<Flag> for SectionFlags {
    fn from(flag: Flag) -> Self {
        match flag {
            Flag::FixedStart => SectionFlags::FIXED_START,
            Flag::FixedSize => SectionFlags::FIXED_SIZE,
            Flag::WriteToDisk => SectionFlags::WRITE_TO_DISK,
            Flag::NoStorage => SectionFlags::NO_STORAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Statement {
    Inst {
        op: String,
        #[serde(default)]
        mode: AddressingMode,
        #[serde(default)]
        arg: Arg,
    },
    Bytes {
        bytes: Vec<u8>,
    },
    Text {
        text: String,
    },
}

/// Instruction operand: a number, or an address relative to the start of a
/// section as placed by the previous pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Arg {
    Num(i32),
    Ref {
        section: String,
        #[serde(default)]
        offset: i32,
    },
}

impl Default for Arg {
    fn default() -> Self {
        Arg::Num(0)
    }
}

impl Project {
    pub fn parse(src: &str) -> Result<Self> {
        let project: Project = serde_yaml::from_str(src)?;
        project.check()?;
        Ok(project)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)
            .map_err(|e| Error::FileRead(path.display().to_string(), e))?;
        Self::parse(&src)
    }

    // Names must be unique and non-empty, references must name a section.
    fn check(&self) -> Result<()> {
        let mut names = HashSet::new();
        for def in &self.sections {
            if def.name.is_empty() {
                return Err(Error::UnknownSection(def.name.clone()));
            }
            if !names.insert(def.name.as_str()) {
                return Err(Error::SectionExists(def.name.clone()));
            }
        }
        for def in &self.sections {
            for stmt in &def.code {
                if let Statement::Inst {
                    arg: Arg::Ref { section, .. },
                    ..
                } = stmt
                {
                    if !names.contains(section.as_str()) {
                        return Err(Error::UnknownSection(section.clone()));
                    }
                }
            }
        }
        Ok(())
    }

    fn declare(&self, sections: &mut Sections) -> Result<()> {
        for def in &self.sections {
            let mut flags = def
                .flags
                .iter()
                .fold(SectionFlags::NONE, |f, &flag| f | flag.into());
            let s = match &def.parent {
                Some(parent) => sections.add_child(&def.name, parent)?,
                None => sections.add_section(&def.name, None)?,
            };
            if def.parent.is_none() || flags.contains(SectionFlags::FIXED_START) {
                if let Some(start) = def.start {
                    s.start = start;
                    s.pc = start;
                }
            }
            if let Some(size) = def.size {
                s.size = size;
                flags.insert(SectionFlags::FIXED_SIZE);
            }
            s.flags = flags;
        }
        Ok(())
    }

    // Emit every statement. Truncated branches are collected, since they only
    // matter once the layout has settled.
    fn emit(&self, sections: &mut Sections) -> Result<Vec<Error>> {
        let mut truncated = vec![];
        for def in &self.sections {
            sections.set_section(&def.name)?;
            for (index, stmt) in def.code.iter().enumerate() {
                match stmt {
                    Statement::Inst { op, mode, arg } => {
                        let operand = match arg {
                            Arg::Num(n) => *n,
                            Arg::Ref { section, offset } => sections
                                .get_section(section)?
                                .start
                                .checked_add(*offset)
                                .ok_or_else(|| Error::AddressOverflow(section.clone()))?,
                        };
                        let pc = sections.pc();
                        match sections.assemble(&Instruction::new(op, *mode, operand))? {
                            AsmResult::Ok => {}
                            AsmResult::Truncated => truncated.push(Error::BranchOutOfRange {
                                section: def.name.clone(),
                                index,
                                mnemonic: op.clone(),
                                offset: branch_offset(operand, pc),
                            }),
                            result => {
                                return Err(Error::Encode {
                                    section: def.name.clone(),
                                    index,
                                    mnemonic: op.clone(),
                                    result,
                                })
                            }
                        }
                    }
                    Statement::Bytes { bytes } => {
                        sections.write_bytes(bytes)?;
                    }
                    Statement::Text { text } => {
                        for b in text.bytes() {
                            sections.write_char(b)?;
                        }
                    }
                }
            }
        }
        Ok(truncated)
    }

    fn pass(&self, sections: &mut Sections) -> Result<(bool, Vec<Error>)> {
        sections.clear();
        self.declare(sections)?;
        let truncated = self.emit(sections)?;
        let stable = sections.layout()?;
        Ok((stable, truncated))
    }
}

/// Assemble `project`, re-running passes until the layout is stable.
pub fn assemble(project: &Project, listing: bool) -> Result<Sections> {
    assemble_passes(project, listing, project.sections.len() + 2)
}

fn assemble_passes(project: &Project, listing: bool, max: usize) -> Result<Sections> {
    project.check()?;
    let mut sections = Sections::new();
    if listing {
        sections.enable_listing();
    }
    for pass in 1..=max {
        let (stable, truncated) = project.pass(&mut sections)?;
        if !stable {
            debug!("Pass {}: layout moved", pass);
            continue;
        }
        if let Some(e) = truncated.into_iter().next() {
            return Err(e);
        }
        sections.check_overlap()?;
        info!("Layout settled after {} passes", pass);
        return Ok(sections);
    }
    Err(Error::LayoutUnstable(max))
}
