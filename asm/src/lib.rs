//! Code generation for a 6502 cross assembler: sections, encoding, layout
//! and output images, plus a small bridge for running the result.

pub mod bus;
pub mod cpu;
pub mod encoder;
pub mod error;
pub mod layout;
pub mod listing;
pub mod output;
pub mod overlap;
pub mod project;
pub mod section;
pub mod sections;

pub use bus::Bus;
pub use cpu::{Cpu, Regs};
pub use encoder::AsmResult;
pub use error::{Error, Result};
pub use output::{Image, OutFmt, SideFile};
pub use project::{assemble, Project};
pub use section::{Section, SectionFlags};
pub use sections::{Sections, DEFAULT_SECTION};
