use color_print::cprintln;
use thiserror::Error;

use crate::encoder::AsmResult;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Section registry
    #[error("Section {0} already exists")]
    SectionExists(String),

    #[error("Unknown section {0}")]
    UnknownSection(String),

    #[error("Anonymous section cannot be added to {0}")]
    AnonymousChild(String),

    #[error("Section {0} cannot be placed inside {1}: sections would form a cycle")]
    CyclicSection(String, String),

    // Layout
    #[error("Data section {0} may not have children")]
    DataSectionHasChildren(String),

    #[error("Section {0} is too large")]
    SectionTooLarge(String),

    #[error("Section {0} starts at {1:x} which is before {2:x}")]
    SectionRegression(String, i32, i32),

    #[error("Section {0} runs past the end of the address space")]
    AddressOverflow(String),

    #[error("Layout did not settle after {0} passes")]
    LayoutUnstable(usize),

    // Overlap and output
    #[error("Section {0} overlaps {1}")]
    Overlap(String, String),

    #[error("Section {0} overlaps previous")]
    OverlapsPrevious(String),

    #[error("Illegal address: section {0} at {1:x}")]
    IllegalAddress(String, i32),

    #[error("Could not map bank {0} at {1:02x}00")]
    BankNotMapped(u8, u8),

    // Encoding, as reported by the project driver
    #[error("{result}: `{mnemonic}`")]
    Encode {
        section: String,
        index: usize,
        mnemonic: String,
        result: AsmResult,
    },

    #[error("Branch out of range: `{mnemonic}` needs offset {offset}")]
    BranchOutOfRange {
        section: String,
        index: usize,
        mnemonic: String,
        offset: i64,
    },

    // Files
    #[error("Failed to read file: {0}")]
    FileRead(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileWrite(String, #[source] std::io::Error),

    #[error("Invalid project file: {0}")]
    Project(#[from] serde_yaml::Error),
}

impl Error {
    /// Print the error, pointing at the offending statement where known.
    pub fn print_diag(&self) {
        cprintln!("<red,bold>error</>: {}", self);
        match self {
            Error::Encode { section, index, .. }
            | Error::BranchOutOfRange { section, index, .. } => {
                cprintln!("     <blue>--></> <underline>{}[{}]</>", section, index);
            }
            Error::FileRead(_, source) | Error::FileWrite(_, source) => {
                cprintln!("     <blue>=</> {}", source);
            }
            _ => {}
        }
    }
}
