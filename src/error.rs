use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Type Alias: A rebranding of the `Result` enum from the standard library which focuses on errors
/// raised anywhere in the simulation.
pub type Result<T> = std::result::Result<T, Error>;

/// Every way a simulation run can fail. Input and usage errors occur before any simulation state
/// exists; the remaining variants signal a broken invariant inside the translation pipeline and
/// abort the run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid address {0}: logical addresses must be within 0..=65535")]
    InvalidAddress(u64),

    #[error("invalid page number {0}: pages must be within 0..=255")]
    InvalidPage(usize),

    #[error("invalid frame number {0}")]
    InvalidFrame(usize),

    #[error("invalid offset {0}: offsets must be within 0..=255")]
    InvalidOffset(usize),

    #[error("page {0} has no page table entry")]
    PageNotPresent(usize),

    #[error("no free frame left in physical memory")]
    NoFreeFrame,

    #[error("replacement queue is empty, no victim to evict")]
    NoVictim,

    #[error("{0}")]
    Usage(String),

    #[error("unable to read {}: {source}", .path.display())]
    MissingInput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("line {line}: expected a decimal address, found {text:?}")]
    MalformedReference { line: u64, text: String },

    #[error("backing store {} holds {len} bytes, expected 65536", .path.display())]
    BackingStoreSize { path: PathBuf, len: usize },

    #[error("TLB hit rate is undefined without any TLB misses")]
    DivideByZero,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to write report: {0}")]
    Report(#[source] std::io::Error),
}

impl Error {
    /// Numeric process status for this error. Internal invariant violations share status 70.
    pub fn status(&self) -> u8 {
        match self {
            Self::Usage(_) => 1,
            Self::MissingInput { .. } | Self::Io(_) => 3,
            Self::MalformedReference { .. }
            | Self::InvalidAddress(_)
            | Self::BackingStoreSize { .. } => 4,
            Self::Report(_) => 74,
            _ => 70,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.status())
    }
}
