use crate::error::{Error, Result};
use crate::replacement::Algorithm;
use crate::{FILENAME_BSTORE, NUM_PAGES};
use clap::{ArgAction, Parser};
use log::LevelFilter;
use std::env;
use std::path::PathBuf;

/// Simulates virtual to physical address translation through a TLB, a page table and a bounded
/// pool of physical frames, reporting page-fault and TLB hit rates.
#[derive(Parser, Debug)]
#[command(name = "memSim", author, version, about, long_about = None)]
pub struct Config {
    /// Text file holding one logical address (0-65535) per line.
    pub reference_file: PathBuf,

    /// Number of physical frames, between 1 and 256.
    #[arg(default_value_t = 256)]
    pub frames: u32,

    /// Page replacement algorithm.
    #[arg(value_enum, default_value_t = Algorithm::Fifo)]
    pub pra: Algorithm,

    /// Backing store holding the content of all 256 pages.
    #[arg(long, default_value_t = env_or_default_str("SIM_FILE_STORAGE", FILENAME_BSTORE))]
    pub file_storage: String,

    /// Draw a progress bar on stderr while translating.
    #[arg(long)]
    pub progress: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    /// Reject values clap cannot rule out on its own.
    ///
    /// # Errors
    ///
    /// `Error::Usage` when `frames` lies outside 1..=256.
    pub fn validate(&self) -> Result<()> {
        if self.frames == 0 || self.frames as usize > NUM_PAGES {
            return Err(Error::Usage(format!(
                "FRAMES must be an integer > 0 and <= {}, got {}",
                NUM_PAGES, self.frames
            )));
        }
        Ok(())
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn env_or_default_str(varname: &str, default: &str) -> String {
    match env::var(varname) {
        Ok(val) => val,
        _ => String::from(default),
    }
}
