pub mod address;
pub mod config;
pub mod error;
pub mod replacement;
pub mod storage;
pub mod table;
pub mod tlb;
pub mod tracker;
pub mod virtual_memory;

use address::VirtualAddress;
use config::Config;
use error::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use replacement::Algorithm;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use storage::Storage;
use tracker::Tracker;
use virtual_memory::VirtualMemory;

pub const FILENAME_BSTORE: &str = "BACKING_STORE.bin";
pub const NUM_PAGES: usize = 256;
pub const SIZE_PAGE: usize = 256;
pub const SIZE_TLB: usize = 16;
pub const SIZE_BACKING_STORE: usize = NUM_PAGES * SIZE_PAGE;
pub const MAX_ADDRESS: u32 = 0xFFFF;
pub const MASK_PAGE: u32 = 0x0000FF00;
pub const MASK_OFFSET: u32 = 0x000000FF;

/// A structure which contains the core elements required to run a simulation: the fully buffered
/// reference stream and the virtual memory it is translated through. All counters live inside, so
/// nothing carries over from one run to the next.
pub struct Simulation {
    virtual_memory: VirtualMemory,
    addresses: Vec<VirtualAddress>,
}

impl Simulation {
    /// Assemble a simulation from inputs already in memory.
    pub fn build(
        addresses: Vec<VirtualAddress>,
        storage: Storage,
        frame_count: usize,
        algorithm: Algorithm,
    ) -> Self {
        let policy = algorithm.policy(&addresses);
        Self {
            virtual_memory: VirtualMemory::build(frame_count, storage, policy),
            addresses,
        }
    }

    /// Translate every address in order, writing one report entry per address to `out`, and
    /// return the final counters.
    pub fn run<W: Write>(self, out: &mut W, progress: &ProgressBar) -> Result<Tracker> {
        let Simulation {
            mut virtual_memory,
            addresses,
        } = self;

        for virtual_address in addresses {
            let access_result = virtual_memory.access(virtual_address)?;
            writeln!(out, "{}", access_result).map_err(Error::Report)?;
            progress.inc(1);
        }
        out.flush().map_err(Error::Report)?;
        progress.finish_and_clear();
        Ok(virtual_memory.tracker)
    }
}

fn progress_bar(enabled: bool, len: usize) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} addresses ({eta})")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// Load both inputs named by `config`, run the simulation and print the per-address report
/// followed by the summary on stdout.
pub fn run_simulation(config: &Config) -> Result<Tracker> {
    config.validate()?;
    info!("simulation configuration values: {:?}", config);

    let addresses = address::read_reference_file(&config.reference_file)?;
    let storage = Storage::build(Path::new(&config.file_storage))?;
    let simulation = Simulation::build(
        addresses,
        storage,
        config.frames as usize,
        config.pra,
    );

    let progress = progress_bar(config.progress, simulation.addresses.len());
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let tracker = simulation.run(&mut out, &progress)?;
    writeln!(out, "{}", tracker).map_err(Error::Report)?;
    out.flush().map_err(Error::Report)?;

    info!(
        "{} evictions, {} tlb invalidations",
        tracker.evictions, tracker.tlb_invalidations
    );
    Ok(tracker)
}

#[cfg(test)]
mod tests {

    use super::*;

    fn storage() -> Storage {
        let bytes = (0..SIZE_BACKING_STORE)
            .map(|x| (x / SIZE_PAGE) as u8)
            .collect();
        Storage::from_bytes(bytes).unwrap()
    }

    #[cfg(test)]
    mod simulation_tests {

        use super::*;

        #[test]
        fn run() {
            let addresses = [0_u32, 256, 512]
                .iter()
                .map(|x| VirtualAddress::try_from(*x).unwrap())
                .collect();
            let simulation = Simulation::build(addresses, storage(), 2, Algorithm::Fifo);
            let mut out = Vec::new();
            let tracker = simulation.run(&mut out, &ProgressBar::hidden()).unwrap();

            let text = String::from_utf8(out).unwrap();
            let heads: Vec<&str> = text.lines().step_by(2).collect();
            assert_eq!(heads, vec!["0, 0, 0, ", "256, 1, 1, ", "512, 2, 0, "]);
            assert_eq!(tracker.page_faults, 3);
            assert_eq!(tracker.tlb_hits, 0);
        }

        #[test]
        fn run_empty() {
            let simulation = Simulation::build(Vec::new(), storage(), 4, Algorithm::Lru);
            let mut out = Vec::new();
            let tracker = simulation.run(&mut out, &ProgressBar::hidden()).unwrap();
            assert!(out.is_empty());
            assert_eq!(tracker, Tracker::new());
        }

        struct ClosedPipe;

        impl Write for ClosedPipe {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        #[test]
        fn run_closed_output() {
            let addresses = vec![VirtualAddress::try_from(300_u32).unwrap()];
            let simulation = Simulation::build(addresses, storage(), 1, Algorithm::Opt);
            let err = simulation
                .run(&mut ClosedPipe, &ProgressBar::hidden())
                .err()
                .unwrap();
            assert!(matches!(err, Error::Report(_)));
            assert_eq!(err.status(), 74);
        }

        #[test]
        fn progress_hidden() {
            assert!(progress_bar(false, 10).is_hidden());
        }
    }
}
