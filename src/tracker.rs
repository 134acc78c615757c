use crate::error::{Error, Result};

/// The `Tracker` struct is a simple collection of named performance data counters used for
/// collecting data points on the simulation. One instance lives for exactly one run.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Tracker {
    pub translated: usize,
    pub page_faults: usize,
    pub tlb_hits: usize,
    pub tlb_misses: usize,
    pub evictions: usize,
    pub tlb_invalidations: usize,
}

impl Tracker {
    /// Create a new instance of the `Tracker` struct with all counters initialized to zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Page faults per translated address, `0.0` before anything was translated.
    pub fn page_fault_rate(&self) -> f64 {
        match self.translated {
            0 => 0.0,
            n => self.page_faults as f64 / n as f64,
        }
    }

    /// TLB hits divided by TLB misses.
    ///
    /// # Errors
    ///
    /// `Error::DivideByZero` when no miss has been recorded.
    pub fn tlb_hit_rate(&self) -> Result<f64> {
        match self.tlb_misses {
            0 => Err(Error::DivideByZero),
            n => Ok(self.tlb_hits as f64 / n as f64),
        }
    }
}

impl std::fmt::Display for Tracker {
    /// End-of-run summary. A hit rate without misses is reported as `0.000`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Number of Translated Addresses = {}", self.translated)?;
        writeln!(f, "Page Faults = {}", self.page_faults)?;
        writeln!(f, "Page Fault Rate = {:.3}", self.page_fault_rate())?;
        writeln!(f, "TLB Hits = {}", self.tlb_hits)?;
        writeln!(f, "TLB Misses = {}", self.tlb_misses)?;
        write!(
            f,
            "TLB Hit Rate = {:.3}",
            self.tlb_hit_rate().unwrap_or(0.0)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(test)]
    mod tracker_tests {

        use super::*;

        #[test]
        fn new() {
            let tracker = Tracker::new();
            assert_eq!(tracker.translated, 0);
            assert_eq!(tracker.page_faults, 0);
            assert_eq!(tracker.tlb_hits, 0);
            assert_eq!(tracker.tlb_misses, 0);
            assert_eq!(tracker.evictions, 0);
        }

        #[test]
        fn equals() {
            assert_eq!(Tracker::new(), Tracker::new());
        }

        #[test]
        fn rates() {
            let tracker = Tracker {
                translated: 8,
                page_faults: 2,
                tlb_hits: 6,
                tlb_misses: 2,
                ..Tracker::new()
            };
            assert_eq!(tracker.page_fault_rate(), 0.25);
            assert_eq!(tracker.tlb_hit_rate().unwrap(), 3.0);
        }

        #[test]
        fn rates_without_traffic() {
            let tracker = Tracker::new();
            assert_eq!(tracker.page_fault_rate(), 0.0);
            assert!(matches!(tracker.tlb_hit_rate(), Err(Error::DivideByZero)));
        }

        #[test]
        fn to_string() {
            let tracker = Tracker {
                translated: 3,
                page_faults: 3,
                tlb_hits: 0,
                tlb_misses: 3,
                ..Tracker::new()
            };
            assert_eq!(
                tracker.to_string(),
                "Number of Translated Addresses = 3\n\
                 Page Faults = 3\n\
                 Page Fault Rate = 1.000\n\
                 TLB Hits = 0\n\
                 TLB Misses = 3\n\
                 TLB Hit Rate = 0.000"
            );
        }

        #[test]
        fn to_string_zero_misses() {
            let tracker = Tracker {
                translated: 2,
                tlb_hits: 2,
                ..Tracker::new()
            };
            assert!(tracker.to_string().ends_with("TLB Hit Rate = 0.000"));
        }
    }
}
