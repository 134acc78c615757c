use crate::address::VirtualAddress;
use crate::error::Result;
use crate::replacement::{PageEvent, ReplacementPolicy};
use crate::storage::Storage;
use crate::table::{FrameTable, PageTable};
use crate::tlb::TLB;
use crate::tracker::Tracker;
use crate::{SIZE_PAGE, SIZE_TLB};
use log::{debug, trace};
use std::fmt;

/// How a single translation was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The TLB held the mapping.
    TlbHit,
    /// TLB miss, but the page table held a resident mapping.
    PageTableHit,
    /// The page had been loaded before and was evicted since.
    PageFault,
    /// First reference to the page.
    FirstFault,
}

impl Outcome {
    pub fn is_fault(&self) -> bool {
        matches!(self, Outcome::PageFault | Outcome::FirstFault)
    }
}

/// The `AccessResult` encodes the result of a translated memory access: the logical address, the
/// frame it resolved to, the byte read and the content of that frame for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessResult {
    pub virtual_address: VirtualAddress,
    pub frame_index: usize,
    pub value: u8,
    pub outcome: Outcome,
    pub page: Vec<u8>,
}

impl AccessResult {
    /// The byte read, viewed as a signed 8-bit two's-complement value.
    pub fn signed_value(&self) -> i8 {
        self.value as i8
    }

    pub fn physical_address(&self) -> usize {
        self.frame_index * SIZE_PAGE + self.virtual_address.offset()
    }
}

impl fmt::Display for AccessResult {
    /// `<address>, <signed value>, <frame>, ` followed by a line holding the page content in
    /// uppercase hex.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}, {}, {}, ",
            self.virtual_address.logical(),
            self.signed_value(),
            self.frame_index
        )?;
        self.page.iter().try_for_each(|byte| write!(f, "{:02X}", byte))
    }
}

/// The `VirtualMemory` struct is the culmination of all other structures in this crate. Each
/// instance owns a TLB, a page table and physical memory for the lifetime of a run and keeps them
/// coherent: a page is in the TLB only while resident, and an evicted page loses its TLB entry
/// before its frame is reused.
pub struct VirtualMemory {
    tlb: TLB,
    pages: PageTable,
    frames: FrameTable,
    storage: Storage,
    policy: Box<dyn ReplacementPolicy>,
    pub tracker: Tracker,
}

impl VirtualMemory {
    /// Create a new `VirtualMemory` instance.
    ///
    /// # Arguments
    ///
    /// * `frame_count` - number of physical frames.
    /// * `storage` - backing store content.
    /// * `policy` - replacement policy; it also decides how the TLB treats hits.
    pub fn build(
        frame_count: usize,
        storage: Storage,
        policy: Box<dyn ReplacementPolicy>,
    ) -> Self {
        debug!(
            "{} frames under {} replacement, tlb promotion {:?}",
            frame_count,
            policy.algorithm(),
            policy.tlb_promotion()
        );
        Self {
            tlb: TLB::build(SIZE_TLB, policy.tlb_promotion()),
            pages: PageTable::build(),
            frames: FrameTable::build(frame_count, SIZE_PAGE),
            storage,
            policy,
            tracker: Tracker::new(),
        }
    }

    /// Translate `virtual_address` and read the byte it refers to, demand paging from the backing
    /// store as required. Counters are updated along the way: one TLB hit or miss per call, plus
    /// one page fault when the page had to be loaded.
    ///
    /// # Errors
    ///
    /// Errors signal a broken invariant between the TLB, the page table and physical memory and
    /// should abort the run.
    pub fn access(&mut self, virtual_address: VirtualAddress) -> Result<AccessResult> {
        self.tracker.translated += 1;
        let page_number = virtual_address.page();
        let offset = virtual_address.offset();
        let (frame_index, outcome) = match self.tlb.lookup(page_number)? {
            Some(frame_index) => {
                self.tracker.tlb_hits += 1;
                (frame_index, Outcome::TlbHit)
            }
            None => {
                self.tracker.tlb_misses += 1;
                match self.pages.lookup(page_number)? {
                    Some(page) if page.resident => {
                        self.tlb.insert(page_number, page.frame_index)?;
                        (page.frame_index, Outcome::PageTableHit)
                    }
                    Some(_) => (self.retrieve_frame(page_number)?, Outcome::PageFault),
                    None => (self.retrieve_frame(page_number)?, Outcome::FirstFault),
                }
            }
        };

        let event = match outcome.is_fault() {
            true => PageEvent::Loaded {
                page: page_number,
                frame: frame_index,
            },
            false => PageEvent::Touched {
                page: page_number,
                frame: frame_index,
            },
        };
        self.policy.page_event(event);

        let value = self.frames.read(frame_index, offset)?;
        let access_result = AccessResult {
            virtual_address,
            frame_index,
            value,
            outcome,
            page: self.frames[frame_index].buffer.clone(),
        };
        trace!(
            "address {} -> page {} offset {}: {:?} in frame {}, physical address {}",
            virtual_address.logical(),
            page_number,
            offset,
            outcome,
            frame_index,
            access_result.physical_address()
        );
        Ok(access_result)
    }

    /// Provided a logical page number, place its content into a frame: a free one while physical
    /// memory has room, otherwise the frame of the victim chosen by the replacement policy. The
    /// victim is marked non-resident and dropped from the TLB before its frame is overwritten.
    fn retrieve_frame(&mut self, page_number: usize) -> Result<usize> {
        self.tracker.page_faults += 1;
        let content = self.storage.page(page_number)?;
        let frame_index = match self.frames.is_full() {
            false => self.frames.allocate(content)?,
            true => {
                let victim = self.policy.select_victim()?;
                self.pages.mark_evicted(victim.page)?;
                if self.tlb.invalidate(victim.page)? {
                    self.tracker.tlb_invalidations += 1;
                    debug!("tlb entry for page {} invalidated", victim.page);
                }
                self.frames.overwrite(victim.frame, content)?;
                self.tracker.evictions += 1;
                debug!(
                    "evicted page {} from frame {} for page {}",
                    victim.page, victim.frame, page_number
                );
                victim.frame
            }
        };
        debug!("page fault: page {} loaded into frame {}", page_number, frame_index);

        self.pages.assign(page_number, frame_index)?;
        self.tlb.insert(page_number, frame_index)?;
        Ok(frame_index)
    }

    pub fn tlb(&self) -> &TLB {
        &self.tlb
    }

    pub fn pages(&self) -> &PageTable {
        &self.pages
    }

    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    pub fn policy(&self) -> &dyn ReplacementPolicy {
        self.policy.as_ref()
    }

    pub fn resident_pages(&self) -> usize {
        self.pages.resident_count()
    }
}
