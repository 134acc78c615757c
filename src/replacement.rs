use crate::address::VirtualAddress;
use crate::error::{Error, Result};
use crate::tlb::Promotion;
use clap::ValueEnum;
use linked_hash_map::LinkedHashMap;
use std::collections::HashMap;
use std::fmt;

/// Page replacement algorithms selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Algorithm {
    /// Evict the page that became resident earliest.
    Fifo,
    /// Evict the page accessed least recently.
    Lru,
    /// Evict the page whose next reference lies farthest in the future.
    Opt,
}

impl Algorithm {
    /// Construct the policy implementing this algorithm. Only `Opt` keeps the reference stream.
    pub fn policy(&self, references: &[VirtualAddress]) -> Box<dyn ReplacementPolicy> {
        match self {
            Algorithm::Fifo => Box::new(Fifo::new()),
            Algorithm::Lru => Box::new(Lru::new()),
            Algorithm::Opt => Box::new(Opt::new(references.iter().map(|x| x.page()).collect())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Fifo => "fifo",
            Algorithm::Lru => "lru",
            Algorithm::Opt => "opt",
        };
        f.write_str(name)
    }
}

/// An event raised by the translator for every processed address. Exactly one event is raised per
/// address: `Touched` when the page was already resident, `Loaded` once a fault brought it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    Touched { page: usize, frame: usize },
    Loaded { page: usize, frame: usize },
}

/// The resident page selected for eviction and the frame it frees up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Victim {
    pub page: usize,
    pub frame: usize,
}

/// Ordered record of resident `(page, frame)` pairs. The front holds the next candidate for
/// eviction under both FIFO and LRU; moving an entry to the back costs O(1).
#[derive(Debug, Default)]
pub struct ReplacementQueue(LinkedHashMap<usize, usize>);

impl ReplacementQueue {
    pub fn new() -> Self {
        Self(LinkedHashMap::new())
    }

    /// Append `page` at the back, dropping any earlier position it held.
    pub fn push(&mut self, page: usize, frame: usize) {
        self.0.remove(&page);
        self.0.insert(page, frame);
    }

    /// Move `page` to the back. Returns false when the page is not queued.
    pub fn refresh(&mut self, page: usize) -> bool {
        self.0.get_refresh(&page).is_some()
    }

    pub fn pop_front(&mut self) -> Option<Victim> {
        self.0.pop_front().map(|(page, frame)| Victim { page, frame })
    }

    pub fn remove(&mut self, page: usize) -> Option<Victim> {
        self.0.remove(&page).map(|frame| Victim { page, frame })
    }

    pub fn contains(&self, page: usize) -> bool {
        self.0.contains_key(&page)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Queued pages from front to back.
    pub fn pages(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.keys().copied()
    }
}

/// The interface of a page replacement algorithm. Implementations observe every access through
/// `page_event` and pick a victim when physical memory is full.
pub trait ReplacementPolicy {
    fn algorithm(&self) -> Algorithm;

    /// Record an access. Called once per translated address.
    fn page_event(&mut self, event: PageEvent);

    /// Choose and dequeue the resident page to evict.
    ///
    /// # Errors
    ///
    /// `Error::NoVictim` when no page is resident.
    fn select_victim(&mut self) -> Result<Victim>;

    /// The TLB behaviour this policy expects.
    fn tlb_promotion(&self) -> Promotion {
        Promotion::Never
    }

    fn queue(&self) -> &ReplacementQueue;
}

/// First in, first out: hits never reorder the queue.
#[derive(Debug, Default)]
pub struct Fifo {
    queue: ReplacementQueue,
}

impl Fifo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplacementPolicy for Fifo {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Fifo
    }

    fn page_event(&mut self, event: PageEvent) {
        if let PageEvent::Loaded { page, frame } = event {
            self.queue.push(page, frame)
        }
    }

    fn select_victim(&mut self) -> Result<Victim> {
        self.queue.pop_front().ok_or(Error::NoVictim)
    }

    fn queue(&self) -> &ReplacementQueue {
        &self.queue
    }
}

/// Least recently used: every access moves the page to the back of the queue.
#[derive(Debug, Default)]
pub struct Lru {
    queue: ReplacementQueue,
}

impl Lru {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplacementPolicy for Lru {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Lru
    }

    fn page_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::Loaded { page, frame } => self.queue.push(page, frame),
            PageEvent::Touched { page, frame } => {
                if !self.queue.refresh(page) {
                    self.queue.push(page, frame)
                }
            }
        }
    }

    fn select_victim(&mut self) -> Result<Victim> {
        self.queue.pop_front().ok_or(Error::NoVictim)
    }

    fn tlb_promotion(&self) -> Promotion {
        Promotion::OnHit
    }

    fn queue(&self) -> &ReplacementQueue {
        &self.queue
    }
}

/// Belady's optimal algorithm. The policy owns the page numbers of the whole reference stream and
/// a cursor pointing at the address being translated; each `page_event` advances the cursor.
#[derive(Debug)]
pub struct Opt {
    queue: ReplacementQueue,
    references: Vec<usize>,
    cursor: usize,
}

impl Opt {
    pub fn new(references: Vec<usize>) -> Self {
        Self {
            queue: ReplacementQueue::new(),
            references,
            cursor: 0,
        }
    }

    /// Page numbers referenced after the current address.
    fn upcoming(&self) -> &[usize] {
        self.references.get(self.cursor + 1..).unwrap_or(&[])
    }
}

impl ReplacementPolicy for Opt {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Opt
    }

    fn page_event(&mut self, event: PageEvent) {
        if let PageEvent::Loaded { page, frame } = event {
            self.queue.push(page, frame)
        }
        self.cursor += 1;
    }

    fn select_victim(&mut self) -> Result<Victim> {
        // distance to the next reference of every resident page that is referenced again
        let mut next_use: HashMap<usize, usize> = HashMap::with_capacity(self.queue.len());
        for (distance, page) in self.upcoming().iter().enumerate() {
            if self.queue.contains(*page) && !next_use.contains_key(page) {
                next_use.insert(*page, distance);
                if next_use.len() == self.queue.len() {
                    break;
                }
            }
        }

        let victim = match self.queue.pages().find(|page| !next_use.contains_key(page)) {
            Some(page) => Some(page),
            None => next_use
                .iter()
                .max_by_key(|(_, distance)| **distance)
                .map(|(page, _)| *page),
        };

        victim
            .and_then(|page| self.queue.remove(page))
            .ok_or(Error::NoVictim)
    }

    fn queue(&self) -> &ReplacementQueue {
        &self.queue
    }
}
