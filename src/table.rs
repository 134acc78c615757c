use crate::error::{Error, Result};
use crate::NUM_PAGES;
use std::ops::Index;

/// The `Page` struct represents the simplest element of the simulated page table. It maps a
/// logical page to the frame it was last loaded into. The mapping may exist in a non-resident
/// state: the frame number is remembered after the page has been evicted, but the frame content
/// then belongs to another page.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Page {
    pub frame_index: usize,
    pub resident: bool,
}

/// Fixed table with one optional `Page` slot for every page of the address space. Entries are
/// created on a page's first fault and are never removed by regular translation traffic.
pub struct PageTable {
    entries: Vec<Option<Page>>,
}

impl PageTable {
    pub fn build() -> Self {
        Self {
            entries: vec![None; NUM_PAGES],
        }
    }

    /// Map `page_number` to `frame_index` and mark it resident.
    pub fn assign(&mut self, page_number: usize, frame_index: usize) -> Result<()> {
        *self.slot_mut(page_number)? = Some(Page {
            frame_index,
            resident: true,
        });
        Ok(())
    }

    /// Flag the page as no longer resident while keeping its last known frame number.
    ///
    /// # Errors
    ///
    /// `Error::PageNotPresent` when the page was never assigned a frame.
    pub fn mark_evicted(&mut self, page_number: usize) -> Result<()> {
        match self.slot_mut(page_number)? {
            Some(page) => {
                page.resident = false;
                Ok(())
            }
            None => Err(Error::PageNotPresent(page_number)),
        }
    }

    /// Provided a page number, return a copy of its entry. `Ok(None)` means the page has never
    /// been loaded.
    pub fn lookup(&self, page_number: usize) -> Result<Option<Page>> {
        self.entries
            .get(page_number)
            .copied()
            .ok_or(Error::InvalidPage(page_number))
    }

    /// Drop the entry of `page_number` entirely.
    pub fn clear(&mut self, page_number: usize) -> Result<()> {
        match self.slot_mut(page_number)?.take() {
            Some(_) => Ok(()),
            None => Err(Error::PageNotPresent(page_number)),
        }
    }

    /// Number of entries currently flagged resident.
    pub fn resident_count(&self) -> usize {
        self.resident_pages().count()
    }

    /// Resident pages and their frames, in page order.
    pub fn resident_pages(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(number, entry)| match entry {
                Some(page) if page.resident => Some((number, page.frame_index)),
                _ => None,
            })
    }

    fn slot_mut(&mut self, page_number: usize) -> Result<&mut Option<Page>> {
        self.entries
            .get_mut(page_number)
            .ok_or(Error::InvalidPage(page_number))
    }
}

/// The `Frame` struct contains a buffer with a length defined as the frame size in bytes. Once
/// occupied a frame stays occupied; later loads overwrite its content in place.
pub struct Frame {
    pub buffer: Vec<u8>,
    pub occupied: bool,
}

impl Frame {
    fn new(frame_size: usize) -> Self {
        Self {
            buffer: vec![0 as u8; frame_size],
            occupied: false,
        }
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }
}

/// The `FrameTable` struct simulates physical memory: a finite set of frames serving a much
/// larger set of logical pages. Frames are handed out lowest index first and never returned to
/// the empty state while the simulation runs.
pub struct FrameTable {
    frame_size: usize,
    entries: Vec<Frame>,
    occupied: usize,
}

impl FrameTable {
    /// Provided sizes for the table and associated memory frames, construct a new `FrameTable`
    /// instance.
    ///
    /// # Arguments
    ///
    /// * `table_size` - number of frames.
    /// * `frame_size` - size of any frame within the table, in bytes.
    pub fn build(table_size: usize, frame_size: usize) -> Self {
        let mut entries: Vec<Frame> = Vec::with_capacity(table_size);
        (0..table_size).for_each(|_| entries.push(Frame::new(frame_size)));

        Self {
            frame_size,
            entries,
            occupied: 0,
        }
    }

    /// True when every frame is occupied.
    pub fn is_full(&self) -> bool {
        self.occupied == self.entries.len()
    }

    /// Store `content` in the lowest-numbered empty frame and return its index.
    ///
    /// # Errors
    ///
    /// `Error::NoFreeFrame` when every frame is occupied; callers check `is_full` first and go
    /// through eviction instead.
    pub fn allocate(&mut self, content: &[u8]) -> Result<usize> {
        let index = self
            .entries
            .iter()
            .position(|frame| !frame.occupied)
            .ok_or(Error::NoFreeFrame)?;
        let frame = &mut self.entries[index];
        frame.occupied = true;
        fill(&mut frame.buffer, content);
        self.occupied += 1;
        Ok(index)
    }

    /// Replace the content of an already occupied frame on the eviction path.
    pub fn overwrite(&mut self, index: usize, content: &[u8]) -> Result<()> {
        let frame = self
            .entries
            .get_mut(index)
            .ok_or(Error::InvalidFrame(index))?;
        fill(&mut frame.buffer, content);
        Ok(())
    }

    /// Read the byte at `offset` within frame `index`.
    pub fn read(&self, index: usize, offset: usize) -> Result<u8> {
        let frame = self.entries.get(index).ok_or(Error::InvalidFrame(index))?;
        frame
            .buffer
            .get(offset)
            .copied()
            .ok_or(Error::InvalidOffset(offset))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn occupied(&self) -> usize {
        self.occupied
    }
}

impl Index<usize> for FrameTable {
    type Output = Frame;

    fn index(&self, index: usize) -> &Self::Output {
        &self.entries[index]
    }
}

fn fill(buffer: &mut [u8], content: &[u8]) {
    let len = buffer.len().min(content.len());
    buffer[..len].copy_from_slice(&content[..len]);
    buffer[len..].fill(0);
}
