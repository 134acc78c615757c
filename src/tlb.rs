use crate::error::{Error, Result};
use crate::NUM_PAGES;
use linked_hash_map::LinkedHashMap;

/// How the buffer reacts to a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// Entries keep their insertion position for their whole life.
    Never,
    /// A hit moves the entry to the most recent position, so hit order doubles as access order.
    OnHit,
}

/// A single cached page to frame mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlbEntry {
    pub page: usize,
    pub frame: usize,
}

/// The `TLB` struct is a simple virtualization of the translation look aside buffer commonly found
/// in CPUs: a small, fully associative cache of page to frame mappings. Entries are kept in
/// insertion order and the oldest entry makes room when the buffer overflows, regardless of the
/// replacement policy governing physical memory.
pub struct TLB {
    table_size: usize,
    promotion: Promotion,
    map: LinkedHashMap<usize, usize>,
}

impl TLB {
    /// Create and return a new `TLB` instance using the provided cache size.
    ///
    /// # Arguments
    ///
    /// * `table_size` - maximum number of entries held at once.
    /// * `promotion` - whether a hit refreshes the entry's position.
    pub fn build(table_size: usize, promotion: Promotion) -> Self {
        Self {
            table_size,
            promotion,
            map: LinkedHashMap::with_capacity(table_size),
        }
    }

    /// Search the TLB for the requested page. `Ok(None)` implies a TLB miss.
    ///
    /// # Errors
    ///
    /// `Error::InvalidPage` when `page_number` is outside 0..=255.
    pub fn lookup(&mut self, page_number: usize) -> Result<Option<usize>> {
        check_page(page_number)?;
        let frame = match self.promotion {
            Promotion::Never => self.map.get(&page_number).copied(),
            Promotion::OnHit => self.map.get_refresh(&page_number).map(|x| *x),
        };
        Ok(frame)
    }

    /// Cache the mapping `page_number -> frame_index`. A previous entry for the same page is
    /// replaced rather than duplicated. When the buffer is already full the oldest entry is
    /// dropped and returned.
    pub fn insert(&mut self, page_number: usize, frame_index: usize) -> Result<Option<TlbEntry>> {
        check_page(page_number)?;
        self.map.remove(&page_number);
        let evicted = if self.map.len() >= self.table_size {
            self.map
                .pop_front()
                .map(|(page, frame)| TlbEntry { page, frame })
        } else {
            None
        };
        self.map.insert(page_number, frame_index);
        Ok(evicted)
    }

    /// Ensure no mapping for `page_number` remains in the buffer. Called whenever the page leaves
    /// physical memory. Returns whether an entry was removed.
    pub fn invalidate(&mut self, page_number: usize) -> Result<bool> {
        check_page(page_number)?;
        Ok(self.map.remove(&page_number).is_some())
    }

    pub fn contains(&self, page_number: usize) -> bool {
        self.map.contains_key(&page_number)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.table_size
    }

    pub fn promotion(&self) -> Promotion {
        self.promotion
    }

    /// Entries from oldest to newest.
    pub fn entries(&self) -> impl Iterator<Item = TlbEntry> + '_ {
        self.map
            .iter()
            .map(|(page, frame)| TlbEntry {
                page: *page,
                frame: *frame,
            })
    }
}

fn check_page(page_number: usize) -> Result<()> {
    match page_number < NUM_PAGES {
        true => Ok(()),
        false => Err(Error::InvalidPage(page_number)),
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    const SIZE_TEST: usize = 3;

    fn pages(tlb: &TLB) -> Vec<usize> {
        tlb.entries().map(|x| x.page).collect()
    }

    #[cfg(test)]
    mod tlb_tests {

        use super::*;

        #[test]
        fn build() {
            let tlb = TLB::build(SIZE_TEST, Promotion::Never);
            assert_eq!(tlb.len(), 0);
            assert_eq!(tlb.capacity(), SIZE_TEST);
        }

        #[test]
        fn find_and_replace() {
            let mut tlb = TLB::build(SIZE_TEST, Promotion::Never);
            let min = 0;
            let max = 5;

            (min..max).for_each(|x| {
                assert!(tlb.lookup(x).unwrap().is_none());
                tlb.insert(x, x + 10).unwrap();
                assert_eq!(tlb.lookup(x).unwrap(), Some(x + 10));
                assert!(tlb.len() <= SIZE_TEST);
            });

            assert_eq!(pages(&tlb), vec![2, 3, 4]);
            assert!(tlb.lookup(0).unwrap().is_none());
        }

        #[test]
        fn insert_reports_oldest() {
            let mut tlb = TLB::build(2, Promotion::Never);
            assert_eq!(tlb.insert(7, 0).unwrap(), None);
            assert_eq!(tlb.insert(8, 1).unwrap(), None);
            assert_eq!(
                tlb.insert(9, 2).unwrap(),
                Some(TlbEntry { page: 7, frame: 0 })
            );
        }

        #[test]
        fn insert_same_page_replaces() {
            let mut tlb = TLB::build(SIZE_TEST, Promotion::Never);
            tlb.insert(1, 4).unwrap();
            tlb.insert(2, 5).unwrap();
            tlb.insert(1, 6).unwrap();
            assert_eq!(tlb.len(), 2);
            assert_eq!(tlb.lookup(1).unwrap(), Some(6));
            assert_eq!(pages(&tlb), vec![2, 1]);
        }

        #[test]
        fn hit_without_promotion() {
            let mut tlb = TLB::build(SIZE_TEST, Promotion::Never);
            (0..3).for_each(|x| {
                tlb.insert(x, x).unwrap();
            });
            tlb.lookup(0).unwrap();
            tlb.insert(3, 3).unwrap();
            assert_eq!(pages(&tlb), vec![1, 2, 3]);
        }

        #[test]
        fn hit_with_promotion() {
            let mut tlb = TLB::build(SIZE_TEST, Promotion::OnHit);
            (0..3).for_each(|x| {
                tlb.insert(x, x).unwrap();
            });
            tlb.lookup(0).unwrap();
            assert_eq!(pages(&tlb), vec![1, 2, 0]);
            tlb.insert(3, 3).unwrap();
            assert_eq!(pages(&tlb), vec![2, 0, 3]);
        }

        #[test]
        fn invalidate() {
            let mut tlb = TLB::build(SIZE_TEST, Promotion::Never);
            tlb.insert(4, 1).unwrap();
            assert!(tlb.invalidate(4).unwrap());
            assert!(!tlb.invalidate(4).unwrap());
            assert!(!tlb.contains(4));
            assert!(tlb.is_empty());
        }

        #[test]
        fn invalid_page() {
            let mut tlb = TLB::build(SIZE_TEST, Promotion::Never);
            assert!(matches!(tlb.lookup(256), Err(Error::InvalidPage(256))));
            assert!(matches!(tlb.insert(300, 0), Err(Error::InvalidPage(300))));
            assert!(matches!(tlb.invalidate(256), Err(Error::InvalidPage(256))));
        }
    }
}
