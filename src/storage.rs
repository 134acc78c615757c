use crate::error::{Error, Result};
use crate::{NUM_PAGES, SIZE_BACKING_STORE, SIZE_PAGE};
use std::fs;
use std::path::{Path, PathBuf};

/// The `Storage` struct holds the backing store: the authoritative content of every virtual page.
/// Conceptually, this can be anything along the lines of actual file data, swap space, or program
/// instructions that have yet to be paged in. The blob is read in full before the simulation
/// starts and never modified afterwards; page `n` occupies bytes `[n * 256, n * 256 + 256)`.
pub struct Storage(Vec<u8>);

impl Storage {
    /// Load the backing store from the binary file at `path`.
    ///
    /// # Errors
    ///
    /// `Error::MissingInput` if the file cannot be read and `Error::BackingStoreSize` if it does
    /// not hold exactly 65536 bytes.
    pub fn build(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|source| Error::MissingInput {
            path: PathBuf::from(path),
            source,
        })?;
        Self::checked(path, bytes)
    }

    /// Wrap an in-memory blob, held to the same size rule as a file on disk.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::checked(Path::new("<memory>"), bytes)
    }

    fn checked(path: &Path, bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() != SIZE_BACKING_STORE {
            return Err(Error::BackingStoreSize {
                path: PathBuf::from(path),
                len: bytes.len(),
            });
        }
        Ok(Self(bytes))
    }

    /// Return the 256 bytes making up the content of `page_number`.
    ///
    /// # Errors
    ///
    /// `Error::InvalidPage` for page numbers outside 0..=255.
    pub fn page(&self, page_number: usize) -> Result<&[u8]> {
        if page_number >= NUM_PAGES {
            return Err(Error::InvalidPage(page_number));
        }
        let start = page_number * SIZE_PAGE;
        Ok(&self.0[start..start + SIZE_PAGE])
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[cfg(test)]
    mod storage_tests {

        use super::*;

        fn standard_storage() -> Storage {
            let bytes = (0..SIZE_BACKING_STORE).map(|x| (x / SIZE_PAGE) as u8).collect();
            Storage::from_bytes(bytes).unwrap()
        }

        #[test]
        fn page() {
            let store = standard_storage();
            let page = store.page(7).unwrap();
            assert_eq!(page.len(), SIZE_PAGE);
            assert!(page.iter().all(|x| *x == 7));
            assert_eq!(store.page(255).unwrap()[255], 255);
        }

        #[test]
        fn page_out_of_range() {
            let store = standard_storage();
            assert!(matches!(store.page(256), Err(Error::InvalidPage(256))));
        }

        #[test]
        fn from_bytes_wrong_size() {
            [3, SIZE_BACKING_STORE - 1, SIZE_BACKING_STORE + 1]
                .iter()
                .for_each(|len| {
                    let err = Storage::from_bytes(vec![0xAB; *len]).err().unwrap();
                    assert!(matches!(err, Error::BackingStoreSize { len: l, .. } if l == *len));
                    assert_eq!(err.status(), 4);
                });
        }

        #[test]
        fn build() {
            let mut file = NamedTempFile::new().unwrap();
            let mut bytes = vec![0u8; SIZE_BACKING_STORE];
            bytes[SIZE_PAGE + 11] = 0x02;
            file.write_all(&bytes).unwrap();

            let store = Storage::build(file.path()).unwrap();
            assert_eq!(store.page(1).unwrap()[11], 0x02);
        }

        #[test]
        fn build_wrong_size() {
            let mut file = NamedTempFile::new().unwrap();
            file.write_all(&[0u8; 100]).unwrap();
            assert!(matches!(
                Storage::build(file.path()),
                Err(Error::BackingStoreSize { len: 100, .. })
            ));
        }

        #[test]
        fn build_missing() {
            assert!(matches!(
                Storage::build(Path::new("/nonexistent/BACKING_STORE.bin")),
                Err(Error::MissingInput { .. })
            ));
        }
    }
}
