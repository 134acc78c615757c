use crate::error::{Error, Result};
use crate::{MASK_OFFSET, MASK_PAGE, MAX_ADDRESS};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::num::IntErrorKind;
use std::path::{Path, PathBuf};

/// `VirtualAddress` is a type that represents the components of a logical memory address in a
/// single structure: the page number selecting one of the 256 pages of the address space and the
/// byte offset within that page.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct VirtualAddress {
    pub number_page: u8,
    pub number_offset: u8,
}

impl VirtualAddress {
    /// Reassemble the logical address this value was decoded from.
    ///
    /// # Examples
    ///
    /// ```
    /// use mem_sim::address::VirtualAddress;
    /// let address = VirtualAddress::try_from(0x0f0e_u32).unwrap();
    /// assert_eq!(address.logical(), 0x0f0e);
    /// ```
    pub fn logical(&self) -> u32 {
        (u32::from(self.number_page) << 8) | u32::from(self.number_offset)
    }

    pub fn page(&self) -> usize {
        self.number_page as usize
    }

    pub fn offset(&self) -> usize {
        self.number_offset as usize
    }
}

impl TryFrom<u32> for VirtualAddress {
    type Error = Error;

    /// Provided an address in the form of a 32-bit unsigned integer, split said address into its
    /// page number (`value div 256`) and offset (`value mod 256`).
    ///
    /// # Errors
    ///
    /// Values above 65535 do not belong to the simulated address space and yield
    /// `Error::InvalidAddress`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mem_sim::address::VirtualAddress;
    /// let y = VirtualAddress::try_from(0x00000f0f_u32).unwrap();
    /// assert_eq!(y.number_page, 15);
    /// assert_eq!(y.number_offset, 15);
    /// assert!(VirtualAddress::try_from(0x10000_u32).is_err());
    /// ```
    fn try_from(value: u32) -> Result<Self> {
        if value > MAX_ADDRESS {
            return Err(Error::InvalidAddress(u64::from(value)));
        }
        Ok(Self {
            number_page: ((value & MASK_PAGE) >> 8) as u8,
            number_offset: (value & MASK_OFFSET) as u8,
        })
    }
}

/// `AddressReader` is a utility type responsible for sequentially obtaining raw address numbers
/// from a text file. Each line holds one decimal address; blank lines are skipped.
pub struct AddressReader<R> {
    reader: R,
    pub line_number: u64,
}

impl AddressReader<BufReader<File>> {
    /// Open the reference file at `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingInput` when the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::MissingInput {
            path: PathBuf::from(path),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> AddressReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for AddressReader<R> {
    type Item = Result<VirtualAddress>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            match self.reader.read_until(b'\n', &mut buffer) {
                Err(err) => return Some(Err(Error::Io(err))),
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let text = match std::str::from_utf8(&buffer) {
                        Ok(text) => text.trim(),
                        Err(_) => {
                            return Some(Err(Error::MalformedReference {
                                line: self.line_number,
                                text: String::from_utf8_lossy(&buffer).trim().to_string(),
                            }))
                        }
                    };
                    if text.is_empty() {
                        continue;
                    }
                    return Some(parse_address(self.line_number, text));
                }
            }
        }
    }
}

/// Decode one trimmed, non-empty line. Anything that is not a decimal integer is malformed; an
/// integer too large for the address space is an invalid address, however many digits it has.
fn parse_address(line: u64, text: &str) -> Result<VirtualAddress> {
    let value = match text.parse::<u64>() {
        Ok(value) => value,
        Err(err) if *err.kind() == IntErrorKind::PosOverflow => {
            return Err(Error::InvalidAddress(u64::MAX))
        }
        Err(_) => {
            return Err(Error::MalformedReference {
                line,
                text: String::from(text),
            })
        }
    };
    u32::try_from(value)
        .map_err(|_| Error::InvalidAddress(value))
        .and_then(VirtualAddress::try_from)
}

/// Read every address of the reference file into memory, in file order.
pub fn read_reference_file(path: &Path) -> Result<Vec<VirtualAddress>> {
    AddressReader::open(path)?.collect()
}
