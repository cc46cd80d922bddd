//! Minimal reader for OLE Compound Files (MS-CFB).
//!
//! McAfee `.bup` files are compound files holding a handful of small streams. This reader
//! supports what those files need: the header, the FAT (including DIFAT sectors), the
//! directory, the mini stream and reading a stream by name. It does not walk the directory
//! red-black tree; streams are found by scanning the directory entries, which is sufficient
//! for the flat layout of a `.bup` file.
//!
//! Every sector number comes from the container and is treated as untrusted: chains are
//! walked with a step limit equal to the number of sectors in the file, so cycles and
//! overlong chains end in [`crate::Error::Malformed`] instead of looping.
//!
//! ```text
//! 0x00  D0 CF 11 E0 A1 B1 1A E1   signature
//! 0x1E  u16  sector shift          9 (512 bytes) or 12 (4096 bytes)
//! 0x20  u16  mini sector shift     6 (64 bytes)
//! 0x2C  u32  number of FAT sectors
//! 0x30  u32  first directory sector
//! 0x38  u32  mini stream cutoff    streams below this size live in the mini stream
//! 0x3C  u32  first mini FAT sector
//! 0x40  u32  number of mini FAT sectors
//! 0x44  u32  first DIFAT sector
//! 0x48  u32  number of DIFAT sectors
//! 0x4C  109 x u32                  first FAT sector numbers
//! ```
//!
//! Sector `n` starts at byte `(n + 1) << sector_shift`.

use widestring::U16Str;

use crate::{file::io::read_le_at, Result};

/// Compound file signature.
pub const SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const HEADER_SIZE: usize = 512;
const HEADER_DIFAT_ENTRIES: usize = 109;
const HEADER_DIFAT_OFFSET: usize = 0x4C;
const DIR_ENTRY_SIZE: usize = 128;
const MINI_SECTOR_SHIFT: u16 = 6;
const MINI_SECTOR_SIZE: usize = 1 << MINI_SECTOR_SHIFT;

const MAX_REGULAR_SECTOR: u32 = 0xFFFF_FFFA;
const END_OF_CHAIN: u32 = 0xFFFF_FFFE;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Unused slot
    Empty,
    /// Storage (directory)
    Storage,
    /// Stream (file)
    Stream,
    /// The root storage, owner of the mini stream
    Root,
    /// Any other type byte
    Unknown(u8),
}

impl From<u8> for EntryKind {
    fn from(value: u8) -> Self {
        match value {
            0 => EntryKind::Empty,
            1 => EntryKind::Storage,
            2 => EntryKind::Stream,
            5 => EntryKind::Root,
            other => EntryKind::Unknown(other),
        }
    }
}

/// One directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name
    pub name: String,
    /// Entry type
    pub kind: EntryKind,
    /// First sector of the entry's data
    pub start: u32,
    /// Size of the entry's data in bytes
    pub size: u64,
}

/// A parsed compound file.
pub struct CompoundFile<'a> {
    data: &'a [u8],
    sector_shift: u16,
    mini_cutoff: u64,
    fat: Vec<u32>,
    mini_fat: Vec<u32>,
    mini_stream: Vec<u8>,
    entries: Vec<DirEntry>,
}

impl<'a> CompoundFile<'a> {
    /// Returns true if `data` starts with the compound file signature.
    #[must_use]
    pub fn is_compound(data: &[u8]) -> bool {
        data.starts_with(&SIGNATURE)
    }

    /// Parse the header, allocation tables and directory of a compound file.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for an invalid header, out of range sector numbers
    /// or chains that do not terminate.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if !Self::is_compound(data) {
            return Err(malformed_error!("Missing compound file signature"));
        }
        if data.len() < HEADER_SIZE {
            return Err(malformed_error!(
                "Compound file header truncated at {} bytes",
                data.len()
            ));
        }

        let sector_shift = read_le_at::<u16>(data, &mut 0x1E)?;
        if sector_shift != 9 && sector_shift != 12 {
            return Err(malformed_error!("Invalid sector shift {}", sector_shift));
        }
        let mini_shift = read_le_at::<u16>(data, &mut 0x20)?;
        if mini_shift != MINI_SECTOR_SHIFT {
            return Err(malformed_error!("Invalid mini sector shift {}", mini_shift));
        }

        let fat_sectors = read_le_at::<u32>(data, &mut 0x2C)?;
        let first_dir = read_le_at::<u32>(data, &mut 0x30)?;
        let mini_cutoff = read_le_at::<u32>(data, &mut 0x38)?;
        let first_mini_fat = read_le_at::<u32>(data, &mut 0x3C)?;
        let first_difat = read_le_at::<u32>(data, &mut 0x44)?;
        let difat_sectors = read_le_at::<u32>(data, &mut 0x48)?;

        let mut file = CompoundFile {
            data,
            sector_shift,
            mini_cutoff: u64::from(mini_cutoff),
            fat: Vec::new(),
            mini_fat: Vec::new(),
            mini_stream: Vec::new(),
            entries: Vec::new(),
        };

        if fat_sectors as usize > file.sector_count() {
            return Err(malformed_error!(
                "{} FAT sectors claimed, file has {}",
                fat_sectors,
                file.sector_count()
            ));
        }

        let fat_locations = file.fat_locations(first_difat, difat_sectors)?;
        for &sector in fat_locations.iter().take(fat_sectors as usize) {
            let bytes = file.sector(sector)?;
            file.fat.extend(u32_entries(bytes));
        }

        let directory = file.read_chain(first_dir)?;
        file.entries = directory
            .chunks_exact(DIR_ENTRY_SIZE)
            .map(|raw| parse_dir_entry(raw, sector_shift))
            .collect::<Result<Vec<_>>>()?;

        if first_mini_fat <= MAX_REGULAR_SECTOR {
            let mini_fat = file.read_chain(first_mini_fat)?;
            file.mini_fat = u32_entries(&mini_fat).collect();
        }

        if let Some(root) = file
            .entries
            .iter()
            .find(|entry| entry.kind == EntryKind::Root)
        {
            if root.start <= MAX_REGULAR_SECTOR {
                let (start, size) = (root.start, root.size);
                let mut mini_stream = file.read_chain(start)?;
                mini_stream.truncate(usize::try_from(size).unwrap_or(usize::MAX));
                file.mini_stream = mini_stream;
            }
        }

        Ok(file)
    }

    /// All directory entries, in directory order.
    #[must_use]
    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    /// Names of all streams.
    pub fn stream_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::Stream)
            .map(|entry| entry.name.as_str())
    }

    /// Read the stream called `name`, compared case-insensitively.
    ///
    /// Returns `Ok(None)` if no such stream exists.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the stream's chain is invalid or shorter than
    /// its recorded size.
    pub fn stream(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let Some(entry) = self
            .entries
            .iter()
            .find(|entry| entry.kind == EntryKind::Stream && entry.name.eq_ignore_ascii_case(name))
        else {
            return Ok(None);
        };

        if entry.size == 0 {
            return Ok(Some(Vec::new()));
        }

        let mut data = if entry.size < self.mini_cutoff {
            self.read_mini_chain(entry.start)?
        } else {
            self.read_chain(entry.start)?
        };

        let size = usize::try_from(entry.size).unwrap_or(usize::MAX);
        if data.len() < size {
            return Err(malformed_error!(
                "Stream {} holds {} of {} bytes",
                entry.name,
                data.len(),
                entry.size
            ));
        }
        data.truncate(size);

        Ok(Some(data))
    }

    fn sector_size(&self) -> usize {
        1 << self.sector_shift
    }

    /// Number of sectors present after the header, counting a trailing partial sector.
    fn sector_count(&self) -> usize {
        let size = self.sector_size();
        self.data.len().div_ceil(size).saturating_sub(1)
    }

    fn sector(&self, sector: u32) -> Result<&'a [u8]> {
        let size = self.sector_size();
        let start = (sector as usize)
            .checked_add(1)
            .and_then(|index| index.checked_mul(size))
            .ok_or(out_of_bounds_error!())?;

        if start >= self.data.len() {
            return Err(malformed_error!(
                "Sector {} beyond the end of the file",
                sector
            ));
        }

        let end = start.saturating_add(size).min(self.data.len());
        Ok(&self.data[start..end])
    }

    /// Sector numbers of the FAT, from the header and the DIFAT chain.
    fn fat_locations(&self, first_difat: u32, difat_sectors: u32) -> Result<Vec<u32>> {
        let mut locations: Vec<u32> = (0..HEADER_DIFAT_ENTRIES)
            .map(|index| {
                let mut offset = HEADER_DIFAT_OFFSET + index * 4;
                read_le_at::<u32>(self.data, &mut offset)
            })
            .collect::<Result<_>>()?;

        let mut next = first_difat;
        let mut visited = 0usize;
        while next <= MAX_REGULAR_SECTOR && visited < difat_sectors as usize {
            visited += 1;
            if visited > self.sector_count() {
                return Err(malformed_error!("DIFAT chain does not terminate"));
            }

            let entries: Vec<u32> = u32_entries(self.sector(next)?).collect();
            let Some((&following, fat)) = entries.split_last() else {
                return Err(malformed_error!("Empty DIFAT sector {}", next));
            };
            locations.extend_from_slice(fat);
            next = following;
        }

        locations.retain(|&sector| sector <= MAX_REGULAR_SECTOR);
        Ok(locations)
    }

    /// Concatenate the sectors of the chain starting at `start`.
    fn read_chain(&self, start: u32) -> Result<Vec<u8>> {
        let limit = self.sector_count();
        let mut data = Vec::new();
        let mut current = start;
        let mut steps = 0usize;

        while current != END_OF_CHAIN {
            if current > MAX_REGULAR_SECTOR {
                return Err(malformed_error!("Invalid sector {:#x} in chain", current));
            }

            steps += 1;
            if steps > limit {
                return Err(malformed_error!(
                    "Sector chain from {} does not terminate",
                    start
                ));
            }

            data.extend_from_slice(self.sector(current)?);
            current = *self.fat.get(current as usize).ok_or_else(|| {
                malformed_error!("Sector {} has no FAT entry", current)
            })?;
        }

        Ok(data)
    }

    /// Concatenate the mini sectors of the chain starting at `start`.
    fn read_mini_chain(&self, start: u32) -> Result<Vec<u8>> {
        let limit = self.mini_fat.len();
        let mut data = Vec::new();
        let mut current = start;
        let mut steps = 0usize;

        while current != END_OF_CHAIN {
            steps += 1;
            if steps > limit {
                return Err(malformed_error!(
                    "Mini sector chain from {} does not terminate",
                    start
                ));
            }

            let offset = (current as usize)
                .checked_mul(MINI_SECTOR_SIZE)
                .ok_or(out_of_bounds_error!())?;
            let end = offset.saturating_add(MINI_SECTOR_SIZE).min(self.mini_stream.len());
            let Some(sector) = self.mini_stream.get(offset..end) else {
                return Err(malformed_error!(
                    "Mini sector {} beyond the mini stream",
                    current
                ));
            };

            data.extend_from_slice(sector);
            current = *self.mini_fat.get(current as usize).ok_or_else(|| {
                malformed_error!("Mini sector {} has no mini FAT entry", current)
            })?;
        }

        Ok(data)
    }
}

impl std::fmt::Debug for CompoundFile<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompoundFile")
            .field("sector_shift", &self.sector_shift)
            .field("fat", &self.fat.len())
            .field("mini_fat", &self.mini_fat.len())
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

fn u32_entries(bytes: &[u8]) -> impl Iterator<Item = u32> + '_ {
    bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}

fn parse_dir_entry(raw: &[u8], sector_shift: u16) -> Result<DirEntry> {
    let name_len = usize::from(read_le_at::<u16>(raw, &mut 0x40)?);
    // The recorded length includes the terminating NUL
    let name_bytes = raw
        .get(..name_len.saturating_sub(2).min(62))
        .unwrap_or_default();
    let units: Vec<u16> = name_bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    let kind = EntryKind::from(read_le_at::<u8>(raw, &mut 0x42)?);
    let start = read_le_at::<u32>(raw, &mut 0x74)?;
    let size_low = read_le_at::<u32>(raw, &mut 0x78)?;
    // Version 3 files (512-byte sectors) may leave garbage in the high half
    let size_high = if sector_shift == 9 {
        0
    } else {
        read_le_at::<u32>(raw, &mut 0x7C)?
    };

    Ok(DirEntry {
        name: U16Str::from_slice(&units).to_string_lossy(),
        kind,
        start,
        size: (u64::from(size_high) << 32) | u64::from(size_low),
    })
}
