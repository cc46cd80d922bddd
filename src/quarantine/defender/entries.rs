//! Defender `Entries` files.
//!
//! An entry file is made of three RC4 regions, each encrypted on its own:
//!
//! ```text
//! header   0x3C bytes   magic DB E8 C5 01; u32 LE lengths of region 1 and 2 at 0x28
//! region 1              FILETIME at 0x20; detection name, NUL-terminated, at 0x34
//! region 2              u32 LE count; count x u32 LE offsets into region 2
//! ```
//!
//! Each offset in region 2 points at a resource entry: the affected path (UTF-16LE,
//! NUL-terminated), a `u16` field count and the entry type (ASCII, NUL-terminated), padded to
//! four bytes. Entries of type `file` continue with a four-byte field header and the SHA-1 of
//! the quarantined file.

use chrono::{DateTime, SecondsFormat};

use crate::{
    file::{io::read_le_at, parser::Parser},
    quarantine::{file_name_of, Metadata, Recovered},
    Result,
};

use super::decrypt;

/// Magic at the start of the decrypted header.
pub const MAGIC: [u8; 4] = [0xDB, 0xE8, 0xC5, 0x01];

const HEADER_LEN: usize = 0x3C;
const REGION_LENGTHS_OFFSET: usize = 0x28;
const FILETIME_OFFSET: usize = 0x20;
const DETECTION_OFFSET: usize = 0x34;
const SHA1_LEN: usize = 20;

/// 100ns intervals between 1601-01-01 and 1970-01-01.
const FILETIME_UNIX_EPOCH: u64 = 116_444_736_000_000_000;

/// One affected resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    /// Path of the affected file or key
    pub path: String,
    /// Resource type, e.g. `file`, `regkey`, `process`
    pub kind: String,
    /// SHA-1 of the quarantined file, `file` entries only
    pub sha1: Option<[u8; SHA1_LEN]>,
}

/// Decode an `Entries` file.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the region lengths exceed the file or an entry
/// offset points outside region 2.
pub fn parse(data: &[u8]) -> Result<Option<Recovered>> {
    let Some(stored_header) = data.get(..HEADER_LEN) else {
        return Ok(None);
    };

    let header = decrypt(stored_header);
    if !header.starts_with(&MAGIC) {
        return Ok(None);
    }

    let mut offset = REGION_LENGTHS_OFFSET;
    let first_len = read_le_at::<u32>(&header, &mut offset)? as usize;
    let second_len = read_le_at::<u32>(&header, &mut offset)? as usize;

    let mut parser = Parser::new(data);
    parser.seek(HEADER_LEN)?;
    if first_len > parser.remaining() {
        return Err(malformed_error!(
            "Entries region 1 of {} bytes exceeds the {} bytes left",
            first_len,
            parser.remaining()
        ));
    }
    let first = decrypt(parser.read_bytes(first_len)?);

    if second_len > parser.remaining() {
        return Err(malformed_error!(
            "Entries region 2 of {} bytes exceeds the {} bytes left",
            second_len,
            parser.remaining()
        ));
    }
    let second = decrypt(parser.read_bytes(second_len)?);

    let mut metadata = Metadata::new();
    parse_detection(&first, &mut metadata)?;

    for (index, entry) in parse_resources(&second)?.iter().enumerate() {
        let suffix = if index == 0 {
            String::new()
        } else {
            format!("_{index}")
        };

        metadata.insert_text(format!("originalPath{suffix}"), &entry.path);
        if let Some(name) = file_name_of(&entry.path) {
            metadata.insert_text(format!("originalName{suffix}"), name);
        }
        metadata.insert_text(format!("entryType{suffix}"), &entry.kind);
        if let Some(sha1) = &entry.sha1 {
            metadata.insert(format!("sha1{suffix}"), hex(sha1));
        }
    }

    Ok(Some(Recovered {
        payloads: Vec::new(),
        metadata,
    }))
}

fn parse_detection(region: &[u8], metadata: &mut Metadata) -> Result<()> {
    let mut offset = FILETIME_OFFSET;
    let filetime = read_le_at::<u64>(region, &mut offset)?;
    if let Some(date) = filetime_to_rfc3339(filetime) {
        metadata.insert("quarantineDate", date);
    }

    if region.len() > DETECTION_OFFSET {
        let mut parser = Parser::new(region);
        parser.seek(DETECTION_OFFSET)?;
        metadata.insert_text("detectionName", &parser.read_cstring()?);
    }

    Ok(())
}

/// Parse the resource entries of region 2.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] if the offset table or
/// an entry does not fit the region.
pub fn parse_resources(region: &[u8]) -> Result<Vec<ResourceEntry>> {
    if region.is_empty() {
        return Ok(Vec::new());
    }

    let mut table = Parser::new(region);
    let count = table.read_le::<u32>()? as usize;
    if count > table.remaining() / 4 {
        return Err(malformed_error!(
            "{} resource entries do not fit a {} byte region",
            count,
            region.len()
        ));
    }

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let offset = table.read_le::<u32>()? as usize;
        if offset >= region.len() {
            return Err(malformed_error!(
                "Resource entry offset {:#x} outside the region",
                offset
            ));
        }

        let mut parser = Parser::new(region);
        parser.seek(offset)?;
        entries.push(parse_resource(&mut parser)?);
    }

    Ok(entries)
}

fn parse_resource(parser: &mut Parser<'_>) -> Result<ResourceEntry> {
    let path = parser.read_utf16z()?;
    let _field_count = parser.read_le::<u16>()?;
    let kind = parser.read_cstring()?;
    parser.align(4)?;

    let sha1 = if kind.eq_ignore_ascii_case("file") {
        parser.advance_by(4)?;
        let mut sha1 = [0u8; SHA1_LEN];
        sha1.copy_from_slice(parser.read_bytes(SHA1_LEN)?);
        Some(sha1)
    } else {
        None
    };

    Ok(ResourceEntry { path, kind, sha1 })
}

fn filetime_to_rfc3339(filetime: u64) -> Option<String> {
    let since_epoch = filetime.checked_sub(FILETIME_UNIX_EPOCH)?;
    let seconds = i64::try_from(since_epoch / 10_000_000).ok()?;
    // remainder < 10_000_000
    let nanos = (since_epoch % 10_000_000) as u32 * 100;

    DateTime::from_timestamp(seconds, nanos)
        .map(|date| date.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test::builders::defender_entries, Error};

    const MARCH_7_2024: u64 = 133_542_939_090_000_000;

    #[test]
    fn golden() {
        let container = defender_entries(
            "Virus:DOS/EICAR_Test_File",
            MARCH_7_2024,
            &[
                ("C:\\Users\\bob\\Desktop\\eicar.com", "file", Some([0x5A; 20])),
                ("HKLM\\Software\\Run\\evil", "regkey", None),
            ],
        );

        let recovered = parse(&container).unwrap().unwrap();
        assert!(recovered.payloads.is_empty());

        let metadata = &recovered.metadata;
        assert_eq!(
            metadata.get_str("detectionName"),
            Some("Virus:DOS/EICAR_Test_File")
        );
        assert_eq!(metadata.get_str("quarantineDate"), Some("2024-03-07T14:05:09Z"));
        assert_eq!(
            metadata.get_str("originalPath"),
            Some("C:\\Users\\bob\\Desktop\\eicar.com")
        );
        assert_eq!(metadata.get_str("originalName"), Some("eicar.com"));
        assert_eq!(metadata.get_str("entryType"), Some("file"));
        assert_eq!(
            metadata.get_str("sha1"),
            Some("5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a")
        );
        assert_eq!(metadata.get_str("entryType_1"), Some("regkey"));
        assert_eq!(metadata.get_str("originalName_1"), Some("evil"));
        assert!(!metadata.contains_key("sha1_1"));
    }

    #[test]
    fn no_magic_is_no_match() {
        assert!(parse(&[0u8; HEADER_LEN]).unwrap().is_none());
        assert!(parse(&MAGIC).unwrap().is_none());
    }

    #[test]
    fn truncated_regions() {
        let container = defender_entries("Trojan:Win32/Test", MARCH_7_2024, &[("C:\\a.exe", "file", None)]);
        let result = parse(&container[..HEADER_LEN + 8]);
        assert!(matches!(result, Err(Error::Malformed { .. })));
    }

    #[test]
    fn entry_count_overrun() {
        let mut region = Vec::new();
        region.extend_from_slice(&1000u32.to_le_bytes());
        region.extend_from_slice(&8u32.to_le_bytes());
        assert!(matches!(
            parse_resources(&region),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn filetimes() {
        assert_eq!(filetime_to_rfc3339(0), None);
        assert_eq!(
            filetime_to_rfc3339(FILETIME_UNIX_EPOCH).as_deref(),
            Some("1970-01-01T00:00:00Z")
        );
        assert_eq!(
            filetime_to_rfc3339(MARCH_7_2024).as_deref(),
            Some("2024-03-07T14:05:09Z")
        );
    }
}
