//! TrendMicro VSBX quarantine files.
//!
//! The whole file is XOR-ed with `0xFF`. After decoding:
//!
//! ```text
//! 0x00  "VSBX"                magic
//! 0x04  u32 LE                payload offset
//! 0x08  u16 LE                number of tags
//! 0x0A  tags                  { u8 id, u16 LE length, value }
//! ...   payload               from the payload offset to EOF
//! ```
//!
//! Tag values are UTF-16LE on Windows products and 8-bit text elsewhere.

use crate::{
    deobfuscation::Transform,
    file::parser::Parser,
    quarantine::{file_name_of, Metadata, Payload, Recovered},
    Result,
};

/// Decoded magic.
pub const MAGIC: &[u8; 4] = b"VSBX";

/// Single-byte XOR key of the whole file.
pub const KEY: u8 = 0xFF;

const TAG_ORIGINAL_PATH: u8 = 1;
const TAG_ORIGINAL_NAME: u8 = 2;
const TAG_PLATFORM: u8 = 3;

/// Decode a VSBX container.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the tag table overruns the file or the payload offset
/// points inside the header or past the end.
pub fn parse(data: &[u8]) -> Result<Option<Recovered>> {
    let Some(stored_magic) = data.get(..MAGIC.len()) else {
        return Ok(None);
    };
    if Transform::Xor(KEY).decode(stored_magic) != MAGIC {
        return Ok(None);
    }

    let decoded = Transform::Xor(KEY).decode(data);
    let mut parser = Parser::new(&decoded);
    parser.advance_by(MAGIC.len())?;

    let payload_offset = parser.read_le::<u32>()? as usize;
    let tag_count = parser.read_le::<u16>()?;

    let mut metadata = Metadata::new();
    for index in 0..tag_count {
        let id = parser.read_le::<u8>()?;
        let len = parser.read_le::<u16>()? as usize;
        if len > parser.remaining() {
            return Err(malformed_error!(
                "VSBX tag {} of length {} overruns the file",
                index,
                len
            ));
        }
        let value = tag_text(parser.read_bytes(len)?)?;

        match id {
            TAG_ORIGINAL_PATH => metadata.insert_text("originalPath", &value),
            TAG_ORIGINAL_NAME => metadata.insert_text("originalName", &value),
            TAG_PLATFORM => metadata.insert_text("platform", &value),
            _ => log::trace!("skipping VSBX tag {id}"),
        }
    }

    if payload_offset < parser.pos() || payload_offset > decoded.len() {
        return Err(malformed_error!(
            "VSBX payload offset {:#x} outside {:#x}..={:#x}",
            payload_offset,
            parser.pos(),
            decoded.len()
        ));
    }

    if !metadata.contains_key("originalName") {
        if let Some(name) = metadata.get_str("originalPath").and_then(file_name_of) {
            let name = name.to_string();
            metadata.insert("originalName", name);
        }
    }

    parser.seek(payload_offset)?;
    let payload = parser.slice_remaining().to_vec();
    let name = metadata.get_str("originalName").map(str::to_string);

    Ok(Some(Recovered {
        payloads: vec![Payload::new(payload, name.as_deref())],
        metadata,
    }))
}

/// Tag values written by the Windows products are UTF-16LE; those are recognised by a zero
/// high byte in the first code unit.
fn tag_text(value: &[u8]) -> Result<String> {
    if value.is_empty() {
        return Ok(String::new());
    }

    let looks_wide = value.len() % 2 == 0 && value.get(1) == Some(&0) && value[0] != 0;
    if looks_wide {
        Parser::new(value).read_utf16z()
    } else {
        Parser::new(value).read_cstring()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test::builders::{trendmicro_container, utf16z},
        Error,
    };

    #[test]
    fn golden() {
        let container = trendmicro_container(
            &[
                (1, utf16z("C:\\Temp\\dropper.exe")),
                (3, b"win32\0".to_vec()),
            ],
            b"MZ\x90\x00dropper",
        );

        let recovered = parse(&container).unwrap().unwrap();
        assert_eq!(recovered.payloads[0].data, b"MZ\x90\x00dropper");
        assert_eq!(recovered.payloads[0].name.as_deref(), Some("dropper.exe"));

        let metadata = &recovered.metadata;
        assert_eq!(metadata.get_str("originalPath"), Some("C:\\Temp\\dropper.exe"));
        assert_eq!(metadata.get_str("originalName"), Some("dropper.exe"));
        assert_eq!(metadata.get_str("platform"), Some("win32"));
    }

    #[test]
    fn name_tag_wins_over_path() {
        let container = trendmicro_container(
            &[
                (1, utf16z("C:\\Temp\\renamed.tmp")),
                (2, utf16z("original.exe")),
            ],
            b"MZ",
        );

        let recovered = parse(&container).unwrap().unwrap();
        assert_eq!(
            recovered.metadata.get_str("originalName"),
            Some("original.exe")
        );
    }

    #[test]
    fn unencoded_magic_is_no_match() {
        assert!(parse(b"VSBX\x0a\x00\x00\x00\x00\x00").unwrap().is_none());
        assert!(parse(&[0xA9, 0xAC]).unwrap().is_none());
    }

    #[test]
    fn payload_offset_inside_header() {
        let mut container = trendmicro_container(&[], b"MZ");
        // Offset 2 lies inside the magic
        container[4..8].copy_from_slice(&Transform::Xor(KEY).decode(&2u32.to_le_bytes()));
        assert!(matches!(parse(&container), Err(Error::Malformed { .. })));
    }

    #[test]
    fn tag_overrun() {
        let mut container = trendmicro_container(&[(1, b"abc".to_vec())], b"");
        // Tag length 0x100 with three bytes present
        container[11..13].copy_from_slice(&Transform::Xor(KEY).decode(&0x100u16.to_le_bytes()));
        assert!(matches!(parse(&container), Err(Error::Malformed { .. })));
    }

    #[test]
    fn narrow_and_wide_text() {
        assert_eq!(tag_text(&utf16z("a.exe")).unwrap(), "a.exe");
        assert_eq!(tag_text(b"linux\0").unwrap(), "linux");
        assert_eq!(tag_text(b"").unwrap(), "");
    }
}
