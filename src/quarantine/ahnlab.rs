//! AhnLab V3 quarantine files.
//!
//! ```text
//! 0x00  "AhnLab Inc. 2006"            magic, 16 bytes
//! 0x58  u32 LE                        metadata length M
//! 0x5C  M bytes                       metadata, XOR-ed with KEY
//! 0x5C + M .. EOF                     payload, XOR-ed with KEY
//! ```
//!
//! The XOR key schedule restarts at the start of each region. The decoded metadata is a
//! sequence of NUL-terminated strings: the original path, then the detection name.

use crate::{
    deobfuscation::Transform,
    file::{io::read_le_at, parser::Parser},
    quarantine::{file_name_of, Metadata, Payload, Recovered},
    Result,
};

/// Container magic.
pub const MAGIC: &[u8; 16] = b"AhnLab Inc. 2006";

/// Repeating XOR key of both regions.
pub const KEY: &[u8; 16] = b"v3backup!@#$%^&)";

const METADATA_LENGTH_OFFSET: usize = 0x58;
const METADATA_OFFSET: usize = 0x5C;

/// Decode an AhnLab container.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the header is truncated or the metadata length
/// exceeds the container.
pub fn parse(data: &[u8]) -> Result<Option<Recovered>> {
    if !data.starts_with(MAGIC) {
        return Ok(None);
    }

    if data.len() < METADATA_OFFSET {
        return Err(malformed_error!(
            "AhnLab header truncated at {} bytes",
            data.len()
        ));
    }

    let mut offset = METADATA_LENGTH_OFFSET;
    let metadata_len = read_le_at::<u32>(data, &mut offset)? as usize;

    let mut parser = Parser::new(data);
    parser.seek(METADATA_OFFSET)?;
    if metadata_len > parser.remaining() {
        return Err(malformed_error!(
            "AhnLab metadata length {} exceeds the {} bytes left",
            metadata_len,
            parser.remaining()
        ));
    }

    let transform = Transform::XorKey(KEY);
    let record = transform.decode(parser.read_bytes(metadata_len)?);
    let payload = transform.decode(parser.slice_remaining());

    let metadata = parse_record(&record)?;
    let name = metadata.get_str("originalName").map(str::to_string);

    Ok(Some(Recovered {
        payloads: vec![Payload::new(payload, name.as_deref())],
        metadata,
    }))
}

fn parse_record(record: &[u8]) -> Result<Metadata> {
    let mut metadata = Metadata::new();
    let mut parser = Parser::new(record);

    if parser.has_more_data() {
        let path = parser.read_cstring()?;
        metadata.insert_text("originalPath", &path);
        if let Some(name) = file_name_of(&path) {
            metadata.insert_text("originalName", name);
        }
    }

    if parser.has_more_data() {
        metadata.insert_text("detectionName", &parser.read_cstring()?);
    }

    Ok(metadata)
}
