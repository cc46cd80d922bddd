//! McAfee `.bup` backup files.
//!
//! A `.bup` file is an OLE compound file (see [`compound`]). Every stream in it is XOR-ed with
//! `0x6A`:
//!
//! - `Details` describes the detection and the quarantined files (see [`details`]);
//! - `File_0`, `File_1`, ... hold the quarantined files themselves.
//!
//! Metadata is taken from the `[Details]` section with keys converted to lowerCamelCase, plus a
//! `quarantineDate` assembled from the `Creation*` fields. Keys of the `[File_0]` section are
//! added unsuffixed; keys of `[File_N]` for `N >= 1` get a `_N` suffix.

pub mod compound;
pub mod details;

use chrono::NaiveDate;

use crate::{
    deobfuscation::Transform,
    quarantine::{file_name_of, metadata_key, Metadata, Payload, Recovered},
    Result,
};

use compound::CompoundFile;
use details::{Details, Section};

/// Single-byte XOR key of every stream.
pub const KEY: u8 = 0x6A;

const DETAILS_STREAM: &str = "Details";
const FILE_PREFIX: &str = "File_";

/// Decode a McAfee backup file.
///
/// Compound files without a `Details` stream (Office documents, installers) are not backup
/// files and yield `Ok(None)`.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if the compound file structure or the `Details` stream
/// is invalid.
pub fn parse(data: &[u8]) -> Result<Option<Recovered>> {
    if !CompoundFile::is_compound(data) {
        return Ok(None);
    }

    let file = CompoundFile::parse(data)?;
    let Some(stored_details) = file.stream(DETAILS_STREAM)? else {
        return Ok(None);
    };
    // Streams never share sectors, so together they cannot outgrow the container
    let mut budget = data.len();
    charge(&mut budget, DETAILS_STREAM, stored_details.len())?;
    let details = Details::parse(&Transform::Xor(KEY).decode(&stored_details))?;

    let metadata = build_metadata(&details);

    let mut indices: Vec<(u32, &str)> = file
        .stream_names()
        .filter_map(|name| Some((file_index(name)?, name)))
        .collect();
    indices.sort_unstable();
    indices.dedup_by_key(|(index, _)| *index);

    let mut payloads = Vec::with_capacity(indices.len());
    for (index, stream) in indices {
        let Some(mut data) = file.stream(stream)? else {
            continue;
        };
        charge(&mut budget, stream, data.len())?;
        Transform::Xor(KEY).apply(&mut data);

        let name = details
            .section(&format!("{FILE_PREFIX}{index}"))
            .and_then(|section| section.get("OriginalName"))
            .and_then(file_name_of);
        payloads.push(Payload::new(data, name));
    }

    Ok(Some(Recovered { payloads, metadata }))
}

fn charge(budget: &mut usize, stream: &str, len: usize) -> Result<()> {
    *budget = budget.checked_sub(len).ok_or_else(|| {
        malformed_error!(
            "Stream {} overlaps other streams: {} bytes read exceed the container",
            stream,
            len
        )
    })?;
    Ok(())
}

fn build_metadata(details: &Details) -> Metadata {
    let mut metadata = Metadata::new();

    if let Some(section) = details.section(DETAILS_STREAM) {
        for (key, value) in &section.fields {
            metadata.insert_text(metadata_key(key), value);
        }
        if let Some(date) = creation_date(section) {
            metadata.insert("quarantineDate", date);
        }
    }

    for section in details.sections() {
        let Some(index) = file_index(&section.name) else {
            continue;
        };

        for (key, value) in &section.fields {
            let key = if index == 0 {
                metadata_key(key)
            } else {
                format!("{}_{index}", metadata_key(key))
            };
            metadata.insert_text(key, value);
        }
    }

    metadata
}

/// `File_3` -> 3
fn file_index(name: &str) -> Option<u32> {
    let prefix = name.get(..FILE_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(FILE_PREFIX) {
        return None;
    }
    name[FILE_PREFIX.len()..].parse().ok()
}

fn creation_date(section: &Section) -> Option<String> {
    let field = |key: &str| section.get(key)?.trim().parse::<u32>().ok();

    let date = NaiveDate::from_ymd_opt(
        i32::try_from(field("CreationYear")?).ok()?,
        field("CreationMonth")?,
        field("CreationDay")?,
    )?;
    let time = date.and_hms_opt(
        field("CreationHour").unwrap_or(0),
        field("CreationMinute").unwrap_or(0),
        field("CreationSecond").unwrap_or(0),
    )?;

    Some(time.format("%Y-%m-%dT%H:%M:%S").to_string())
}
