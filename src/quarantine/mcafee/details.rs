//! The `Details` stream of a McAfee backup file.
//!
//! Most product versions write an INI document:
//!
//! ```text
//! [Details]
//! DetectionName=EICAR test file
//! CreationYear=2024
//! NumberOfFiles=1
//! [File_0]
//! OriginalName=C:\Users\bob\evil.exe
//! ```
//!
//! Some versions write the same sections as XML elements instead, with one child element per
//! key. Both are read into the same [`Details`] shape: a list of named sections holding ordered
//! key/value pairs.

use quick_xml::{events::Event, Reader};

use crate::{file::parser::Parser, Result};

/// A named group of key/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    /// Section name, e.g. `Details` or `File_0`
    pub name: String,
    /// Key/value pairs in document order
    pub fields: Vec<(String, String)>,
}

impl Section {
    fn new(name: &str) -> Self {
        Section {
            name: name.trim().to_string(),
            fields: Vec::new(),
        }
    }

    /// Returns the first value stored under `key`, compared case-insensitively.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }
}

/// Parsed `Details` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Details {
    sections: Vec<Section>,
}

impl Details {
    /// Parse a deobfuscated `Details` stream.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the stream is XML and not well formed.
    pub fn parse(raw: &[u8]) -> Result<Details> {
        let text = decode_text(raw)?;
        let trimmed = text.trim_start_matches(['\u{feff}', '\0']).trim_start();

        if trimmed.starts_with('<') {
            parse_xml(trimmed)
        } else {
            Ok(parse_ini(trimmed))
        }
    }

    /// All sections in document order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Returns the section called `name`, compared case-insensitively.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| section.name.eq_ignore_ascii_case(name))
    }

    fn section_mut(&mut self, name: &str) -> &mut Section {
        let index = match self
            .sections
            .iter()
            .position(|section| section.name.eq_ignore_ascii_case(name.trim()))
        {
            Some(index) => index,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }
}

/// Details streams are 8-bit text, or UTF-16LE when they start with a byte order mark.
fn decode_text(raw: &[u8]) -> Result<String> {
    if let Some(wide) = raw.strip_prefix(&[0xFF, 0xFE]) {
        if wide.len() < 2 {
            return Ok(String::new());
        }
        return Parser::new(wide).read_utf16z();
    }

    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

fn parse_ini(text: &str) -> Details {
    let mut details = Details::default();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            details.section_mut(name);
            current = Some(name.to_string());
            continue;
        }

        let (Some(section), Some((key, value))) = (current.as_deref(), line.split_once('=')) else {
            continue;
        };
        let key = key.trim();
        if !key.is_empty() {
            details
                .section_mut(section)
                .fields
                .push((key.to_string(), value.trim().to_string()));
        }
    }

    details
}

/// Text inside an element whose parent is not the document root becomes a field: the parent
/// names the section and the element names the key.
fn parse_xml(text: &str) -> Result<Details> {
    let mut details = Details::default();
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    loop {
        let event = reader
            .read_event()
            .map_err(|error| malformed_error!("Invalid Details XML: {}", error))?;

        match event {
            Event::Start(element) => {
                stack.push(String::from_utf8_lossy(element.name().as_ref()).into_owned());
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map_err(|error| malformed_error!("Invalid Details XML text: {}", error))?;
                add_xml_field(&mut details, &stack, &value);
            }
            Event::CData(data) => {
                let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                add_xml_field(&mut details, &stack, &value);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(details)
}

fn add_xml_field(details: &mut Details, stack: &[String], value: &str) {
    if let [.., section, key] = stack {
        details
            .section_mut(section)
            .fields
            .push((key.clone(), value.trim().to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ini() {
        let details = Details::parse(
            b"[Details]\r\nDetectionName=EICAR test file\r\nNumberOfFiles=1\r\n\r\n; comment\r\n[File_0]\r\nOriginalName=C:\\evil.exe\r\nstray line\r\n",
        )
        .unwrap();

        assert_eq!(details.sections().len(), 2);
        let section = details.section("details").unwrap();
        assert_eq!(section.get("DetectionName"), Some("EICAR test file"));
        assert_eq!(section.get("numberoffiles"), Some("1"));
        assert_eq!(
            details.section("File_0").unwrap().get("OriginalName"),
            Some("C:\\evil.exe")
        );
    }

    #[test]
    fn keys_before_first_section_are_ignored() {
        let details = Details::parse(b"Orphan=1\n[Details]\nKey=Value=with=equals\n").unwrap();
        assert_eq!(details.sections().len(), 1);
        assert_eq!(
            details.section("Details").unwrap().get("Key"),
            Some("Value=with=equals")
        );
    }

    #[test]
    fn xml() {
        let details = Details::parse(
            br#"<?xml version="1.0"?>
<BUP>
  <Details><DetectionName>EICAR &amp; friends</DetectionName><CreationYear>2024</CreationYear></Details>
  <File_0><OriginalName>C:\evil.exe</OriginalName></File_0>
</BUP>"#,
        )
        .unwrap();

        assert_eq!(
            details.section("Details").unwrap().get("DetectionName"),
            Some("EICAR & friends")
        );
        assert_eq!(
            details.section("File_0").unwrap().get("OriginalName"),
            Some("C:\\evil.exe")
        );
    }

    #[test]
    fn broken_xml_is_malformed() {
        let result = Details::parse(b"<Details><Key>value</Other></Details>");
        assert!(matches!(result, Err(crate::Error::Malformed { .. })));
    }

    #[test]
    fn utf16_with_bom() {
        let mut raw = vec![0xFF, 0xFE];
        for unit in "[Details]\nKey=Value".encode_utf16() {
            raw.extend_from_slice(&unit.to_le_bytes());
        }

        let details = Details::parse(&raw).unwrap();
        assert_eq!(details.section("Details").unwrap().get("Key"), Some("Value"));
    }
}
