//! Result reports for a host service.
//!
//! A host that resubmits recovered files needs three things on top of an [`Extraction`]: file
//! names it can show without sanitising them again, a guard against containers that unpack
//! into more files than it accepts, and a structured summary. The report carries the metadata
//! unscrubbed; it can contain live URLs pointing at the original download source.
//!
//! # Usage Examples
//!
//! ```rust
//! use dexray::{report::Report, Extraction};
//!
//! let extraction = Extraction::default();
//! extraction.check_limit(10)?;
//!
//! let report = Report::from_extraction(&extraction);
//! assert!(report.sections.is_empty());
//! # Ok::<(), dexray::Error>(())
//! ```

use std::path::Path;

use serde::Serialize;

use crate::{
    quarantine::{Extraction, Metadata, Vendor},
    Error, Result,
};

/// Title of the section listing recovered files.
pub const FOUND_FILES_TITLE: &str = "DeXRAY found files:";

/// Title of the metadata section.
pub const METADATA_TITLE: &str = "DeXRAY Quarantine Metadata";

/// Content of a report section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "format", content = "body", rename_all = "lowercase")]
pub enum SectionBody {
    /// Plain text lines
    Text(Vec<String>),
    /// A JSON document
    Json(Metadata),
}

/// One titled report section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    /// Section title
    pub title: String,
    /// Section content
    #[serde(flatten)]
    pub body: SectionBody,
}

/// Summary of one decode call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    /// The vendor whose container was decoded
    pub vendor: Option<Vendor>,
    /// Sections in display order; empty when nothing was recovered
    pub sections: Vec<ReportSection>,
}

impl Report {
    /// Build the report for `extraction`.
    #[must_use]
    pub fn from_extraction(extraction: &Extraction) -> Report {
        let mut sections = Vec::new();

        if !extraction.entries.is_empty() {
            let lines = extraction
                .entries
                .iter()
                .map(|entry| {
                    format!(
                        "Resubmitted un-quarantined file as : {}",
                        safe_name(&entry.display_name, &entry.stored_path)
                    )
                })
                .collect();

            sections.push(ReportSection {
                title: FOUND_FILES_TITLE.to_string(),
                body: SectionBody::Text(lines),
            });
        }

        if !extraction.metadata.is_empty() {
            sections.push(ReportSection {
                title: METADATA_TITLE.to_string(),
                body: SectionBody::Json(extraction.metadata.clone()),
            });
        }

        Report {
            vendor: extraction.vendor,
            sections,
        }
    }

    /// Render the report as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns [`crate::Error::Error`] if serialisation fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Extraction {
    /// Fail if more than `max` files were recovered.
    ///
    /// The caller should then discard every recovered file, not only the excess ones.
    ///
    /// # Errors
    /// Returns [`crate::Error::LimitExceeded`] if the entry count exceeds `max`.
    pub fn check_limit(&self, max: usize) -> Result<()> {
        let count = self.entries.len();
        if count > max {
            return Err(Error::LimitExceeded { count, max });
        }
        Ok(())
    }
}

/// Make a recovered file name safe to display and to use as a single path component.
///
/// Control characters and path separators are replaced with `_`. A name that is empty
/// afterwards, or consists only of dots, is replaced by the stored file name.
#[must_use]
pub fn safe_name(display_name: &str, stored_path: &Path) -> String {
    let cleaned: String = display_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_control() || c == '/' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        stored_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string())
    } else {
        cleaned
    }
}
