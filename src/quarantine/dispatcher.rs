//! Trying every decoder on an input.

use crate::{
    config::DecoderConfig,
    file::File,
    quarantine::{DecodeOutcome, Diagnostic, Extraction, QuarantineInput},
    Error, Result,
};

/// Runs the enabled vendor decoders over an input until one of them recovers something.
///
/// The input file is mapped once and every decoder works on the same read-only view. A decoder
/// that does not recognise the input, or recognises it but finds it damaged, never stops the
/// others; the first decoder producing entries or metadata wins.
///
/// # Examples
///
/// ```rust,no_run
/// use dexray::{DecoderConfig, Dispatcher, QuarantineInput};
///
/// let dispatcher = Dispatcher::new(DecoderConfig::exhaustive());
/// let input = QuarantineInput::new("sample.bin", "0a1b2c", "/tmp/scratch", "");
///
/// let extraction = dispatcher.decode(&input)?;
/// for entry in &extraction.entries {
///     println!("{} -> {}", entry.display_name, entry.stored_path.display());
/// }
/// # Ok::<(), dexray::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    config: DecoderConfig,
}

impl Dispatcher {
    /// Create a dispatcher running with `config`.
    #[must_use]
    pub fn new(config: DecoderConfig) -> Self {
        Dispatcher { config }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode the file described by `input`.
    ///
    /// An empty file, or one no decoder recognises, yields an empty [`Extraction`].
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the input cannot be read or a recovered file
    /// cannot be written to the scratch directory.
    pub fn decode(&self, input: &QuarantineInput) -> Result<Extraction> {
        let file = match File::from_file(input.path()) {
            Ok(file) => file,
            Err(Error::Empty) => {
                log::debug!("{}: empty input", input.file_path.display());
                return Ok(Extraction::default());
            }
            Err(error) => return Err(error),
        };

        self.decode_data(input, file.data())
    }

    /// Decode `data`, read from the file described by `input`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if a recovered file cannot be written.
    pub fn decode_data(&self, input: &QuarantineInput, data: &[u8]) -> Result<Extraction> {
        let mut extraction = Extraction::default();
        if data.is_empty() {
            return Ok(extraction);
        }

        for vendor in self.config.order(input.vendor_hint()) {
            log::debug!("{}: trying {vendor}", input.file_path.display());

            let outcome = vendor.attempt(input, data)?;
            if !outcome.is_useful() {
                if let DecodeOutcome::Malformed(reason) = outcome {
                    extraction.diagnostics.push(Diagnostic { vendor, reason });
                }
                continue;
            }

            if let DecodeOutcome::Success { entries, metadata } = outcome {
                log::info!(
                    "{}: recovered {} file(s) and {} metadata field(s) from {vendor} quarantine",
                    input.file_path.display(),
                    entries.len(),
                    metadata.len()
                );

                extraction.entries = entries;
                extraction.metadata = metadata;
                extraction.vendor = Some(vendor);
                return Ok(extraction);
            }
        }

        log::debug!(
            "{}: no quarantine format recognised",
            input.file_path.display()
        );
        Ok(extraction)
    }
}

/// Decode `input` with the default configuration.
///
/// # Errors
/// Returns [`crate::Error::FileError`] if the input cannot be read or a recovered file cannot be
/// written to the scratch directory.
pub fn decode_quarantine(input: &QuarantineInput) -> Result<Extraction> {
    Dispatcher::default().decode(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        quarantine::Vendor,
        test::builders::{ahnlab_container, avast_container, bup_container, trendmicro_container},
    };

    fn input(dir: &std::path::Path, hint: &str) -> QuarantineInput {
        QuarantineInput::new(dir.join("sample"), "c0ffee", dir.join("out"), hint)
    }

    #[test]
    fn first_useful_result_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("out")).unwrap();
        let container = avast_container(b"MZ chest");

        let extraction = Dispatcher::default()
            .decode_data(&input(dir.path(), ""), &container)
            .unwrap();

        assert_eq!(extraction.vendor, Some(Vendor::AvastAvg));
        assert_eq!(extraction.entries.len(), 1);
        assert_eq!(
            extraction.entries[0].stored_path,
            dir.path().join("out").join("c0ffee.avastavg.0")
        );
        assert_eq!(
            std::fs::read(&extraction.entries[0].stored_path).unwrap(),
            b"MZ chest"
        );
    }

    #[test]
    fn disabled_vendor_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("out")).unwrap();
        let container = trendmicro_container(&[], b"MZ");

        let dispatcher = Dispatcher::new(DecoderConfig::default().with_vendors(&[Vendor::AhnLab]));
        let extraction = dispatcher
            .decode_data(&input(dir.path(), "trendmicro"), &container)
            .unwrap();

        assert!(extraction.is_empty());
        assert_eq!(extraction.vendor, None);
    }

    #[test]
    fn malformed_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("out")).unwrap();
        let mut container = ahnlab_container("C:\\a.exe", "X", b"MZ");
        container[0x58..0x5C].copy_from_slice(&u32::MAX.to_le_bytes());

        let extraction = Dispatcher::default()
            .decode_data(&input(dir.path(), ""), &container)
            .unwrap();

        assert!(extraction.is_empty());
        assert_eq!(extraction.diagnostics.len(), 1);
        assert_eq!(extraction.diagnostics[0].vendor, Vendor::AhnLab);
        assert_eq!(
            std::fs::read_dir(dir.path().join("out")).unwrap().count(),
            0
        );
    }

    #[test]
    fn empty_success_is_not_a_result() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("out")).unwrap();
        let container = bup_container("; nothing recorded\r\n", &[]);

        let outcome = Vendor::McAfeeBup
            .attempt(&input(dir.path(), ""), &container)
            .unwrap();
        assert!(matches!(outcome, DecodeOutcome::Success { .. }));
        assert!(!outcome.is_useful());

        let extraction = Dispatcher::default()
            .decode_data(&input(dir.path(), "mcafee"), &container)
            .unwrap();
        assert!(extraction.is_empty());
        assert_eq!(extraction.vendor, None);
        assert!(extraction.diagnostics.is_empty());
    }

    #[test]
    fn empty_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sample"), b"").unwrap();

        let extraction = decode_quarantine(&input(dir.path(), "")).unwrap();
        assert!(extraction.is_empty());
        assert!(extraction.diagnostics.is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = decode_quarantine(&input(dir.path(), ""));
        assert!(matches!(result, Err(Error::FileError(_))));
    }
}
