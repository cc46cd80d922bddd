use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

macro_rules! out_of_bounds_error {
    () => {
        crate::Error::OutOfBounds
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Most variants describe why a container could not be decoded. Inside the decoders,
/// [`Error::Malformed`] and [`Error::OutOfBounds`] are never surfaced to the caller: they are
/// folded into [`crate::quarantine::DecodeOutcome::Malformed`] so that the dispatcher can move on
/// to the next vendor. [`Error::FileError`] is the only variant that aborts a decode call.
///
/// # Error Categories
///
/// ## Container Parsing Errors
/// - [`Error::Malformed`] - Signature matched but the structure is corrupted or truncated
/// - [`Error::OutOfBounds`] - A read would have crossed the end of the buffer
/// - [`Error::Empty`] - Empty input provided
///
/// ## I/O and External Errors
/// - [`Error::FileError`] - Filesystem I/O errors on the input or the scratch directory
/// - [`Error::Error`] - Miscellaneous failures (mapping, rendering)
///
/// ## Host Policy Errors
/// - [`Error::LimitExceeded`] - More entries recovered than the caller allows
///
/// # Examples
///
/// ```rust,no_run
/// use dexray::{Error, QuarantineInput, decode_quarantine};
///
/// let input = QuarantineInput::new("sample.bup", "d41d8cd9", "/tmp/scratch", "quarantine/mcafee");
/// match decode_quarantine(&input) {
///     Ok(extraction) => println!("{} files recovered", extraction.entries.len()),
///     Err(Error::FileError(io_err)) => eprintln!("I/O error: {}", io_err),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The container is damaged and could not be parsed.
    ///
    /// The signature of a vendor format matched, but a later field was invalid. The error
    /// includes the source location where the malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the container.
    ///
    /// Every length and offset taken from a container goes through the bounds-checked
    /// reader; this is what it reports instead of reading past the end.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that occur while mapping the input file or while writing
    /// recovered payloads into the scratch directory.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// More files were recovered than the caller allows.
    ///
    /// None of the recovered files should be kept when this is returned.
    #[error("This file contains {count} extracted files, exceeding the maximum of {max} extracted files allowed. None of the files were extracted.")]
    LimitExceeded {
        /// Number of recovered entries
        count: usize,
        /// Maximum accepted by the caller
        max: usize,
    },

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}

impl Error {
    /// Returns `true` for errors that describe the container rather than the environment.
    ///
    /// These are the errors a decoder absorbs into a soft failure.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(self, Error::Malformed { .. } | Error::OutOfBounds | Error::Empty)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Error(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_errors() {
        assert!(malformed_error!("bad header").is_format_error());
        assert!(out_of_bounds_error!().is_format_error());
        assert!(Error::Empty.is_format_error());

        let io = Error::FileError(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(!io.is_format_error());
    }

    #[test]
    fn malformed_carries_location() {
        let error = malformed_error!("length {} exceeds {}", 10, 4);
        match error {
            Error::Malformed { message, file, .. } => {
                assert_eq!(message, "length 10 exceeds 4");
                assert!(file.ends_with("error.rs"));
            }
            _ => panic!("expected Malformed"),
        }
    }

    #[test]
    fn limit_display() {
        let error = Error::LimitExceeded { count: 7, max: 5 };
        let text = error.to_string();
        assert!(text.contains('7'));
        assert!(text.contains('5'));
    }
}
