//! # dexray Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dexray library. Import this module to get quick access to the essential
//! types for decoding quarantine containers.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dexray operations
pub use crate::Error;

/// The result type used throughout dexray
pub use crate::Result;

/// Configuration for the dispatcher
pub use crate::DecoderConfig;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Decode an input with the default configuration
pub use crate::decode_quarantine;

/// Runs the vendor decoders in priority order
pub use crate::Dispatcher;

/// Description of one input
pub use crate::QuarantineInput;

/// Low-level file parsing utilities
pub use crate::{File, Parser};

// ================================================================================================
// Results
// ================================================================================================

/// Decode results
pub use crate::quarantine::{
    DecodeOutcome, Diagnostic, ExtractedEntry, Extraction, MetaValue, Metadata,
};

/// The supported container formats
pub use crate::Vendor;

/// Result report shaping
pub use crate::report::{safe_name, Report};

// ================================================================================================
// Deobfuscation
// ================================================================================================

/// Byte transforms used by the decoders
pub use crate::deobfuscation::{Rc4, Transform};
