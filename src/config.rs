//! Decoder configuration
//!
//! This module provides the options the [`crate::Dispatcher`] runs with: which vendor decoders
//! are enabled, in which order they are tried, and whether the caller's format hint may move
//! a decoder to the front.

use strum::IntoEnumIterator;

use crate::quarantine::Vendor;

/// Configuration for a [`crate::Dispatcher`]
///
/// Exactly one decoder's result is used per input, so the order only matters for inputs that
/// more than one enabled decoder would accept. The hint never changes the result for
/// well-formed containers, only how quickly the right decoder is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Try the vendor named by the input's format hint before the others
    pub honor_hint: bool,

    /// Enabled decoders, in the order they are tried
    pub vendors: Vec<Vendor>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            honor_hint: true,
            vendors: Vendor::iter().collect(),
        }
    }
}

impl DecoderConfig {
    /// Creates a configuration that ignores the format hint
    ///
    /// All decoders run in the fixed order regardless of what the caller believes the input
    /// to be. Useful when the upstream type tag is known to be unreliable.
    #[must_use]
    pub fn exhaustive() -> Self {
        Self {
            honor_hint: false,
            ..Self::default()
        }
    }

    /// Restricts the enabled decoders to `vendors`, in the given order
    ///
    /// Duplicates are dropped.
    #[must_use]
    pub fn with_vendors(mut self, vendors: &[Vendor]) -> Self {
        self.vendors.clear();
        for vendor in vendors {
            if !self.vendors.contains(vendor) {
                self.vendors.push(*vendor);
            }
        }
        self
    }

    /// Order in which the decoders run for an input with the given vendor hint
    #[must_use]
    pub fn order(&self, hint: &str) -> Vec<Vendor> {
        let mut order = self.vendors.clone();

        if self.honor_hint {
            if let Some(hinted) = Vendor::from_hint(hint) {
                if let Some(position) = order.iter().position(|vendor| *vendor == hinted) {
                    let vendor = order.remove(position);
                    order.insert(0, vendor);
                }
            }
        }

        order
    }
}
