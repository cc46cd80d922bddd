//! Synthetic quarantine containers for the unit tests.
