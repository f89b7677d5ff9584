//! Property-based tests for mpflat-converter
//!
//! Conversion invariants (deduplication, value mapping, acceptance fixed
//! point) and expression flattening.

mod conversion_properties;
mod flatten_properties;
