//! Common utilities and data structures

pub mod buffer;
pub mod samplefmt;

pub use buffer::{SpanCursor, SpanList};
pub use samplefmt::{normalize_sample, SampleKind, SoundInfo};
