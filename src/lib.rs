//! mixdown - the export subsystem of a PCM sound-mixing library
//!
//! mixdown turns an in-memory, possibly fragmented, decoded PCM buffer
//! into a sound file. The streaming Ogg Vorbis path is the centerpiece;
//! WAV and FLAC writers share the same session machinery.
//!
//! # Architecture
//!
//! - `export`: export sessions and the per-format write strategies
//! - `metadata`: key-value tags consulted by the writers
//! - `sound`: the decoded-sound representation exporters consume
//! - `util`: span storage, the sequential cursor, sample normalization
//!
//! # Example
//!
//! ```rust,ignore
//! use mixdown::{ExportFormat, Exporter, SampleKind, Sound, SoundInfo};
//!
//! let info = SoundInfo::new(2, 44100, 16, SampleKind::Signed);
//! let sound = Sound::from_pcm(info, pcm_bytes);
//!
//! let mut exporter = Exporter::new(&sound, ExportFormat::Ogg);
//! exporter.set_quality(0.5);
//! exporter.metadata_mut().set_text("TITLE", "Night Drive");
//! assert!(exporter.write("night_drive.ogg"));
//! ```

pub mod error;
pub mod export;
pub mod metadata;
pub mod sound;
pub mod util;

pub use error::{Error, Result};
pub use export::{ExportFormat, Exporter, FallbackWriter};
pub use metadata::{MetaValue, MetadataStore};
pub use sound::Sound;
pub use util::{SampleKind, SoundInfo};

/// mixdown version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
