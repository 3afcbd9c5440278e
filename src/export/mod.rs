//! Sound export sessions and the per-format write strategies

pub mod flac;
pub mod ogg;
pub mod wav;

use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::metadata::MetadataStore;
use crate::sound::Sound;
use crate::util::{SoundInfo, SpanList};

use ogg::writer::OggWriteRequest;

/// Container formats an export session can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// RIFF/WAVE, header plus raw PCM copy
    Wav,
    /// Ogg Vorbis, quality-targeted VBR
    Ogg,
    /// FLAC, lossless
    Flac,
}

impl ExportFormat {
    /// Detect the export format from a path's extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "wav" => Some(ExportFormat::Wav),
            "ogg" | "oga" => Some(ExportFormat::Ogg),
            "flac" => Some(ExportFormat::Flac),
            _ => None,
        }
    }
}

/// Writer used when an export requests a sample rate or channel count the
/// session cannot produce itself; implementations are expected to resample.
pub trait FallbackWriter {
    /// Write the sound to `path` in the `requested` format
    fn write(
        &mut self,
        info: &SoundInfo,
        spans: &SpanList,
        path: &Path,
        requested: &SoundInfo,
    ) -> Result<()>;
}

/// One export session over a decoded sound
///
/// The session captures the sound's stream description and span list at
/// construction and never mutates the source. Metadata and quality persist
/// across write calls; each write call is an independent pass over the
/// spans.
pub struct Exporter {
    info: SoundInfo,
    spans: SpanList,
    metadata: MetadataStore,
    quality: f64,
    format: ExportFormat,
    dest_info: Option<SoundInfo>,
    stream_serial: Option<u32>,
    fallback: Option<Box<dyn FallbackWriter>>,
}

impl Exporter {
    /// Create an export session for a sound
    pub fn new(sound: &Sound, format: ExportFormat) -> Self {
        Exporter {
            info: *sound.info(),
            spans: sound.span_list(),
            metadata: MetadataStore::new(),
            quality: 0.5,
            format,
            dest_info: None,
            stream_serial: None,
            fallback: None,
        }
    }

    /// Set the encoding quality, clamped to [0.0, 1.0]
    pub fn set_quality(&mut self, quality: f64) {
        self.quality = quality.clamp(0.0, 1.0);
    }

    /// Current quality scalar
    pub fn quality(&self) -> f64 {
        self.quality
    }

    /// Integer quality level 0-10 derived from the quality scalar
    pub fn quality_level(&self) -> i32 {
        (self.quality * 10.0).round() as i32
    }

    /// Metadata consulted by the writers
    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// Mutable access to the metadata store
    pub fn metadata_mut(&mut self) -> &mut MetadataStore {
        &mut self.metadata
    }

    /// Pin the Ogg logical-stream serial number
    ///
    /// Without this, every write draws a fresh serial from the process
    /// random source; pinning one makes encodes reproducible.
    pub fn set_stream_serial(&mut self, serial: u32) {
        self.stream_serial = Some(serial);
    }

    /// Install the writer used for exports that need resampling
    pub fn set_fallback_writer(&mut self, writer: Box<dyn FallbackWriter>) {
        self.fallback = Some(writer);
    }

    /// Active destination-format override, if a mismatched-format export
    /// is in progress
    pub fn destination_override(&self) -> Option<&SoundInfo> {
        self.dest_info.as_ref()
    }

    /// Write the sound to `path` in the session's format
    ///
    /// Returns whether the export succeeded; failures are logged and
    /// carry no further detail across this boundary.
    pub fn write<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let path = path.as_ref();
        match self.try_write(path) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "export failed");
                false
            }
        }
    }

    /// Write the sound to `path` in a caller-requested format
    ///
    /// A request whose sample rate or channel count differs from the
    /// source is delegated entirely to the fallback writer. Otherwise the
    /// requested format becomes the destination override for the duration
    /// of the write and the previous override is restored on every exit
    /// path.
    pub fn write_as<P: AsRef<Path>>(&mut self, path: P, requested: &SoundInfo) -> bool {
        let path = path.as_ref();
        if requested.sample_rate != self.info.sample_rate
            || requested.channels != self.info.channels
        {
            return match self.fallback.as_mut() {
                Some(writer) => {
                    match writer.write(&self.info, &self.spans, path, requested) {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "fallback export failed");
                            false
                        }
                    }
                }
                None => {
                    warn!(
                        path = %path.display(),
                        "export needs resampling but no fallback writer is installed"
                    );
                    false
                }
            };
        }

        let previous = self.dest_info.replace(*requested);
        let result = self.write(path);
        self.dest_info = previous;
        result
    }

    fn try_write(&mut self, path: &Path) -> Result<()> {
        match self.format {
            ExportFormat::Wav => wav::write(&self.info, &self.spans, path),
            ExportFormat::Ogg => {
                let request = OggWriteRequest {
                    info: &self.info,
                    spans: &self.spans,
                    metadata: &self.metadata,
                    quality_level: self.quality_level(),
                    serial: self.stream_serial.unwrap_or_else(rand::random),
                };
                ogg::writer::write(&request, path)
            }
            ExportFormat::Flac => flac::write(&self.info, &self.spans, path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::util::SampleKind;

    fn test_sound() -> Sound {
        let info = SoundInfo::new(2, 44100, 16, SampleKind::Signed);
        Sound::from_pcm(info, vec![0u8; 64])
    }

    #[test]
    fn test_quality_level_mapping() {
        let sound = test_sound();
        let mut exporter = Exporter::new(&sound, ExportFormat::Ogg);

        exporter.set_quality(0.5);
        assert_eq!(exporter.quality_level(), 5);

        exporter.set_quality(0.24);
        assert_eq!(exporter.quality_level(), 2);

        exporter.set_quality(1.7);
        assert_eq!(exporter.quality(), 1.0);
        assert_eq!(exporter.quality_level(), 10);

        exporter.set_quality(-0.3);
        assert_eq!(exporter.quality_level(), 0);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ExportFormat::from_extension(Path::new("mix.wav")),
            Some(ExportFormat::Wav)
        );
        assert_eq!(
            ExportFormat::from_extension(Path::new("MIX.OGG")),
            Some(ExportFormat::Ogg)
        );
        assert_eq!(
            ExportFormat::from_extension(Path::new("a/b/c.oga")),
            Some(ExportFormat::Ogg)
        );
        assert_eq!(
            ExportFormat::from_extension(Path::new("track.flac")),
            Some(ExportFormat::Flac)
        );
        assert_eq!(ExportFormat::from_extension(Path::new("track.mp3")), None);
        assert_eq!(ExportFormat::from_extension(Path::new("noext")), None);
    }

    #[test]
    fn test_mismatched_request_without_fallback_fails() {
        let sound = test_sound();
        let mut exporter = Exporter::new(&sound, ExportFormat::Ogg);

        let requested = SoundInfo::new(2, 22050, 16, SampleKind::Signed);
        assert!(!exporter.write_as("/nonexistent/out.ogg", &requested));
        assert!(exporter.destination_override().is_none());
    }

    struct StubFallback {
        fail: bool,
    }

    impl FallbackWriter for StubFallback {
        fn write(
            &mut self,
            _info: &SoundInfo,
            _spans: &SpanList,
            _path: &Path,
            _requested: &SoundInfo,
        ) -> Result<()> {
            if self.fail {
                Err(Error::unsupported("resampling not available"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_mismatched_request_delegates_to_fallback() {
        let sound = test_sound();
        let mut exporter = Exporter::new(&sound, ExportFormat::Ogg);
        exporter.set_fallback_writer(Box::new(StubFallback { fail: false }));

        let requested = SoundInfo::new(1, 44100, 16, SampleKind::Signed);
        assert!(exporter.write_as("/tmp/ignored.ogg", &requested));
        assert!(exporter.destination_override().is_none());

        exporter.set_fallback_writer(Box::new(StubFallback { fail: true }));
        assert!(!exporter.write_as("/tmp/ignored.ogg", &requested));
    }

    #[test]
    fn test_override_restored_when_inner_write_fails() {
        let sound = test_sound();
        let mut exporter = Exporter::new(&sound, ExportFormat::Ogg);

        // same rate and channels, so the session writes directly; the
        // unwritable path makes the inner write fail
        let requested = SoundInfo::new(2, 44100, 32, SampleKind::Float);
        assert!(!exporter.write_as("/nonexistent-dir/out.ogg", &requested));
        assert!(exporter.destination_override().is_none());
    }
}
