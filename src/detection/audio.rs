use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use symphonia::core::codecs::{CodecType, CODEC_TYPE_FLAC, CODEC_TYPE_MP3, CODEC_TYPE_PCM_S16LE};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::detection::error::TranscribeError;

/// Encoding hint passed through to the recognizer.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoding {
    #[serde(rename = "ENCODING_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "LINEAR16")]
    Linear16,
    #[serde(rename = "FLAC")]
    Flac,
    #[serde(rename = "MP3")]
    Mp3,
    #[serde(rename = "OGG_OPUS")]
    OggOpus,
    #[serde(rename = "WEBM_OPUS")]
    WebmOpus,
}

impl AudioEncoding {
    /// Maps a declared MIME type, ignoring parameters such as `;codecs=opus`.
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "audio/wav" | "audio/wave" | "audio/x-wav" | "audio/x-pn-wav" | "audio/l16" => {
                AudioEncoding::Linear16
            }
            "audio/flac" | "audio/x-flac" => AudioEncoding::Flac,
            "audio/mpeg" | "audio/mp3" => AudioEncoding::Mp3,
            "audio/ogg" | "audio/opus" => AudioEncoding::OggOpus,
            "audio/webm" | "video/webm" => AudioEncoding::WebmOpus,
            _ => AudioEncoding::Unspecified,
        }
    }

    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "wav" | "wave" => AudioEncoding::Linear16,
            "flac" => AudioEncoding::Flac,
            "mp3" => AudioEncoding::Mp3,
            "ogg" | "opus" => AudioEncoding::OggOpus,
            "webm" => AudioEncoding::WebmOpus,
            _ => AudioEncoding::Unspecified,
        }
    }

    fn from_codec(codec: CodecType) -> Self {
        if codec == CODEC_TYPE_PCM_S16LE {
            AudioEncoding::Linear16
        } else if codec == CODEC_TYPE_FLAC {
            AudioEncoding::Flac
        } else if codec == CODEC_TYPE_MP3 {
            AudioEncoding::Mp3
        } else {
            AudioEncoding::Unspecified
        }
    }

    pub fn is_unspecified(&self) -> bool {
        *self == AudioEncoding::Unspecified
    }
}

/// An uploaded audio clip. The bytes are shared, never copied, between concurrent probes.
#[derive(Debug, Clone)]
pub struct AudioInput {
    bytes: Arc<[u8]>,
    encoding: AudioEncoding,
    sample_rate_hertz: Option<u32>,
    duration: Option<Duration>,
}

impl AudioInput {
    /// Inspects the container to fill in the hints. A container that cannot be probed
    /// (browser WebM uploads, truncated files) only leaves the hints unset.
    pub fn new(bytes: impl Into<Arc<[u8]>>, declared_mime: Option<&str>) -> Self {
        let bytes = bytes.into();
        let declared = declared_mime
            .map(AudioEncoding::from_mime)
            .unwrap_or(AudioEncoding::Unspecified);

        let Some(probed) = probe(&bytes, declared_mime) else {
            tracing::debug!(bytes = bytes.len(), encoding = ?declared, "Audio container could not be probed");
            return Self {
                bytes,
                encoding: declared,
                sample_rate_hertz: None,
                duration: None,
            };
        };

        let encoding = if declared.is_unspecified() {
            probed.encoding
        } else {
            declared
        };
        tracing::debug!(
            bytes = bytes.len(),
            encoding = ?encoding,
            sample_rate = ?probed.sample_rate_hertz,
            duration = ?probed.duration,
            "Audio container probed"
        );

        Self {
            bytes,
            encoding,
            sample_rate_hertz: probed.sample_rate_hertz,
            duration: probed.duration,
        }
    }

    pub fn with_encoding(mut self, encoding: AudioEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn encoding(&self) -> AudioEncoding {
        self.encoding
    }

    pub fn sample_rate_hertz(&self) -> Option<u32> {
        self.sample_rate_hertz
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }
}

struct ProbedAudio {
    encoding: AudioEncoding,
    sample_rate_hertz: Option<u32>,
    duration: Option<Duration>,
}

/// Malformed headers can make the demuxer panic (a zero sample rate divides by zero), and
/// uploads are untrusted, so a panic counts as an unprobeable container.
fn probe(bytes: &Arc<[u8]>, declared_mime: Option<&str>) -> Option<ProbedAudio> {
    panic::catch_unwind(AssertUnwindSafe(|| probe_container(bytes, declared_mime)))
        .unwrap_or_else(|_| {
            tracing::warn!(bytes = bytes.len(), "Audio container probe panicked");
            None
        })
}

fn probe_container(bytes: &Arc<[u8]>, declared_mime: Option<&str>) -> Option<ProbedAudio> {
    let mut hint = Hint::new();
    if let Some(mime) = declared_mime {
        hint.mime_type(mime);
    }
    let source = MediaSourceStream::new(Box::new(Cursor::new(Arc::clone(bytes))), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .ok()?;

    let track = probed.format.default_track()?;
    let params = &track.codec_params;
    let duration = match (params.n_frames, params.sample_rate) {
        (Some(frames), Some(rate)) if rate > 0 => {
            Some(Duration::from_secs_f64(frames as f64 / f64::from(rate)))
        }
        _ => None,
    };

    Some(ProbedAudio {
        encoding: AudioEncoding::from_codec(params.codec),
        sample_rate_hertz: params.sample_rate,
        duration,
    })
}

/// Size and duration bounds an upload must respect before any recognizer call is made.
#[derive(Debug, Clone, Copy)]
pub struct AudioLimits {
    pub min_bytes: usize,
    pub max_bytes: usize,
    pub max_duration: Duration,
}

impl Default for AudioLimits {
    fn default() -> Self {
        Self {
            min_bytes: 1_000,
            // 10 MB
            max_bytes: 10_000_000,
            max_duration: Duration::from_secs(60),
        }
    }
}

impl AudioLimits {
    pub fn validate(&self, audio: &AudioInput) -> Result<(), TranscribeError> {
        if audio.is_empty() {
            return Err(TranscribeError::InvalidInput(
                "audio buffer is empty".to_string(),
            ));
        }
        if audio.len() < self.min_bytes {
            return Err(TranscribeError::InvalidInput(format!(
                "audio is too short to contain speech ({} bytes, minimum is {})",
                audio.len(),
                self.min_bytes
            )));
        }
        if audio.len() > self.max_bytes {
            return Err(TranscribeError::InvalidInput(format!(
                "audio is too large ({} bytes, maximum is {})",
                audio.len(),
                self.max_bytes
            )));
        }
        if let Some(duration) = audio.duration() {
            if duration > self.max_duration {
                return Err(TranscribeError::InvalidInput(format!(
                    "audio is too long ({:.1}s, maximum is {}s)",
                    duration.as_secs_f64(),
                    self.max_duration.as_secs()
                )));
            }
        }
        Ok(())
    }
}
