//! The audio decoding seam.
//!
//! Loading a container hands every source's raw bytes to an [`AudioDecoder`] and keeps the
//! resulting [`DecodedAudio`] next to the bytes. The container codec never looks inside either;
//! callers that only need the document structure can plug in a decoder that does no work.

mod symphonia_decoder;

pub use symphonia_decoder::SymphoniaDecoder;

/// Decoded PCM for one source.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub channels: usize,
    /// Interleaved samples normalized to `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Turns a source's raw bytes into [`DecodedAudio`].
///
/// Called once per source while loading a container, possibly from several worker threads at
/// once, hence the `Sync` bound.
pub trait AudioDecoder: Sync {
    fn decode(&self, file_name: &str, bytes: &[u8]) -> anyhow::Result<DecodedAudio>;
}

impl<F> AudioDecoder for F
where
    F: Fn(&str, &[u8]) -> anyhow::Result<DecodedAudio> + Sync,
{
    fn decode(&self, file_name: &str, bytes: &[u8]) -> anyhow::Result<DecodedAudio> {
        self(file_name, bytes)
    }
}
