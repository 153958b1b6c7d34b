use zip::CompressionMethod;

/// Options that control how containers are read and written.
///
/// This is library-level configuration; the CLI maps its flags onto it.
#[derive(Debug, Clone)]
pub struct ContainerOpts {
    /// Upper bound on worker threads used to decode sources while loading.
    ///
    /// The effective count is also capped by the number of sources. `0` behaves like `1`.
    pub max_parallel_decodes: usize,

    /// Compression applied to audio entries. The metadata entry is always deflated.
    pub audio_compression: AudioCompression,

    /// Whether loading checks the document invariants before decoding any audio.
    pub validate_on_decode: bool,
}

impl Default for ContainerOpts {
    fn default() -> Self {
        Self {
            max_parallel_decodes: num_cpus::get(),
            audio_compression: AudioCompression::default(),
            validate_on_decode: true,
        }
    }
}

/// How audio payloads are stored in the archive.
///
/// Compressed audio formats gain nothing from deflate, so entries are stored as-is unless the
/// caller knows the payloads are raw PCM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum AudioCompression {
    #[default]
    Stored,
    Deflated,
}

impl AudioCompression {
    pub(crate) fn method(self) -> CompressionMethod {
        match self {
            Self::Stored => CompressionMethod::Stored,
            Self::Deflated => CompressionMethod::Deflated,
        }
    }
}
