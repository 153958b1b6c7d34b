//! `transcript-doc`: the document model behind an audio-transcript editor.
//!
//! This crate provides:
//! - The data model: words and silences grouped into speaker paragraphs, pointing at audio
//!   sources
//! - A zip-based container format bundling JSON metadata with the raw audio payloads
//! - Lazy traversal of the document timeline and single-pass seeking to a timestamp
//!
//! Audio decoding is pluggable through [`AudioDecoder`]; [`SymphoniaDecoder`] is the default.

// Data model.
pub mod document;

// Timeline traversal.
pub mod iter;
pub mod seek;
pub mod timeline;

// Persistence.
pub mod container;
pub mod fs;
pub mod opts;

// Audio decoding seam.
pub mod audio;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

mod error;

pub use audio::{AudioDecoder, DecodedAudio, SymphoniaDecoder};
pub use container::{
    METADATA_ENTRY, decode_document, decode_from_slice, encode_document, encode_to_vec,
};
pub use document::{Document, Paragraph, ParagraphItem, Silence, Source, SourceMedia, Word};
pub use error::{Error, ErrorKind, Result};
pub use fs::{load_document, save_document};
pub use iter::{DocumentItem, DocumentIter};
pub use opts::{AudioCompression, ContainerOpts};
pub use seek::{SeekExt, SkipToTime, Timed, skip_to_time};
pub use timeline::{TimedItem, compute_timed};
