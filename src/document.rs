//! The transcript document model.
//!
//! A [`Document`] is an ordered list of audio [`Source`]s plus an ordered list of
//! [`Paragraph`]s. Each paragraph holds words and silences that point back into the source list
//! by index, with timestamps local to that source.
//!
//! Storage order is the playback order. Embedded timestamps only locate an item inside its own
//! source; the document-wide timeline is derived from item durations (see [`crate::timeline`]).

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::audio::DecodedAudio;
use crate::container::METADATA_ENTRY;
use crate::iter::DocumentIter;
use crate::seek::SkipToTime;
use crate::{Error, Result};

/// A spoken token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub word: String,
    /// Index into [`Document::sources`].
    pub source: usize,
    /// Start time in seconds, local to the source.
    pub start: f64,
    /// End time in seconds, local to the source.
    pub end: f64,
    /// Recognizer confidence. Opaque to this crate.
    pub conf: f64,
}

/// A gap between words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Silence {
    pub source: usize,
    pub start: f64,
    pub end: f64,
}

/// One entry of a paragraph.
///
/// Serialized with a `type` discriminator (`"word"` or `"silence"`) next to the variant fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParagraphItem {
    Word(Word),
    Silence(Silence),
}

impl ParagraphItem {
    pub fn source(&self) -> usize {
        match self {
            Self::Word(w) => w.source,
            Self::Silence(s) => s.source,
        }
    }

    pub fn start(&self) -> f64 {
        match self {
            Self::Word(w) => w.start,
            Self::Silence(s) => s.start,
        }
    }

    pub fn end(&self) -> f64 {
        match self {
            Self::Word(w) => w.end,
            Self::Silence(s) => s.end,
        }
    }

    /// Length of this item on the document timeline.
    pub fn duration(&self) -> f64 {
        self.end() - self.start()
    }

    pub fn is_word(&self) -> bool {
        matches!(self, Self::Word(_))
    }

    pub fn as_word(&self) -> Option<&Word> {
        match self {
            Self::Word(w) => Some(w),
            Self::Silence(_) => None,
        }
    }
}

impl From<Word> for ParagraphItem {
    fn from(word: Word) -> Self {
        Self::Word(word)
    }
}

impl From<Silence> for ParagraphItem {
    fn from(silence: Silence) -> Self {
        Self::Silence(silence)
    }
}

/// A speaker turn.
///
/// Generic over the item type so the same shape can carry timeline-annotated items
/// (`Paragraph<TimedItem>`, see [`crate::timeline::compute_timed`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph<I = ParagraphItem> {
    /// Speaker label. Empty when unknown.
    #[serde(default)]
    pub speaker: String,
    pub content: Vec<I>,
}

impl<I> Paragraph<I> {
    pub fn new(speaker: impl Into<String>, content: Vec<I>) -> Self {
        Self {
            speaker: speaker.into(),
            content,
        }
    }
}

/// Audio attached to a [`Source`] while a document is loaded.
///
/// Never persisted in the metadata entry; the raw bytes are written as their own archive entry
/// and the decoded audio is rebuilt on every load.
#[derive(Debug, Clone)]
pub struct SourceMedia {
    pub bytes: Arc<[u8]>,
    pub decoded: Arc<DecodedAudio>,
}

/// An audio asset referenced by paragraph items.
#[derive(Debug, Clone)]
pub struct Source {
    file_name: String,
    media: Option<SourceMedia>,
}

impl Source {
    /// A bare reference with no audio attached.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            media: None,
        }
    }

    /// A source with its raw bytes and decoded audio in memory.
    pub fn with_media(
        file_name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
        decoded: DecodedAudio,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media: Some(SourceMedia {
                bytes: bytes.into(),
                decoded: Arc::new(decoded),
            }),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media(&self) -> Option<&SourceMedia> {
        self.media.as_ref()
    }

    pub fn raw_bytes(&self) -> Option<&[u8]> {
        self.media.as_ref().map(|m| &*m.bytes)
    }

    pub fn decoded(&self) -> Option<&DecodedAudio> {
        self.media.as_ref().map(|m| &*m.decoded)
    }

    pub fn is_materialized(&self) -> bool {
        self.media.is_some()
    }

    pub(crate) fn attach(&mut self, media: SourceMedia) {
        self.media = Some(media);
    }

    /// Drop the in-memory audio, leaving only the file name.
    pub fn detach(&mut self) -> Option<SourceMedia> {
        self.media.take()
    }
}

/// A complete transcript: audio sources plus paragraphs in playback order.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub sources: Vec<Source>,
    pub content: Vec<Paragraph>,
}

impl Document {
    pub fn new(sources: Vec<Source>, content: Vec<Paragraph>) -> Self {
        Self { sources, content }
    }

    /// Check the model invariants.
    ///
    /// Fails with [`Error::InvariantViolation`] describing the first offending source or item.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.sources.len());
        for (idx, source) in self.sources.iter().enumerate() {
            let name = source.file_name();
            if name.is_empty() {
                return Err(Error::invariant(format!("source {idx} has an empty file name")));
            }
            if name == METADATA_ENTRY {
                return Err(Error::invariant(format!(
                    "source {idx} uses the reserved name '{METADATA_ENTRY}'"
                )));
            }
            if !seen.insert(name) {
                return Err(Error::invariant(format!(
                    "duplicate source file name '{name}'"
                )));
            }
        }

        for (p, paragraph) in self.content.iter().enumerate() {
            for (i, item) in paragraph.content.iter().enumerate() {
                let (source, start, end) = (item.source(), item.start(), item.end());
                if source >= self.sources.len() {
                    return Err(Error::invariant(format!(
                        "paragraph {p} item {i} references source {source}, but only {} exist",
                        self.sources.len()
                    )));
                }
                if !start.is_finite() || !end.is_finite() || start < 0.0 {
                    return Err(Error::invariant(format!(
                        "paragraph {p} item {i} has invalid timestamps ({start}, {end})"
                    )));
                }
                if start >= end {
                    return Err(Error::invariant(format!(
                        "paragraph {p} item {i} does not end after it starts ({start} >= {end})"
                    )));
                }
                // JSON has no NaN or infinity; such a value would not survive a save.
                if let Some(word) = item.as_word() {
                    if !word.conf.is_finite() {
                        return Err(Error::invariant(format!(
                            "paragraph {p} item {i} has a non-finite confidence ({})",
                            word.conf
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Stream every item with its position and absolute start.
    pub fn iter(&self) -> DocumentIter<'_> {
        DocumentIter::new(&self.content)
    }

    /// Stream the timeline starting at the item playing at `target_time`.
    pub fn seek(&self, target_time: f64) -> SkipToTime<DocumentIter<'_>> {
        SkipToTime::new(target_time, self.iter())
    }

    /// Length of the whole virtual timeline in seconds.
    pub fn duration(&self) -> f64 {
        self.content
            .iter()
            .flat_map(|p| &p.content)
            .map(ParagraphItem::duration)
            .sum()
    }

    pub fn item_count(&self) -> usize {
        self.content.iter().map(|p| p.content.len()).sum()
    }
}
