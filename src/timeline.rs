//! The document-wide virtual timeline.
//!
//! Every item's absolute start is the sum of the durations of all items before it, across
//! paragraph boundaries, regardless of which source the items come from. The whole document
//! therefore plays back as one continuous line starting at zero.

use serde::Serialize;

use crate::document::{Paragraph, ParagraphItem};
use crate::iter::DocumentIter;

/// A paragraph item annotated with its start on the document timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedItem {
    #[serde(flatten)]
    pub item: ParagraphItem,
    #[serde(rename = "absoluteStart")]
    pub absolute_start: f64,
}

/// Annotate every item of `content` with its absolute start.
///
/// The paragraph structure (speakers, item order, empty paragraphs) is preserved.
pub fn compute_timed(content: &[Paragraph]) -> Vec<Paragraph<TimedItem>> {
    let mut timed: Vec<Paragraph<TimedItem>> = content
        .iter()
        .map(|p| Paragraph::new(p.speaker.clone(), Vec::with_capacity(p.content.len())))
        .collect();

    for entry in DocumentIter::new(content) {
        timed[entry.paragraph_idx].content.push(TimedItem {
            item: entry.item.clone(),
            absolute_start: entry.absolute_start,
        });
    }

    timed
}
