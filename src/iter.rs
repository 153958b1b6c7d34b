//! Lazy, forward-only traversal of a document's content.
//!
//! [`DocumentIter`] walks paragraphs and their items in storage order and annotates every item
//! with its position and its start on the document timeline. It keeps a cursor and a running
//! sum, nothing else, so arbitrarily long documents can be streamed. To start over, build a new
//! iterator.

use std::iter::FusedIterator;

use serde::Serialize;

use crate::document::{Paragraph, ParagraphItem};

/// One item of a traversal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentItem<'a> {
    pub paragraph_idx: usize,
    pub item_idx: usize,
    /// Sum of the durations of every item before this one.
    pub absolute_start: f64,
    #[serde(flatten)]
    pub item: &'a ParagraphItem,
}

impl DocumentItem<'_> {
    /// Where this item stops on the document timeline.
    pub fn absolute_end(&self) -> f64 {
        self.absolute_start + self.item.duration()
    }
}

/// Streams [`DocumentItem`]s in document order.
#[derive(Debug, Clone)]
pub struct DocumentIter<'a> {
    content: &'a [Paragraph],
    paragraph: usize,
    item: usize,
    elapsed: f64,
}

impl<'a> DocumentIter<'a> {
    pub fn new(content: &'a [Paragraph]) -> Self {
        Self {
            content,
            paragraph: 0,
            item: 0,
            elapsed: 0.0,
        }
    }
}

impl<'a> Iterator for DocumentIter<'a> {
    type Item = DocumentItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let paragraph = self.content.get(self.paragraph)?;

            let Some(item) = paragraph.content.get(self.item) else {
                // Paragraph exhausted (or empty); move to the next one.
                self.paragraph += 1;
                self.item = 0;
                continue;
            };

            let out = DocumentItem {
                paragraph_idx: self.paragraph,
                item_idx: self.item,
                absolute_start: self.elapsed,
                item,
            };
            self.elapsed += item.duration();
            self.item += 1;
            return Some(out);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.content.get(self.paragraph..) {
            Some([first, rest @ ..]) => {
                first.content.len().saturating_sub(self.item)
                    + rest.iter().map(|p| p.content.len()).sum::<usize>()
            }
            _ => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DocumentIter<'_> {}

impl FusedIterator for DocumentIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Silence, Word};

    fn w(text: &str, start: f64, end: f64) -> ParagraphItem {
        ParagraphItem::Word(Word {
            word: text.to_string(),
            source: 0,
            start,
            end,
            conf: 1.0,
        })
    }

    fn s(start: f64, end: f64) -> ParagraphItem {
        ParagraphItem::Silence(Silence {
            source: 0,
            start,
            end,
        })
    }

    #[test]
    fn empty_content_yields_nothing() {
        assert_eq!(DocumentIter::new(&[]).count(), 0);
    }

    #[test]
    fn walks_across_paragraphs_with_running_time() {
        let content = vec![
            Paragraph::new("A", vec![w("one", 10.0, 10.5), s(10.5, 11.0)]),
            Paragraph::new("B", vec![]),
            Paragraph::new("A", vec![w("two", 3.0, 4.25)]),
        ];

        let seen: Vec<(usize, usize, f64)> = DocumentIter::new(&content)
            .map(|it| (it.paragraph_idx, it.item_idx, it.absolute_start))
            .collect();

        assert_eq!(seen, vec![(0, 0, 0.0), (0, 1, 0.5), (2, 0, 1.0)]);
    }

    #[test]
    fn absolute_end_adds_duration() {
        let content = vec![Paragraph::new("", vec![w("a", 1.0, 2.0), w("b", 7.0, 7.5)])];
        let last = DocumentIter::new(&content).last().map(|it| it.absolute_end());
        assert_eq!(last, Some(1.5));
    }

    #[test]
    fn size_hint_tracks_remaining_items() {
        let content = vec![
            Paragraph::new("", vec![s(0.0, 1.0), s(1.0, 2.0)]),
            Paragraph::new("", vec![]),
            Paragraph::new("", vec![s(0.0, 1.0)]),
        ];
        let mut it = DocumentIter::new(&content);
        assert_eq!(it.len(), 3);
        it.next();
        assert_eq!(it.len(), 2);
        it.next();
        it.next();
        assert_eq!(it.len(), 0);
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }

    #[test]
    fn serializes_with_item_fields_inline() -> anyhow::Result<()> {
        let content = vec![Paragraph::new("", vec![s(0.0, 1.0), w("hey", 1.0, 1.5)])];
        let items: Vec<_> = DocumentIter::new(&content).collect();
        let json = serde_json::to_value(items[1])?;
        assert_eq!(json["paragraphIdx"], 0);
        assert_eq!(json["itemIdx"], 1);
        assert_eq!(json["absoluteStart"], 1.0);
        assert_eq!(json["type"], "word");
        assert_eq!(json["word"], "hey");
        Ok(())
    }
}
