//! Single-pass "seek to timestamp" over a timeline stream.
//!
//! [`SkipToTime`] wraps any iterator of timed items and yields the suffix that starts at the
//! last item whose absolute start is `<=` the target, i.e. the item playing at that moment.
//! Because the stream only reveals that an item was the last one at-or-before the target once
//! the *next* item has been seen, the adapter runs one item behind its input. It holds at most
//! one buffered item and never rewinds the input.

use std::iter::FusedIterator;

use crate::iter::DocumentItem;
use crate::timeline::TimedItem;

/// Anything positioned on the document timeline.
pub trait Timed {
    fn absolute_start(&self) -> f64;
}

impl Timed for DocumentItem<'_> {
    fn absolute_start(&self) -> f64 {
        self.absolute_start
    }
}

impl Timed for TimedItem {
    fn absolute_start(&self) -> f64 {
        self.absolute_start
    }
}

impl<T: Timed + ?Sized> Timed for &T {
    fn absolute_start(&self) -> f64 {
        (**self).absolute_start()
    }
}

/// Iterator adapter returned by [`skip_to_time`] and [`SeekExt::skip_to_time`].
#[derive(Debug, Clone)]
pub struct SkipToTime<I: Iterator> {
    target: f64,
    inner: I,
    candidate: Option<I::Item>,
    exhausted: bool,
}

impl<I: Iterator> SkipToTime<I> {
    pub fn new(target: f64, inner: I) -> Self {
        Self {
            target,
            inner,
            candidate: None,
            exhausted: false,
        }
    }

    pub fn target(&self) -> f64 {
        self.target
    }
}

impl<I> Iterator for SkipToTime<I>
where
    I: Iterator,
    I::Item: Timed,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        while let Some(item) = self.inner.next() {
            let past_target = item.absolute_start() > self.target;
            let previous = self.candidate.replace(item);
            if past_target && previous.is_some() {
                return previous;
            }
        }

        // The input is drained. The remaining candidate is the final item; it belongs to the
        // output unless it starts strictly before the target.
        self.exhausted = true;
        self.candidate
            .take()
            .filter(|last| last.absolute_start() >= self.target)
    }
}

impl<I> FusedIterator for SkipToTime<I>
where
    I: Iterator,
    I::Item: Timed,
{
}

/// Skip `iter` forward to the item playing at `target_time`.
pub fn skip_to_time<I>(target_time: f64, iter: I) -> SkipToTime<I::IntoIter>
where
    I: IntoIterator,
    I::Item: Timed,
{
    SkipToTime::new(target_time, iter.into_iter())
}

/// Adds [`skip_to_time`](SeekExt::skip_to_time) to every iterator of timed items.
pub trait SeekExt: Iterator + Sized
where
    Self::Item: Timed,
{
    fn skip_to_time(self, target_time: f64) -> SkipToTime<Self> {
        SkipToTime::new(target_time, self)
    }
}

impl<I> SeekExt for I
where
    I: Iterator,
    I::Item: Timed,
{
}
