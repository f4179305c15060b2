//! Iterator adapters for automatic progress metering.
//!
//! This module provides the [`ProgressIterator`] trait, which adds helper
//! methods to any Rust [`Iterator`]. This attaches a meter to a loop with a
//! single method call; the meter advances once per yielded item and closes
//! when the iterator runs dry.
//!
//! # Totals
//!
//! The adapters check [`Iterator::size_hint`]: an exact upper bound becomes
//! the meter's total, anything else leaves the total unknown (0), which
//! renders an empty bar and `?` placeholders.
//!
//! ```
//! use ritmo::ProgressIterator;
//!
//! // The total is inferred from the range's exact size.
//! for _ in (0..100).progress() {
//!     // ...
//! }
//! ```

use crate::builder::MeterBuilder;
use crate::meter::Meter;

/// An iterator adapter that advances a [`Meter`] on every yielded item.
pub struct MeterIter<I> {
    iter: I,
    meter: Meter,
}

impl<I> MeterIter<I> {
    /// Wraps `iter`, driving the given meter.
    ///
    /// Usually constructed via [`ProgressIterator`] methods.
    pub const fn new(iter: I, meter: Meter) -> Self {
        Self { iter, meter }
    }

    /// Returns a handle to the driven meter, e.g. to set a description or
    /// postfix mid-loop.
    #[must_use]
    pub fn meter(&self) -> &Meter {
        &self.meter
    }
}

impl<I: Iterator> Iterator for MeterIter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.iter.next();

        if item.is_some() {
            self.meter.advance(1);
        } else {
            // Exhaustion finalizes the meter.
            self.meter.close();
        }

        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

/// Extension trait attaching a progress meter to any [`Iterator`].
pub trait ProgressIterator: Sized {
    /// Wraps the iterator in a fresh meter, inferring the total from
    /// `size_hint` when it is exact.
    fn progress(self) -> MeterIter<Self>;

    /// Wraps the iterator in a fresh meter with the given description.
    fn progress_desc(self, desc: &str) -> MeterIter<Self>;

    /// Wraps the iterator in a fresh meter with an explicit total.
    fn progress_count(self, total: u64) -> MeterIter<Self>;

    /// Wraps the iterator, driving an existing meter.
    fn progress_with(self, meter: Meter) -> MeterIter<Self>;

    /// The total implied by `size_hint`: the exact upper bound, or 0 when
    /// the size is unknown.
    fn hinted_total(&self) -> u64;
}

impl<I: Iterator> ProgressIterator for I {
    fn progress(self) -> MeterIter<Self> {
        let total = self.hinted_total();
        MeterIter::new(self, Meter::new(total))
    }

    fn progress_desc(self, desc: &str) -> MeterIter<Self> {
        let total = self.hinted_total();
        let meter = MeterBuilder::new().total(total).desc(desc).build();
        MeterIter::new(self, meter)
    }

    fn progress_count(self, total: u64) -> MeterIter<Self> {
        MeterIter::new(self, Meter::new(total))
    }

    fn progress_with(self, meter: Meter) -> MeterIter<Self> {
        MeterIter::new(self, meter)
    }

    fn hinted_total(&self) -> u64 {
        let (lower, upper) = self.size_hint();
        match upper {
            Some(upper) if upper == lower => upper as u64,
            _ => 0,
        }
    }
}
