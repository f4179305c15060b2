//! # `ritmo`
//!
//! A thread-safe, single-line terminal progress meter with an adaptive
//! redraw cadence.
//!
//! `ritmo` (rhythm, in Spanish) draws a live meter — percentage, bar with
//! sub-character resolution, counts, elapsed/remaining time, rate — and
//! decides *when* to redraw so tight loops do not flood the stream. It is
//! designed to be:
//!
//! * **Cheap to update**: redraws are throttled by a wall-clock interval and
//!   a self-tuning iteration threshold; most `advance` calls touch only the
//!   counters.
//! * **Concurrent**: a [`Meter`] handle is cheap to clone ([`Arc`]-based)
//!   and safe to share across threads; every operation is one uninterrupted
//!   critical section, so renders never interleave.
//! * **Stream-friendly**: each redraw overwrites the previous line in
//!   place, and a shared [`WriteLock`] lets log lines and multiple meters
//!   coexist on one stream.
//!
//! ```
//! use ritmo::Meter;
//!
//! let meter = Meter::new(1000);
//! for _ in 0..1000 {
//!     // ...
//!     meter.advance(1);
//! }
//! meter.close();
//! ```
//!
//! ## Modules
//!
//! * [`builder`]: [`MeterConfig`] and the fluent [`MeterBuilder`].
//! * [`env`]: `RITMO_*` environment-variable overlay.
//! * [`format`]: human-readable count/size/duration formatting.
//! * [`io`]: [`Read`](std::io::Read)/[`Write`](std::io::Write) wrappers
//!   that meter byte transfer.
//! * [`iter`]: extension trait metering any [`Iterator`].
//! * [`meter`]: the [`Meter`] state engine and snapshot logic.
//! * [`postfix`]: ordered key=value annotations for the line's tail.
//! * [`render`]: assembly of the meter line and bar glyphs.
//! * [`term`]: terminal measurement and the shared [`WriteLock`].
//!
//! [`Arc`]: std::sync::Arc

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod builder;
pub mod env;
pub mod format;
pub mod io;
pub mod iter;
pub mod meter;
pub mod postfix;
pub mod render;
pub mod term;

pub use builder::{MeterBuilder, MeterConfig};
pub use iter::{MeterIter, ProgressIterator};
pub use meter::{Meter, MeterSnapshot};
pub use postfix::{Postfix, PostfixValue};
pub use term::WriteLock;
