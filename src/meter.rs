//! The progress-state engine behind the meter line.
//!
//! This module defines [`Meter`], the central handle for updates. A `Meter`
//! is a cheap-to-clone [`Arc`]-based handle; all state sits behind a single
//! [`Mutex`](parking_lot::Mutex) so that every public operation — read the
//! counters, decide whether a redraw is due, render, write, update the
//! bookkeeping — runs as one uninterrupted critical section. Two threads
//! advancing the same meter can never interleave a partial render.
//!
//! # Redraw cadence
//!
//! Updates are frequent; redraws are not. A redraw happens when the counter
//! has grown by at least `miniters` since the last one *and* at least
//! `mininterval` seconds have passed, or unconditionally once the meter
//! completes. With `miniters` left at 0 the meter tunes itself: the first
//! burst of updates that arrives faster than `mininterval` raises
//! `miniters` to twice the burst size. The raise is one-way — the meter
//! never drops back to auto mode, trading responsiveness on slow phases for
//! a bounded redraw cost on fast ones.
//!
//! # Snapshots
//!
//! [`Meter::snapshot`] returns a plain-data [`MeterSnapshot`] with the
//! derived metrics (elapsed, rate, percentage) computed at that instant,
//! requiring no further locking to read.

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use compact_str::CompactString;
use parking_lot::Mutex;
use web_time::Instant;

use crate::builder::{MeterBuilder, MeterConfig};
use crate::postfix::Postfix;
use crate::render::{self, MeterParams};
use crate::term::{self, CLEAR_LINE, WriteLock};

/// Elapsed times at or below this are treated as zero when computing rates.
const RATE_EPSILON: f64 = 1e-6;

/// Slots in the per-meter rate-history window.
const RATE_WINDOW_LEN: usize = 10;

/// Fixed-capacity ring of rate samples, reserved for smoothed-rate
/// calculation. The configured smoothing factor is stored but not applied —
/// the displayed rate remains the instantaneous `n / elapsed` — so the
/// window is cleared on reset yet never sampled.
#[allow(dead_code)]
#[derive(Clone, Debug)]
struct RateWindow {
    samples: [f64; RATE_WINDOW_LEN],
    cursor: usize,
}

impl RateWindow {
    const fn new() -> Self {
        Self {
            samples: [0.0; RATE_WINDOW_LEN],
            cursor: 0,
        }
    }

    fn clear(&mut self) {
        *self = Self::new();
    }
}

/// Everything the meter owns, guarded by the instance lock.
struct State {
    cfg: MeterConfig,
    sink: Box<dyn Write + Send>,

    /// Current counter value. May exceed `cfg.total`.
    n: u64,
    /// Number of `advance` calls since creation or the last reset.
    count: u64,

    start: Instant,
    last_print: Instant,
    last_print_n: u64,

    closed: bool,
    pause_start: Option<Instant>,
    total_pause: Duration,

    rates: RateWindow,

    cached_ncols: u16,
    last_ncols_check: Option<Instant>,
}

struct Inner {
    state: Mutex<State>,
    write_lock: WriteLock,
}

/// A thread-safe, cloneable handle to a live progress meter.
///
/// Cloning is cheap (Arc bump) and clones share the same underlying state.
/// See the [module docs](self) for the locking and cadence model.
#[derive(Clone)]
pub struct Meter {
    inner: Arc<Inner>,
}

impl fmt::Debug for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Meter")
            .field("n", &state.n)
            .field("total", &state.cfg.total)
            .field("closed", &state.closed)
            .finish()
    }
}

impl Meter {
    /// Creates a meter with the given total and default configuration.
    ///
    /// Pass 0 when the total is unknown; the bar stays empty and remaining
    /// time renders as `?`.
    #[must_use]
    pub fn new(total: u64) -> Self {
        MeterBuilder::new().total(total).build()
    }

    /// Creates a byte-transfer meter: unit `B`, scaled, divisor 1024.
    #[must_use]
    pub fn bytes(total: u64) -> Self {
        MeterBuilder::new()
            .total(total)
            .unit("B")
            .unit_scale(true)
            .unit_divisor(1024.0)
            .build()
    }

    /// Finishes construction for [`MeterBuilder::build`].
    pub(crate) fn start(config: MeterConfig, sink: Box<dyn Write + Send>, write_lock: WriteLock) -> Self {
        let now = Instant::now();
        let n = config.initial;
        let state = State {
            n,
            count: 0,
            start: now,
            last_print: now,
            last_print_n: n,
            closed: false,
            pause_start: None,
            total_pause: Duration::ZERO,
            rates: RateWindow::new(),
            cached_ncols: 80,
            last_ncols_check: None,
            cfg: config,
            sink,
        };

        let delay = state.cfg.delay;
        if delay > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(delay));
        }

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                write_lock,
            }),
        }
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Advances the counter by `delta` (which may be 0) and redraws if the
    /// cadence allows.
    ///
    /// Silent no-op on a closed or disabled meter.
    pub fn advance(&self, delta: u64) {
        let mut state = self.inner.state.lock();
        if state.closed || state.cfg.disable {
            return;
        }

        state.n = state.n.saturating_add(delta);
        state.count += 1;

        let now = Instant::now();
        state.tune_miniters(now);
        let count_since = state.n.saturating_sub(state.last_print_n);
        if state.should_print(now, count_since) {
            state.render(now);
        }
    }

    /// Advances the counter by one.
    pub fn advance1(&self) {
        self.advance(1);
    }

    /// Moves the counter to an absolute value, in either direction.
    ///
    /// The cadence decision treats a rewind as zero growth. Returns whether
    /// a redraw happened; always `false` on a closed or disabled meter.
    pub fn set_at(&self, target: u64) -> bool {
        let mut state = self.inner.state.lock();
        if state.closed || state.cfg.disable {
            return false;
        }

        let count_since = target.saturating_sub(state.n);
        state.n = target;

        let now = Instant::now();
        state.tune_miniters(now);
        if state.should_print(now, count_since) {
            state.render(now);
            true
        } else {
            false
        }
    }

    /// Restarts the meter: counter back to the initial offset, timers and
    /// pause bookkeeping fresh, rate history cleared.
    ///
    /// The total is replaced only when `new_total > 0`. No-op once closed.
    pub fn reset(&self, new_total: u64) {
        let mut state = self.inner.state.lock();
        if state.closed {
            return;
        }

        let now = Instant::now();
        state.n = state.cfg.initial;
        state.count = 0;
        state.start = now;
        state.last_print = now;
        state.last_print_n = state.n;
        state.total_pause = Duration::ZERO;
        state.pause_start = None;
        state.rates.clear();

        if new_total > 0 {
            state.cfg.total = new_total;
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Finalizes the meter. Idempotent.
    ///
    /// With `leave` set (the default) a final render is forced and a
    /// trailing newline emitted, so the completed line stays on screen.
    /// Without it the line is erased.
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        if state.closed {
            return;
        }

        if state.cfg.leave && !state.cfg.disable {
            state.render(Instant::now());
            let _ = state.sink.write_all(b"\n");
            let _ = state.sink.flush();
        } else if !state.cfg.leave {
            state.clear_line();
        }

        state.closed = true;
    }

    /// Forces an immediate redraw, bypassing the cadence.
    ///
    /// No-op on a closed or disabled meter.
    pub fn refresh(&self) {
        let mut state = self.inner.state.lock();
        if state.closed || state.cfg.disable {
            return;
        }
        state.render(Instant::now());
    }

    /// Erases the current line without finalizing the meter.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        state.clear_line();
    }

    /// Stops the elapsed clock until [`unpause`](Self::unpause).
    ///
    /// No-op when already paused or closed.
    pub fn pause(&self) {
        let mut state = self.inner.state.lock();
        if state.closed || state.pause_start.is_some() {
            return;
        }
        state.pause_start = Some(Instant::now());
    }

    /// Restarts the elapsed clock, crediting the paused span.
    pub fn unpause(&self) {
        let mut state = self.inner.state.lock();
        if let Some(started) = state.pause_start.take() {
            state.total_pause += started.elapsed();
        }
    }

    // ========================================================================
    // Text fields
    // ========================================================================

    /// Replaces the description prefix, optionally forcing a redraw.
    pub fn set_description(&self, desc: impl Into<CompactString>, refresh: bool) {
        let mut state = self.inner.state.lock();
        if state.closed {
            return;
        }
        state.cfg.desc = desc.into();
        if refresh {
            state.render(Instant::now());
        }
    }

    /// Replaces the postfix text, optionally forcing a redraw.
    pub fn set_postfix_text(&self, postfix: impl Into<CompactString>, refresh: bool) {
        let mut state = self.inner.state.lock();
        if state.closed {
            return;
        }
        state.cfg.postfix = Some(postfix.into());
        if refresh {
            state.render(Instant::now());
        }
    }

    /// Stores a rendered snapshot of the caller's [`Postfix`] list.
    ///
    /// The list itself stays owned by the caller; later mutations of it do
    /// not affect the meter until the next call here.
    pub fn set_postfix(&self, postfix: &Postfix, refresh: bool) {
        self.set_postfix_text(postfix.format(), refresh);
    }

    // ========================================================================
    // Shared-stream coordination
    // ========================================================================

    /// Writes a full line above the meter, holding the shared write lock.
    ///
    /// The line replaces the meter's current content and ends with a
    /// newline; the next redraw repaints the meter below it. Stream errors
    /// are swallowed, as for renders.
    pub fn write_line(&self, message: &str) {
        let _guard = self.inner.write_lock.acquire();
        let mut state = self.inner.state.lock();
        let _ = writeln!(state.sink, "{CLEAR_LINE}{message}");
        let _ = state.sink.flush();
    }

    /// Writes a message at an advisory vertical offset.
    ///
    /// When both `pos` and the configured position are set, the message is
    /// bracketed by cursor-up/cursor-down escapes so several stacked meters
    /// can share a stream. Ordering across meters remains the caller's
    /// responsibility.
    pub fn display(&self, message: &str, pos: Option<u16>) {
        let mut state = self.inner.state.lock();
        if state.cfg.disable {
            return;
        }

        let hop = match (pos, state.cfg.position) {
            (Some(p), Some(_)) => Some(p),
            _ => None,
        };

        if let Some(p) = hop {
            let _ = write!(state.sink, "\x1b[{p}A\r");
        }
        let _ = write!(state.sink, "{CLEAR_LINE}{message}");
        if let Some(p) = hop {
            let _ = write!(state.sink, "\x1b[{p}B");
        }
        let _ = state.sink.flush();
    }

    /// Returns the write-lock handle this meter coordinates through.
    ///
    /// Hand it to [`crate::term::write_line`] or to other meters sharing
    /// the stream.
    #[must_use]
    pub fn write_lock(&self) -> WriteLock {
        self.inner.write_lock.clone()
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Current counter value.
    #[must_use]
    pub fn n(&self) -> u64 {
        self.inner.state.lock().n
    }

    /// Number of `advance` calls since creation or the last reset.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.inner.state.lock().count
    }

    /// Expected total, 0 when unknown.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.inner.state.lock().cfg.total
    }

    /// Current redraw threshold. Nonzero once auto-tuning has triggered.
    #[must_use]
    pub fn miniters(&self) -> u64 {
        self.inner.state.lock().cfg.miniters
    }

    /// Whether [`close`](Self::close) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Whether the elapsed clock is currently paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.state.lock().pause_start.is_some()
    }

    /// Captures a consistent view of the meter's derived metrics.
    #[must_use]
    pub fn snapshot(&self) -> MeterSnapshot {
        let state = self.inner.state.lock();
        let now = Instant::now();
        let elapsed = state.elapsed_secs(now);
        let rate = if elapsed > RATE_EPSILON {
            state.n as f64 / elapsed
        } else {
            0.0
        };
        let percentage = if state.cfg.total > 0 {
            100.0 * state.n as f64 / state.cfg.total as f64
        } else {
            0.0
        };

        MeterSnapshot {
            n: state.n,
            count: state.count,
            total: state.cfg.total,
            elapsed,
            rate,
            percentage,
            ncols: term::width(),
            nrows: term::height(),
            unit_divisor: state.cfg.unit_divisor,
        }
    }
}

impl State {
    /// Elapsed seconds with all pause time subtracted. Never negative.
    fn elapsed_secs(&self, now: Instant) -> f64 {
        let mut elapsed = now
            .saturating_duration_since(self.start)
            .saturating_sub(self.total_pause);
        if let Some(pause_start) = self.pause_start {
            elapsed = elapsed.saturating_sub(now.saturating_duration_since(pause_start));
        }
        elapsed.as_secs_f64()
    }

    /// One-way auto-tune: a burst faster than `mininterval` raises the
    /// iteration threshold to twice the burst size. Runs only while the
    /// threshold is still in auto mode (0).
    fn tune_miniters(&mut self, now: Instant) {
        if self.cfg.miniters != 0 {
            return;
        }
        let since_print = now.saturating_duration_since(self.last_print).as_secs_f64();
        if since_print <= 0.0 || since_print >= self.cfg.mininterval {
            return;
        }
        let count_since = self.n.saturating_sub(self.last_print_n);
        if count_since > 0 {
            self.cfg.miniters = count_since.saturating_mul(2);
        }
    }

    /// The cadence decision. Completion always prints; otherwise both the
    /// iteration threshold and the wall-clock interval must be satisfied.
    fn should_print(&self, now: Instant, count_since: u64) -> bool {
        let is_complete = self.cfg.total > 0 && self.n >= self.cfg.total;
        let iters_ok =
            is_complete || self.cfg.miniters == 0 || count_since >= self.cfg.miniters;
        if !iters_ok {
            return false;
        }
        is_complete
            || now.saturating_duration_since(self.last_print).as_secs_f64()
                >= self.cfg.mininterval
    }

    /// Resolves the column budget: the explicit width when one is set and
    /// dynamic sizing is off, else the terminal width cached for 1 second.
    fn resolve_ncols(&mut self, now: Instant) -> u16 {
        match self.cfg.ncols {
            Some(cols) if cols > 0 && !self.cfg.dynamic_ncols => cols,
            _ => {
                let fresh = self.last_ncols_check.is_some_and(|checked| {
                    now.saturating_duration_since(checked).as_secs_f64() < 1.0
                });
                if !fresh {
                    self.cached_ncols = term::width();
                    self.last_ncols_check = Some(now);
                }
                self.cached_ncols
            }
        }
    }

    /// Renders the meter line and updates the last-print bookkeeping.
    fn render(&mut self, now: Instant) {
        if self.closed || self.cfg.disable {
            return;
        }

        let elapsed = self.elapsed_secs(now);
        let rate = if elapsed > RATE_EPSILON {
            self.n as f64 / elapsed
        } else {
            0.0
        };
        let ncols = self.resolve_ncols(now);

        let line = render::format_meter(&MeterParams {
            n: self.n,
            total: self.cfg.total,
            elapsed,
            ncols,
            desc: &self.cfg.desc,
            ascii: self.cfg.ascii,
            unit: &self.cfg.unit,
            unit_scale: self.cfg.unit_scale,
            rate,
            bar_format: self.cfg.bar_format.as_deref(),
            postfix: self.cfg.postfix.as_deref().unwrap_or(""),
            unit_divisor: self.cfg.unit_divisor,
        });

        let _ = write!(self.sink, "{CLEAR_LINE}{line}");
        let _ = self.sink.flush();

        self.last_print = now;
        self.last_print_n = self.n;
    }

    /// Erases the meter's line. Respects `disable`.
    fn clear_line(&mut self) {
        if self.cfg.disable {
            return;
        }
        let _ = self.sink.write_all(CLEAR_LINE.as_bytes());
        let _ = self.sink.flush();
    }
}

/// A plain-data snapshot of a [`Meter`]'s derived metrics at one instant.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeterSnapshot {
    n: u64,
    count: u64,
    total: u64,
    elapsed: f64,
    rate: f64,
    percentage: f64,
    ncols: u16,
    nrows: u16,
    unit_divisor: f64,
}

impl MeterSnapshot {
    /// Counter value at snapshot time.
    #[must_use]
    pub const fn n(&self) -> u64 {
        self.n
    }

    /// Advance calls at snapshot time.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Expected total, 0 when unknown.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Elapsed seconds, pause time subtracted.
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Instantaneous rate in units per second.
    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    /// Completion percentage. Unclamped: overshoot reads above 100.
    #[must_use]
    pub const fn percentage(&self) -> f64 {
        self.percentage
    }

    /// Terminal width at snapshot time.
    #[must_use]
    pub const fn ncols(&self) -> u16 {
        self.ncols
    }

    /// Terminal height at snapshot time.
    #[must_use]
    pub const fn nrows(&self) -> u16 {
        self.nrows
    }

    /// Configured unit divisor.
    #[must_use]
    pub const fn unit_divisor(&self) -> f64 {
        self.unit_divisor
    }

    /// Seconds until completion at the current rate.
    ///
    /// `None` when the total is unknown, nothing has been counted yet, the
    /// rate is zero, or the meter has already reached its total.
    #[must_use]
    pub fn remaining_secs(&self) -> Option<f64> {
        if self.total > 0 && self.n > 0 && self.rate > 0.0 && self.n < self.total {
            Some((self.total - self.n) as f64 / self.rate)
        } else {
            None
        }
    }
}

/// Test support: an in-memory sink shared between the meter and the
/// asserting test.
#[cfg(test)]
pub(crate) mod testing {
    use std::io::{self, Write};
    use std::sync::Arc;

    use parking_lot::Mutex;

    /// Cloneable capture buffer; hand one clone to the builder as the sink
    /// and keep the other to inspect what was written.
    #[derive(Clone, Default)]
    pub(crate) struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl SharedSink {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
