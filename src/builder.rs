//! Configuration and the fluent constructor for [`Meter`] instances.
//!
//! Simple meters come from [`Meter::new`] or [`Meter::bytes`]; the
//! [`MeterBuilder`] covers everything else, including injecting an output
//! sink (tests, files) and a shared [`WriteLock`] so several meters and a
//! logger can coexist on one stream.
//!
//! Out-of-range configuration values are silently replaced with defaults at
//! build time, never rejected: a negative refresh interval, a smoothing
//! factor outside `[0, 1]`, or a non-positive unit divisor each fall back to
//! their default.

use std::io::Write;

use compact_str::CompactString;

use crate::meter::Meter;
use crate::term::WriteLock;

/// Creation-time parameters for a meter.
///
/// This is an open parameter struct: construct one with
/// [`MeterConfig::default`], overwrite the fields you care about, and hand
/// it to [`MeterBuilder::from`]. The fluent methods on [`MeterBuilder`]
/// cover the same fields one by one.
#[derive(Clone, Debug)]
pub struct MeterConfig {
    /// Description prefix shown before the percentage. Empty for none.
    pub desc: CompactString,
    /// Expected total count. 0 means unknown.
    pub total: u64,
    /// Keep the final rendered line on close instead of erasing it.
    pub leave: bool,
    /// Explicit column width. `None` queries the terminal.
    pub ncols: Option<u16>,
    /// Minimum seconds between redraws.
    pub mininterval: f64,
    /// Minimum counter growth between redraws. 0 enables auto-tuning.
    pub miniters: u64,
    /// Render the bar with `#` cells instead of Unicode blocks.
    pub ascii: bool,
    /// Suppress all output and update side effects.
    pub disable: bool,
    /// Unit label appended to the rate.
    pub unit: CompactString,
    /// Format counts with metric prefixes instead of `k`/`m`/`b` suffixes.
    pub unit_scale: bool,
    /// Re-query the terminal width on every redraw window.
    pub dynamic_ncols: bool,
    /// Rate smoothing weight in `[0, 1]`. Stored and validated but not
    /// applied: the displayed rate is always the instantaneous `n / elapsed`.
    pub smoothing: f64,
    /// Custom format template. Non-empty switches the renderer to its
    /// simplified template mode.
    pub bar_format: Option<CompactString>,
    /// Initial counter offset.
    pub initial: u64,
    /// Advisory vertical offset for stacked meters. Not enforced.
    pub position: Option<u16>,
    /// Initial postfix text.
    pub postfix: Option<CompactString>,
    /// Divisor for unit scaling, 1000 or 1024.
    pub unit_divisor: f64,
    /// Colour tag. Stored for callers; the renderer does not apply it.
    pub colour: Option<CompactString>,
    /// Seconds to sleep before the meter becomes live.
    pub delay: f64,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            desc: CompactString::default(),
            total: 0,
            leave: true,
            ncols: None,
            mininterval: 0.1,
            miniters: 0,
            ascii: false,
            disable: false,
            unit: CompactString::const_new("it"),
            unit_scale: false,
            dynamic_ncols: false,
            smoothing: 0.3,
            bar_format: None,
            initial: 0,
            position: None,
            postfix: None,
            unit_divisor: 1000.0,
            colour: None,
            delay: 0.0,
        }
    }
}

impl MeterConfig {
    /// Replaces malformed values with defaults.
    pub(crate) fn sanitize(&mut self) {
        if self.mininterval < 0.0 {
            self.mininterval = 0.1;
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            self.smoothing = 0.3;
        }
        if self.unit_divisor <= 0.0 {
            self.unit_divisor = 1000.0;
        }
    }
}

/// A builder pattern for constructing [`Meter`] instances.
///
/// ```
/// use ritmo::MeterBuilder;
///
/// let meter = MeterBuilder::new()
///     .total(1000)
///     .desc("download")
///     .unit("B")
///     .unit_scale(true)
///     .unit_divisor(1024.0)
///     .build();
/// for _ in 0..4 {
///     meter.advance(256);
/// }
/// meter.close();
/// ```
#[derive(Default)]
pub struct MeterBuilder {
    config: MeterConfig,
    sink: Option<Box<dyn Write + Send>>,
    write_lock: Option<WriteLock>,
}

impl From<MeterConfig> for MeterBuilder {
    fn from(config: MeterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }
}

impl MeterBuilder {
    /// Starts a builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the description prefix.
    #[must_use]
    pub fn desc(mut self, desc: impl Into<CompactString>) -> Self {
        self.config.desc = desc.into();
        self
    }

    /// Sets the expected total. 0 means unknown.
    #[must_use]
    pub fn total(mut self, total: u64) -> Self {
        self.config.total = total;
        self
    }

    /// Keeps (or erases) the final line on close.
    #[must_use]
    pub fn leave(mut self, leave: bool) -> Self {
        self.config.leave = leave;
        self
    }

    /// Fixes the column width instead of querying the terminal.
    #[must_use]
    pub fn ncols(mut self, ncols: u16) -> Self {
        self.config.ncols = Some(ncols);
        self
    }

    /// Sets the minimum seconds between redraws.
    #[must_use]
    pub fn mininterval(mut self, seconds: f64) -> Self {
        self.config.mininterval = seconds;
        self
    }

    /// Sets the minimum counter growth between redraws. 0 enables
    /// auto-tuning.
    #[must_use]
    pub fn miniters(mut self, miniters: u64) -> Self {
        self.config.miniters = miniters;
        self
    }

    /// Switches the bar to ASCII cells.
    #[must_use]
    pub fn ascii(mut self, ascii: bool) -> Self {
        self.config.ascii = ascii;
        self
    }

    /// Disables the meter entirely.
    #[must_use]
    pub fn disable(mut self, disable: bool) -> Self {
        self.config.disable = disable;
        self
    }

    /// Sets the unit label.
    #[must_use]
    pub fn unit(mut self, unit: impl Into<CompactString>) -> Self {
        self.config.unit = unit.into();
        self
    }

    /// Formats counts with metric prefixes.
    #[must_use]
    pub fn unit_scale(mut self, unit_scale: bool) -> Self {
        self.config.unit_scale = unit_scale;
        self
    }

    /// Re-queries the terminal width while running.
    #[must_use]
    pub fn dynamic_ncols(mut self, dynamic: bool) -> Self {
        self.config.dynamic_ncols = dynamic;
        self
    }

    /// Sets the (stored, unapplied) smoothing factor.
    #[must_use]
    pub fn smoothing(mut self, smoothing: f64) -> Self {
        self.config.smoothing = smoothing;
        self
    }

    /// Sets a custom format template (simplified template mode).
    #[must_use]
    pub fn bar_format(mut self, format: impl Into<CompactString>) -> Self {
        self.config.bar_format = Some(format.into());
        self
    }

    /// Sets the initial counter offset.
    #[must_use]
    pub fn initial(mut self, initial: u64) -> Self {
        self.config.initial = initial;
        self
    }

    /// Sets the advisory stacked-meter position.
    #[must_use]
    pub fn position(mut self, position: u16) -> Self {
        self.config.position = Some(position);
        self
    }

    /// Sets the initial postfix text.
    #[must_use]
    pub fn postfix(mut self, postfix: impl Into<CompactString>) -> Self {
        self.config.postfix = Some(postfix.into());
        self
    }

    /// Sets the unit divisor (1000 or 1024).
    #[must_use]
    pub fn unit_divisor(mut self, divisor: f64) -> Self {
        self.config.unit_divisor = divisor;
        self
    }

    /// Sets the (stored, unapplied) colour tag.
    #[must_use]
    pub fn colour(mut self, colour: impl Into<CompactString>) -> Self {
        self.config.colour = Some(colour.into());
        self
    }

    /// Sleeps this many seconds before the meter becomes live.
    #[must_use]
    pub fn delay(mut self, seconds: f64) -> Self {
        self.config.delay = seconds;
        self
    }

    /// Redirects rendering to the given writer instead of stderr.
    ///
    /// Useful for writing to stdout, a file, or a capture buffer in tests.
    #[must_use]
    pub fn sink(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Shares a write lock with other meters and logging sites on the same
    /// stream. A private lock is created when none is supplied.
    #[must_use]
    pub fn write_lock(mut self, lock: WriteLock) -> Self {
        self.write_lock = Some(lock);
        self
    }

    /// Consumes the builder and returns the running meter.
    ///
    /// Malformed configuration values are replaced with defaults here. When
    /// a positive `delay` is configured, this call sleeps for that long
    /// before returning.
    #[must_use]
    pub fn build(self) -> Meter {
        let Self {
            mut config,
            sink,
            write_lock,
        } = self;
        config.sanitize();

        let sink = sink.unwrap_or_else(|| Box::new(std::io::stderr()));
        let write_lock = write_lock.unwrap_or_default();

        Meter::start(config, sink, write_lock)
    }
}

#[cfg(test)]
mod tests {
    use super::{MeterBuilder, MeterConfig};

    /// Defaults
    /// The zero-configuration meter matches the documented defaults.
    #[test]
    fn test_defaults() {
        let config = MeterConfig::default();

        assert_eq!(config.total, 0);
        assert!(config.leave);
        assert_eq!(config.ncols, None);
        assert!((config.mininterval - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.miniters, 0);
        assert_eq!(config.unit, "it");
        assert!((config.unit_divisor - 1000.0).abs() < f64::EPSILON);
    }

    /// Sanitization
    /// Malformed values are silently defaulted, never rejected.
    #[test]
    fn test_sanitize_malformed() {
        let mut config = MeterConfig {
            mininterval: -5.0,
            smoothing: 2.0,
            unit_divisor: 0.0,
            ..MeterConfig::default()
        };
        config.sanitize();

        assert!((config.mininterval - 0.1).abs() < f64::EPSILON);
        assert!((config.smoothing - 0.3).abs() < f64::EPSILON);
        assert!((config.unit_divisor - 1000.0).abs() < f64::EPSILON);
    }

    /// Builder Passthrough
    /// Fluent setters land in the built meter's configuration.
    #[test]
    fn test_builder_passthrough() {
        let meter = MeterBuilder::new()
            .total(500)
            .desc("stage")
            .initial(20)
            .disable(true)
            .build();

        assert_eq!(meter.total(), 500);
        assert_eq!(meter.n(), 20);
    }
}
