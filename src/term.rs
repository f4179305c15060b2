//! Terminal measurement and coordination of interleaved writes.
//!
//! The meter redraws in place by emitting a carriage return and a
//! line-clear escape before each render. Anything else written to the same
//! stream mid-render would shear the line, so external writes go through a
//! shared [`WriteLock`]: the meter holds it while drawing, and callers hold
//! it while printing their own lines via [`write_line`].
//!
//! The lock is an explicit, cloneable handle rather than process-global
//! state. Construction sites that want several meters and their log output
//! coordinated pass one handle to all of them; a meter built without one
//! gets a private default.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

/// Escape sequence that clears from the cursor to the end of the line.
pub(crate) const CLEAR_LINE: &str = "\r\x1b[K";

/// Queries the terminal width in columns, falling back to 80 when the
/// output is not a terminal.
#[must_use]
pub fn width() -> u16 {
    crossterm::terminal::size().map_or(80, |(cols, _)| cols)
}

/// Queries the terminal height in rows, falling back to 24.
#[must_use]
pub fn height() -> u16 {
    crossterm::terminal::size().map_or(24, |(_, rows)| rows)
}

/// A cloneable lock handle coordinating writes to a shared output stream.
///
/// Cloning is cheap and clones share the same underlying lock. Pass one
/// handle to every meter (and every logging site) that shares a stream.
#[derive(Clone, Debug, Default)]
pub struct WriteLock {
    inner: Arc<Mutex<()>>,
}

/// RAII guard returned by [`WriteLock::acquire`]. The stream is yours until
/// it drops.
pub type WriteGuard<'a> = MutexGuard<'a, ()>;

impl WriteLock {
    /// Creates a fresh, unshared lock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the stream is free and returns a guard holding it.
    ///
    /// Use this to bracket a batch of external writes so no meter redraw
    /// lands in the middle:
    ///
    /// ```
    /// use ritmo::WriteLock;
    ///
    /// let lock = WriteLock::new();
    /// {
    ///     let _guard = lock.acquire();
    ///     eprintln!("several");
    ///     eprintln!("uninterrupted lines");
    /// }
    /// ```
    #[must_use]
    pub fn acquire(&self) -> WriteGuard<'_> {
        self.inner.lock()
    }
}

/// Writes a message above the meter, holding `lock` for the duration.
///
/// The message is prefixed with a carriage return and a line-clear so it
/// replaces whatever meter content occupies the line, and followed by `end`
/// (typically `"\n"`) so the next redraw starts on a clean line.
///
/// # Errors
///
/// Propagates any error from the underlying writer.
pub fn write_line<W: Write>(lock: &WriteLock, out: &mut W, text: &str, end: &str) -> io::Result<()> {
    let _guard = lock.acquire();
    write!(out, "{CLEAR_LINE}{text}{end}")?;
    out.flush()
}
