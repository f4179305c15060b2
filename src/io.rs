//! I/O wrappers metering data transfer.
//!
//! [`MeterReader`] and [`MeterWriter`] wrap any [`std::io::Read`] or
//! [`std::io::Write`] and advance a [`Meter`] by the number of bytes that
//! actually moved. Pair them with [`Meter::bytes`] so counts render as
//! sizes (`1.50kB`, `12.3MB/s`) with the 1024 divisor:
//!
//! ```no_run
//! use std::{fs::File, io};
//!
//! use ritmo::{Meter, io::MeterReader};
//!
//! # fn main() -> io::Result<()> {
//! let file = File::open("dump.bin")?;
//! let total = file.metadata()?.len();
//! let mut reader = MeterReader::new(file, Meter::bytes(total));
//! io::copy(&mut reader, &mut io::sink())?;
//! # Ok(())
//! # }
//! ```
//!
//! Transfer errors propagate untouched; the meter only ever observes
//! successful reads and writes.

use std::io::{self, Read, Write};

use crate::meter::Meter;

/// A wrapper around [`Read`] that advances a [`Meter`] by bytes read.
pub struct MeterReader<R> {
    inner: R,
    meter: Meter,
}

impl<R> MeterReader<R> {
    /// Wraps `inner`, advancing the given meter.
    pub const fn new(inner: R, meter: Meter) -> Self {
        Self { inner, meter }
    }

    /// Returns a handle to the driven meter.
    #[must_use]
    pub fn meter(&self) -> &Meter {
        &self.meter
    }

    /// Unwraps, closing the meter and returning the inner reader.
    pub fn finish(self) -> R {
        self.meter.close();
        self.inner
    }
}

impl<R: Read> Read for MeterReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.meter.advance(n as u64);
        Ok(n)
    }
}

/// A wrapper around [`Write`] that advances a [`Meter`] by bytes written.
pub struct MeterWriter<W> {
    inner: W,
    meter: Meter,
}

impl<W> MeterWriter<W> {
    /// Wraps `inner`, advancing the given meter.
    pub const fn new(inner: W, meter: Meter) -> Self {
        Self { inner, meter }
    }

    /// Returns a handle to the driven meter.
    #[must_use]
    pub fn meter(&self) -> &Meter {
        &self.meter
    }

    /// Unwraps, closing the meter and returning the inner writer.
    pub fn finish(self) -> W {
        self.meter.close();
        self.inner
    }
}

impl<W: Write> Write for MeterWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.meter.advance(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read as _, Write as _};

    use super::{MeterReader, MeterWriter};
    use crate::builder::MeterBuilder;
    use crate::meter::testing::SharedSink;

    fn quiet_meter(total: u64) -> crate::meter::Meter {
        MeterBuilder::new()
            .total(total)
            .ncols(60)
            .sink(Box::new(SharedSink::new()))
            .build()
    }

    /// Reader Metering
    /// Bytes read are counted; short reads count what arrived.
    #[test]
    fn test_reader_counts_bytes() {
        let data = vec![0u8; 100];
        let meter = quiet_meter(100);
        let mut reader = MeterReader::new(Cursor::new(&data), meter.clone());

        let mut buf = [0u8; 10];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(meter.n(), 10);

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(meter.n(), 100);
    }

    /// Writer Metering
    /// Bytes written are counted and `finish` closes the meter.
    #[test]
    fn test_writer_counts_bytes() {
        let meter = quiet_meter(5);
        let mut writer = MeterWriter::new(Vec::new(), meter.clone());

        writer.write_all(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(meter.n(), 5);

        let inner = writer.finish();
        assert_eq!(inner, vec![1, 2, 3, 4, 5]);
        assert!(meter.is_closed());
    }

    /// Bytes-Mode Rendering
    /// A `Meter::bytes`-style meter formats the counters as sizes.
    #[test]
    fn test_bytes_mode_formats_sizes() {
        let sink = SharedSink::new();
        let meter = MeterBuilder::new()
            .total(2048)
            .unit("B")
            .unit_scale(true)
            .unit_divisor(1024.0)
            .ncols(60)
            .sink(Box::new(sink.clone()))
            .build();

        let mut writer = MeterWriter::new(std::io::sink(), meter);
        writer.write_all(&vec![0u8; 2048]).unwrap();

        let out = sink.contents();
        assert!(out.contains("2kB/2kB"), "got {out:?}");
    }
}
