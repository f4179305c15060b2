//! Pipe monitor: draws a meter for data flowing through stdin.
//!
//! By default every occurrence of the delimiter (newline) advances the
//! meter; `--delim '\0'` switches to counting raw bytes, `--tee` mirrors
//! the stream to stdout, and `--update`/`--update-to` instead interpret
//! each input line as a numeric counter update.

use std::fs::File;
use std::io::{self, BufRead, IsTerminal, Read, Write};

use anyhow::{Context, Result};
use clap::Parser;

use ritmo::env::overlay_env;
use ritmo::{Meter, MeterBuilder, MeterConfig};

#[derive(Parser, Debug)]
#[command(
    name = "ritmo",
    version,
    about = "Monitor progress of data through a pipe"
)]
struct Args {
    /// Prefix for the meter line.
    #[arg(long)]
    desc: Option<String>,

    /// Total expected items or bytes (0 = unknown).
    #[arg(long, default_value_t = 0)]
    total: u64,

    /// Leave the meter on screen after completion (default).
    #[arg(long, overrides_with = "no_leave")]
    leave: bool,

    /// Erase the meter on completion.
    #[arg(long, overrides_with = "leave")]
    no_leave: bool,

    /// Output target: stderr (default), stdout, or a file path.
    #[arg(long, default_value = "stderr")]
    file: String,

    /// Fixed meter width in columns.
    #[arg(long)]
    ncols: Option<u16>,

    /// Minimum seconds between redraws.
    #[arg(long)]
    mininterval: Option<f64>,

    /// Minimum iterations between redraws (0 = auto-tune).
    #[arg(long)]
    miniters: Option<u64>,

    /// Use ASCII bar characters.
    #[arg(long)]
    ascii: bool,

    /// Disable the meter entirely.
    #[arg(long)]
    disable: bool,

    /// Unit text (default "it").
    #[arg(long)]
    unit: Option<String>,

    /// Auto-scale units with metric prefixes.
    #[arg(long)]
    unit_scale: bool,

    /// Re-query the terminal width while running.
    #[arg(long)]
    dynamic_ncols: bool,

    /// Rate smoothing factor in [0, 1].
    #[arg(long)]
    smoothing: Option<f64>,

    /// Custom bar format (simplified template mode).
    #[arg(long)]
    bar_format: Option<String>,

    /// Initial counter value.
    #[arg(long)]
    initial: Option<u64>,

    /// Line position for stacked meters.
    #[arg(long)]
    position: Option<u16>,

    /// Postfix text.
    #[arg(long)]
    postfix: Option<String>,

    /// Unit divisor (1000 or 1024).
    #[arg(long)]
    unit_divisor: Option<f64>,

    /// Meter colour tag.
    #[arg(long)]
    colour: Option<String>,

    /// Initial delay before showing (seconds).
    #[arg(long)]
    delay: Option<f64>,

    /// Bytes mode: unit B, scaled, divisor 1024.
    #[arg(long)]
    bytes: bool,

    /// Delimiter to count; "\n" (default), "\0" for raw bytes, or any
    /// single character.
    #[arg(long, default_value = "\\n")]
    delim: String,

    /// I/O buffer size in bytes.
    #[arg(long, default_value_t = 8192)]
    buf_size: usize,

    /// Copy input to stdout as well.
    #[arg(long)]
    tee: bool,

    /// Treat each input line as an increment.
    #[arg(long)]
    update: bool,

    /// Treat each input line as an absolute counter value.
    #[arg(long, conflicts_with = "update")]
    update_to: bool,

    /// Permit NUL bytes in teed output.
    #[arg(long)]
    null: bool,
}

/// Environment first, then flags: explicit arguments win.
fn config_from(args: &Args) -> MeterConfig {
    let mut config = MeterConfig::default();
    overlay_env(&mut config);

    if let Some(desc) = &args.desc {
        config.desc = desc.as_str().into();
    }
    config.total = args.total;
    config.leave = !args.no_leave;
    if args.ncols.is_some() {
        config.ncols = args.ncols;
    }
    if let Some(mininterval) = args.mininterval {
        config.mininterval = mininterval;
    }
    if let Some(miniters) = args.miniters {
        config.miniters = miniters;
    }
    if args.ascii {
        config.ascii = true;
    }
    if args.disable {
        config.disable = true;
    }
    if let Some(unit) = &args.unit {
        config.unit = unit.as_str().into();
    }
    if args.unit_scale {
        config.unit_scale = true;
    }
    if args.dynamic_ncols {
        config.dynamic_ncols = true;
    }
    if let Some(smoothing) = args.smoothing {
        config.smoothing = smoothing;
    }
    if let Some(bar_format) = &args.bar_format {
        config.bar_format = Some(bar_format.as_str().into());
    }
    if let Some(initial) = args.initial {
        config.initial = initial;
    }
    if args.position.is_some() {
        config.position = args.position;
    }
    if let Some(postfix) = &args.postfix {
        config.postfix = Some(postfix.as_str().into());
    }
    if let Some(unit_divisor) = args.unit_divisor {
        config.unit_divisor = unit_divisor;
    }
    if let Some(colour) = &args.colour {
        config.colour = Some(colour.as_str().into());
    }
    if let Some(delay) = args.delay {
        config.delay = delay;
    }

    if args.bytes {
        config.unit = "B".into();
        config.unit_scale = true;
        config.unit_divisor = 1024.0;
    }

    config
}

fn open_sink(target: &str) -> Result<Box<dyn Write + Send>> {
    Ok(match target {
        "stderr" => Box::new(io::stderr()),
        "stdout" => Box::new(io::stdout()),
        path => {
            Box::new(File::create(path).with_context(|| format!("failed to open {path}"))?)
        }
    })
}

fn parse_delim(raw: &str) -> u8 {
    match raw {
        "\\n" => b'\n',
        "\\0" | "0" => 0,
        other => other.as_bytes().first().copied().unwrap_or(b'\n'),
    }
}

/// Numeric-line mode: each parseable line adjusts the counter.
fn run_updates(meter: &Meter, input: impl BufRead, tee: bool, absolute: bool) -> Result<u64> {
    let mut processed = 0;
    for line in input.lines() {
        let line = line.context("failed to read stdin")?;
        let Ok(value) = line.trim().parse::<f64>() else {
            continue;
        };
        if absolute {
            meter.set_at(value as u64);
        } else {
            meter.advance(value as u64);
        }
        processed += 1;
        if tee {
            println!("{line}");
        }
    }
    Ok(processed)
}

/// Stream mode: count delimiter occurrences, or raw bytes when the
/// delimiter is NUL.
fn run_stream(
    meter: &Meter,
    mut input: impl Read,
    mut tee: Option<impl Write>,
    delim: u8,
    buf_size: usize,
) -> Result<u64> {
    let mut buf = vec![0u8; buf_size.max(1)];
    let mut processed = 0u64;

    loop {
        let read = input.read(&mut buf).context("failed to read stdin")?;
        if read == 0 {
            break;
        }
        if let Some(out) = tee.as_mut() {
            out.write_all(&buf[..read]).context("failed to tee stdout")?;
        }

        if delim == 0 {
            meter.advance(read as u64);
            processed += read as u64;
        } else {
            for _ in buf[..read].iter().filter(|&&b| b == delim) {
                meter.advance(1);
                processed += 1;
            }
        }
    }

    if let Some(out) = tee.as_mut() {
        out.flush().context("failed to flush stdout")?;
    }
    Ok(processed)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = config_from(&args);
    let sink = open_sink(&args.file)?;
    let meter = MeterBuilder::from(config).sink(sink).build();

    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprintln!("Reading from terminal (Ctrl+D to end)");
    }

    let delim = parse_delim(&args.delim);
    if args.update || args.update_to {
        run_updates(&meter, stdin.lock(), args.tee && !args.null, args.update_to)?;
    } else {
        let tee = args.tee.then(io::stdout);
        run_stream(&meter, stdin.lock(), tee, delim, args.buf_size)?;
    }

    meter.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_delim, run_stream, run_updates};
    use ritmo::MeterBuilder;

    fn quiet_meter(total: u64) -> ritmo::Meter {
        MeterBuilder::new()
            .total(total)
            .ncols(60)
            .disable(true)
            .build()
    }

    /// Delimiter Parsing
    /// Escapes map to control bytes; anything else takes its first byte.
    #[test]
    fn test_parse_delim() {
        assert_eq!(parse_delim("\\n"), b'\n');
        assert_eq!(parse_delim("\\0"), 0);
        assert_eq!(parse_delim("0"), 0);
        assert_eq!(parse_delim(","), b',');
        assert_eq!(parse_delim(""), b'\n');
    }

    /// Stream Counting
    /// Newline mode counts delimiters; NUL mode counts bytes; tee mirrors
    /// the input unchanged.
    #[test]
    fn test_run_stream() {
        let meter = quiet_meter(0);
        let input: &[u8] = b"one\ntwo\nthree\n";
        let mut teed = Vec::new();

        let lines = run_stream(&meter, input, Some(&mut teed), b'\n', 8).unwrap();
        assert_eq!(lines, 3);
        assert_eq!(teed, b"one\ntwo\nthree\n");

        let meter = quiet_meter(0);
        let input: &[u8] = b"12345";
        let bytes =
            run_stream(&meter, input, None::<&mut Vec<u8>>, 0, 2).unwrap();
        assert_eq!(bytes, 5);
    }

    /// Update Modes
    /// Numeric lines adjust the counter; non-numeric lines are skipped.
    #[test]
    fn test_run_updates() {
        let sink_meter = MeterBuilder::new().total(100).ncols(60).disable(false);
        let meter = sink_meter
            .sink(Box::new(std::io::sink()))
            .build();

        let input: &[u8] = b"5\nnot-a-number\n7\n";
        let processed = run_updates(&meter, input, false, false).unwrap();

        assert_eq!(processed, 2);
        assert_eq!(meter.n(), 12);
    }
}
