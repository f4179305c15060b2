//! Rendering of the single meter line.
//!
//! [`format_meter`] composes the formatters in [`crate::format`] with the
//! bar glyphs into one display string. Token order and separators are a
//! compatibility contract: consumers grep the rendered line for exact
//! substrings, so the assembly below must not be reordered.

use crate::format::{format_interval, format_num, format_sizeof};

/// Block glyphs for the Unicode bar, from empty through seven eighths to a
/// full cell.
pub const UNICODE_BLOCKS: [&str; 9] = [" ", "▏", "▎", "▍", "▌", "▋", "▊", "▉", "█"];

/// Fill and pad characters for the ASCII bar.
pub const ASCII_FILL: char = '#';
const ASCII_PAD: char = ' ';

/// Everything one render of the meter line needs, captured under the
/// instance lock.
#[derive(Clone, Copy, Debug)]
pub struct MeterParams<'a> {
    /// Current counter value. May exceed `total`.
    pub n: u64,
    /// Expected total, 0 when unknown.
    pub total: u64,
    /// Elapsed seconds, pause time already subtracted.
    pub elapsed: f64,
    /// Resolved terminal width in columns.
    pub ncols: u16,
    /// Description prefix, empty for none.
    pub desc: &'a str,
    /// Render the bar with `#` cells instead of Unicode blocks.
    pub ascii: bool,
    /// Unit label, e.g. `"it"` or `"B"`.
    pub unit: &'a str,
    /// Format counts through [`format_sizeof`] instead of [`format_num`].
    pub unit_scale: bool,
    /// Instantaneous rate in units per second, 0 when elapsed is ~0.
    pub rate: f64,
    /// Custom format template. Non-empty switches to template mode.
    pub bar_format: Option<&'a str>,
    /// Rendered postfix annotations, empty for none.
    pub postfix: &'a str,
    /// 1000 or 1024, forwarded to [`format_sizeof`].
    pub unit_divisor: f64,
}

/// Renders the meter line for the given inputs.
///
/// A non-empty `bar_format` selects template mode, which emits the fixed
/// shape `"<desc>: <n>/<total> [<elapsed>s, <rate>it/s] <postfix>"`. This is
/// a simplified stand-in for the configured template, not a template engine.
///
/// Standard mode renders
/// `"<desc>: <pct>%|<bar>| <n>/<total> [<elapsed><remaining>, <rate><unit>/s] <postfix>"`
/// with unknown quantities shown as `"?"`.
#[must_use]
pub fn format_meter(params: &MeterParams<'_>) -> String {
    let MeterParams {
        n,
        total,
        elapsed,
        ncols,
        desc,
        ascii,
        unit,
        unit_scale,
        rate,
        bar_format,
        postfix,
        unit_divisor,
    } = *params;

    if bar_format.is_some_and(|f| !f.is_empty()) {
        return format!("{desc}: {n}/{total} [{elapsed:.1}s, {rate:.1}it/s] {postfix}");
    }

    let percentage = if total > 0 {
        (100.0 * n as f64 / total as f64).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let remaining = if total > 0 && n > 0 && rate > 0.0 && n < total {
        format_interval((total - n) as f64 / rate)
    } else {
        "?".to_string()
    };
    let elapsed_fmt = format_interval(elapsed);

    let (n_fmt, total_fmt, rate_fmt) = if unit_scale {
        (
            format_sizeof(n as f64, unit, unit_divisor),
            if total > 0 {
                format_sizeof(total as f64, unit, unit_divisor)
            } else {
                "?".to_string()
            },
            if rate > 0.0 {
                format_sizeof(rate, unit, unit_divisor)
            } else {
                "?".to_string()
            },
        )
    } else {
        (
            format_num(n as f64),
            if total > 0 {
                format_num(total as f64)
            } else {
                "?".to_string()
            },
            if rate > 0.0 {
                format_num(rate)
            } else {
                "?".to_string()
            },
        )
    };

    // Layout heuristic: reserve space for the stats by byte length. Multi-byte
    // description or postfix text makes this an estimate, not an exact fit.
    let fixed = 50 + desc.len() + postfix.len();
    let bar_width = (ncols as usize).saturating_sub(fixed).clamp(1, 100);

    let bar = render_bar(n, total, bar_width, ascii);

    let desc_sep = if desc.is_empty() { "" } else { ": " };
    // The size formatter already embeds the unit in the rate.
    let rate_unit = if unit_scale { "" } else { unit };
    let postfix_sep = if postfix.is_empty() { "" } else { " " };

    format!(
        "{desc}{desc_sep}{percentage:3.0}%|{bar}| {n_fmt}/{total_fmt} \
         [{elapsed_fmt}<{remaining}, {rate_fmt}{rate_unit}/s]{postfix_sep}{postfix}"
    )
}

/// Renders the bar cells alone, `bar_width` columns wide.
fn render_bar(n: u64, total: u64, bar_width: usize, ascii: bool) -> String {
    if ascii {
        let filled = if total > 0 {
            ((bar_width as f64 * n as f64 / total as f64) as usize).min(bar_width)
        } else {
            0
        };
        let mut bar = String::with_capacity(bar_width);
        for _ in 0..filled {
            bar.push(ASCII_FILL);
        }
        for _ in filled..bar_width {
            bar.push(ASCII_PAD);
        }
        return bar;
    }

    let mut bar = String::with_capacity(bar_width * 4);
    if total > 0 && n > 0 {
        // Sub-character resolution: each cell holds eight fill levels.
        let eighths = (n as u128 * 8 * bar_width as u128 / total as u128) as usize;
        let mut full = eighths / 8;
        let mut partial = eighths % 8;
        if full > bar_width {
            full = bar_width;
            partial = 0;
        }

        for _ in 0..full {
            bar.push_str(UNICODE_BLOCKS[8]);
        }
        if full < bar_width && partial > 0 {
            bar.push_str(UNICODE_BLOCKS[partial]);
            full += 1;
        }
        for _ in full..bar_width {
            bar.push_str(UNICODE_BLOCKS[0]);
        }
    } else {
        for _ in 0..bar_width {
            bar.push_str(UNICODE_BLOCKS[0]);
        }
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::{MeterParams, UNICODE_BLOCKS, format_meter, render_bar};

    fn params<'a>(n: u64, total: u64) -> MeterParams<'a> {
        MeterParams {
            n,
            total,
            elapsed: 10.0,
            ncols: 80,
            desc: "",
            ascii: false,
            unit: "it",
            unit_scale: false,
            rate: 0.0,
            bar_format: None,
            postfix: "",
            unit_divisor: 1000.0,
        }
    }

    /// Standard Mode Tokens
    /// Percentage, counts, and the description prefix land in the line.
    #[test]
    fn test_standard_mode_tokens() {
        let mut p = params(750, 1000);
        p.desc = "Processing";
        p.rate = 75.0;

        let line = format_meter(&p);
        assert!(line.contains("75%"), "got {line}");
        assert!(line.contains("Processing: "), "got {line}");
        assert!(line.contains("750/1.00k"), "got {line}");
        assert!(line.contains("75it/s"), "got {line}");
    }

    /// Unknown Quantities
    /// Total 0 renders `?` placeholders and an all-empty bar.
    #[test]
    fn test_unknown_total() {
        let mut p = params(5, 0);
        p.rate = 2.5;

        let line = format_meter(&p);
        assert!(line.contains("  0%"), "got {line}");
        assert!(line.contains("5/?"), "got {line}");
        assert!(line.contains("<?,"), "got {line}");
        assert!(!line.contains('█'), "got {line}");
    }

    /// Overshoot
    /// n past total clamps the percentage at 100 and the bar at full width.
    #[test]
    fn test_overshoot_clamps() {
        let p = params(150, 100);
        let line = format_meter(&p);
        assert!(line.contains("100%"), "got {line}");

        let bar = render_bar(150, 100, 10, true);
        assert_eq!(bar, "##########");
    }

    /// ASCII Bar
    /// Fill is floor(width * n / total), padded with spaces.
    #[test]
    fn test_ascii_bar() {
        assert_eq!(render_bar(5, 10, 10, true), "#####     ");
        assert_eq!(render_bar(0, 10, 4, true), "    ");
        assert_eq!(render_bar(1, 3, 10, true), "###       ");
    }

    /// Unicode Bar
    /// Eighths resolution: full blocks, one partial glyph, empty padding.
    #[test]
    fn test_unicode_bar() {
        // 5/10 over 8 cells = 32 eighths = 4 full blocks.
        assert_eq!(render_bar(5, 10, 8, false), "████    ");

        // 3/8 over 1 cell = 3 eighths: the 3/8 ramp glyph.
        assert_eq!(render_bar(3, 8, 1, false), UNICODE_BLOCKS[3]);

        // n == 0 renders only empty glyphs.
        assert_eq!(render_bar(0, 10, 4, false), "    ");
    }

    /// Template Mode
    /// A non-empty format string switches to the fixed simplified shape.
    #[test]
    fn test_template_mode() {
        let mut p = params(3, 9);
        p.desc = "copy";
        p.rate = 1.5;
        p.bar_format = Some("{l_bar}{bar}{r_bar}");
        p.postfix = "file=a.txt";

        let line = format_meter(&p);
        assert_eq!(line, "copy: 3/9 [10.0s, 1.5it/s] file=a.txt");

        // An empty template string does not trigger template mode.
        p.bar_format = Some("");
        assert!(format_meter(&p).contains('|'));
    }

    /// Postfix Separator
    /// Present only when a postfix exists.
    #[test]
    fn test_postfix_separator() {
        let mut p = params(1, 2);
        let bare = format_meter(&p);
        assert!(bare.ends_with("/s]"), "got {bare}");

        p.postfix = "loss=0.5";
        let line = format_meter(&p);
        assert!(line.ends_with("/s] loss=0.5"), "got {line}");
    }
}
