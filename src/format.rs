//! Human-readable formatting of counts, sizes, and durations.
//!
//! These are pure functions with exact output contracts: the meter line is
//! assembled from their results, and downstream consumers compare rendered
//! substrings, so the decimal rules here are load-bearing rather than
//! cosmetic. Each function documents its rounding and clamping behavior.

/// Metric prefixes used by [`format_sizeof`], in ascending magnitude.
const SI_PREFIXES: [&str; 9] = ["", "k", "M", "G", "T", "P", "E", "Z", "Y"];

/// Formats a duration in seconds as a clock-style interval.
///
/// Returns `"?"` for negative durations and for anything longer than a year.
/// Otherwise renders `HH:MM:SS` when at least one full hour has elapsed and
/// `MM:SS` below that, with every component zero-padded to two digits. Hours
/// clamp to 99999.
///
/// # Examples
///
/// ```
/// use ritmo::format::format_interval;
///
/// assert_eq!(format_interval(3661.5), "01:01:01");
/// assert_eq!(format_interval(59.0), "00:59");
/// assert_eq!(format_interval(-1.0), "?");
/// ```
#[must_use]
pub fn format_interval(seconds: f64) -> String {
    if seconds < 0.0 || seconds > 86_400.0 * 365.0 {
        return "?".to_string();
    }

    let total = seconds as u64;
    let hours = (total / 3600).min(99_999);
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Formats a quantity with a metric prefix and unit suffix.
///
/// The value is repeatedly divided by `divisor` (1000 for counts, 1024 for
/// bytes) until it drops below the divisor or the prefix table runs out.
/// Decimal places then follow the magnitude of the scaled value: none for
/// integers below one million or values of 100 and up, one for values of 10
/// and up, two otherwise.
///
/// ```
/// use ritmo::format::format_sizeof;
///
/// assert_eq!(format_sizeof(1536.0, "B", 1024.0), "1.50kB");
/// assert_eq!(format_sizeof(1_000_000.0, "it", 1000.0), "1Mit");
/// ```
#[must_use]
pub fn format_sizeof(value: f64, suffix: &str, divisor: f64) -> String {
    let mut value = value;
    let mut idx = 0;
    while value >= divisor && idx < 8 {
        value /= divisor;
        idx += 1;
    }
    let prefix = SI_PREFIXES[idx];

    if value == value.trunc() && value < 1e6 {
        format!("{}{prefix}{suffix}", value as i64)
    } else if value.abs() >= 100.0 || idx == 0 {
        format!("{value:.0}{prefix}{suffix}")
    } else if value.abs() >= 10.0 {
        format!("{value:.1}{prefix}{suffix}")
    } else {
        format!("{value:.2}{prefix}{suffix}")
    }
}

/// Compacts a number with `k`/`m`/`b`/`t` suffixes.
///
/// The suffix ladder is ordered: `t` covers `1e12..1e15`, after which `b`
/// applies to everything at `1e9` and above. Scaled values get the same
/// 0/1/2-decimal magnitude rule as [`format_sizeof`]. Unsuffixed integers
/// below 1000 print exactly; other unsuffixed values below `1e15` print with
/// no decimals, and the remainder fall back to scientific notation with
/// three significant digits.
///
/// ```
/// use ritmo::format::format_num;
///
/// assert_eq!(format_num(1_234_567.89), "1.23m");
/// assert_eq!(format_num(999.0), "999");
/// ```
#[must_use]
pub fn format_num(value: f64) -> String {
    let abs = value.abs();
    let (scaled, suffix) = if (1e12..1e15).contains(&abs) {
        (value / 1e12, "t")
    } else if abs >= 1e9 {
        (value / 1e9, "b")
    } else if abs >= 1e6 {
        (value / 1e6, "m")
    } else if abs >= 1e3 {
        (value / 1e3, "k")
    } else {
        (value, "")
    };

    if !suffix.is_empty() {
        if scaled.abs() >= 100.0 {
            format!("{scaled:.0}{suffix}")
        } else if scaled.abs() >= 10.0 {
            format!("{scaled:.1}{suffix}")
        } else {
            format!("{scaled:.2}{suffix}")
        }
    } else if abs < 1000.0 && value == value.trunc() {
        format!("{}", value as i64)
    } else if abs < 1e15 {
        format!("{value:.0}")
    } else {
        format_general(value, 3)
    }
}

/// Formats with `sig` significant digits, printf `%g` style: plain decimal
/// for moderate exponents, `e` notation otherwise, trailing zeros trimmed.
#[must_use]
pub fn format_general(value: f64, sig: i32) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let exp = value.abs().log10().floor() as i32;
    if exp < -4 || exp >= sig {
        let mantissa = value / 10f64.powi(exp);
        let digits = (sig - 1).max(0) as usize;
        let mantissa = trim_trailing_zeros(&format!("{mantissa:.digits$}"));
        format!("{mantissa}e{exp:+03}")
    } else {
        let decimals = (sig - 1 - exp).max(0) as usize;
        trim_trailing_zeros(&format!("{value:.decimals$}"))
    }
}

fn trim_trailing_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}
