//! Environment-variable configuration overlay.
//!
//! Glue, not core: [`overlay_env`] reads `RITMO_*` variables into a
//! [`MeterConfig`], and callers (the CLI does this) decide when in their
//! precedence chain to apply it. The core factory never consults the
//! environment on its own.
//!
//! | variable               | field           |
//! |------------------------|-----------------|
//! | `RITMO_MININTERVAL`    | `mininterval`   |
//! | `RITMO_MINITERS`       | `miniters`      |
//! | `RITMO_ASCII`          | `ascii`         |
//! | `RITMO_DISABLE`        | `disable`       |
//! | `RITMO_UNIT`           | `unit`          |
//! | `RITMO_UNIT_SCALE`     | `unit_scale`    |
//! | `RITMO_DYNAMIC_NCOLS`  | `dynamic_ncols` |
//! | `RITMO_SMOOTHING`      | `smoothing`     |
//! | `RITMO_NCOLS`          | `ncols`         |
//! | `RITMO_COLOUR`         | `colour`        |
//! | `RITMO_DELAY`          | `delay`         |
//!
//! Booleans accept `1` or a case-insensitive `true`; anything else is
//! false. Unparseable numeric values leave the field untouched.

use std::env;
use std::str::FromStr;

use crate::builder::MeterConfig;

/// Environment variable name prefix.
pub const ENV_PREFIX: &str = "RITMO_";

/// Overlays `RITMO_*` environment variables onto `config`.
///
/// Unset variables leave their fields unchanged, so apply this at the point
/// in the precedence chain where the environment should win.
pub fn overlay_env(config: &mut MeterConfig) {
    overlay_from(config, |name| env::var(format!("{ENV_PREFIX}{name}")).ok());
}

/// Overlay driven by an arbitrary lookup, `None` meaning unset.
fn overlay_from(config: &mut MeterConfig, lookup: impl Fn(&str) -> Option<String>) {
    parse_into(lookup("MININTERVAL"), &mut config.mininterval);
    parse_into(lookup("MINITERS"), &mut config.miniters);
    flag_into(lookup("ASCII"), &mut config.ascii);
    flag_into(lookup("DISABLE"), &mut config.disable);
    if let Some(unit) = lookup("UNIT") {
        config.unit = unit.into();
    }
    flag_into(lookup("UNIT_SCALE"), &mut config.unit_scale);
    flag_into(lookup("DYNAMIC_NCOLS"), &mut config.dynamic_ncols);
    parse_into(lookup("SMOOTHING"), &mut config.smoothing);
    if let Some(ncols) = lookup("NCOLS") {
        if let Ok(cols) = ncols.parse::<i32>() {
            config.ncols = u16::try_from(cols).ok().filter(|&c| c > 0);
        }
    }
    if let Some(colour) = lookup("COLOUR") {
        config.colour = Some(colour.into());
    }
    parse_into(lookup("DELAY"), &mut config.delay);
}

fn parse_into<T: FromStr>(value: Option<String>, field: &mut T) {
    if let Some(value) = value {
        if let Ok(parsed) = value.parse::<T>() {
            *field = parsed;
        }
    }
}

fn truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

fn flag_into(value: Option<String>, field: &mut bool) {
    if let Some(value) = value {
        *field = truthy(&value);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{overlay_from, truthy};
    use crate::builder::MeterConfig;

    /// Truthiness
    /// `1` and any casing of `true` count; everything else is false.
    #[test]
    fn test_truthy() {
        assert!(truthy("1"));
        assert!(truthy("true"));
        assert!(truthy("TRUE"));
        assert!(!truthy("0"));
        assert!(!truthy("yes"));
        assert!(!truthy(""));
    }

    /// Overlay
    /// Set variables land in the config; unset ones leave defaults alone,
    /// and garbage numeric values are ignored.
    #[test]
    fn test_overlay() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("MININTERVAL", "0.5"),
            ("ASCII", "true"),
            ("UNIT", "rows"),
            ("NCOLS", "120"),
            ("MINITERS", "not-a-number"),
        ]);

        let mut config = MeterConfig::default();
        overlay_from(&mut config, |name| {
            vars.get(name).map(ToString::to_string)
        });

        assert!((config.mininterval - 0.5).abs() < f64::EPSILON);
        assert!(config.ascii);
        assert_eq!(config.unit, "rows");
        assert_eq!(config.ncols, Some(120));
        assert_eq!(config.miniters, 0, "garbage leaves the field untouched");
        assert!(!config.disable, "unset variables change nothing");
    }

    /// Width Edge Cases
    /// Zero and negative widths mean "query the terminal".
    #[test]
    fn test_non_positive_ncols() {
        let mut config = MeterConfig::default();
        config.ncols = Some(80);
        overlay_from(&mut config, |name| {
            (name == "NCOLS").then(|| "-1".to_string())
        });
        assert_eq!(config.ncols, None);

        let mut config = MeterConfig::default();
        config.ncols = Some(80);
        overlay_from(&mut config, |name| {
            (name == "NCOLS").then(|| "0".to_string())
        });
        assert_eq!(config.ncols, None);
    }
}
