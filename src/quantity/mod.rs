//! Resource quantity parsing and percentage scaling
//!
//! Kubernetes expresses CPU and memory as magnitude+suffix strings
//! ("250m", "128Mi"). Scaling a deployment means rewriting each of
//! those strings; a value we cannot parse is passed through untouched
//! so a patch never mangles a quantity it does not understand.

use crate::intent::Operation;

/// Unit suffixes understood by the scaler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Bare integer (whole cores or raw bytes)
    None,
    /// CPU millicores
    Milli,
    Ki,
    Mi,
    Gi,
}

impl Unit {
    fn suffix(self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::Milli => "m",
            Unit::Ki => "Ki",
            Unit::Mi => "Mi",
            Unit::Gi => "Gi",
        }
    }
}

/// Outcome of parsing a quantity string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedQuantity {
    Parsed { magnitude: u64, unit: Unit },
    /// Suffix or magnitude was not recognized; the original string is kept
    Unparsed,
}

/// Parse a quantity string into magnitude and unit
pub fn parse(quantity: &str) -> ParsedQuantity {
    let quantity = quantity.trim();

    let (digits, unit) = if let Some(v) = quantity.strip_suffix("Ki") {
        (v, Unit::Ki)
    } else if let Some(v) = quantity.strip_suffix("Mi") {
        (v, Unit::Mi)
    } else if let Some(v) = quantity.strip_suffix("Gi") {
        (v, Unit::Gi)
    } else if let Some(v) = quantity.strip_suffix('m') {
        (v, Unit::Milli)
    } else {
        (quantity, Unit::None)
    };

    match digits.parse::<u64>() {
        Ok(magnitude) => ParsedQuantity::Parsed { magnitude, unit },
        Err(_) => ParsedQuantity::Unparsed,
    }
}

/// Rescale a quantity string by a percentage.
///
/// The magnitude becomes `round(m * (1 ± pct/100))`, floored at 1 for a
/// decrease so a request is never scaled to zero. Total: any parse or
/// arithmetic failure returns the input verbatim.
pub fn scale_quantity(quantity: &str, operation: Operation, percentage: u32) -> String {
    let (magnitude, unit) = match parse(quantity) {
        ParsedQuantity::Parsed { magnitude, unit } => (magnitude, unit),
        ParsedQuantity::Unparsed => return quantity.to_string(),
    };

    let factor = match operation {
        Operation::Increase => 1.0 + percentage as f64 / 100.0,
        Operation::Decrease => 1.0 - percentage as f64 / 100.0,
    };

    let scaled = (magnitude as f64 * factor).round();
    let scaled = match operation {
        Operation::Decrease => scaled.max(1.0) as u64,
        Operation::Increase => scaled as u64,
    };

    format!("{}{}", scaled, unit.suffix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(
            parse("250m"),
            ParsedQuantity::Parsed {
                magnitude: 250,
                unit: Unit::Milli
            }
        );
        assert_eq!(
            parse("128Mi"),
            ParsedQuantity::Parsed {
                magnitude: 128,
                unit: Unit::Mi
            }
        );
        assert_eq!(
            parse("1Gi"),
            ParsedQuantity::Parsed {
                magnitude: 1,
                unit: Unit::Gi
            }
        );
        assert_eq!(
            parse("512Ki"),
            ParsedQuantity::Parsed {
                magnitude: 512,
                unit: Unit::Ki
            }
        );
        assert_eq!(
            parse("2"),
            ParsedQuantity::Parsed {
                magnitude: 2,
                unit: Unit::None
            }
        );
    }

    #[test]
    fn test_parse_unrecognized() {
        assert_eq!(parse("abc"), ParsedQuantity::Unparsed);
        assert_eq!(parse("12Ti"), ParsedQuantity::Unparsed);
        assert_eq!(parse(""), ParsedQuantity::Unparsed);
    }

    #[test]
    fn test_scale_noop_roundtrip() {
        for q in ["250m", "128Mi", "1Gi", "512Ki", "2"] {
            assert_eq!(scale_quantity(q, Operation::Decrease, 0), q);
            assert_eq!(scale_quantity(q, Operation::Increase, 0), q);
        }
    }

    #[test]
    fn test_scale_decrease() {
        assert_eq!(scale_quantity("200m", Operation::Decrease, 30), "140m");
        assert_eq!(scale_quantity("128Mi", Operation::Decrease, 50), "64Mi");
    }

    #[test]
    fn test_scale_increase() {
        assert_eq!(scale_quantity("200m", Operation::Increase, 30), "260m");
        assert_eq!(scale_quantity("1Gi", Operation::Increase, 100), "2Gi");
    }

    #[test]
    fn test_decrease_floors_at_one() {
        assert_eq!(scale_quantity("1m", Operation::Decrease, 99), "1m");
        assert_eq!(scale_quantity("1Gi", Operation::Decrease, 100), "1Gi");
        assert_eq!(scale_quantity("2", Operation::Decrease, 90), "1");
    }

    #[test]
    fn test_monotonic_in_percentage() {
        let magnitude = |q: &str| match parse(q) {
            ParsedQuantity::Parsed { magnitude, .. } => magnitude,
            ParsedQuantity::Unparsed => panic!("expected parse of {q}"),
        };

        let mut prev = magnitude("500m");
        for pct in (0..=100).step_by(5) {
            let cur = magnitude(&scale_quantity("500m", Operation::Decrease, pct));
            assert!(cur <= prev, "decrease not monotone at {pct}%");
            prev = cur;
        }

        let mut prev = magnitude("500m");
        for pct in (0..=100).step_by(5) {
            let cur = magnitude(&scale_quantity("500m", Operation::Increase, pct));
            assert!(cur >= prev, "increase not monotone at {pct}%");
            prev = cur;
        }
    }

    #[test]
    fn test_unrecognized_passthrough() {
        assert_eq!(scale_quantity("abc", Operation::Decrease, 50), "abc");
        assert_eq!(scale_quantity("100Ti", Operation::Increase, 50), "100Ti");
    }
}
