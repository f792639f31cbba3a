//! Cell value normalization
//!
//! Submissions come from many institutions and many spreadsheet locales: amounts
//! arrive as `"1 250 000,50"`, dates as `"15/01/2024"` or native date cells,
//! and missing values as `-`, `N/A` or an em-dash. Everything here is total:
//! malformed input degrades to `None` or to the caller's default.

use chrono::NaiveDate;

use crate::types::CellValue;

/// Date formats tried, in order, for text cells
pub const DATE_FORMATS: [&str; 5] = ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d"];

/// Text tokens that stand for "no value"
const PLACEHOLDERS: [&str; 4] = ["-", "—", "n/a", "na"];

fn is_placeholder(s: &str) -> bool {
    s.is_empty() || PLACEHOLDERS.iter().any(|p| s.eq_ignore_ascii_case(p))
}

/// Convert a cell to a calendar date
pub fn to_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        }
        _ => None,
    }
}

/// Trim text and map placeholder tokens to `None`
pub fn clean_scalar(value: &CellValue) -> Option<CellValue> {
    match value {
        CellValue::Empty => None,
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if is_placeholder(trimmed) {
                None
            } else {
                Some(CellValue::Text(trimmed.to_string()))
            }
        }
        other => Some(other.clone()),
    }
}

/// Render a cleaned cell as text, `""` when there is no value
pub fn to_text(value: &CellValue) -> String {
    match clean_scalar(value) {
        None => String::new(),
        Some(CellValue::Text(s)) => s,
        Some(CellValue::Int(i)) => i.to_string(),
        Some(CellValue::Number(n)) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", n as i64)
            } else {
                n.to_string()
            }
        }
        Some(CellValue::Bool(b)) => b.to_string(),
        Some(CellValue::DateTime(dt)) => dt.date().format("%Y-%m-%d").to_string(),
        Some(CellValue::Empty) => String::new(),
    }
}

/// Parse a number out of a cell, `None` when nothing usable is there
pub fn parse_number(value: &CellValue) -> Option<f64> {
    let n = match value {
        CellValue::Int(i) => *i as f64,
        CellValue::Number(n) => *n,
        CellValue::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        CellValue::Text(s) => parse_numeric_text(s)?,
        CellValue::Empty | CellValue::DateTime(_) => return None,
    };
    n.is_finite().then_some(n)
}

fn parse_numeric_text(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if is_placeholder(trimmed) {
        return None;
    }

    let kept: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    // "1.234.567" → "1.234567": first dot is the decimal point
    let candidate = match kept.split_once('.') {
        Some((int_part, rest)) if rest.contains('.') => {
            format!("{}.{}", int_part, rest.replace('.', ""))
        }
        _ => kept,
    };

    if candidate.is_empty() || candidate == "-" || candidate == "." {
        return None;
    }
    candidate.parse::<f64>().ok()
}

/// Convert a cell to a float, falling back to `default`
pub fn to_number(value: &CellValue, default: f64) -> f64 {
    parse_number(value).unwrap_or(default)
}

/// Convert a cell to an integer (truncating toward zero), falling back to `default`
pub fn to_integer(value: &CellValue, default: i64) -> i64 {
    parse_number(value).map(|n| n.trunc() as i64).unwrap_or(default)
}

/// Bring a rate to fractional form: values above 1 are read as percentages
pub fn normalize_rate(rate: f64) -> f64 {
    if rate > 1.0 {
        rate / 100.0
    } else {
        rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::from(s)
    }

    #[test]
    fn test_to_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(to_date(&text("15/01/2024")), Some(expected));
        assert_eq!(to_date(&text("2024-01-15")), Some(expected));
        assert_eq!(to_date(&text("15-01-2024")), Some(expected));
        assert_eq!(to_date(&text("15.01.2024")), Some(expected));
        assert_eq!(to_date(&text("2024/01/15")), Some(expected));
        assert_eq!(to_date(&text("  15/01/2024 ")), Some(expected));
    }

    #[test]
    fn test_to_date_native_and_invalid() {
        let d = NaiveDate::from_ymd_opt(2023, 6, 30).unwrap();
        assert_eq!(to_date(&CellValue::from(d)), Some(d));
        assert_eq!(to_date(&text("31/02/2024")), None);
        assert_eq!(to_date(&text("not a date")), None);
        assert_eq!(to_date(&CellValue::Empty), None);
        assert_eq!(to_date(&CellValue::Number(45306.0)), None);
    }

    #[test]
    fn test_clean_scalar_placeholders() {
        for token in ["", "  ", "-", "—", "N/A", "n/a", "NA", "na"] {
            assert_eq!(clean_scalar(&text(token)), None, "token {:?}", token);
        }
        assert_eq!(clean_scalar(&text("  BICEC ")), Some(text("BICEC")));
        assert_eq!(
            clean_scalar(&CellValue::Number(3.5)),
            Some(CellValue::Number(3.5))
        );
        assert_eq!(clean_scalar(&CellValue::Empty), None);
    }

    #[test]
    fn test_to_text() {
        assert_eq!(to_text(&text(" Mensuel ")), "Mensuel");
        assert_eq!(to_text(&text("N/A")), "");
        assert_eq!(to_text(&CellValue::Number(12.0)), "12");
        assert_eq!(to_text(&CellValue::Number(12.5)), "12.5");
        assert_eq!(to_text(&CellValue::Int(7)), "7");
    }

    #[test]
    fn test_to_number_locales() {
        assert_eq!(to_number(&text("1234,56"), 0.0), 1234.56);
        assert_eq!(to_number(&text("1 234,56 FCFA"), 0.0), 1234.56);
        assert_eq!(to_number(&text("12.5%"), 0.0), 12.5);
        assert_eq!(to_number(&text("-42"), 0.0), -42.0);
        assert_eq!(to_number(&text("1.234.567"), 0.0), 1.234567);
        assert_eq!(to_number(&CellValue::Int(10), 0.0), 10.0);
        assert_eq!(to_number(&CellValue::Number(0.125), 0.0), 0.125);
    }

    #[test]
    fn test_to_number_defaults() {
        assert_eq!(to_number(&text(""), 7.0), 7.0);
        assert_eq!(to_number(&text("abc"), 7.0), 7.0);
        assert_eq!(to_number(&text("-"), 7.0), 7.0);
        assert_eq!(to_number(&text("."), 7.0), 7.0);
        assert_eq!(to_number(&text("1-2"), 7.0), 7.0);
        assert_eq!(to_number(&CellValue::Empty, 7.0), 7.0);
        assert_eq!(to_number(&CellValue::Number(f64::NAN), 7.0), 7.0);
        assert_eq!(to_number(&CellValue::Number(f64::INFINITY), 7.0), 7.0);
    }

    #[test]
    fn test_to_integer_truncates() {
        assert_eq!(to_integer(&text("36"), 0), 36);
        assert_eq!(to_integer(&text("36,9"), 0), 36);
        assert_eq!(to_integer(&text("-2.7"), 0), -2);
        assert_eq!(to_integer(&CellValue::Number(59.99), 0), 59);
        assert_eq!(to_integer(&text("douze"), 1), 1);
        assert_eq!(to_integer(&CellValue::Empty, 1), 1);
    }

    #[test]
    fn test_normalize_rate() {
        assert_eq!(normalize_rate(12.5), 0.125);
        assert_eq!(normalize_rate(0.125), 0.125);
        assert_eq!(normalize_rate(1.0), 1.0);
        assert_eq!(normalize_rate(0.0), 0.0);
        // Idempotent on fractions
        assert_eq!(normalize_rate(normalize_rate(8.5)), normalize_rate(8.5));
    }
}
