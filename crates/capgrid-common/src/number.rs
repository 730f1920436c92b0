//! Lenient numeric parsing for user-typed cell text.
//!
//! Grid cells arrive as strings typed by people used to either `1,234.5` or
//! `1.234,5`. The rules, applied after dropping all whitespace:
//!
//! - if both `.` and `,` occur, the one occurring last is the decimal mark
//!   and the other groups thousands
//! - a separator occurring more than once groups thousands
//! - a single `,` followed by exactly three digits, with a non-zero integer
//!   part, groups thousands (`1,234`); otherwise it is a decimal comma (`0,125`)
//! - a single `.` is a decimal point
//!
//! Thousands groups after the first must be exactly three digits. Anything
//! else (letters, `%`, non-finite results) yields `None`; callers decide what
//! "unparsable" means for them.

/// Parse `text` as a number, tolerating thousands separators and comma-decimal.
pub fn parse_lenient(text: &str) -> Option<f64> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    let (negative, body) = match compact.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, compact.strip_prefix('+').unwrap_or(compact.as_str())),
    };

    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };

    let mut canonical = String::with_capacity(compact.len());
    if negative {
        canonical.push('-');
    }
    canonical.push_str(&normalize_mantissa(mantissa)?);
    if let Some(exp) = exponent {
        let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        if !is_digits(digits) {
            return None;
        }
        canonical.push('e');
        canonical.push_str(exp);
    }

    let value = canonical.parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Rewrite a sign-less mantissa into `digits[.digits]` form.
fn normalize_mantissa(mantissa: &str) -> Option<String> {
    let dots = mantissa.matches('.').count();
    let commas = mantissa.matches(',').count();

    let (int_part, frac_part) = match (dots, commas) {
        (0, 0) => (mantissa.to_owned(), None),
        (1, 0) => split_once_owned(mantissa, '.'),
        (_, 0) => (strip_grouping(mantissa, '.')?, None),
        (0, 1) => {
            let (int, frac) = mantissa.split_once(',')?;
            let significant_int = !int.trim_start_matches('0').is_empty();
            if frac.len() == 3 && is_digits(frac) && significant_int {
                (format!("{int}{frac}"), None)
            } else {
                (int.to_owned(), Some(frac.to_owned()))
            }
        }
        (0, _) => (strip_grouping(mantissa, ',')?, None),
        _ => {
            let last_dot = mantissa.rfind('.')?;
            let last_comma = mantissa.rfind(',')?;
            let (decimal, grouping) = if last_dot > last_comma {
                ('.', ',')
            } else {
                (',', '.')
            };
            if mantissa.matches(decimal).count() != 1 {
                return None;
            }
            let (int, frac) = mantissa.split_once(decimal)?;
            if frac.contains(grouping) {
                return None;
            }
            (strip_grouping(int, grouping)?, Some(frac.to_owned()))
        }
    };

    let int_ok = int_part.is_empty() || is_digits(&int_part);
    let frac_ok = frac_part.as_deref().is_none_or(|f| f.is_empty() || is_digits(f));
    let has_digit = !int_part.is_empty() || frac_part.as_deref().is_some_and(|f| !f.is_empty());
    if !(int_ok && frac_ok && has_digit) {
        return None;
    }

    Some(match frac_part {
        Some(frac) if !frac.is_empty() => format!("{}.{frac}", zero_if_empty(&int_part)),
        _ => zero_if_empty(&int_part).to_owned(),
    })
}

fn split_once_owned(s: &str, sep: char) -> (String, Option<String>) {
    match s.split_once(sep) {
        Some((a, b)) => (a.to_owned(), Some(b.to_owned())),
        None => (s.to_owned(), None),
    }
}

/// Remove `sep` thousands grouping; every group after the first is 3 digits.
fn strip_grouping(s: &str, sep: char) -> Option<String> {
    let mut groups = s.split(sep);
    let first = groups.next()?;
    if first.is_empty() || !is_digits(first) {
        return None;
    }
    let mut out = first.to_owned();
    for group in groups {
        if group.len() != 3 || !is_digits(group) {
            return None;
        }
        out.push_str(group);
    }
    Some(out)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn zero_if_empty(s: &str) -> &str {
    if s.is_empty() { "0" } else { s }
}

/// True when a raw cell string counts as entered.
///
/// `"0"` is present; `""` and whitespace-only strings are not.
pub fn is_present(raw: Option<&str>) -> bool {
    raw.is_some_and(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_parses(text: &str, expected: f64) {
        match parse_lenient(text) {
            Some(n) => assert!(
                (n - expected).abs() < 1e-9,
                "{text:?} parsed to {n}, expected {expected}"
            ),
            None => panic!("{text:?} did not parse, expected {expected}"),
        }
    }

    #[test]
    fn plain_numbers() {
        assert_parses("0", 0.0);
        assert_parses("42", 42.0);
        assert_parses("-7.25", -7.25);
        assert_parses("+3", 3.0);
        assert_parses(".5", 0.5);
        assert_parses("5.", 5.0);
        assert_parses("  12  ", 12.0);
        assert_parses("1.5e3", 1500.0);
    }

    #[test]
    fn thousands_separators() {
        assert_parses("1,234", 1234.0);
        assert_parses("1,234,567", 1_234_567.0);
        assert_parses("1.234.567", 1_234_567.0);
        assert_parses("1,234.50", 1234.5);
        assert_parses("1 234 567", 1_234_567.0);
        assert_parses("1\u{a0}234", 1234.0);
    }

    #[test]
    fn comma_decimal() {
        assert_parses("12,5", 12.5);
        assert_parses("0,125", 0.125);
        assert_parses("1.234,56", 1234.56);
        assert_parses("-1.234,5", -1234.5);
    }

    #[test]
    fn rejects_garbage() {
        for text in [
            "", "   ", "-", "abc", "12a", "1,2,3", "1.2.3", "1,23.4.5", "inf", "NaN", "40%",
            "1e", "1,234.5,6",
        ] {
            assert_eq!(parse_lenient(text), None, "{text:?} should not parse");
        }
    }

    #[test]
    fn presence_is_about_text_not_value() {
        assert!(is_present(Some("0")));
        assert!(is_present(Some("abc")));
        assert!(!is_present(Some("")));
        assert!(!is_present(Some("  ")));
        assert!(!is_present(None));
    }
}
