use std::sync::OnceLock;

use regex::Regex;

use crate::table::Cell;

fn non_numeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9.]").expect("static pattern"))
}

/// Canonicalize a raw identifier cell into an integer.
///
/// Strings may carry grouping separators ("1.234") and float cells carry
/// spreadsheet storage noise (123.0); both normalize to the same integer.
/// Returns None when no numeric reading exists. Idempotent on values that
/// are already canonical.
pub fn normalize_identifier(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Int(i) => Some(*i),
        Cell::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        Cell::Text(s) => {
            let stripped: String = s
                .chars()
                .filter(|c| !matches!(c, '.' | ',') && !c.is_whitespace())
                .collect();
            if stripped.is_empty() {
                return None;
            }
            if stripped.chars().all(|c| c.is_ascii_digit()) {
                stripped.parse::<i64>().ok()
            } else {
                stripped
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            }
        }
        _ => None,
    }
}

/// Normalize a locale-flexible amount cell to a float. Decimal commas
/// become points, any other non-numeric character is stripped.
pub fn normalize_amount(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Int(i) => Some(*i as f64),
        Cell::Float(f) if f.is_finite() => Some(*f),
        Cell::Text(s) => {
            let swapped = s.replace(',', ".");
            let cleaned = non_numeric().replace_all(&swapped, "");
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}
