use std::collections::BTreeSet;

use colored::Colorize;
use comfy_table::Table as TextTable;

use crate::cleaner::CleanStats;
use crate::fmt::money;
use crate::models::Rejection;
use crate::pipeline::Analysis;

/// How many rejected rows the detail table lists before eliding the rest.
const REJECTION_PREVIEW: usize = 20;

/// Per-stage drop counts as a terminal table.
pub fn format_clean_stats(stats: &CleanStats) -> String {
    let mut table = TextTable::new();
    table.set_header(vec!["Cleaning stage", "Rows dropped"]);
    table.add_row(vec!["Empty rows".to_string(), stats.empty.to_string()]);
    table.add_row(vec![
        "Missing required fields".to_string(),
        stats.missing_fields.to_string(),
    ]);
    table.add_row(vec!["Duplicates".to_string(), stats.duplicates.to_string()]);
    table.add_row(vec![
        "Type conversion failures".to_string(),
        stats.conversion_failures.to_string(),
    ]);
    table.add_row(vec![
        "Non-positive values".to_string(),
        stats.non_positive.to_string(),
    ]);
    format!(
        "{table}\n{} of {} input rows dropped during cleaning",
        stats.dropped(),
        stats.input_rows
    )
}

fn format_key_list(keys: &BTreeSet<i64>) -> String {
    keys.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Remediation-oriented view of the resolution failures.
pub fn format_unresolved(
    unresolved_employees: &BTreeSet<i64>,
    unresolved_cost_centers: &BTreeSet<i64>,
    amount_only_failures: usize,
) -> String {
    let mut out = String::new();
    if !unresolved_employees.is_empty() {
        out.push_str(&format!(
            "{} {} matricula(s) not found in the employee reference: {}\n",
            "!".yellow().bold(),
            unresolved_employees.len(),
            format_key_list(unresolved_employees)
        ));
        out.push_str("  Add them to the employee spreadsheet and re-run.\n");
    }
    if !unresolved_cost_centers.is_empty() {
        out.push_str(&format!(
            "{} {} setor(es) not found in the cost-center reference: {}\n",
            "!".yellow().bold(),
            unresolved_cost_centers.len(),
            format_key_list(unresolved_cost_centers)
        ));
        out.push_str("  Add them to the cost-center spreadsheet and re-run.\n");
    }
    if amount_only_failures > 0 {
        out.push_str(&format!(
            "{} {} row(s) resolved fully but carry a non-positive value\n",
            "!".yellow().bold(),
            amount_only_failures
        ));
    }
    out
}

/// Full diagnostic summary for a run or a dry run.
pub fn format_summary(analysis: &Analysis) -> String {
    let mut out = String::new();
    out.push_str(&format_clean_stats(&analysis.stats));
    out.push('\n');
    let unique_employees: BTreeSet<i64> =
        analysis.valid.iter().map(|r| r.row.employee_id).collect();
    out.push_str(&format!(
        "Valid: {} row(s) across {} matricula(s), totalling {} | Invalid: {} row(s)\n",
        analysis.valid.len(),
        unique_employees.len(),
        money(analysis.valid_value()),
        analysis.invalid_rows
    ));
    out.push_str(&format_unresolved(
        &analysis.unresolved_employees,
        &analysis.unresolved_cost_centers,
        analysis.amount_only_failures,
    ));
    out
}

/// Row-by-row rejection detail, elided past the preview limit. Row
/// numbers are 1-based to match what the operator sees in a spreadsheet
/// (row 1 being the header).
pub fn format_rejections(rejections: &[Rejection]) -> String {
    if rejections.is_empty() {
        return String::new();
    }
    let mut table = TextTable::new();
    table.set_header(vec!["Row", "Reason"]);
    for rejection in rejections.iter().take(REJECTION_PREVIEW) {
        let reasons: Vec<&str> = rejection.reasons.iter().map(|r| r.label()).collect();
        table.add_row(vec![
            (rejection.row_index + 2).to_string(),
            reasons.join(", "),
        ]);
    }
    let mut out = format!("{table}\n");
    if rejections.len() > REJECTION_PREVIEW {
        out.push_str(&format!(
            "... and {} more rejected row(s)\n",
            rejections.len() - REJECTION_PREVIEW
        ));
    }
    out
}

/// Last-write-wins warnings for duplicated reference keys.
pub fn format_duplicate_key_warnings(employee_keys: &[i64], cost_center_keys: &[i64]) -> String {
    let mut out = String::new();
    if !employee_keys.is_empty() {
        out.push_str(&format!(
            "{} duplicate matricula(s) in the employee reference (last entry wins): {}\n",
            "warning:".yellow().bold(),
            employee_keys
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    if !cost_center_keys.is_empty() {
        out.push_str(&format!(
            "{} duplicate setor(es) in the cost-center reference (last entry wins): {}\n",
            "warning:".yellow().bold(),
            cost_center_keys
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> CleanStats {
        CleanStats {
            input_rows: 10,
            empty: 1,
            missing_fields: 2,
            duplicates: 1,
            conversion_failures: 1,
            non_positive: 1,
        }
    }

    #[test]
    fn test_clean_stats_table_lists_every_stage() {
        let text = format_clean_stats(&stats());
        assert!(text.contains("Empty rows"));
        assert!(text.contains("Duplicates"));
        assert!(text.contains("Non-positive values"));
        assert!(text.contains("6 of 10 input rows dropped"));
    }

    #[test]
    fn test_summary_shows_unresolved_keys() {
        let analysis = Analysis {
            valid: Vec::new(),
            rejections: Vec::new(),
            stats: CleanStats::default(),
            invalid_rows: 2,
            unresolved_employees: [123, 456].into_iter().collect(),
            unresolved_cost_centers: [5].into_iter().collect(),
            amount_only_failures: 0,
            duplicate_employee_keys: Vec::new(),
            duplicate_cost_center_keys: Vec::new(),
            flags: Vec::new(),
        };
        let text = format_summary(&analysis);
        assert!(text.contains("123, 456"));
        assert!(text.contains("cost-center reference: 5"));
    }

    #[test]
    fn test_rejection_detail_elides_past_preview() {
        use crate::models::{RejectReason, Rejection};
        let rejections: Vec<Rejection> = (0..25)
            .map(|i| Rejection::one(i, RejectReason::Duplicate))
            .collect();
        let text = format_rejections(&rejections);
        assert!(text.contains("duplicate"));
        assert!(text.contains("and 5 more rejected row(s)"));
        assert!(format_rejections(&[]).is_empty());
    }

    #[test]
    fn test_duplicate_key_warnings() {
        let text = format_duplicate_key_warnings(&[7], &[]);
        assert!(text.contains("duplicate matricula"));
        assert!(text.contains('7'));
        assert!(format_duplicate_key_warnings(&[], &[]).is_empty());
    }
}
