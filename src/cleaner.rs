use std::collections::HashSet;

use crate::models::{BenefitRow, CleanRow, RejectReason, Rejection};
use crate::normalize::{normalize_amount, normalize_identifier};

/// Per-stage drop counts, in pipeline order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub input_rows: usize,
    pub empty: usize,
    pub missing_fields: usize,
    pub duplicates: usize,
    pub conversion_failures: usize,
    pub non_positive: usize,
}

impl CleanStats {
    pub fn dropped(&self) -> usize {
        self.empty + self.missing_fields + self.duplicates + self.conversion_failures
            + self.non_positive
    }
}

pub struct CleanOutcome {
    pub rows: Vec<CleanRow>,
    pub rejections: Vec<Rejection>,
    pub stats: CleanStats,
}

fn drop_empty(rows: Vec<BenefitRow>) -> (Vec<BenefitRow>, Vec<Rejection>) {
    let mut kept = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();
    for row in rows {
        if row.employee_id.is_empty() && row.cost_center_code.is_empty() && row.amount.is_empty() {
            rejected.push(Rejection::one(row.row_index, RejectReason::EmptyRow));
        } else {
            kept.push(row);
        }
    }
    (kept, rejected)
}

fn require_fields(rows: Vec<BenefitRow>) -> (Vec<BenefitRow>, Vec<Rejection>) {
    let mut kept = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();
    for row in rows {
        if row.employee_id.is_empty() || row.cost_center_code.is_empty() || row.amount.is_empty() {
            rejected.push(Rejection::one(row.row_index, RejectReason::MissingRequiredField));
        } else {
            kept.push(row);
        }
    }
    (kept, rejected)
}

/// Exact duplicates on the raw (employee, cost center, amount) triple;
/// the first occurrence survives.
fn drop_duplicates(rows: Vec<BenefitRow>) -> (Vec<BenefitRow>, Vec<Rejection>) {
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut kept = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();
    for row in rows {
        let key = (
            row.employee_id.to_text(),
            row.cost_center_code.to_text(),
            row.amount.to_text(),
        );
        if seen.insert(key) {
            kept.push(row);
        } else {
            rejected.push(Rejection::one(row.row_index, RejectReason::Duplicate));
        }
    }
    (kept, rejected)
}

fn convert_types(rows: Vec<BenefitRow>) -> (Vec<CleanRow>, Vec<Rejection>) {
    let mut kept = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();
    for row in rows {
        match (
            normalize_identifier(&row.employee_id),
            normalize_identifier(&row.cost_center_code),
            normalize_amount(&row.amount),
        ) {
            (Some(employee_id), Some(cost_center_code), Some(amount)) => kept.push(CleanRow {
                row_index: row.row_index,
                employee_id,
                cost_center_code,
                amount,
                already_processed: row.already_processed,
            }),
            _ => rejected.push(Rejection::one(
                row.row_index,
                RejectReason::TypeConversionFailure,
            )),
        }
    }
    (kept, rejected)
}

fn drop_non_positive(rows: Vec<CleanRow>) -> (Vec<CleanRow>, Vec<Rejection>) {
    let mut kept = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();
    for row in rows {
        if row.amount <= 0.0 || row.employee_id <= 0 || row.cost_center_code <= 0 {
            rejected.push(Rejection::one(row.row_index, RejectReason::NonPositiveValue));
        } else {
            kept.push(row);
        }
    }
    (kept, rejected)
}

/// Run the cleaning stages in order. A row dropped at one stage is never
/// seen by a later one, so each rejection carries a single reason and the
/// per-stage counts partition the dropped set.
pub fn clean(rows: Vec<BenefitRow>) -> CleanOutcome {
    let mut stats = CleanStats {
        input_rows: rows.len(),
        ..CleanStats::default()
    };
    let mut rejections = Vec::new();

    let (rows, r) = drop_empty(rows);
    stats.empty = r.len();
    rejections.extend(r);

    let (rows, r) = require_fields(rows);
    stats.missing_fields = r.len();
    rejections.extend(r);

    let (rows, r) = drop_duplicates(rows);
    stats.duplicates = r.len();
    rejections.extend(r);

    let (rows, r) = convert_types(rows);
    stats.conversion_failures = r.len();
    rejections.extend(r);

    let (rows, r) = drop_non_positive(rows);
    stats.non_positive = r.len();
    rejections.extend(r);

    rejections.sort_by_key(|r| r.row_index);
    CleanOutcome {
        rows,
        rejections,
        stats,
    }
}
