use crate::models::{CleanRow, ResolvedRow};
use crate::reference::RefIndex;

/// Join cleaned rows against the two reference snapshots.
///
/// A missing key is recorded as an absent id, never an error; failures are
/// batched for the partitioner. Rows are borrowed, so a caller can re-run
/// resolution over the same cleaned set after editing the reference
/// tables, without re-validating anything.
pub fn resolve(rows: &[CleanRow], employees: &RefIndex, cost_centers: &RefIndex) -> Vec<ResolvedRow> {
    rows.iter()
        .map(|row| ResolvedRow {
            row: row.clone(),
            stakeholder_id: employees.get(row.employee_id).map(str::to_string),
            cost_center_id: cost_centers.get(row.cost_center_code).map(str::to_string),
        })
        .collect()
}
