use std::collections::BTreeSet;

use crate::models::{RejectReason, Rejection, ResolvedRow};

/// What to do when resolution leaves invalid rows behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidPolicy {
    /// Export the valid subset (the default).
    #[default]
    Proceed,
    /// Fail the run if any row is invalid.
    Abort,
}

#[derive(Debug, Default)]
pub struct Partition {
    pub valid: Vec<ResolvedRow>,
    pub invalid: Vec<(ResolvedRow, Vec<RejectReason>)>,
    /// Unique employee ids with no stakeholder mapping, for remediation.
    pub unresolved_employees: BTreeSet<i64>,
    /// Unique cost-center codes with no external id, for remediation.
    pub unresolved_cost_centers: BTreeSet<i64>,
    /// Rows whose only defect is a non-positive amount.
    pub amount_only_failures: usize,
}

impl Partition {
    pub fn rejections(&self) -> Vec<Rejection> {
        self.invalid
            .iter()
            .map(|(row, reasons)| Rejection {
                row_index: row.row.row_index,
                reasons: reasons.clone(),
            })
            .collect()
    }
}

/// Split resolved rows into valid and invalid sets, aggregating the
/// unresolved keys once each no matter how often they repeat.
pub fn partition(rows: Vec<ResolvedRow>) -> Partition {
    let mut part = Partition::default();
    for row in rows {
        if row.is_valid() {
            part.valid.push(row);
            continue;
        }
        let mut reasons = Vec::new();
        if row.stakeholder_id.is_none() {
            reasons.push(RejectReason::UnresolvedEmployee);
            part.unresolved_employees.insert(row.row.employee_id);
        }
        if row.cost_center_id.is_none() {
            reasons.push(RejectReason::UnresolvedCostCenter);
            part.unresolved_cost_centers.insert(row.row.cost_center_code);
        }
        if reasons.is_empty() {
            // both keys resolved, so the amount alone disqualified it
            part.amount_only_failures += 1;
            reasons.push(RejectReason::NonPositiveValue);
        }
        part.invalid.push((row, reasons));
    }
    part
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CleanRow;

    fn resolved(
        row_index: usize,
        employee_id: i64,
        cost_center_code: i64,
        amount: f64,
        stakeholder: Option<&str>,
        cost_center: Option<&str>,
    ) -> ResolvedRow {
        ResolvedRow {
            row: CleanRow {
                row_index,
                employee_id,
                cost_center_code,
                amount,
                already_processed: false,
            },
            stakeholder_id: stakeholder.map(str::to_string),
            cost_center_id: cost_center.map(str::to_string),
        }
    }

    #[test]
    fn test_valid_rows_pass_through() {
        let part = partition(vec![resolved(0, 1, 5, 10.0, Some("a"), Some("x"))]);
        assert_eq!(part.valid.len(), 1);
        assert!(part.invalid.is_empty());
    }

    #[test]
    fn test_unresolved_keys_aggregate_once() {
        let part = partition(vec![
            resolved(0, 1, 5, 10.0, Some("a"), None),
            resolved(1, 2, 5, 20.0, Some("b"), None),
            resolved(2, 3, 5, 30.0, None, None),
        ]);
        assert_eq!(part.valid.len(), 0);
        assert_eq!(part.invalid.len(), 3);
        // setor 5 repeats across all three rows but aggregates once
        assert_eq!(part.unresolved_cost_centers.iter().copied().collect::<Vec<_>>(), vec![5]);
        assert_eq!(part.unresolved_employees.iter().copied().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_row_can_carry_both_unresolved_reasons() {
        let part = partition(vec![resolved(0, 1, 5, 10.0, None, None)]);
        assert_eq!(
            part.invalid[0].1,
            vec![RejectReason::UnresolvedEmployee, RejectReason::UnresolvedCostCenter]
        );
    }

    #[test]
    fn test_amount_only_failures_are_counted() {
        let part = partition(vec![
            resolved(0, 1, 5, 0.0, Some("a"), Some("x")),
            resolved(1, 2, 5, -1.0, Some("b"), Some("x")),
            resolved(2, 3, 5, 0.0, None, Some("x")),
        ]);
        assert_eq!(part.amount_only_failures, 2);
        assert_eq!(part.invalid.len(), 3);
    }

    #[test]
    fn test_rejections_carry_row_indexes() {
        let part = partition(vec![resolved(7, 1, 5, 10.0, None, Some("x"))]);
        let rejections = part.rejections();
        assert_eq!(rejections[0].row_index, 7);
        assert_eq!(rejections[0].reasons, vec![RejectReason::UnresolvedEmployee]);
    }
}
