use std::collections::BTreeSet;

use crate::cleaner::{clean, CleanStats};
use crate::error::{BatchError, Result};
use crate::export::{build_export, ExportConfig, ExportMode, ExportOutput};
use crate::models::{BenefitRow, Rejection, ResolvedRow};
use crate::partition::{partition, InvalidPolicy};
use crate::reference::{build_cost_center_index, build_employee_index};
use crate::resolver::resolve;
use crate::table::Table;

/// Everything one run needs besides the tables themselves.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub export: ExportConfig,
    pub mode: ExportMode,
    pub policy: InvalidPolicy,
    /// Skip rows whose already-processed flag is set.
    pub only_new: bool,
}

/// Diagnosis of one input against one reference snapshot: everything up to
/// (but not including) export. `valid` holds the exportable rows.
#[derive(Debug)]
pub struct Analysis {
    pub valid: Vec<ResolvedRow>,
    pub rejections: Vec<Rejection>,
    pub stats: CleanStats,
    pub invalid_rows: usize,
    pub unresolved_employees: BTreeSet<i64>,
    pub unresolved_cost_centers: BTreeSet<i64>,
    pub amount_only_failures: usize,
    pub duplicate_employee_keys: Vec<i64>,
    pub duplicate_cost_center_keys: Vec<i64>,
    /// Input flags by row index, the baseline for write-back.
    pub flags: Vec<bool>,
}

impl Analysis {
    pub fn valid_value(&self) -> f64 {
        self.valid.iter().map(|r| r.row.amount).sum()
    }
}

/// Completed run: the export plus everything a caller needs to report on
/// it and to write the updated flags back to the source table.
#[derive(Debug)]
pub struct RunOutcome {
    pub output: ExportOutput,
    pub rejections: Vec<Rejection>,
    pub stats: CleanStats,
    pub invalid_rows: usize,
    pub unresolved_employees: BTreeSet<i64>,
    pub unresolved_cost_centers: BTreeSet<i64>,
    pub amount_only_failures: usize,
    pub duplicate_employee_keys: Vec<i64>,
    pub duplicate_cost_center_keys: Vec<i64>,
    pub exported_rows: usize,
    pub skipped_already_processed: usize,
    pub exported_value: f64,
    /// One flag per input row; exported rows come back `true`.
    pub updated_flags: Vec<bool>,
}

/// Clean, resolve and partition without exporting. Reference tables are
/// validated up front; a malformed one fails here, before any row work.
pub fn analyze(
    rows: Vec<BenefitRow>,
    employees: &Table,
    employees_file: &str,
    cost_centers: &Table,
    cost_centers_file: &str,
) -> Result<Analysis> {
    let employee_index = build_employee_index(employees, employees_file)?;
    let cost_center_index = build_cost_center_index(cost_centers, cost_centers_file)?;

    let flags_len = rows.iter().map(|r| r.row_index + 1).max().unwrap_or(0);
    let mut flags = vec![false; flags_len];
    for row in &rows {
        flags[row.row_index] = row.already_processed;
    }

    let cleaned = clean(rows);
    let resolved = resolve(&cleaned.rows, &employee_index, &cost_center_index);
    let part = partition(resolved);

    let mut rejections = cleaned.rejections;
    rejections.extend(part.rejections());
    rejections.sort_by_key(|r| r.row_index);

    Ok(Analysis {
        invalid_rows: part.invalid.len(),
        valid: part.valid,
        rejections,
        stats: cleaned.stats,
        unresolved_employees: part.unresolved_employees,
        unresolved_cost_centers: part.unresolved_cost_centers,
        amount_only_failures: part.amount_only_failures,
        duplicate_employee_keys: employee_index.overwritten,
        duplicate_cost_center_keys: cost_center_index.overwritten,
        flags,
    })
}

/// Full run: Loaded → Cleaned → Resolved → Partitioned → Exported. No
/// transition is reversible; re-running from the top is the only recovery
/// path.
pub fn run(
    rows: Vec<BenefitRow>,
    employees: &Table,
    employees_file: &str,
    cost_centers: &Table,
    cost_centers_file: &str,
    config: &RunConfig,
) -> Result<RunOutcome> {
    let analysis = analyze(rows, employees, employees_file, cost_centers, cost_centers_file)?;

    if config.policy == InvalidPolicy::Abort && analysis.invalid_rows > 0 {
        return Err(BatchError::InvalidRows(analysis.invalid_rows));
    }
    if analysis.valid.is_empty() {
        return Err(BatchError::NoValidRows);
    }

    let (to_export, skipped): (Vec<ResolvedRow>, Vec<ResolvedRow>) = if config.only_new {
        analysis
            .valid
            .into_iter()
            .partition(|r| !r.row.already_processed)
    } else {
        (analysis.valid, Vec::new())
    };
    if to_export.is_empty() {
        return Err(BatchError::NoValidRows);
    }

    let exported_value = to_export.iter().map(|r| r.row.amount).sum();
    let output = build_export(&to_export, &config.export, config.mode)?;
    let exported_rows = output.document_count();

    let mut updated_flags = analysis.flags;
    for row in &to_export {
        updated_flags[row.row.row_index] = true;
    }

    Ok(RunOutcome {
        output,
        rejections: analysis.rejections,
        stats: analysis.stats,
        invalid_rows: analysis.invalid_rows,
        unresolved_employees: analysis.unresolved_employees,
        unresolved_cost_centers: analysis.unresolved_cost_centers,
        amount_only_failures: analysis.amount_only_failures,
        duplicate_employee_keys: analysis.duplicate_employee_keys,
        duplicate_cost_center_keys: analysis.duplicate_cost_center_keys,
        exported_rows,
        skipped_already_processed: skipped.len(),
        exported_value,
        updated_flags,
    })
}
