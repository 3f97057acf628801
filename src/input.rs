use crate::error::{BatchError, Result};
use crate::models::BenefitRow;
use crate::table::Table;

pub const REQUIRED_COLUMNS: &[&str] = &["matricula", "idsetor", "valor"];

/// Optional flag column carried through from previous runs.
pub const PROCESSED_COLUMN: &str = "jafoiprocessado";

/// Turn a loaded input table into benefit rows. Missing required columns
/// are fatal and reported before any row is looked at.
pub fn benefit_rows(table: &Table, file: &str) -> Result<Vec<BenefitRow>> {
    let missing = table.missing_columns(REQUIRED_COLUMNS);
    if !missing.is_empty() {
        return Err(BatchError::MissingColumns {
            file: file.to_string(),
            columns: missing.join(", "),
        });
    }
    let flag_col = table.column_index(PROCESSED_COLUMN);
    let mut rows = Vec::with_capacity(table.len());
    for i in 0..table.len() {
        rows.push(BenefitRow {
            row_index: i,
            employee_id: table.cell_by_name(i, "matricula"),
            cost_center_code: table.cell_by_name(i, "idsetor"),
            amount: table.cell_by_name(i, "valor"),
            already_processed: flag_col.map(|c| table.cell(i, c).as_bool()).unwrap_or(false),
        });
    }
    Ok(rows)
}
