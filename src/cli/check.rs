use std::path::Path;

use colored::Colorize;

use crate::cli::CheckArgs;
use crate::error::{BatchError, Result};
use crate::input;
use crate::pipeline;
use crate::report;
use crate::table::load_table;

pub fn run(args: CheckArgs) -> Result<()> {
    let input_table = load_table(Path::new(&args.file))?;
    let rows = input::benefit_rows(&input_table, &args.file)?;
    let employees = load_table(Path::new(&args.employees))?;
    let cost_centers = load_table(Path::new(&args.cost_centers))?;

    let analysis = pipeline::analyze(
        rows,
        &employees,
        &args.employees,
        &cost_centers,
        &args.cost_centers,
    )?;

    print!(
        "{}",
        report::format_duplicate_key_warnings(
            &analysis.duplicate_employee_keys,
            &analysis.duplicate_cost_center_keys,
        )
    );
    print!("{}", report::format_summary(&analysis));
    print!("{}", report::format_rejections(&analysis.rejections));

    if analysis.valid.is_empty() {
        return Err(BatchError::NoValidRows);
    }
    println!(
        "{} {} row(s) would be exported",
        "ok:".green().bold(),
        analysis.valid.len()
    );
    Ok(())
}
