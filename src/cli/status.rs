use std::path::Path;

use colored::Colorize;

use crate::error::Result;
use crate::reference::RefKind;
use crate::table::load_table;

fn report_one(kind: RefKind, file: &str) {
    let path = Path::new(file);
    if !path.exists() {
        println!("{} {:<14} {file} (not found)", "✗".red(), kind.name());
        return;
    }
    match load_table(path) {
        Ok(table) => match kind.validate(&table, file) {
            Ok(()) => println!(
                "{} {:<14} {file} ({} row(s))",
                "✓".green(),
                kind.name(),
                table.len()
            ),
            Err(e) => println!("{} {:<14} {e}", "✗".red(), kind.name()),
        },
        Err(e) => println!("{} {:<14} {e}", "✗".red(), kind.name()),
    }
}

pub fn run(employees: &str, cost_centers: &str, categories: &str) -> Result<()> {
    report_one(RefKind::Employees, employees);
    report_one(RefKind::CostCenters, cost_centers);
    report_one(RefKind::Categories, categories);
    Ok(())
}
