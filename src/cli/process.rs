use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::cli::{parse_date_opt, ProcessArgs};
use crate::error::{BatchError, Result};
use crate::export::{ExportConfig, ExportMode, ExportOutput};
use crate::fmt::money;
use crate::input;
use crate::models::BenefitRow;
use crate::pipeline::{self, RunConfig};
use crate::partition::InvalidPolicy;
use crate::reference::build_category_index;
use crate::report;
use crate::settings;
use crate::table::load_table;

pub fn run(args: ProcessArgs) -> Result<()> {
    let input_path = PathBuf::from(&args.file);
    let input_table = load_table(&input_path)?;
    let rows = input::benefit_rows(&input_table, &args.file)?;
    let write_back = rows.clone();

    let employees = load_table(Path::new(&args.employees))?;
    let cost_centers = load_table(Path::new(&args.cost_centers))?;

    let category_id = resolve_category(&args)?;
    let api_token = resolve_token(&args)?;
    if api_token.is_empty() {
        println!(
            "{} no API token configured; the collection headers will carry an empty token",
            "warning:".yellow().bold()
        );
    }

    let mode = ExportMode::parse(&args.mode)
        .ok_or_else(|| BatchError::Other(format!("Unknown export mode: {}", args.mode)))?;
    let config = RunConfig {
        export: ExportConfig {
            collection_name: args.name.clone(),
            api_token,
            category_id,
            description: args.description.clone(),
            reference: args.reference.clone(),
            schedule_date: parse_date_opt(&args.schedule_date)?,
            due_date: parse_date_opt(&args.due_date)?,
            accrual_date: parse_date_opt(&args.accrual_date)?,
        },
        mode,
        policy: if args.strict {
            InvalidPolicy::Abort
        } else {
            InvalidPolicy::Proceed
        },
        only_new: args.only_new,
    };

    let outcome = pipeline::run(
        rows,
        &employees,
        &args.employees,
        &cost_centers,
        &args.cost_centers,
        &config,
    )?;

    print!(
        "{}",
        report::format_duplicate_key_warnings(
            &outcome.duplicate_employee_keys,
            &outcome.duplicate_cost_center_keys,
        )
    );
    println!("{}", report::format_clean_stats(&outcome.stats));
    print!(
        "{}",
        report::format_unresolved(
            &outcome.unresolved_employees,
            &outcome.unresolved_cost_centers,
            outcome.amount_only_failures,
        )
    );

    let out_dir = PathBuf::from(&args.out);
    std::fs::create_dir_all(&out_dir)?;
    write_artifacts(&outcome.output, &out_dir)?;
    write_flags(&write_back, &outcome.updated_flags, &out_dir)?;

    if outcome.skipped_already_processed > 0 {
        println!(
            "{} row(s) skipped as already processed",
            outcome.skipped_already_processed
        );
    }
    if outcome.invalid_rows > 0 {
        println!(
            "{} row(s) left unexported; fix the references and re-run",
            outcome.invalid_rows
        );
    }
    println!(
        "{} {} document(s) exported, totalling {}",
        "ok:".green().bold(),
        outcome.exported_rows,
        money(outcome.exported_value)
    );
    Ok(())
}

fn resolve_category(args: &ProcessArgs) -> Result<String> {
    if let Some(id) = &args.category_id {
        return Ok(id.clone());
    }
    let Some(name) = &args.category else {
        return Err(BatchError::Other(
            "Provide --category (with a category spreadsheet) or --category-id".to_string(),
        ));
    };
    let table = load_table(Path::new(&args.categories))?;
    let index = build_category_index(&table, &args.categories)?;
    index
        .get(&name.trim().to_lowercase())
        .cloned()
        .ok_or_else(|| BatchError::UnknownCategory(name.clone()))
}

fn resolve_token(args: &ProcessArgs) -> Result<String> {
    if let Some(token) = &args.token {
        return Ok(token.clone());
    }
    if let Some(profile) = &args.profile {
        return settings::profile_token(&settings::load_settings(), profile);
    }
    Ok(String::new())
}

fn write_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, format!("{json}\n"))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn write_artifacts(output: &ExportOutput, out_dir: &Path) -> Result<()> {
    match output {
        ExportOutput::Batch { collection } => {
            write_json(collection, &out_dir.join("nibo_collection.json"))?;
        }
        ExportOutput::Runner {
            collection,
            data_rows,
        } => {
            write_json(collection, &out_dir.join("nibo_runner_collection.json"))?;
            let data_path = out_dir.join("nibo_runner_data.csv");
            let mut writer = csv::Writer::from_path(&data_path)?;
            for row in data_rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
            println!("Wrote {}", data_path.display());
        }
        ExportOutput::Discrete {
            documents,
            manifest,
        } => {
            for named in documents {
                let json = serde_json::to_string_pretty(&named.document)?;
                std::fs::write(out_dir.join(&named.file_name), format!("{json}\n"))?;
            }
            println!(
                "Wrote {} document(s) to {}",
                documents.len(),
                out_dir.display()
            );
            write_json(manifest, &out_dir.join("data.json"))?;
        }
    }
    Ok(())
}

/// The collaborator-side flag write-back: the input rows echoed with the
/// updated jafoiprocessado column.
fn write_flags(rows: &[BenefitRow], updated_flags: &[bool], out_dir: &Path) -> Result<()> {
    let path = out_dir.join("processed_rows.csv");
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(["matricula", "idsetor", "valor", "jafoiprocessado"])?;
    for row in rows {
        let flag = updated_flags.get(row.row_index).copied().unwrap_or(false);
        writer.write_record([
            row.employee_id.to_text(),
            row.cost_center_code.to_text(),
            row.amount.to_text(),
            flag.to_string(),
        ])?;
    }
    writer.flush()?;
    println!("Wrote {}", path.display());
    Ok(())
}
