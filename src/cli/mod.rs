pub mod check;
pub mod process;
pub mod profile;
pub mod status;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::error::{BatchError, Result};

/// Parse an optional YYYY-MM-DD argument, defaulting to today.
pub(crate) fn parse_date_opt(date: &Option<String>) -> Result<NaiveDate> {
    match date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| BatchError::Other(format!("Invalid date '{raw}' (expected YYYY-MM-DD)"))),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

#[derive(Parser)]
#[command(
    name = "nibo-batch",
    about = "Turns benefit allocation spreadsheets into Nibo scheduled-debit request batches."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean a benefit spreadsheet, resolve its references and export a
    /// request collection.
    Process(ProcessArgs),
    /// Dry run: clean and resolve, report problems, export nothing.
    Check(CheckArgs),
    /// Show the state of the reference spreadsheets.
    Status {
        /// Employee reference spreadsheet
        #[arg(long, default_value = "FUNC.xlsx")]
        employees: String,
        /// Cost-center reference spreadsheet
        #[arg(long = "cost-centers", default_value = "centros_de_custo.xlsx")]
        cost_centers: String,
        /// Category reference spreadsheet
        #[arg(long, default_value = "categorias_nibo.xlsx")]
        categories: String,
    },
    /// Manage saved API credential profiles.
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Args)]
pub struct ProcessArgs {
    /// Benefit spreadsheet (columns: matricula, idsetor, valor)
    pub file: String,
    /// Employee reference spreadsheet
    #[arg(long, default_value = "FUNC.xlsx")]
    pub employees: String,
    /// Cost-center reference spreadsheet
    #[arg(long = "cost-centers", default_value = "centros_de_custo.xlsx")]
    pub cost_centers: String,
    /// Category reference spreadsheet (used to resolve --category)
    #[arg(long, default_value = "categorias_nibo.xlsx")]
    pub categories: String,
    /// Category name, resolved against the category reference
    #[arg(long, conflicts_with = "category_id")]
    pub category: Option<String>,
    /// Category id, used as-is
    #[arg(long = "category-id")]
    pub category_id: Option<String>,
    /// Description applied to every document
    #[arg(long, default_value = "Benefício processado automaticamente")]
    pub description: String,
    /// Reference code applied to every document
    #[arg(long, default_value = "PROC")]
    pub reference: String,
    /// Schedule date (YYYY-MM-DD, default: today)
    #[arg(long = "schedule-date")]
    pub schedule_date: Option<String>,
    /// Due date (YYYY-MM-DD, default: today)
    #[arg(long = "due-date")]
    pub due_date: Option<String>,
    /// Accrual date (YYYY-MM-DD, default: today)
    #[arg(long = "accrual-date")]
    pub accrual_date: Option<String>,
    /// Export mode: batch, runner or discrete
    #[arg(long, default_value = "batch")]
    pub mode: String,
    /// Collection name
    #[arg(long, default_value = "Nibo Agendamentos Automáticos")]
    pub name: String,
    /// Output directory
    #[arg(long, default_value = "out")]
    pub out: String,
    /// Skip rows already marked jafoiprocessado
    #[arg(long = "only-new")]
    pub only_new: bool,
    /// Abort instead of exporting the valid subset when rows fail resolution
    #[arg(long)]
    pub strict: bool,
    /// API token embedded in the request headers
    #[arg(long)]
    pub token: Option<String>,
    /// Saved profile to take the token from
    #[arg(long, conflicts_with = "token")]
    pub profile: Option<String>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Benefit spreadsheet (columns: matricula, idsetor, valor)
    pub file: String,
    /// Employee reference spreadsheet
    #[arg(long, default_value = "FUNC.xlsx")]
    pub employees: String,
    /// Cost-center reference spreadsheet
    #[arg(long = "cost-centers", default_value = "centros_de_custo.xlsx")]
    pub cost_centers: String,
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Save (or overwrite) a named credential profile.
    Set {
        /// Profile name, e.g. 'default'
        name: String,
        /// API base URL
        #[arg(long, default_value = "https://api.nibo.com.br/empresas/v1/")]
        url: String,
        /// API token
        #[arg(long)]
        token: String,
    },
    /// List saved profiles (tokens are masked).
    List,
    /// Remove a profile.
    Remove {
        /// Profile name
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_opt() {
        let date = parse_date_opt(&Some("2026-08-01".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        assert!(parse_date_opt(&Some("01/08/2026".to_string())).is_err());
        assert!(parse_date_opt(&None).is_ok());
    }
}
