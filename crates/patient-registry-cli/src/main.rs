//! Command-line shell for the patient registry.
//!
//! Usage:
//!   patient-registry [--database <path>] [--export-dir <dir>] register --first-name Ada ...
//!   patient-registry list [--search <term>] [--sort-by <column>] [--desc] [--export json|csv]
//!   patient-registry delete <id> [--yes]
//!   patient-registry query ["SELECT ..."] [--param <value>]... [--export] [--copy]

mod render;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use patient_registry_core::export::{Clipboard, ExportFile, ExportResult};
use patient_registry_core::models::{Patient, PatientField, SqlValue};
use patient_registry_core::views::{
    ConsoleDisplay, FormField, PatientListView, QueryConsoleView, RegistrationView, ViewError,
    DEFAULT_QUERY, DELETE_PROMPT, NO_DATA, SUCCESS_MESSAGE,
};
use patient_registry_core::{PatientRegistry, RegistryConfig};

#[derive(Parser, Debug)]
#[clap(name = "patient-registry")]
#[clap(about = "Register, browse and query patients in a local database")]
struct Args {
    /// SQLite database file (or set PATIENT_REGISTRY_DB); in-memory when unset
    #[clap(short, long)]
    database: Option<PathBuf>,

    /// Directory for exported files (or set PATIENT_REGISTRY_EXPORT_DIR)
    #[clap(long)]
    export_dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new patient
    Register(RegisterArgs),

    /// List patients, optionally filtered by name
    List {
        /// Case-insensitive substring of first or last name
        #[clap(short, long)]
        search: Option<String>,

        /// Column to sort by
        #[clap(long, default_value = "last_name")]
        sort_by: PatientField,

        /// Sort descending
        #[clap(long)]
        desc: bool,

        /// Write the listed patients to the export directory
        #[clap(long, value_enum)]
        export: Option<ExportFormat>,
    },

    /// Delete a patient by ID
    Delete {
        id: i64,

        /// Skip the confirmation prompt
        #[clap(short, long)]
        yes: bool,
    },

    /// Run an arbitrary SQL statement
    Query {
        #[clap(default_value = DEFAULT_QUERY)]
        sql: String,

        /// Positional parameter for $1, $2, ... (JSON literal or plain text)
        #[clap(short, long = "param")]
        params: Vec<String>,

        /// Write the results to the export directory
        #[clap(long)]
        export: bool,

        /// Print the results' JSON for copying
        #[clap(long)]
        copy: bool,
    },
}

#[derive(clap::Args, Debug)]
struct RegisterArgs {
    #[clap(long)]
    first_name: Option<String>,
    #[clap(long)]
    last_name: Option<String>,
    /// YYYY-MM-DD
    #[clap(long)]
    date_of_birth: Option<String>,
    /// male, female or other
    #[clap(long)]
    gender: Option<String>,
    #[clap(long)]
    email: Option<String>,
    #[clap(long)]
    phone: Option<String>,
    #[clap(long)]
    address: Option<String>,
    #[clap(long)]
    medical_notes: Option<String>,
    #[clap(long)]
    insurance_provider: Option<String>,
    #[clap(long)]
    insurance_id: Option<String>,
}

impl RegisterArgs {
    fn into_fields(self) -> Vec<(FormField, Option<String>)> {
        vec![
            (FormField::FirstName, self.first_name),
            (FormField::LastName, self.last_name),
            (FormField::DateOfBirth, self.date_of_birth),
            (FormField::Gender, self.gender),
            (FormField::Email, self.email),
            (FormField::Phone, self.phone),
            (FormField::Address, self.address),
            (FormField::MedicalNotes, self.medical_notes),
            (FormField::InsuranceProvider, self.insurance_provider),
            (FormField::InsuranceId, self.insurance_id),
        ]
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ExportFormat {
    Json,
    Csv,
}

/// Copies by printing to stdout, for piping into a system clipboard tool.
struct StdoutClipboard;

impl Clipboard for StdoutClipboard {
    fn write_text(&mut self, text: &str) -> ExportResult<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", text)?;
        out.flush()?;
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = RegistryConfig::from_env();
    if let Some(path) = args.database {
        config = config.with_database_path(path);
    }
    if let Some(dir) = args.export_dir {
        config = config.with_export_dir(dir);
    }

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .init();

    debug!(?config, "starting");
    let registry = PatientRegistry::new(config);
    registry.connect().context("Failed to open patient database")?;

    match args.command {
        Command::Register(fields) => register(&registry, fields),
        Command::List {
            search,
            sort_by,
            desc,
            export,
        } => list(&registry, search, sort_by, desc, export),
        Command::Delete { id, yes } => delete(&registry, id, yes),
        Command::Query {
            sql,
            params,
            export,
            copy,
        } => query(&registry, sql, &params, export, copy),
    }
}

fn register(registry: &PatientRegistry, fields: RegisterArgs) -> Result<()> {
    let mut view = RegistrationView::new(registry.config().success_banner);
    for (field, value) in fields.into_fields() {
        if let Some(value) = value {
            view.set(field, value);
        }
    }

    match view.submit(registry, Instant::now()) {
        Ok(id) => {
            println!("{} (id {})", SUCCESS_MESSAGE, id);
            Ok(())
        }
        Err(ViewError::Validation(errors)) => {
            for (field, message) in &errors {
                eprintln!("{}: {}", field, message);
            }
            Err(anyhow!("Registration rejected"))
        }
        Err(e) => Err(e).context("Failed to register patient"),
    }
}

fn list(
    registry: &PatientRegistry,
    search: Option<String>,
    sort_by: PatientField,
    desc: bool,
    export: Option<ExportFormat>,
) -> Result<()> {
    let mut view = PatientListView::new();
    match search {
        Some(term) => {
            view.set_search_term(term);
            view.search(registry)?;
        }
        None => view.load(registry)?,
    }

    if view.sort_state().key != sort_by {
        view.toggle_sort(sort_by);
    }
    if desc {
        view.toggle_sort(sort_by);
    }

    if view.is_empty() {
        println!("{}", view.empty_message());
    } else {
        print!("{}", render::patients(&view.rows(), view.sort_state()));
        println!("{} of {} patient(s)", view.patients().len(), registry.count()?);
    }

    if let Some(format) = export {
        let file = match format {
            ExportFormat::Json => view.export_json()?,
            ExportFormat::Csv => view.export_csv()?,
        };
        write_export(registry, file)?;
    }
    Ok(())
}

fn delete(registry: &PatientRegistry, id: i64, yes: bool) -> Result<()> {
    let mut view = PatientListView::new();
    view.load(registry)?;

    let result = view.delete(registry, id, |patient| yes || confirm(id, patient));
    match result {
        Ok(true) => {
            println!("Deleted patient {}", id);
            Ok(())
        }
        Ok(false) => {
            println!("Cancelled");
            Ok(())
        }
        Err(e) => {
            if let Some(alert) = view.alert() {
                eprintln!("{}", alert);
            }
            Err(e.into())
        }
    }
}

fn confirm(id: i64, patient: Option<&Patient>) -> bool {
    let who = patient.map_or_else(|| format!("#{}", id), Patient::display_name);
    print!("{} ({}) [y/N] ", DELETE_PROMPT, who);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

/// JSON literals bind with their type; anything else binds as text.
fn parse_param(raw: &str) -> SqlValue {
    serde_json::from_str(raw).unwrap_or_else(|_| SqlValue::from(raw))
}

fn query(registry: &PatientRegistry, sql: String, params: &[String], export: bool, copy: bool) -> Result<()> {
    let mut view = QueryConsoleView::new(registry.config().copy_ack);
    view.set_sql(sql);
    view.set_params(params.iter().map(|p| parse_param(p)).collect());

    if !view.execute(registry)? {
        println!("Nothing to run");
        return Ok(());
    }

    match view.display() {
        ConsoleDisplay::Nothing => {}
        ConsoleDisplay::Error(message) => return Err(anyhow!("{}", message)),
        ConsoleDisplay::NoData => println!("{}", NO_DATA),
        ConsoleDisplay::Table { columns, rows } => print!("{}", render::query_rows(columns, rows)),
    }

    if export {
        write_export(registry, view.export_json()?)?;
    }
    if copy {
        view.copy(&mut StdoutClipboard, Instant::now())?;
    }
    Ok(())
}

fn write_export(registry: &PatientRegistry, file: Option<ExportFile>) -> Result<()> {
    let Some(file) = file else {
        println!("Nothing to export");
        return Ok(());
    };
    let path = file
        .write_to(&registry.config().export_dir)
        .with_context(|| format!("Failed to write {}", file.file_name))?;
    info!(path = %path.display(), "export written");
    println!("Exported to {}", path.display());
    Ok(())
}
