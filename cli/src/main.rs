//! threadaudit command-line interface.
//!
//! Usage:
//!   threadaudit validate --catalog catalogs/travel.toml
//!   threadaudit columns  --catalog catalogs/travel.toml
//!   threadaudit run      --catalog catalogs/travel.toml --input threads/ --out reports/ --ledger ledger.json
//!   threadaudit demo all
//!
//! Set RUST_LOG=debug (or pass --verbose) for per-step logging.

mod run;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use threadaudit_catalog::AuditCatalog;
use threadaudit_contracts::error::{ThreadAuditError, ThreadAuditResult};
use threadaudit_oracle::{config, OracleOverrides};
use threadaudit_ref_travel::scenarios::{clean_audit, fatal_override, oracle_outage};
use threadaudit_report::ReportLayout;

// ── CLI definition ────────────────────────────────────────────────────────────

/// threadaudit: score customer-service email threads against an audit catalog.
#[derive(Parser)]
#[command(
    name = "threadaudit",
    version,
    about = "Audit customer-service email threads against a step catalog",
    long_about = "Loads a TOML audit catalog, judges every step of every thread with a\n\
                  reasoning oracle, and writes weighted scores with fatal-error semantics\n\
                  as JSON and as a fixed-column CSV report."
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a catalog and report every configuration problem.
    Validate {
        #[arg(long)]
        catalog: PathBuf,
    },
    /// Print the report headers for a catalog, one per line.
    Columns {
        #[arg(long)]
        catalog: PathBuf,
    },
    /// Audit conversation JSON files and write reports.
    Run(RunArgs),
    /// Run the travel-desk reference scenarios with a scripted oracle.
    Demo {
        #[arg(value_enum, default_value_t = DemoScenario::All)]
        scenario: DemoScenario,
    },
}

#[derive(Args)]
struct RunArgs {
    #[arg(long)]
    catalog: PathBuf,

    /// A conversation JSON file, or a directory of them.
    #[arg(long)]
    input: PathBuf,

    /// Output directory for `<stem>_report.json` and `audit_report.csv`.
    #[arg(long)]
    out: PathBuf,

    /// Processing ledger; created if missing, threads already in it are skipped.
    #[arg(long)]
    ledger: Option<PathBuf>,

    #[arg(long, env = config::ENV_PROVIDER)]
    provider: Option<String>,

    #[arg(long, env = config::ENV_MODEL)]
    model: Option<String>,

    #[arg(long, env = config::ENV_TEMPERATURE)]
    temperature: Option<String>,

    #[arg(long, env = config::ENV_BASE_URL)]
    base_url: Option<String>,
}

impl RunArgs {
    fn overrides(&self) -> OracleOverrides {
        OracleOverrides {
            provider: self.provider.clone(),
            model: self.model.clone(),
            temperature: self.temperature.clone(),
            base_url: self.base_url.clone(),
            api_key: None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DemoScenario {
    Clean,
    Fatal,
    Outage,
    All,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    let result = match cli.command {
        Command::Validate { catalog } => validate(&catalog),
        Command::Columns { catalog } => columns(&catalog),
        Command::Run(args) => run_batch(args).await,
        Command::Demo { scenario } => demo(scenario).await,
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            report_error(&e);
            std::process::exit(1);
        }
    }
}

fn report_error(err: &ThreadAuditError) {
    match err {
        ThreadAuditError::Config { violations } => {
            eprintln!("Configuration invalid ({} violation(s)):", violations.len());
            for violation in violations {
                eprintln!("  {violation}");
            }
        }
        other => eprintln!("Error: {other}"),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Load the catalog and its report layout. Returns `Ok(true)` on success.
fn validate(path: &Path) -> ThreadAuditResult<bool> {
    let catalog = AuditCatalog::from_file(path)?;
    let layout = ReportLayout::for_catalog(&catalog)?;

    println!(
        "Catalog '{}' is valid: {} step(s), {} categor(ies), {} report column(s).",
        catalog.name().unwrap_or("unnamed"),
        catalog.steps().len(),
        catalog.schema().len(),
        layout.len()
    );
    let profiles = catalog.profiles();
    if !profiles.is_empty() {
        let names: Vec<&str> = profiles.iter().map(String::as_str).collect();
        println!("Oracle profiles: {}", names.join(", "));
    }
    Ok(true)
}

fn columns(path: &Path) -> ThreadAuditResult<bool> {
    let catalog = AuditCatalog::from_file(path)?;
    for header in ReportLayout::for_catalog(&catalog)?.headers() {
        println!("{header}");
    }
    Ok(true)
}

async fn run_batch(args: RunArgs) -> ThreadAuditResult<bool> {
    let overrides = args.overrides();
    let summary = run::execute(
        run::RunPaths {
            catalog: args.catalog,
            input: args.input,
            out: args.out,
            ledger: args.ledger,
        },
        &overrides,
    )
    .await?;

    println!(
        "processed: {}, skipped: {}, failed: {}",
        summary.processed, summary.skipped, summary.failed
    );
    println!("report: {}", summary.csv_path.display());
    Ok(summary.failed == 0)
}

async fn demo(scenario: DemoScenario) -> ThreadAuditResult<bool> {
    println!();
    println!("threadaudit: travel-desk reference demo");
    println!("=======================================");
    println!();

    if matches!(scenario, DemoScenario::Clean | DemoScenario::All) {
        clean_audit::run_scenario().await?;
    }
    if matches!(scenario, DemoScenario::Fatal | DemoScenario::All) {
        fatal_override::run_scenario().await?;
    }
    if matches!(scenario, DemoScenario::Outage | DemoScenario::All) {
        oracle_outage::run_scenario().await?;
    }

    println!("All selected scenarios completed successfully.");
    Ok(true)
}
