use clap::{Parser, Subcommand};
use std::path::PathBuf;
use teg_verify::cli;
use teg_verify::config::Settings;

#[derive(Parser)]
#[command(name = "teg-verify")]
#[command(about = "Effective global rate (TEG) conformity checks for institution submissions")]
#[command(long_about = "TEG Verify - effective global rate conformity checks

Reads the workbook an institution submits, recognizes each product worksheet
by its name, recomputes the effective global rate of every credit line and
compares it with the declared rate.

PRODUCTS:
  amortizing credit, overdraft, factoring, guarantee,
  commercial paper, spot credit

COMMANDS:
  preview   - Extract and check, store nothing
  import    - Extract and store one JSON batch per product
  verify    - Per-record conformity verdicts and statistics
  classify  - Show which product a sheet name maps to

EXAMPLES:
  teg-verify preview submission.xlsx --institution BANK01
  teg-verify import submission.xlsx --out records/
  teg-verify verify submission.xlsx --simplified --json
  teg-verify classify \"Découverts Bancaires 2024\" CA Synthèse")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML settings file (tolerances, header scan depth, sheet aliases)
    #[arg(long, global = true, env = "TEG_VERIFY_CONFIG")]
    config: Option<PathBuf>,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    json: bool,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and check a workbook without storing anything
    Preview {
        /// Path to the submitted workbook (.xlsx, .xls, .ods)
        file: PathBuf,

        /// Institution the submission belongs to (default: file name)
        #[arg(short, long)]
        institution: Option<String>,
    },

    #[command(long_about = "Extract a workbook and store its records.

Each product type is stored as one batch: <out>/<product>.json. A batch is
written entirely or not at all; a failed batch does not stop the others.
The command fails when any batch could not be stored.")]
    /// Extract a workbook and store one batch per product
    Import {
        /// Path to the submitted workbook (.xlsx, .xls, .ods)
        file: PathBuf,

        /// Output directory for the product batches
        #[arg(short, long)]
        out: PathBuf,

        /// Institution the submission belongs to (default: file name)
        #[arg(short, long)]
        institution: Option<String>,
    },

    #[command(long_about = "Compare calculated and declared rates for every record.

Batch mode (default) uses a 0.001 tolerance and counts records where both
rates are zero as conformant. Simplified mode uses 0.01 and leaves those
records out. Records with no declared rate or an incomputable rate are
reported as unverified.")]
    /// Check calculated against declared rates
    Verify {
        /// Path to the submitted workbook (.xlsx, .xls, .ods)
        file: PathBuf,

        /// Institution the submission belongs to (default: file name)
        #[arg(short, long)]
        institution: Option<String>,

        /// Use the simplified verification (looser tolerance)
        #[arg(long)]
        simplified: bool,
    },

    /// Show which product each sheet name is classified as
    Classify {
        /// Sheet names to classify
        #[arg(required = true)]
        names: Vec<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "teg_verify=info"
    } else {
        "teg_verify=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load_or_default(cli.config.as_deref())?;
    let json = cli.json;

    match cli.command {
        Commands::Preview { file, institution } => {
            cli::preview(file, institution, settings, json)?
        }

        Commands::Import {
            file,
            out,
            institution,
        } => cli::import(file, out, institution, settings, json)?,

        Commands::Verify {
            file,
            institution,
            simplified,
        } => cli::verify(file, institution, simplified, settings, json)?,

        Commands::Classify { names } => cli::classify(names, settings, json)?,
    }

    Ok(())
}
