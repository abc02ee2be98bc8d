// stockroom CLI - inventory reconciliation over catalog / stock-in / stock-out files

mod exit_codes;
mod logging;
mod stock;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use stockroom_recon::StockError;

use exit_codes::{stock_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};
use stock::{FailOn, RecordKind};

#[derive(Parser)]
#[command(name = "stockroom")]
#[command(about = "Reconcile a material catalog with stock movements into stock levels and reorder alerts")]
#[command(version)]
struct Cli {
    /// Config file (default: ./stockroom.toml, then the user config dir)
    #[arg(long, global = true, env = "STOCKROOM_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the catalog / inbound / outbound files
    #[arg(long, global = true, env = "STOCKROOM_DATA")]
    data: Option<PathBuf>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile and print every inventory line
    #[command(after_help = "\
Examples:
  stockroom run
  stockroom run --json
  stockroom run --output snapshot.json --fail-on critical
  stockroom --data ./sheets run")]
    Run {
        /// Output the full snapshot as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON snapshot to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit non-zero when alerts of this tier (or worse) exist
        #[arg(long, value_enum)]
        fail_on: Option<FailOn>,
    },

    /// List reorder alerts in catalog order
    #[command(after_help = "\
Examples:
  stockroom alerts
  stockroom alerts --json --fail-on warning")]
    Alerts {
        #[arg(long)]
        json: bool,

        #[arg(long, value_enum)]
        fail_on: Option<FailOn>,
    },

    /// Find items whose key or name contains QUERY (case-insensitive)
    Search {
        query: String,

        #[arg(long)]
        json: bool,
    },

    /// Items with the most stock on hand
    Top {
        /// How many items (default: metrics.top_n from config)
        #[arg(long, short = 'n')]
        n: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Check the config and report what the source files contribute
    Validate,

    /// Append a stock-in or stock-out row
    #[command(after_help = "\
Examples:
  stockroom record in \"RM ID=WHEA01\" \"Product Name=Wheat Flour\" Quantity=50
  stockroom record out \"Product ID=PANE04\" \"Quantity Out=2\" --date \"05 Jan 2026\"")]
    Record {
        #[arg(value_enum)]
        kind: RecordKind,

        /// Column values as FIELD=VALUE
        #[arg(required = true, num_args = 1..)]
        fields: Vec<String>,

        /// Date written when no date field is given (default: today)
        #[arg(long)]
        date: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = stock::load_context(cli.config, cli.data).and_then(|ctx| match cli.command {
        Commands::Run { json, output, fail_on } => stock::cmd_run(&ctx, json, output, fail_on),
        Commands::Alerts { json, fail_on } => stock::cmd_alerts(&ctx, json, fail_on),
        Commands::Search { query, json } => stock::cmd_search(&ctx, &query, json),
        Commands::Top { n, json } => stock::cmd_top(&ctx, n, json),
        Commands::Validate => stock::cmd_validate(&ctx),
        Commands::Record { kind, fields, date } => stock::cmd_record(&ctx, kind, &fields, date),
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<StockError> for CliError {
    fn from(err: StockError) -> Self {
        let code = stock_exit_code(&err);
        let hint = match &err {
            StockError::UnsupportedFormat(_) => Some("use .csv or .json files".to_string()),
            StockError::MissingHeader(_) => {
                Some("add a header row naming the columns first".to_string())
            }
            StockError::Io { .. } => {
                Some("check --data and the [sources] file names".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}
