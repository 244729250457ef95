// rollcall CLI - config-driven duplicate-record reconciliation

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rollcall_recon::engine::{load_csv_frame, write_csv_frame};
use rollcall_recon::{run, ReconConfig};

use exit_codes::{EXIT_CONFIG, EXIT_RUNTIME, EXIT_SUCCESS, EXIT_UNRESOLVED};

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

fn cli_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Collapse duplicate records to one clean row per key")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a reconciliation from a TOML config file
    #[command(after_help = "\
Examples:
  rollcall run cleanup.recon.toml
  rollcall run cleanup.recon.toml --output clean.csv
  rollcall run cleanup.recon.toml --json > audit.json")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Print the JSON audit to stdout instead of the cleaned CSV
        #[arg(long)]
        json: bool,

        /// Write the cleaned CSV here (overrides [output].csv)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the JSON audit here (overrides [output].audit)
        #[arg(long)]
        audit: Option<PathBuf>,
    },

    /// Validate a config without running
    #[command(after_help = "\
Examples:
  rollcall validate cleanup.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run { config, json, output, audit } => cmd_run(config, json, output, audit),
        Commands::Validate { config } => cmd_validate(config),
    };
    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e.message);
            if let Some(hint) = e.hint {
                eprintln!("hint: {hint}");
            }
            ExitCode::from(e.code)
        }
    }
}

fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    audit_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot read config: {e}")))?;
    let config =
        ReconConfig::from_toml(&config_str).map_err(|e| cli_err(EXIT_CONFIG, e.to_string()))?;

    // Input and config-named outputs resolve relative to the config file.
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let csv_path = base_dir.join(&config.table.file);
    let csv_data = std::fs::read_to_string(&csv_path).map_err(|e| {
        cli_err(EXIT_RUNTIME, format!("cannot read {}: {e}", csv_path.display()))
    })?;

    let frame =
        load_csv_frame(&csv_data, &config).map_err(|e| cli_err(EXIT_RUNTIME, e.to_string()))?;
    let result = run(&config, &frame).map_err(|e| cli_err(EXIT_RUNTIME, e.to_string()))?;

    let rendered =
        write_csv_frame(&result.frame).map_err(|e| cli_err(EXIT_RUNTIME, e.to_string()))?;
    let csv_out = output_file.or_else(|| config.output.csv.as_ref().map(|p| base_dir.join(p)));
    match &csv_out {
        Some(path) => {
            std::fs::write(path, &rendered)
                .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }
        None if !json_output => print!("{rendered}"),
        None => {}
    }

    let audit_json = serde_json::to_string_pretty(&result)
        .map_err(|e| cli_err(EXIT_RUNTIME, format!("JSON serialization error: {e}")))?;
    let audit_out = audit_file.or_else(|| config.output.audit.as_ref().map(|p| base_dir.join(p)));
    if let Some(path) = &audit_out {
        std::fs::write(path, &audit_json)
            .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot write audit: {e}")))?;
        eprintln!("wrote {}", path.display());
    }
    if json_output {
        println!("{audit_json}");
    }

    // Human summary to stderr
    let s = &result.summary;
    eprintln!(
        "{}: {} rows in, {} rows out, {} attribute(s) reconciled, {} unresolved",
        result.meta.config_name,
        s.rows_in,
        s.rows_out,
        s.attributes.len(),
        s.unresolved_rows,
    );

    if s.unresolved_rows > 0 {
        return Err(CliError {
            code: EXIT_UNRESOLVED,
            message: format!("{} row(s) left unresolved", s.unresolved_rows),
            hint: Some("the audit's per-attribute 'unresolved' list names them".into()),
        });
    }

    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(&config_path)
        .map_err(|e| cli_err(EXIT_RUNTIME, format!("cannot read config: {e}")))?;
    match ReconConfig::from_toml(&config_str) {
        Ok(config) => {
            eprintln!(
                "valid: '{}' with {} identifier column(s), {} attribute(s)",
                config.name,
                config.table.identifier.len(),
                config.attributes.len(),
            );
            Ok(())
        }
        Err(e) => Err(cli_err(EXIT_CONFIG, e.to_string())),
    }
}
