//! Urna Verifier CLI
//!
//! Command-line interface for checking voting-terminal result files against
//! their signature envelope, inspecting envelopes, and managing configuration.

use clap::{Parser, Subcommand, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};
use std::path::{Path, PathBuf};
use urna_verifier::{
    config::{ConfigManager, ExportFormat, VerifierConfiguration},
    domain::crypto::signed_quantity,
    pipelines::verify::VerifyWorkflow,
    FileVerification, VerificationReport,
};

#[derive(Parser)]
#[command(name = "urna-verifier")]
#[command(about = "Authenticity verification for voting terminal result files")]
#[command(long_about = "
Urna Verifier - checks a results bulletin and terminal log against the
signature envelope written by the voting terminal

EXAMPLES:
    # Verify extracted result files
    urna-verifier verify --envelope urna.vscmr --bulletin bu.dat --log logd.dat

    # Machine-readable report
    urna-verifier verify --envelope urna.vscmr --bulletin bu.dat --log logd.dat --json

    # Show what an envelope contains
    urna-verifier inspect urna.vscmr

    # Change the position of the log record
    urna-verifier config set log_index 10

ENVIRONMENT VARIABLES:
    RUST_LOG        Logging level (debug, info, warn, error)
")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a bulletin and log against their signature envelope
    Verify {
        /// Signature envelope written by the terminal
        #[arg(long, value_name = "FILE")]
        envelope: PathBuf,

        /// Terminal event log
        #[arg(long, value_name = "FILE")]
        log: PathBuf,

        /// Results bulletin
        #[arg(long, value_name = "FILE")]
        bulletin: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Configuration file (defaults to the user configuration)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Decode an envelope and print its records
    Inspect {
        /// Signature envelope to decode
        #[arg(value_name = "ENVELOPE")]
        envelope: PathBuf,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Create default configuration file
    Init,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Export configuration
    Export {
        /// Export format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ExportFormatArg,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone)]
enum ExportFormatArg {
    Toml,
    Json,
    Yaml,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Toml => ExportFormat::Toml,
            ExportFormatArg::Json => ExportFormat::Json,
            ExportFormatArg::Yaml => ExportFormat::Yaml,
        }
    }
}

/// Parameters for the verify command
struct VerifyCommandArgs {
    envelope: PathBuf,
    log: PathBuf,
    bulletin: PathBuf,
    json: bool,
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Verify {
            envelope,
            log,
            bulletin,
            json,
            config,
        } => {
            let args = VerifyCommandArgs {
                envelope,
                log,
                bulletin,
                json,
                config,
            };
            handle_verify_command(args)?;
        }

        Commands::Inspect { envelope } => {
            handle_inspect_command(&envelope)?;
        }

        Commands::Config(config_cmd) => {
            handle_config_command(config_cmd)?;
        }
    }

    Ok(())
}

fn load_configuration(path: Option<&Path>) -> Result<VerifierConfiguration> {
    match path {
        Some(path) => ConfigManager::with_path(path)
            .load()
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to load configuration {}", path.display())),
        None => ConfigManager::new()
            .into_diagnostic()?
            .load_or_default()
            .into_diagnostic(),
    }
}

fn handle_verify_command(args: VerifyCommandArgs) -> Result<()> {
    let config = load_configuration(args.config.as_deref())?;
    let json = args.json || config.wants_json();

    let report = VerifyWorkflow::from_config(&config)
        .run_paths(&args.envelope, &args.bulletin, &args.log)
        .into_diagnostic()
        .wrap_err("Verification could not be completed")?;

    if json {
        let rendered = serde_json::to_string_pretty(&report).into_diagnostic()?;
        println!("{rendered}");
    } else {
        print_report(&report, config.verbose);
    }

    if !report.success() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(report: &VerificationReport, verbose: bool) {
    println!("🗳️  Terminal: {}", report.terminal_id);
    println!("   Certificate: {}", report.subject_dn);
    println!("   Algorithm: {}", report.algorithm);
    println!();
    print_file("Bulletin", &report.bulletin, verbose);
    print_file("Log", &report.log, verbose);
    println!();

    if report.success() {
        println!("✅ Result files are authentic");
    } else {
        println!("❌ Result files failed verification");
    }
}

fn print_file(label: &str, file: &FileVerification, verbose: bool) {
    let mark = |ok: bool| if ok { "✅" } else { "❌" };
    println!("  {label} ({})", file.file_name);
    println!("    {} hash matches recorded hash", mark(file.hash_matches()));
    println!("      Recorded:   {}", file.recorded_hex());
    println!("      Recomputed: {}", file.recomputed_hex());
    println!("    {} signature is valid", mark(file.signature_valid));
    if verbose {
        let signed = signed_quantity(&file.recorded_hash);
        println!("      Signed digest: {}", hex::encode(signed.as_slice()));
    }
}

fn handle_inspect_command(envelope: &Path) -> Result<()> {
    let inspection = VerifyWorkflow::inspect_path(envelope)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to decode envelope {}", envelope.display()))?;
    let envelope = &inspection.envelope;

    println!("📦 Envelope: {}", envelope.model);
    for (label, block) in [
        ("Software", &envelope.software_signature),
        ("Hardware", &envelope.hardware_signature),
    ] {
        let signature = &block.self_signature;
        println!("  {label} signature block");
        println!("    Created at: {}", block.created_at);
        println!("    Protocol version: {}", block.protocol_version);
        println!(
            "    Signer: {} (serial {})",
            signature.signer.user_name, signature.signer.serial
        );
        println!(
            "    Hash algorithm: {}",
            signature.hash_algorithm_name().unwrap_or("unknown")
        );
        println!(
            "    Signature algorithm: {} ({} bits)",
            signature.signature_algorithm, signature.key_bits
        );
        println!(
            "    Certificate: {}",
            block
                .certificate
                .as_ref()
                .map_or_else(|| "none".to_string(), |c| format!("{} bytes", c.len()))
        );
        if let Some(key_set_id) = &block.key_set_id {
            println!("    Key set: {key_set_id}");
        }
    }

    println!("  File signatures ({})", inspection.files.len());
    for (index, file) in inspection.files.iter().enumerate() {
        println!(
            "    [{index:2}] {} {}",
            file.file_name,
            hex::encode(&file.signature.hash)
        );
    }
    Ok(())
}

fn handle_config_command(config_cmd: ConfigCommands) -> Result<()> {
    let config_manager = ConfigManager::new().into_diagnostic()?;

    match config_cmd {
        ConfigCommands::Show => match config_manager.load() {
            Ok(config) => {
                println!("📋 Current Configuration:");
                println!(
                    "  Bulletin record position: {}",
                    config.record_positions.bulletin_index
                );
                println!(
                    "  Log record position: {}",
                    config.record_positions.log_index
                );
                println!(
                    "  Accept PEM certificates: {}",
                    config.accept_pem_certificates
                );
                println!(
                    "  Terminal id prefix length: {}",
                    config.terminal_id_prefix_len
                );
                println!("  Output format: {}", config.output_format);
                println!("  Verbose: {}", config.verbose);
                println!(
                    "  Configuration file: {}",
                    config_manager.config_path().display()
                );
            }
            Err(_) => {
                println!("📋 No configuration file found. Use 'config init' to create one.");
            }
        },

        ConfigCommands::Init => {
            let _config = config_manager.load_or_create_default().into_diagnostic()?;
            println!(
                "✅ Configuration initialized: {}",
                config_manager.config_path().display()
            );
            println!("   Edit the file to customize settings, or use 'config set' commands.");
        }

        ConfigCommands::Set { key, value } => {
            config_manager
                .update_value(&key, &value)
                .into_diagnostic()?;
            println!("✅ Configuration updated: {key} = {value}");
        }

        ConfigCommands::Export { format, output } => {
            let content = config_manager
                .export_config(format.into())
                .into_diagnostic()?;

            if let Some(output_path) = output {
                std::fs::write(&output_path, content).into_diagnostic()?;
                println!("✅ Configuration exported to: {}", output_path.display());
            } else {
                println!("{content}");
            }
        }
    }

    Ok(())
}
