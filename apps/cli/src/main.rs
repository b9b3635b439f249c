use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use modupdate_core::paths::default_config_path;
use modupdate_core::{run_with_client, ItemOutcome, UpdateReport, UpdaterConfig};
use modupdate_meta::{stamp, MetadataReader, PluginMetadata, SidecarReader, TrailerReader};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Self-update for plugin binaries that declare where their updates live.
#[derive(Parser)]
#[command(name = "modupdate", version, about)]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one update pass over the mods directory
    Update(UpdateArgs),
    /// Print the metadata a binary carries
    Inspect {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = MetadataFormat::Trailer)]
        metadata: MetadataFormat,
    },
    /// Write (or replace) the metadata trailer of a binary
    Stamp(StampArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum MetadataFormat {
    /// Footer appended to the binary itself
    Trailer,
    /// `<binary>.meta.json` next to the binary
    Sidecar,
}

impl MetadataFormat {
    fn reader(self) -> Box<dyn MetadataReader> {
        match self {
            MetadataFormat::Trailer => Box::new(TrailerReader),
            MetadataFormat::Sidecar => Box::new(SidecarReader),
        }
    }
}

#[derive(Args)]
struct UpdateArgs {
    #[arg(long, env = "MODUPDATE_MODS_DIR")]
    mods_dir: Option<PathBuf>,
    #[arg(long)]
    backup_dir: Option<PathBuf>,
    #[arg(long)]
    temp_dir: Option<PathBuf>,
    /// Root for dependency LocalPaths (default: parent of the mods dir)
    #[arg(long)]
    install_root: Option<PathBuf>,
    /// Plugin binary extension
    #[arg(long)]
    extension: Option<String>,
    /// Per-request timeout, 0 for none
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[arg(long)]
    user_agent: Option<String>,
    #[arg(long, value_enum, default_value_t = MetadataFormat::Trailer)]
    metadata: MetadataFormat,
    /// JSON config file (default: <data dir>/ModUpdater/config.json when present)
    #[arg(long, env = "MODUPDATE_CONFIG")]
    config: Option<PathBuf>,
    /// Print the report as JSON instead of one line per item
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct StampArgs {
    file: PathBuf,
    #[arg(long)]
    type_name: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    version: String,
    #[arg(long)]
    author: String,
    #[arg(long)]
    download_link: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "modupdate=debug,modupdate_core=debug"
        } else {
            "modupdate=info,modupdate_core=info"
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Update(args) => update(args),
        Command::Inspect { file, metadata } => {
            let meta = metadata
                .reader()
                .read(&file)
                .with_context(|| format!("read metadata of {}", file.display()))?;
            match meta {
                Some(m) => println!("{}", serde_json::to_string_pretty(&m)?),
                None => bail!("{} carries no metadata", file.display()),
            }
            Ok(())
        }
        Command::Stamp(args) => {
            let meta = PluginMetadata {
                type_name: args.type_name,
                name: args.name,
                version: args.version,
                author: args.author,
                download_link: args.download_link,
            };
            stamp(&args.file, &meta).with_context(|| format!("stamp {}", args.file.display()))?;
            tracing::info!(file = %args.file.display(), version = %meta.version, "metadata written");
            Ok(())
        }
    }
}

fn update(args: UpdateArgs) -> Result<()> {
    let cfg = resolve_config(&args)?;
    let reader = args.metadata.reader();

    let report = run_with_client(&cfg, reader.as_ref())
        .with_context(|| format!("update pass over {}", cfg.mods_dir.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Config file first, then flags and env on top.
fn resolve_config(args: &UpdateArgs) -> Result<UpdaterConfig> {
    let mut cfg = match &args.config {
        Some(path) => UpdaterConfig::load(path)?,
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(default) => {
                tracing::debug!(path = %default.display(), "using default config");
                UpdaterConfig::load(&default)?
            }
            None => UpdaterConfig::new(PathBuf::new()),
        },
    };

    if let Some(dir) = &args.mods_dir {
        cfg.mods_dir = dir.clone();
    }
    if cfg.mods_dir.as_os_str().is_empty() {
        bail!("no mods directory: pass --mods-dir, set MODUPDATE_MODS_DIR or add mods_dir to the config");
    }
    if let Some(dir) = &args.backup_dir {
        cfg.backup_dir = Some(dir.clone());
    }
    if let Some(dir) = &args.temp_dir {
        cfg.temp_dir = Some(dir.clone());
    }
    if let Some(dir) = &args.install_root {
        cfg.install_dir = Some(dir.clone());
    }
    if let Some(ext) = &args.extension {
        cfg.binary_extension = ext.clone();
    }
    if let Some(secs) = args.timeout_secs {
        cfg.timeout_secs = secs;
    }
    if let Some(ua) = &args.user_agent {
        cfg.user_agent = ua.clone();
    }
    Ok(cfg)
}

fn print_report(report: &UpdateReport) {
    for item in &report.items {
        let line = match &item.outcome {
            ItemOutcome::Updated { from, to, .. } => format!("updated     {from} -> {to}"),
            ItemOutcome::UpToDate { installed, .. } => format!("up to date  {installed}"),
            ItemOutcome::Skipped { reason, message } => format!("skipped     {reason}: {message}"),
        };
        println!("{:<32} {line}", item.file_name);
    }
    for dep in &report.dependencies {
        println!(
            "{:<32} dependency of {} -> {:?}",
            dep.file_name, dep.required_by, dep.outcome
        );
    }
    println!(
        "{} updated, {} skipped, {} checked",
        report.updated().count(),
        report.skipped().count(),
        report.items.len()
    );
}
