//! Maintenance CLI for the runtime bundle and application self-update.
//!
//! All tracing output goes to stderr; stdout carries only the command result.

use assetsync::bundle::BundleSync;
use assetsync::selfupdate::{DialogOptions, HttpUpdateChannel, ProcessRelauncher, UserPrompt};
use assetsync::{
    CheckTrigger, SelfUpdateOutcome, SelfUpdater, SyncConfig, SyncOutcome, TransferEvent,
};
use async_trait::async_trait;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Sync { force: bool },
    Check,
    Status,
    SelfUpdate,
    Help,
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    config: Option<PathBuf>,
    command: Command,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("assetsync=info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "assetsync failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.command == Command::Help {
        print_usage();
        return Ok(());
    }

    let config = load_config(args.config.as_ref())?;

    match args.command {
        Command::Sync { force } => sync(&config, force).await,
        Command::Check => check(&config).await,
        Command::Status => status(&config),
        Command::SelfUpdate => self_update(&config).await,
        Command::Help => Ok(()),
    }
}

fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let mut config = None;
    let mut command = None;
    let mut force = false;

    let mut args = args;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
                config = Some(PathBuf::from(path));
            }
            "--force" | "-f" => force = true,
            "help" | "--help" | "-h" => command = Some("help".to_owned()),
            other if other.starts_with('-') => anyhow::bail!("unknown option `{other}`"),
            other if command.is_none() => command = Some(other.to_owned()),
            other => anyhow::bail!("unexpected argument `{other}`"),
        }
    }

    let command = match command.as_deref().unwrap_or("sync") {
        "sync" => Command::Sync { force },
        "check" => Command::Check,
        "status" => Command::Status,
        "self-update" => Command::SelfUpdate,
        "help" => Command::Help,
        other => anyhow::bail!("unknown subcommand `{other}` (use sync|check|status|self-update)"),
    };
    if force && !matches!(command, Command::Sync { .. }) {
        anyhow::bail!("--force only applies to `sync`");
    }

    Ok(Args { config, command })
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SyncConfig> {
    if let Some(path) = path {
        return Ok(SyncConfig::from_file(path)?);
    }
    let default = SyncConfig::default_config_path();
    if default.exists() {
        tracing::debug!(path = %default.display(), "loading config");
        Ok(SyncConfig::from_file(&default)?)
    } else {
        Ok(SyncConfig::default())
    }
}

async fn sync(config: &SyncConfig, force: bool) -> anyhow::Result<()> {
    let bundle = BundleSync::from_config(config)?;
    let bars = TransferBars::new();
    let outcome = bundle
        .sync_with(force, &|event: TransferEvent| bars.handle(event))
        .await?;

    match outcome {
        SyncOutcome::UpToDate { version } => println!("already up to date ({version})"),
        SyncOutcome::Updated { previous, version } => println!(
            "updated {} -> {version}",
            previous.as_deref().unwrap_or("none")
        ),
    }
    Ok(())
}

async fn check(config: &SyncConfig) -> anyhow::Result<()> {
    let bundle = BundleSync::from_config(config)?;
    let plan = bundle.check().await?;
    match plan.remote_version() {
        Some(remote) => println!(
            "update available: {} -> {remote}",
            bundle.local_version().as_deref().unwrap_or("none")
        ),
        None => println!("up to date"),
    }
    Ok(())
}

fn status(config: &SyncConfig) -> anyhow::Result<()> {
    let bundle = BundleSync::from_config(config)?;
    let status = bundle.status();
    println!(
        "version\t{}\ndir\t{}\ncomplete\t{}",
        status.recorded_version.as_deref().unwrap_or("none"),
        status.install_dir.display(),
        status.complete
    );
    Ok(())
}

async fn self_update(config: &SyncConfig) -> anyhow::Result<()> {
    config.validate()?;
    let endpoint = config
        .self_update
        .endpoint
        .clone()
        .ok_or_else(|| anyhow::anyhow!("self_update.endpoint is not configured"))?;

    let channel = HttpUpdateChannel::new(config.http.build_client()?, endpoint)?;
    let bars = TransferBars::new();
    let updater = SelfUpdater::new(channel, TerminalPrompt, ProcessRelauncher)
        .with_progress(Box::new(move |event: TransferEvent| bars.handle(event)));

    match updater.run(CheckTrigger::UserInitiated).await? {
        SelfUpdateOutcome::UpToDate => println!("up to date"),
        SelfUpdateOutcome::Declined => println!("update declined"),
    }
    Ok(())
}

/// One progress bar per file being transferred.
struct TransferBars {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl TransferBars {
    fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn handle(&self, event: TransferEvent) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        match event {
            TransferEvent::Started { file, total_bytes } => {
                let pb = self.multi.add(ProgressBar::new(total_bytes.unwrap_or(0)));
                if let Ok(style) = ProgressStyle::with_template(
                    "  {msg} [{bar:30}] {bytes}/{total_bytes} {bytes_per_sec} ETA {eta}",
                ) {
                    pb.set_style(style);
                }
                pb.set_message(file.clone());
                bars.insert(file, pb);
            }
            TransferEvent::Progress { file, chunk_len } => {
                if let Some(pb) = bars.get(&file) {
                    pb.inc(chunk_len);
                }
            }
            TransferEvent::Finished { file } => {
                if let Some(pb) = bars.remove(&file) {
                    pb.finish();
                }
            }
        }
    }
}

/// Yes/no prompts on the controlling terminal.
struct TerminalPrompt;

#[async_trait]
impl UserPrompt for TerminalPrompt {
    async fn ask(&self, question: &str, options: &DialogOptions) -> bool {
        let prompt = format!(
            "{}\n\n{question}\n\n{}? [y/N] ",
            options.title, options.ok_label
        );
        let answer = tokio::task::spawn_blocking(move || {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "{prompt}");
            let _ = stderr.flush();
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await;

        matches!(answer, Ok(Ok(line)) if matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
    }

    async fn notify(&self, message: &str, options: &DialogOptions) {
        eprintln!("[{}] {}: {message}", options.kind, options.title);
    }
}

fn print_usage() {
    println!(
        "assetsync [--config <path>] <command>\n\n\
         commands:\n  \
         sync [--force]  install the latest runtime bundle if it changed (default)\n  \
         check           report whether a bundle update is available\n  \
         status          show the recorded bundle version and install state\n  \
         self-update     check for and install an application update"
    );
}
