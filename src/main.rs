use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use sciolyid::jobs::{spawn_reconcile_timer, Job, JobQueue};
use sciolyid::{Config, Context};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sciolyid",
    version,
    about = "Media cache and upload verification for an identification quiz bot"
)]
struct Cli {
    /// Config file (default: ~/.config/sciolyid/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the store URL from the config file
    #[arg(long, env = "SCIOLYID_REDIS_URL", global = true)]
    redis_url: Option<String>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pick the next image of an item for a channel
    Fetch {
        channel: String,
        /// Item name, may be several words
        #[arg(required = true, num_args = 1..)]
        item: Vec<String>,
    },
    /// Initialise a channel's state if it has none
    Setup { channel: String },
    /// Push the verification repository on behalf of a user
    Push { user: String, message: String },
    /// Run one verification reconciliation pass
    Reconcile,
    /// Run the job worker with a periodic reconciliation timer
    Worker {
        /// Seconds between reconciliation passes
        #[arg(long, default_value_t = 3600)]
        interval: u64,
    },
    /// Show a user's upload status record
    Status { user: String },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => match Config::default_path().filter(|path| path.exists()) {
            Some(path) => Config::load(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => {
                tracing::warn!("no config file found, using defaults");
                Config::default()
            }
        },
    };
    if let Some(url) = &cli.redis_url {
        config.redis_url = url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let ctx = Context::from_config(config).context("failed to initialise")?;

    match cli.command {
        Commands::Fetch { channel, item } => {
            let item = item.join(" ");
            ctx.channels().setup(&channel).await?;
            match ctx.media_service().send_image(&channel, &item).await {
                Ok(attachment) => {
                    println!(
                        "{} {} as {} ({} bytes)",
                        "✓".green(),
                        attachment.path.display(),
                        attachment.filename.bold(),
                        attachment.size
                    );
                }
                Err(e) => {
                    eprintln!("{}", e.user_message(&ctx.config.id_type).red());
                    std::process::exit(1);
                }
            }
        }
        Commands::Setup { channel } => {
            if ctx.channels().setup(&channel).await? {
                println!("{} channel {} initialised", "✓".green(), channel);
            } else {
                println!("channel {} already set up", channel);
            }
        }
        Commands::Push { user, message } => {
            ctx.sync_validation_repo()
                .await
                .context("failed to sync verification repository")?;
            match ctx.push_upload(&message, &user).await {
                Ok(Some(flags)) => println!("{} {}", "pushed:".green(), flags.join(", ")),
                Ok(None) => println!("{}", "push failed completely".red()),
                Err(e) => {
                    eprintln!("{} {}", "push failed:".red(), e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Reconcile => {
            let report = ctx
                .reconciler()
                .move_images()
                .await
                .context("reconciliation failed")?;
            if !report.changed() {
                println!("no changes to update!");
            } else {
                println!(
                    "{} deleted {}, moved {}, skipped {}",
                    "✓".green(),
                    report.deleted.len(),
                    report.moved.len(),
                    report.skipped.len()
                );
            }
        }
        Commands::Worker { interval } => {
            let (queue, worker) = JobQueue::start(ctx.clone());
            let timer = spawn_reconcile_timer(queue.clone(), Duration::from_secs(interval.max(1)));
            // Catch up on votes cast while no worker was running
            queue.enqueue(Job::MoveImages).await?;

            tracing::info!("worker running, reconciling every {}s", interval);
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for ctrl-c")?;
            tracing::info!("shutting down, finishing queued jobs");

            timer.abort();
            let _ = timer.await;
            drop(queue);
            worker.await.context("job worker panicked")?;
        }
        Commands::Status { user } => {
            let status = ctx.upload_status(&user).await?;
            if status.is_empty() {
                println!("no upload status for {}", user);
            } else {
                let mut fields: Vec<_> = status.into_iter().collect();
                fields.sort();
                for (field, value) in fields {
                    println!("{:>10} {}", field.cyan(), value);
                }
            }
        }
    }

    Ok(())
}
