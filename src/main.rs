//! # Screwie CLI
//!
//! Runs the Telegram printer bot, or renders a single message to PNG.
//!
//! ## Usage
//!
//! ```bash
//! # Run the bot (config from etc/, ~/.config/ or next to the binary)
//! screwie
//!
//! # Run with an explicit config file and verbose logging
//! screwie --config ./screwie.toml --log-level DEBUG
//!
//! # Preview what a message would look like, without Telegram or a printer
//! screwie render --text "Hello world" --out preview.png
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};

use screwie::{
    Message, RequestHandler, ScrewieError,
    config::Config,
    logging,
    render::{ImageRenderer, Typeface},
    telegram::TelegramBot,
};

/// Screwie - Telegram message printer
#[derive(Parser, Debug)]
#[command(name = "screwie")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (skips the default search paths)
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Logging level
    #[arg(long, short = 'l', value_enum, ignore_case = true, default_value_t = LogLevel::Warning, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a message to a PNG file instead of printing it
    Render {
        /// Message body
        #[arg(long)]
        text: String,

        /// Output PNG file
        #[arg(long, value_name = "FILE")]
        out: PathBuf,

        /// Sender name shown in the header
        #[arg(long, default_value = "preview")]
        sender: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
#[value(rename_all = "UPPER")]
enum LogLevel {
    Notset,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    fn name(self) -> &'static str {
        match self {
            LogLevel::Notset => "NOTSET",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ScrewieError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Render { text, out, sender }) => {
            let (config, paths) = Config::load_or_default(cli.config.as_deref())?;
            logging::init(cli.log_level.name(), config.log_level.as_deref());
            log_config_paths(&paths);
            render_preview(&config, &text, &sender, &out)
        }
        None => {
            let (config, paths) = Config::load(cli.config.as_deref())?;
            logging::init(cli.log_level.name(), config.log_level.as_deref());
            log_config_paths(&paths);
            serve(config).await
        }
    }
}

fn log_config_paths(paths: &[PathBuf]) {
    if paths.is_empty() {
        tracing::info!("No configuration file found, using defaults");
    }
    for path in paths {
        tracing::info!("Read configuration file: {}", path.display());
    }
}

/// Validate everything up front, then poll until the process is killed.
async fn serve(config: Config) -> Result<(), ScrewieError> {
    let token = config.bot_token()?.to_string();
    let policy = config.access_policy()?;
    tracing::info!("Allowed users: {:?}", policy.ids());
    if policy.is_empty() {
        tracing::warn!("allowed_users is empty; every sender will be denied");
    }

    let font: Arc<dyn Typeface> = Arc::new(config.load_typeface()?);
    let spec = config.render_spec(font)?;
    let dispatcher = config.dispatcher()?;
    tracing::info!(
        "Printer command: {} (keep temp files: {})",
        dispatcher.command().program(),
        spec.keep_temp_files
    );

    let handler = Arc::new(RequestHandler::new(policy, spec, dispatcher));
    let bot = Arc::new(TelegramBot::new(token));

    let me = bot.get_me().await?;
    tracing::info!("Starting Telegram bot @{}", me);

    bot.run(handler).await;
    Ok(())
}

fn render_preview(
    config: &Config,
    text: &str,
    sender: &str,
    out: &Path,
) -> Result<(), ScrewieError> {
    let font: Arc<dyn Typeface> = Arc::new(config.load_typeface()?);
    let spec = config.render_spec(font)?;

    let mut message = Message::new(0, Utc::now(), text);
    message.username = Some(sender.to_string());

    let document = screwie::format::format_document(&message, spec.timezone)
        .map_err(|e| ScrewieError::Config(format!("nothing to render: {}", e)))?;
    let canvas = ImageRenderer::new(spec).render_text(&document);

    let mut file = std::fs::File::create(out)?;
    canvas.write_png(&mut file)?;
    println!(
        "Saved {}x{} preview to {}",
        canvas.width(),
        canvas.height(),
        out.display()
    );
    Ok(())
}
