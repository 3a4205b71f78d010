mod logging;

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use engine_logging::{engine_error, engine_info};
use mailhook_core::{EmailRenderer, FooterMarker, RenderConfig, DEFAULT_BLOCK_LIMIT};
use mailhook_engine::{
    decode_markup, sign_body, webhook_router, DeliveryReport, Relay, RelaySettings,
    RequestHeaders, SIGNATURE_HEADER,
};
use tokio::net::TcpListener;

use crate::logging::LogDestination;

const BLOCK_RULE: &str = "----------------------------------------";

/// Render HTML email into chat-sized text blocks and relay it to webhooks.
#[derive(Debug, Parser)]
#[command(name = "mailhook", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render an HTML file and print its blocks.
    Render(RenderArgs),
    /// Listen for inbound email webhooks.
    Serve(ServeArgs),
    /// Run a captured webhook request through the full relay.
    Replay(ReplayArgs),
}

#[derive(Debug, Args)]
struct RenderArgs {
    /// HTML file to render.
    file: PathBuf,
    /// Title prepended in bold.
    #[arg(long)]
    title: Option<String>,
    /// Maximum characters per block.
    #[arg(long, default_value_t = DEFAULT_BLOCK_LIMIT)]
    limit: usize,
    /// Character encoding of the file, when known.
    #[arg(long)]
    charset: Option<String>,
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// RON settings file.
    #[arg(long)]
    config: PathBuf,
    /// Save each request body and its headers into this directory
    /// (the current directory when given without a value).
    #[arg(long, short = 's', num_args = 0..=1, default_missing_value = ".")]
    save_body: Option<PathBuf>,
    /// Log blocks instead of posting them.
    #[arg(long)]
    dry_run: bool,
    /// Debug-level logging.
    #[arg(long, short = 'd')]
    debug: bool,
    /// Also write the log to ./mailhook.log.
    #[arg(long)]
    log_file: bool,
}

#[derive(Debug, Args)]
struct ReplayArgs {
    /// RON settings file.
    #[arg(long)]
    config: PathBuf,
    /// Captured JSON request body.
    #[arg(long)]
    body: PathBuf,
    /// Captured request headers as a JSON object.
    #[arg(long)]
    headers: Option<PathBuf>,
    /// Log blocks instead of posting them.
    #[arg(long)]
    dry_run: bool,
    /// Debug-level logging.
    #[arg(long)]
    debug: bool,
    /// Also write the log to ./mailhook.log.
    #[arg(long)]
    log_file: bool,
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Render(args) => {
            logging::initialize(LogDestination::Terminal, false);
            run_render(&args)
        }
        Command::Serve(args) => {
            logging::initialize(LogDestination::from_flag(args.log_file), args.debug);
            run_serve(&args)
        }
        Command::Replay(args) => {
            logging::initialize(LogDestination::from_flag(args.log_file), args.debug);
            run_replay(&args)
        }
    }
}

fn run_render(args: &RenderArgs) -> Result<()> {
    let bytes = fs::read(&args.file).with_context(|| format!("reading {:?}", args.file))?;
    let decoded = decode_markup(&bytes, args.charset.as_deref())?;
    engine_info!("decoded {:?} as {}", args.file, decoded.encoding_label);

    let config = RenderConfig::new(args.limit, FooterMarker::default())?;
    let rendered = EmailRenderer::new(config).render(&decoded.html, args.title.as_deref());
    println!("{}", rendered.blocks.join(&format!("\n{BLOCK_RULE}\n")));
    Ok(())
}

fn run_serve(args: &ServeArgs) -> Result<()> {
    let settings = RelaySettings::load(&args.config)?;
    let relay = Relay::from_settings(&settings, args.dry_run)?;
    let app = webhook_router(
        Arc::new(relay),
        &settings.webhook_route(),
        args.save_body.clone(),
    );
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(async {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding {addr}"))?;
        engine_info!("listening on {} at {}", addr, settings.webhook_route());
        axum::serve(listener, app).await.context("serving webhooks")
    })
}

fn run_replay(args: &ReplayArgs) -> Result<()> {
    let settings = RelaySettings::load(&args.config)?;
    let body = fs::read(&args.body).with_context(|| format!("reading {:?}", args.body))?;
    let headers = match &args.headers {
        Some(path) => {
            let raw =
                fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
            RequestHeaders::from_json(&raw).with_context(|| format!("parsing {:?}", path))?
        }
        None => RequestHeaders::new(),
    };
    let headers = replay_headers(&settings, &body, headers);

    let relay = Relay::from_settings(&settings, args.dry_run)?;
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    let outcome = runtime.block_on(relay.handle(&body, &headers))?;

    report("primary", &outcome.primary);
    if let Some(stylized) = &outcome.stylized {
        report("stylized", stylized);
    }

    let incomplete = !outcome.primary.is_complete()
        || outcome.stylized.as_ref().is_some_and(|r| !r.is_complete());
    if incomplete {
        bail!("some blocks could not be delivered");
    }
    Ok(())
}

/// Captured signatures are replaced by one computed with the configured key,
/// so edited or re-saved bodies still authenticate.
fn replay_headers(
    settings: &RelaySettings,
    body: &[u8],
    captured: RequestHeaders,
) -> RequestHeaders {
    match settings.signature_key() {
        Some(key) => captured.with(SIGNATURE_HEADER, sign_body(key, body)),
        None => captured,
    }
}

fn report(name: &str, report: &DeliveryReport) {
    engine_info!(
        "{}: {} delivered, {} skipped, {} failed",
        name,
        report.delivered,
        report.skipped,
        report.failures.len()
    );
    for (index, err) in &report.failures {
        engine_error!("{} block {} failed: {}", name, index + 1, err);
    }
}
