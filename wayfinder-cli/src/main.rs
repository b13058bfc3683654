// Wayfinder command line interface
// Runs the capture pipeline, or single describe/speak requests

mod config;
mod console;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::AppConfig;
use console::ConsoleCommand;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wayfinder_core::{is_hazard, ImageSample};
use wayfinder_eye::{AnalysisWorkflow, DirectoryCamera, HttpVisionService, VisualAssistant};
use wayfinder_spk::{
    CommandPlayer, HttpSynthesisService, LogHaptic, NotificationOrchestrator, Notifier, PlaybackEvent,
    PlaybackManager, PlaybackState, SynthesisJobClient,
};

#[derive(Parser)]
#[command(name = "wayfinder")]
#[command(about = "Spoken hazard warnings from periodic scene captures", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML or JSON)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG overrides it
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture, analyze and speak periodically; control it from stdin
    Run {
        /// Directory of JPEG frames to capture from
        #[arg(long)]
        images: Option<PathBuf>,

        /// Seconds between captures
        #[arg(long)]
        interval: Option<u64>,

        /// Wait for a `start` command instead of capturing right away
        #[arg(long)]
        paused: bool,
    },

    /// Analyze one image and speak the result
    Describe {
        /// JPEG file
        image: PathBuf,
    },

    /// Synthesize text and play it
    Speak {
        /// Text to speak; a leading WARNING also pulses the haptic device
        text: String,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.json_logs);

    let mut config = match cli.config {
        Some(ref path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    config.apply_env();

    match cli.command {
        Commands::Run {
            images,
            interval,
            paused,
        } => {
            if let Some(dir) = images {
                config.capture.image_dir = dir;
            }
            if let Some(secs) = interval {
                config.capture.interval_secs = secs;
            }
            config.validate()?;
            run(config, paused).await?;
        }
        Commands::Describe { image } => {
            config.validate()?;
            describe(config, image).await?;
        }
        Commands::Speak { text } => {
            config.validate()?;
            speak(config, text).await?;
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_notifier(config: &AppConfig) -> anyhow::Result<Arc<NotificationOrchestrator>> {
    let service = HttpSynthesisService::new(&config.synthesis).context("synthesis client")?;
    let jobs = SynthesisJobClient::from_config(Arc::new(service), &config.synthesis);
    let playback = Arc::new(PlaybackManager::new(Arc::new(CommandPlayer::from_config(&config.playback))));

    Ok(Arc::new(NotificationOrchestrator::new(
        Arc::new(LogHaptic::new()),
        config.haptic.pulse(),
        jobs,
        playback,
    )))
}

async fn run(config: AppConfig, paused: bool) -> anyhow::Result<()> {
    let notifier = build_notifier(&config)?;
    let vision = HttpVisionService::new(&config.vision).context("vision client")?;
    let camera = DirectoryCamera::new(&config.capture.image_dir);
    info!("Capturing from {}", camera.dir().display());

    let assistant = VisualAssistant::new(
        Arc::new(camera),
        Arc::new(vision),
        notifier,
        config.capture.interval(),
    )?;
    if !paused {
        assistant.start();
    }
    println!("Commands: start, stop, toggle, status, quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ConsoleCommand>() {
                    Ok(ConsoleCommand::Quit) => break,
                    Ok(command) => println!("{}", command.apply(&assistant)),
                    Err(e) => warn!("{}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    assistant.shutdown().await;
    Ok(())
}

async fn describe(config: AppConfig, image: PathBuf) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&image)
        .await
        .with_context(|| format!("reading {}", image.display()))?;

    let notifier = build_notifier(&config)?;
    let playback = notifier.playback().clone();
    let mut events = playback.subscribe();
    let vision = HttpVisionService::new(&config.vision).context("vision client")?;
    let workflow = AnalysisWorkflow::new(Arc::new(vision), notifier);

    let classification = workflow.analyze(ImageSample::new(bytes)).await?;
    println!("{}", classification.text());

    match requested_url(&mut events) {
        Some(url) => report_playback(wait_for_playback(&mut events, &url).await),
        None => warn!("Nothing to play"),
    }
    playback.release();
    Ok(())
}

async fn speak(config: AppConfig, text: String) -> anyhow::Result<()> {
    let notifier = build_notifier(&config)?;
    let playback = notifier.playback().clone();
    let mut events = playback.subscribe();

    let url = notifier.notify(&text, is_hazard(&text)).await?;
    report_playback(wait_for_playback(&mut events, &url).await);
    playback.release();
    Ok(())
}

/// URL of the first playback that began preparing, from events already queued
fn requested_url(events: &mut broadcast::Receiver<PlaybackEvent>) -> Option<String> {
    loop {
        match events.try_recv() {
            Ok(event) if event.state == PlaybackState::Preparing => return Some(event.url),
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
        }
    }
}

/// Last state `url` reached before returning to idle
async fn wait_for_playback(events: &mut broadcast::Receiver<PlaybackEvent>, url: &str) -> PlaybackState {
    let mut last = PlaybackState::Preparing;
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) if event.url == url => {
                    if event.state == PlaybackState::Idle {
                        return last;
                    }
                    last = event.state;
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return last,
            },
            _ = tokio::signal::ctrl_c() => return last,
        }
    }
}

fn report_playback(state: PlaybackState) {
    match state {
        PlaybackState::Completed => info!("Playback completed"),
        other => warn!("Playback ended in state {}", other),
    }
}
