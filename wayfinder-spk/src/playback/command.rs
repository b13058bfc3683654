//! Playback through an external player process

use super::{AudioAttributes, PlaybackBackend, PlaybackResource, PlaybackSignal};
use crate::config::PlaybackConfig;
use crate::error::PlaybackError;
use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use url::Url;

/// Plays audio by running `program args... <url>`
///
/// The source is ready as soon as the URL checks out; the process is only
/// spawned on `start`. A zero exit status means the audio finished.
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }
}

impl PlaybackBackend for CommandPlayer {
    fn open(
        &self,
        url: &str,
        attributes: AudioAttributes,
        signals: mpsc::UnboundedSender<PlaybackSignal>,
    ) -> Result<Box<dyn PlaybackResource>, PlaybackError> {
        let parsed = Url::parse(url).map_err(|e| PlaybackError::InvalidUrl(format!("{}: {}", url, e)))?;
        match parsed.scheme() {
            "http" | "https" | "file" => {}
            other => {
                return Err(PlaybackError::InvalidUrl(format!(
                    "unsupported scheme '{}' in {}",
                    other, url
                )))
            }
        }

        debug!(?attributes, "Opening {} with {}", url, self.program);
        let _ = signals.send(PlaybackSignal::Ready);

        Ok(Box::new(CommandResource {
            program: self.program.clone(),
            args: self.args.clone(),
            url: url.to_string(),
            signals,
            stop: None,
            released: false,
        }))
    }
}

struct CommandResource {
    program: String,
    args: Vec<String>,
    url: String,
    signals: mpsc::UnboundedSender<PlaybackSignal>,
    stop: Option<oneshot::Sender<()>>,
    released: bool,
}

impl PlaybackResource for CommandResource {
    fn start(&mut self) -> Result<(), PlaybackError> {
        if self.released {
            return Err(PlaybackError::Start("resource already released".to_string()));
        }
        if self.stop.is_some() {
            return Ok(());
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(&self.url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlaybackError::Start(format!("{}: {}", self.program, e)))?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let signals = self.signals.clone();
        let url = self.url.clone();

        tokio::spawn(async move {
            // A dropped sender counts as a stop request
            let exit = tokio::select! {
                status = child.wait() => Some(status),
                _ = stop_rx => None,
            };

            match exit {
                Some(Ok(status)) if status.success() => {
                    let _ = signals.send(PlaybackSignal::Finished);
                }
                Some(Ok(status)) => {
                    let _ = signals.send(PlaybackSignal::Error(format!("player exited with {}", status)));
                }
                Some(Err(e)) => {
                    let _ = signals.send(PlaybackSignal::Error(format!("failed to wait for player: {}", e)));
                }
                None => {
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill player for {}: {}", url, e);
                    } else {
                        debug!("Player for {} stopped", url);
                    }
                }
            }
        });

        self.stop = Some(stop_tx);
        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

impl Drop for CommandResource {
    fn drop(&mut self) {
        self.release();
    }
}
