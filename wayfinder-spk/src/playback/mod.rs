//! Audio playback
//!
//! A [`PlaybackBackend`] turns a URL into a [`PlaybackResource`] and reports
//! its progress as [`PlaybackSignal`]s on a single channel. The
//! [`manager::PlaybackManager`] owns at most one resource at a time.

pub mod command;
pub mod manager;

use crate::error::PlaybackError;
use std::fmt;
use tokio::sync::mpsc;

/// State of the playback handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Preparing,
    Playing,
    Completed,
    Error,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Preparing => "preparing",
            PlaybackState::Playing => "playing",
            PlaybackState::Completed => "completed",
            PlaybackState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Asynchronous notification from a playback resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackSignal {
    Ready,
    Finished,
    Error(String),
}

/// State transition published by the manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackEvent {
    pub url: String,
    pub state: PlaybackState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioUsage {
    Media,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioContent {
    Speech,
}

/// Output routing hints for the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioAttributes {
    pub usage: AudioUsage,
    pub content: AudioContent,
}

impl AudioAttributes {
    /// Media output carrying speech
    pub fn speech() -> Self {
        Self {
            usage: AudioUsage::Media,
            content: AudioContent::Speech,
        }
    }
}

/// Creates playback resources
pub trait PlaybackBackend: Send + Sync {
    /// Acquire a resource for `url` and begin preparing it.
    ///
    /// Preparation is asynchronous: the resource sends `Ready` on `signals`
    /// once it can start, and later `Finished` or `Error`. On failure the
    /// backend must not leave anything acquired.
    fn open(
        &self,
        url: &str,
        attributes: AudioAttributes,
        signals: mpsc::UnboundedSender<PlaybackSignal>,
    ) -> Result<Box<dyn PlaybackResource>, PlaybackError>;
}

/// One acquired audio output
pub trait PlaybackResource: Send {
    /// Begin audible output. Called once, after `Ready`.
    fn start(&mut self) -> Result<(), PlaybackError>;

    /// Stop output and free the resource. Must be idempotent.
    fn release(&mut self);
}
