//! Periodic capture scheduler
//!
//! At most one capture session runs at a time. Each tick acquires one image
//! and hands it to a freshly spawned handler task; ticks never wait for
//! earlier handlers, so results from slow ticks may arrive out of order.

use crate::camera::Camera;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;
use wayfinder_core::{Error as CoreError, ImageSample};

/// Receives each captured image in its own task
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CaptureHandler: Send + Sync {
    async fn handle(&self, image: ImageSample);
}

struct CaptureSession {
    started_at: DateTime<Utc>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct CaptureScheduler {
    camera: Arc<dyn Camera>,
    handler: Arc<dyn CaptureHandler>,
    interval: Duration,
    session: Mutex<Option<CaptureSession>>,
}

impl CaptureScheduler {
    /// Build a stopped scheduler. A zero `interval` is rejected.
    pub fn new(
        camera: Arc<dyn Camera>,
        handler: Arc<dyn CaptureHandler>,
        interval: Duration,
    ) -> wayfinder_core::Result<Self> {
        if interval.is_zero() {
            return Err(CoreError::Configuration(
                "Capture interval must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            camera,
            handler,
            interval,
            session: Mutex::new(None),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start capturing. Returns `false` if a session was already running.
    pub fn start(&self) -> bool {
        let mut session = self.session.lock();
        self.start_session(&mut session)
    }

    /// Stop capturing. Returns `false` if nothing was running.
    ///
    /// No new tick begins once this returns. A capture already in progress
    /// finishes and is dispatched, and spawned handlers keep running.
    /// A tick that passed its cancellation check just before this call
    /// counts as in progress, so its capture may start after `stop` returns.
    pub fn stop(&self) -> bool {
        let mut session = self.session.lock();
        Self::stop_session(&mut session).is_some()
    }

    /// Flip the running state and return the new one
    pub fn toggle(&self) -> bool {
        let mut session = self.session.lock();
        if session.is_some() {
            Self::stop_session(&mut session);
            false
        } else {
            self.start_session(&mut session)
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.lock().is_some()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.session.lock().as_ref().map(|s| s.started_at)
    }

    /// Stop and wait for the capture loop to exit
    pub async fn shutdown(&self) {
        let task = Self::stop_session(&mut self.session.lock());
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Capture loop ended abnormally: {}", e);
            }
        }
    }

    fn start_session(&self, session: &mut Option<CaptureSession>) -> bool {
        if session.is_some() {
            debug!("Capture loop already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(capture_loop(
            self.camera.clone(),
            self.handler.clone(),
            self.interval,
            cancel.clone(),
        ));

        *session = Some(CaptureSession {
            started_at: Utc::now(),
            cancel,
            task,
        });
        info!("Capture loop started (every {:?})", self.interval);
        true
    }

    fn stop_session(session: &mut Option<CaptureSession>) -> Option<JoinHandle<()>> {
        let session = session.take()?;
        session.cancel.cancel();
        info!("Capture loop stopped");
        Some(session.task)
    }
}

impl Drop for CaptureScheduler {
    fn drop(&mut self) {
        Self::stop_session(self.session.get_mut());
    }
}

async fn capture_loop(
    camera: Arc<dyn Camera>,
    handler: Arc<dyn CaptureHandler>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        if cancel.is_cancelled() {
            break;
        }
        tick += 1;

        // Capture runs to completion even if stop() lands meanwhile
        let image = match camera.capture_image().await {
            Ok(image) => image,
            Err(e) => {
                warn!("Image capture failed on tick {}: {}", tick, e);
                continue;
            }
        };

        let capture_id = Uuid::new_v4();
        debug!("Tick {} captured {} bytes as {}", tick, image.len(), capture_id);

        let handler = handler.clone();
        let span = info_span!("capture", id = %capture_id, tick);
        tokio::spawn(async move { handler.handle(image).await }.instrument(span));
    }

    debug!("Capture loop exited after {} ticks", tick);
}
