use std::future::Future;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::ConnectionManager;

/// What the host shows each frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    pub gesture: String,
    pub status: String,
}

impl DisplayFrame {
    /// Text for the on-screen label.
    pub fn label(&self) -> String {
        format!("Gesture: {}", self.gesture)
    }
}

/// Something that renders the current gesture, e.g. a text widget.
pub trait DisplaySink {
    fn render(&mut self, frame: &DisplayFrame);
}

// Records every frame; handy for headless hosts and tests
impl DisplaySink for Vec<DisplayFrame> {
    fn render(&mut self, frame: &DisplayFrame) {
        self.push(frame.clone());
    }
}

/// Frame-driven host: ticks the manager and renders once per frame.
pub struct GestureHost<S> {
    manager: ConnectionManager,
    sink: S,
}

impl<S: DisplaySink> GestureHost<S> {
    pub fn new(manager: ConnectionManager, sink: S) -> Self {
        Self { manager, sink }
    }

    pub async fn start(&mut self) {
        self.manager.start().await;
        self.render();
    }

    /// One host frame at time `now`.
    pub async fn frame(&mut self, now: Instant) {
        self.manager.tick(now).await;
        self.render();
    }

    pub async fn shutdown(&mut self) {
        self.manager.shutdown().await;
        self.render();
    }

    /// Start, then run frames every `frame_interval` until `shutdown` resolves.
    pub async fn run_until<F>(&mut self, frame_interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        self.start().await;

        let mut ticker = tokio::time::interval(frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Host shutdown requested");
                    break;
                }
                instant = ticker.tick() => self.frame(instant.into_std()).await,
            }
        }

        self.shutdown().await;
    }

    fn render(&mut self) {
        let frame = self.manager.frame();
        self.sink.render(&frame);
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut ConnectionManager {
        &mut self.manager
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (ConnectionManager, S) {
        (self.manager, self.sink)
    }
}
