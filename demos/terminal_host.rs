use std::error::Error;
use tokio::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use gesture_socket_rs::{ConnectionManager, DisplayFrame, DisplaySink, GestureHost};

// Roughly a 60 Hz render loop
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Prints the label and status whenever either changes.
#[derive(Default)]
struct TerminalSink {
    last: Option<DisplayFrame>,
}

impl DisplaySink for TerminalSink {
    fn render(&mut self, frame: &DisplayFrame) {
        if self.last.as_ref() != Some(frame) {
            println!("{:<24} [{}]", frame.label(), frame.status);
            self.last = Some(frame.clone());
        }
    }
}

/// Shows the current gesture from a producer at GESTURE_HOST:GESTURE_PORT.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut log_level = Level::INFO;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--trace" | "-t" => log_level = Level::TRACE,
            "--debug" | "-d" => log_level = Level::DEBUG,
            "--warn" | "-w" => log_level = Level::WARN,
            _ => {}
        }
    }

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let manager = ConnectionManager::from_env();
    info!("Press Ctrl+C to exit.");

    let mut host = GestureHost::new(manager, TerminalSink::default());
    host.run_until(FRAME_INTERVAL, async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down..."),
            Err(err) => error!("Failed to listen for Ctrl+C signal: {}", err),
        }
    })
    .await;

    Ok(())
}
