use std::error::Error;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use gesture_socket_rs::Settings;

// Stand-in for the recognition process: cycles through labels and pushes the
// current one to every client every 100ms, without framing.
const GESTURES: [&str; 4] = ["Piedra", "Papel", "Tijera", " "];
const SEND_INTERVAL: Duration = Duration::from_millis(100);
const GESTURE_HOLD: Duration = Duration::from_secs(2);

async fn serve_client(mut socket: TcpStream, mut current: watch::Receiver<&'static str>) {
    loop {
        let gesture = *current.borrow_and_update();
        if let Err(e) = socket.write_all(gesture.as_bytes()).await {
            warn!(error = %e, "Client went away");
            break;
        }
        sleep(SEND_INTERVAL).await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let settings = Settings::from_env();
    let listener = TcpListener::bind(settings.address()).await?;
    info!("Mock producer listening on {}", settings.address());

    let (gesture_tx, gesture_rx) = watch::channel(GESTURES[0]);

    tokio::spawn(async move {
        for gesture in GESTURES.iter().cycle() {
            gesture_tx.send_replace(*gesture);
            sleep(GESTURE_HOLD).await;
        }
    });

    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Client connected from {}", peer);
        tokio::spawn(serve_client(socket, gesture_rx.clone()));
    }
}
