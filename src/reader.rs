//! Background read loop for one connection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, trace, warn};

use crate::codec::GestureCodec;
use crate::dispatcher::LinkDispatcher;
use crate::error::LinkError;
use crate::state::LinkState;

/// Reads labels from one stream and publishes the latest into a watch channel.
pub struct StreamReader {
    connection_id: u64,
    active: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    gesture_tx: Arc<watch::Sender<String>>,
    dispatcher: Arc<LinkDispatcher>,
    buffer_size: usize,
}

impl StreamReader {
    pub(crate) fn new(
        connection_id: u64,
        gesture_tx: Arc<watch::Sender<String>>,
        dispatcher: Arc<LinkDispatcher>,
        buffer_size: usize,
    ) -> Self {
        Self {
            connection_id,
            active: Arc::new(AtomicBool::new(true)),
            shutdown: Arc::new(Notify::new()),
            gesture_tx,
            dispatcher,
            buffer_size,
        }
    }

    /// Spawn the loop on its own task and return the handle used to stop it.
    pub(crate) fn spawn<S>(self, stream: S) -> ReaderHandle
    where
        S: AsyncRead + Unpin + Send + 'static,
    {
        let active = self.active.clone();
        let shutdown = self.shutdown.clone();
        let task = tokio::spawn(async move {
            let _ = self.run(stream).await;
        });
        ReaderHandle {
            active,
            shutdown,
            task: Some(task),
        }
    }

    /// Read until the peer closes, a read fails, or the reader is stopped.
    ///
    /// Returns why the loop ended, or `None` for an intentional stop. An
    /// unintentional exit also queues a reconnect request for the consumer.
    pub async fn run<S>(self, stream: S) -> Option<LinkError>
    where
        S: AsyncRead + Unpin,
    {
        let connection_id = self.connection_id;
        let mut frames = FramedRead::with_capacity(
            stream,
            GestureCodec::new(self.buffer_size),
            self.buffer_size,
        );

        let exit = loop {
            if !self.active.load(Ordering::SeqCst) {
                break None;
            }

            tokio::select! {
                biased;

                _ = self.shutdown.notified() => {
                    debug!(connection_id, "Reader received shutdown notification.");
                    break None;
                }

                frame = frames.next() => match frame {
                    Some(Ok(label)) => {
                        trace!(connection_id, %label, "Gesture received");
                        self.gesture_tx.send_replace(label);
                    }
                    Some(Err(e)) => break Some(LinkError::ReadFailure(e)),
                    None => break Some(LinkError::GracefulClose),
                }
            }
        };

        // Close the socket before anyone can open the next one.
        drop(frames);

        match &exit {
            Some(e) if e.is_graceful() => info!(connection_id, "Producer closed the connection"),
            Some(e) => error!(connection_id, error = %e, "Error reading gesture stream"),
            None => {}
        }

        if self.active.swap(false, Ordering::SeqCst) {
            warn!(connection_id, "Connection lost, requesting reconnect");
            self.dispatcher.enqueue(move |link: &mut LinkState| {
                if link.mark_lost(connection_id) {
                    info!(connection_id, "Connection marked as lost, reconnecting...");
                }
            });
        } else {
            debug!(connection_id, "Reader stopped by teardown");
        }

        exit
    }
}

/// Owner-side handle to a running reader.
#[derive(Debug)]
pub(crate) struct ReaderHandle {
    active: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl ReaderHandle {
    pub(crate) fn signal_stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.shutdown.notify_one();
    }

    pub(crate) fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Signal the loop and wait for its task to finish.
    pub(crate) async fn stop(mut self) -> Result<(), LinkError> {
        self.signal_stop();
        if let Some(task) = self.task.take() {
            task.await?;
        }
        Ok(())
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        // don't block here; the loop sees the flag or the notification
        self.signal_stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    fn reader(
        id: u64,
    ) -> (
        StreamReader,
        watch::Receiver<String>,
        Arc<LinkDispatcher>,
    ) {
        let (tx, rx) = watch::channel(" ".to_string());
        let dispatcher = Arc::new(LinkDispatcher::new());
        let reader = StreamReader::new(id, Arc::new(tx), dispatcher.clone(), 1024);
        (reader, rx, dispatcher)
    }

    #[tokio::test]
    async fn test_publishes_trimmed_label_then_reports_close() {
        let (reader, mut rx, dispatcher) = reader(3);
        let (mut producer, consumer) = tokio::io::duplex(64);

        let task = tokio::spawn(reader.run(consumer));

        producer.write_all(b"wave\n").await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*rx.borrow(), "wave");

        drop(producer);
        let exit = task.await.unwrap();
        assert!(matches!(exit, Some(LinkError::GracefulClose)));

        let mut link = LinkState::new(Duration::from_secs(2));
        link.connection_id = Some(3);
        assert_eq!(dispatcher.drain(&mut link), 1);
        assert!(link.reconnect().is_pending());
        assert_eq!(*rx.borrow(), "wave");
    }

    #[tokio::test]
    async fn test_stop_exits_silently() {
        let (reader, _rx, dispatcher) = reader(1);
        let (_producer, consumer) = tokio::io::duplex(64);

        let handle = reader.spawn(consumer);
        assert!(handle.is_running());
        tokio::time::timeout(Duration::from_secs(2), handle.stop())
            .await
            .unwrap()
            .unwrap();

        assert!(dispatcher.is_empty());
    }
}
