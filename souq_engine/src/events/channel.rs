//! A small stateless pub-sub channel
//!
//! Components of the engine publish events (an order was paid, a return was refunded) and interested parties react to
//! them through hooks. Handlers only ever see the event itself, never the engine's internal state. Handlers can be
//! async, and each event is handled on its own task.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, listener) = mpsc::channel(buffer_size);
        Self { listener, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs until every producer has been dropped and every in-flight handler has finished.
    pub async fn start_handler(self) {
        let Self { mut listener, sender, handler } = self;
        debug!("📬️ Event handler is listening");
        // Only producers may keep the channel open
        drop(sender);
        let mut jobs = JoinSet::new();
        while let Some(event) = listener.recv().await {
            let handler = Arc::clone(&handler);
            jobs.spawn(async move { (handler)(event).await });
            // Reap whatever has already finished so the set does not grow unbounded
            while let Some(done) = jobs.try_join_next() {
                if let Err(e) = done {
                    warn!("📬️ An event handler task failed: {e}");
                }
            }
        }
        debug!("📬️ All producers are gone. Waiting for {} handler(s) to finish", jobs.len());
        while let Some(done) = jobs.join_next().await {
            if let Err(e) = done {
                warn!("📬️ An event handler task failed: {e}");
            }
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to publish event: {e}");
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicI64, Ordering};

    use super::*;

    #[tokio::test]
    async fn every_published_event_is_handled() {
        let _ = env_logger::try_init();
        let total = Arc::new(AtomicI64::new(0));
        let t2 = total.clone();
        let handler: Handler<i64> = Arc::new(move |cents: i64| {
            let total = total.clone();
            Box::pin(async move {
                tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
                total.fetch_add(cents, Ordering::SeqCst);
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let event_handler = EventHandler::new(2, handler);
        let sales = event_handler.subscribe();
        let refunds = event_handler.subscribe();
        tokio::spawn(async move {
            for cents in [1000, 2500, 400] {
                sales.publish_event(cents).await;
            }
        });
        tokio::spawn(async move {
            for cents in [-1000, -400] {
                refunds.publish_event(cents).await;
            }
        });
        event_handler.start_handler().await;
        assert_eq!(t2.load(Ordering::SeqCst), 2500);
    }
}
