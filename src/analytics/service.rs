//! Background search analytics task

use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::event::{new_session_id, SearchEvent};
use crate::analytics::sink::AnalyticsSink;
use crate::config::AnalyticsConfig;
use crate::metrics::ANALYTICS_EVENTS_FLUSHED_TOTAL;
use crate::search::{SearchQuery, SearchResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events that may wait in the channel before the task picks them up
const CHANNEL_CAPACITY: usize = 1024;

enum Command {
    Track(SearchEvent),
    Flush(oneshot::Sender<()>),
}

/// Best-effort search analytics.
///
/// Tracking never blocks or fails the caller: when the channel is full or the
/// task has stopped, the event is dropped. Buffered events are flushed to the
/// sink when the buffer reaches capacity, on every interval tick, and once
/// more on [`SearchAnalytics::shutdown`].
pub struct SearchAnalytics {
    tx: mpsc::Sender<Command>,
    session_id: String,
    task: JoinHandle<()>,
}

impl SearchAnalytics {
    /// Spawn the analytics task. Must be called inside a Tokio runtime.
    pub fn start(sink: Arc<dyn AnalyticsSink>, config: &AnalyticsConfig) -> AnalyticsResult<Self> {
        if config.buffer_capacity == 0 {
            return Err(AnalyticsError::InvalidConfiguration(
                "buffer_capacity must be greater than zero".to_string(),
            ));
        }
        if config.flush_interval_secs == 0 {
            return Err(AnalyticsError::InvalidConfiguration(
                "flush_interval_secs must be greater than zero".to_string(),
            ));
        }

        Ok(Self::spawn(
            sink,
            config.buffer_capacity,
            Duration::from_secs(config.flush_interval_secs),
        ))
    }

    /// Spawn with an explicit flush interval
    pub fn spawn(sink: Arc<dyn AnalyticsSink>, capacity: usize, flush_interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let session_id = new_session_id();
        let task = tokio::spawn(run(sink, rx, capacity.max(1), flush_interval));

        info!(
            session_id = %session_id,
            capacity,
            flush_interval_ms = flush_interval.as_millis() as u64,
            "Search analytics started"
        );

        Self {
            tx,
            session_id,
            task,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Record an event
    pub fn track(&self, event: SearchEvent) {
        if let Err(e) = self.tx.try_send(Command::Track(event)) {
            debug!(error = %e, "Dropping analytics event");
        }
    }

    /// Record an executed search
    pub fn track_search(
        &self,
        query: impl Into<String>,
        results_count: u64,
        search_time_ms: f64,
        filters_used: Vec<String>,
    ) {
        self.track(SearchEvent::search(
            self.session_id.as_str(),
            query,
            results_count,
            search_time_ms,
            filters_used,
        ));
    }

    /// Record a completed search call
    pub fn track_result(&self, query: &SearchQuery, result: &SearchResult) {
        self.track(SearchEvent::from_result(self.session_id.as_str(), query, result));
    }

    /// Record a click on the result at `position`
    pub fn track_click(&self, query: impl Into<String>, position: usize, member_id: Uuid) {
        self.track(SearchEvent::click(
            self.session_id.as_str(),
            query,
            position,
            member_id,
        ));
    }

    /// Flush buffered events now and wait for the sink to receive them
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Stop accepting events, flush what is buffered and wait for the task
    pub async fn shutdown(self) {
        let Self { tx, task, session_id } = self;
        drop(tx);

        if let Err(e) = task.await {
            warn!(error = %e, "Analytics task ended abnormally");
        }
        info!(session_id = %session_id, "Search analytics stopped");
    }
}

async fn run(
    sink: Arc<dyn AnalyticsSink>,
    mut rx: mpsc::Receiver<Command>,
    capacity: usize,
    flush_interval: Duration,
) {
    let mut buffer: Vec<SearchEvent> = Vec::with_capacity(capacity);
    let mut ticker = tokio::time::interval(flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Track(event)) => {
                    buffer.push(event);
                    if buffer.len() >= capacity {
                        flush_buffer(sink.as_ref(), &mut buffer).await;
                    }
                }
                Some(Command::Flush(done)) => {
                    flush_buffer(sink.as_ref(), &mut buffer).await;
                    let _ = done.send(());
                }
                None => {
                    flush_buffer(sink.as_ref(), &mut buffer).await;
                    break;
                }
            },
            _ = ticker.tick() => {
                flush_buffer(sink.as_ref(), &mut buffer).await;
            }
        }
    }
}

async fn flush_buffer(sink: &dyn AnalyticsSink, buffer: &mut Vec<SearchEvent>) {
    if buffer.is_empty() {
        return;
    }

    let batch = std::mem::take(buffer);
    let count = batch.len();
    match sink.flush(batch).await {
        Ok(()) => {
            ANALYTICS_EVENTS_FLUSHED_TOTAL.inc_by(count as f64);
            info!(count, "Flushed search events");
        }
        Err(e) => warn!(error = %e, count, "Failed to flush search events"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::sink::InMemorySink;

    #[tokio::test]
    async fn test_rejects_zero_capacity() {
        let config = AnalyticsConfig {
            buffer_capacity: 0,
            ..Default::default()
        };
        let result = SearchAnalytics::start(Arc::new(InMemorySink::new()), &config);
        assert!(matches!(result, Err(AnalyticsError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_explicit_flush() {
        let sink = Arc::new(InMemorySink::new());
        let analytics = SearchAnalytics::spawn(sink.clone(), 10, Duration::from_secs(3600));

        analytics.track_search("ada", 1, 2.0, Vec::new());
        analytics.flush().await;

        assert_eq!(sink.batch_sizes(), vec![1]);
        assert_eq!(sink.events()[0].session_id, analytics.session_id());
        analytics.shutdown().await;
    }
}
