//! Event-driven index worker.
//!
//! Subscribes to the post [`EventBus`] and runs the pipeline for every
//! after-write event, with at most `max_concurrent` posts in flight.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use solmi_core::defaults::EVENT_BUS_CAPACITY;
use solmi_core::{Error, EventBus, EventEnvelope, PostId, Result};

use crate::config::IndexerConfig;
use crate::pipeline::{IndexReport, IndexingPipeline};

/// Event emitted by the index worker.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum IndexEvent {
    /// Both branches succeeded for a post.
    Indexed {
        post_id: PostId,
        link_count: usize,
        keyword_count: usize,
        duration_ms: u64,
    },
    /// At least one branch failed. The other branch's write still happened.
    Failed { post_id: PostId, error: String },
    /// Worker started.
    WorkerStarted,
    /// Worker stopped.
    WorkerStopped,
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<IndexEvent>,
}

impl WorkerHandle {
    /// Signal the worker to stop. In-flight runs finish first.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<IndexEvent> {
        self.event_rx.resubscribe()
    }
}

/// Runs the indexing pipeline for post events.
pub struct IndexWorker {
    pipeline: Arc<IndexingPipeline>,
    config: IndexerConfig,
    event_tx: broadcast::Sender<IndexEvent>,
}

impl IndexWorker {
    pub fn new(pipeline: IndexingPipeline, config: IndexerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self {
            pipeline: Arc::new(pipeline),
            config,
            event_tx,
        }
    }

    /// Subscribe to `bus` and start processing. Events published after this
    /// returns are never missed (unless the receiver lags).
    pub fn start(self, bus: &EventBus) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();
        let post_rx = bus.subscribe();

        tokio::spawn(async move {
            self.run(post_rx, &mut shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
        }
    }

    async fn run(
        &self,
        mut post_rx: broadcast::Receiver<EventEnvelope>,
        shutdown_rx: &mut mpsc::Receiver<()>,
    ) {
        if !self.config.enabled {
            info!("Index worker is disabled, not starting");
            drop(post_rx);
            // Keep the shutdown channel open so the handle can still stop us.
            let _ = shutdown_rx.recv().await;
            return;
        }

        info!(
            subsystem = "index",
            component = "worker",
            max_concurrent = self.config.max_concurrent,
            "Index worker started"
        );
        let _ = self.event_tx.send(IndexEvent::WorkerStarted);

        let permits = Arc::new(Semaphore::new(self.config.max_concurrent));
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Index worker received shutdown signal");
                    break;
                }
                received = post_rx.recv() => match received {
                    Ok(envelope) => {
                        let permits = permits.clone();
                        let pipeline = self.pipeline.clone();
                        let event_tx = self.event_tx.clone();
                        // Permits are taken inside the task so the receiver keeps draining.
                        tasks.spawn(async move {
                            let Ok(_permit) = permits.acquire_owned().await else {
                                return;
                            };
                            process(&pipeline, &event_tx, envelope).await;
                        });
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            subsystem = "index",
                            component = "worker",
                            skipped,
                            "Index worker lagged, reindexing all posts"
                        );
                        let permits = permits.clone();
                        let pipeline = self.pipeline.clone();
                        let event_tx = self.event_tx.clone();
                        tasks.spawn(async move {
                            reindex_all(&pipeline, &event_tx, &permits).await;
                        });
                    }
                    Err(RecvError::Closed) => {
                        info!("Post event bus closed");
                        break;
                    }
                },
                Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = result {
                        error!(error = ?e, "Index task panicked");
                    }
                }
            }
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!(error = ?e, "Index task panicked");
            }
        }

        let _ = self.event_tx.send(IndexEvent::WorkerStopped);
        info!("Index worker stopped");
    }
}

fn report_event(report: &IndexReport) -> IndexEvent {
    match (&report.links, &report.keywords) {
        (Ok(links), Ok(keywords)) => IndexEvent::Indexed {
            post_id: report.post_id.clone(),
            link_count: links.len(),
            keyword_count: keywords.keyword_ids.len(),
            duration_ms: report.duration_ms,
        },
        _ => IndexEvent::Failed {
            post_id: report.post_id.clone(),
            error: report.failures().join("; "),
        },
    }
}

async fn process(
    pipeline: &IndexingPipeline,
    event_tx: &broadcast::Sender<IndexEvent>,
    envelope: EventEnvelope,
) {
    debug!(
        event_id = %envelope.event_id,
        event_type = %envelope.event_type,
        post_id = %envelope.payload.post_id(),
        "Processing post event"
    );

    let report = pipeline.handle_event(&envelope.payload).await;
    let _ = event_tx.send(report_event(&report));
}

/// Index every stored post from its saved content, one permit at a time.
///
/// Recovers the saves whose events were dropped while the receiver lagged.
async fn reindex_all(
    pipeline: &IndexingPipeline,
    event_tx: &broadcast::Sender<IndexEvent>,
    permits: &Arc<Semaphore>,
) {
    let post_ids = match pipeline.stored_post_ids().await {
        Ok(ids) => ids,
        Err(e) => {
            error!(
                subsystem = "index",
                component = "worker",
                op = "reindex",
                error = %e,
                "Failed to list posts for reindex"
            );
            return;
        }
    };

    info!(
        subsystem = "index",
        component = "worker",
        op = "reindex",
        post_count = post_ids.len(),
        "Reindexing all posts"
    );

    for post_id in post_ids {
        let Ok(_permit) = permits.acquire().await else {
            return;
        };
        let event = match pipeline.index_stored(&post_id).await {
            Ok(report) => report_event(&report),
            Err(e) => IndexEvent::Failed {
                post_id: post_id.clone(),
                error: e.to_string(),
            },
        };
        let _ = event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solmi_core::{ContentNode, ContentTree, MemoryStore, PostEvent, PostRepository};
    use std::time::Duration;

    fn worker(store: &Arc<MemoryStore>, config: IndexerConfig) -> IndexWorker {
        let pipeline = IndexingPipeline::new(store.clone(), store.clone(), &config);
        IndexWorker::new(pipeline, config)
    }

    async fn next_event(rx: &mut broadcast::Receiver<IndexEvent>) -> IndexEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for index event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn test_worker_indexes_published_events() {
        let store = Arc::new(MemoryStore::new());
        let tree = ContentTree::new(vec![ContentNode::text("rust rust rust")]);
        store.save_post("post-1", tree.clone()).await;

        let bus = EventBus::new(16);
        let handle = worker(&store, IndexerConfig::default()).start(&bus);
        let mut events = handle.events();
        assert!(matches!(next_event(&mut events).await, IndexEvent::WorkerStarted));

        bus.emit(PostEvent::created("post-1", tree));

        match next_event(&mut events).await {
            IndexEvent::Indexed {
                post_id,
                keyword_count,
                link_count,
                ..
            } => {
                assert_eq!(post_id.as_str(), "post-1");
                assert_eq!(keyword_count, 1);
                assert_eq!(link_count, 0);
            }
            other => panic!("expected Indexed, got {:?}", other),
        }

        handle.shutdown().await.unwrap();
        assert!(matches!(next_event(&mut events).await, IndexEvent::WorkerStopped));
    }

    #[tokio::test]
    async fn test_worker_reports_failures() {
        let store = Arc::new(MemoryStore::new());
        let bus = EventBus::new(16);
        let handle = worker(&store, IndexerConfig::default()).start(&bus);
        let mut events = handle.events();
        assert!(matches!(next_event(&mut events).await, IndexEvent::WorkerStarted));

        // Never saved, so both writes fail.
        bus.emit(PostEvent::updated("ghost", ContentTree::default()));

        match next_event(&mut events).await {
            IndexEvent::Failed { post_id, error } => {
                assert_eq!(post_id.as_str(), "ghost");
                assert!(error.contains("links:"));
                assert!(error.contains("keywords:"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_disabled_worker_does_not_process() {
        let store = Arc::new(MemoryStore::new());
        let tree = ContentTree::new(vec![ContentNode::text("rust rust rust")]);
        store.save_post("post-1", tree.clone()).await;
        let bus = EventBus::new(16);
        let handle = worker(&store, IndexerConfig::default().with_enabled(false)).start(&bus);
        let mut events = handle.events();

        bus.emit(PostEvent::created("post-1", tree));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(events.try_recv().is_err());
        assert_eq!(store.keyword_count().await, 0);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_indexes_every_post_after_lagging() {
        let store = Arc::new(MemoryStore::new());
        let tree = ContentTree::new(vec![ContentNode::text("rust rust rust")]);
        let posts = ["p1", "p2", "p3"];
        for id in posts {
            store.save_post(id, tree.clone()).await;
        }

        // Room for one event: the first two saves are dropped before the
        // worker gets to run.
        let bus = EventBus::new(1);
        let handle = worker(&store, IndexerConfig::default()).start(&bus);
        for id in posts {
            bus.emit(PostEvent::created(id, tree.clone()));
        }

        let all_indexed = async {
            loop {
                let mut pending = 0;
                for id in posts {
                    let keywords = store.keywords_for(&PostId::from(id)).await.unwrap();
                    if keywords.is_empty() {
                        pending += 1;
                    }
                }
                if pending == 0 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), all_indexed)
            .await
            .expect("every saved post is indexed");

        handle.shutdown().await.unwrap();
    }

    #[test]
    fn test_index_event_serialization() {
        let event = IndexEvent::Failed {
            post_id: PostId::from("post-1"),
            error: "links: boom".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"Failed""#));
        assert!(json.contains(r#""post_id":"post-1""#));
    }
}
