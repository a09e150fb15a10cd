//! Long-running engine: one memory, one store, two timers.
//!
//! The physics timer advances the graph every `tick_interval_ms`. The persist
//! timer prunes and serializes under the memory lock, then hands the SQLite
//! write to the blocking pool so a slow disk never delays the next tick.
//! Both timers skip missed ticks instead of bursting, so neither can overlap
//! with itself.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use muza_core::{
    AssociativeMemory, ContentType, Emotion, LearnReport, MemoryStats, Node, TickReport,
    millis_to_iso8601, now_millis,
};
use muza_store::{EngineConfig, Store, db_path};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

/// Owned view of a node for tool and CLI output.
#[derive(Clone, Debug, Serialize)]
pub struct NodeSummary {
    pub id: String,
    pub energy: f64,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub emotion: Emotion,
    pub associations: usize,
    pub last_access: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl NodeSummary {
    pub fn from_node(node: &Node, similarity: Option<f64>) -> Self {
        Self {
            id: node.id.clone(),
            energy: node.energy,
            content_type: node.content_type,
            emotion: node.emotion,
            associations: node.associations.len(),
            last_access: millis_to_iso8601(node.last_access),
            similarity,
        }
    }
}

struct Running {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

pub struct Engine {
    memory: Arc<Mutex<AssociativeMemory>>,
    store: Arc<std::sync::Mutex<Store>>,
    config: EngineConfig,
    running: std::sync::Mutex<Option<Running>>,
}

impl Engine {
    /// Open `<data_dir>/muza.db`, apply `<data_dir>/muza.toml` and load the
    /// last snapshot. An unreadable snapshot starts an empty graph.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let config = EngineConfig::load(data_dir).context("failed to load config")?;
        let path = db_path(data_dir);
        let store = Store::open(&path)
            .with_context(|| format!("failed to open store at {}", path.display()))?;
        Ok(Self::with_store(store, config))
    }

    pub fn in_memory() -> Result<Self> {
        let store = Store::open_in_memory().context("failed to open in-memory store")?;
        Ok(Self::with_store(store, EngineConfig::default()))
    }

    pub fn with_store(store: Store, config: EngineConfig) -> Self {
        let graph = store.load_graph_or_empty();
        let memory = AssociativeMemory::from_graph(graph)
            .with_params(config.physics)
            .with_retention(config.retention);
        Self {
            memory: Arc::new(Mutex::new(memory)),
            store: Arc::new(std::sync::Mutex::new(store)),
            config,
            running: std::sync::Mutex::new(None),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start both timers. Returns false if they were already running.
    pub fn start(&self) -> bool {
        let Ok(mut running) = self.running.lock() else {
            tracing::error!("engine state lock poisoned");
            return false;
        };
        if running.is_some() {
            return false;
        }

        let cancel = CancellationToken::new();
        let handles = vec![
            tokio::spawn(tick_loop(
                self.memory.clone(),
                Duration::from_millis(self.config.tick_interval_ms),
                cancel.clone(),
            )),
            tokio::spawn(persist_loop(
                self.memory.clone(),
                self.store.clone(),
                Duration::from_millis(self.config.persist_interval_ms),
                cancel.clone(),
            )),
        ];
        *running = Some(Running { cancel, handles });
        tracing::info!(
            tick_ms = self.config.tick_interval_ms,
            persist_ms = self.config.persist_interval_ms,
            "engine started"
        );
        true
    }

    /// Stop both timers, wait for them, then prune and flush once more.
    /// Safe to call when not running; the final flush still happens.
    pub async fn stop(&self) -> Result<usize> {
        let running = self
            .running
            .lock()
            .map_err(|_| anyhow!("engine state lock poisoned"))?
            .take();

        if let Some(Running { cancel, handles }) = running {
            cancel.cancel();
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::warn!("engine task ended abnormally: {e}");
                }
            }
            tracing::info!("engine stopped");
        }

        let saved = self.flush().await?;
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let store = store.lock().map_err(|_| anyhow!("store lock poisoned"))?;
            store.checkpoint_truncate()?;
            Ok(())
        })
        .await??;
        Ok(saved)
    }

    /// Prune, serialize and write the snapshot now. Returns the node count written.
    pub async fn flush(&self) -> Result<usize> {
        persist(&self.memory, &self.store).await
    }

    // --- Delegated operations ---

    pub async fn learn(
        &self,
        text: &str,
        adaptive_memory_active: bool,
        content_type: ContentType,
        emotion: Emotion,
    ) -> LearnReport {
        let mut memory = self.memory.lock().await;
        memory.learn(text, adaptive_memory_active, content_type, emotion)
    }

    pub async fn search(&self, query: &str, top_k: usize) -> Vec<NodeSummary> {
        let memory = self.memory.lock().await;
        memory
            .semantic_search(query, top_k)
            .into_iter()
            .map(|s| NodeSummary::from_node(s.node, Some(s.similarity)))
            .collect()
    }

    pub async fn recall(&self, query: &str) -> Option<String> {
        self.memory.lock().await.cached_response(query)
    }

    pub async fn generate(&self, seed: &str, length: usize) -> Option<String> {
        self.memory.lock().await.generate(seed, length)
    }

    pub async fn most_active(&self, count: usize) -> Vec<NodeSummary> {
        let memory = self.memory.lock().await;
        memory
            .most_active(count)
            .into_iter()
            .map(|n| NodeSummary::from_node(n, None))
            .collect()
    }

    /// Snapshot of every live node.
    pub async fn nodes(&self) -> Vec<Node> {
        self.memory.lock().await.nodes().cloned().collect()
    }

    pub async fn stats(&self) -> MemoryStats {
        self.memory.lock().await.stats()
    }

    /// Run `ticks` steps immediately, independent of the timer.
    pub async fn simulate(&self, ticks: usize) -> TickReport {
        let mut memory = self.memory.lock().await;
        let mut total = TickReport::default();
        for _ in 0..ticks {
            let report = memory.tick();
            total.nodes = report.nodes;
            total.resets += report.resets;
        }
        total
    }

    pub async fn export_json(&self) -> Result<String> {
        let memory = self.memory.lock().await;
        memory.export_json().context("failed to serialize graph")
    }

    /// Replace the live graph. Returns the number of nodes loaded.
    pub async fn import_json(&self, json: &str) -> Result<usize> {
        let mut memory = self.memory.lock().await;
        memory.import_json(json).context("invalid snapshot JSON")
    }
}

async fn tick_loop(
    memory: Arc<Mutex<AssociativeMemory>>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let report = memory.lock().await.tick();
                if report.resets > 0 {
                    tracing::debug!(nodes = report.nodes, resets = report.resets, "runaway nodes reset");
                }
            }
        }
    }
}

async fn persist_loop(
    memory: Arc<Mutex<AssociativeMemory>>,
    store: Arc<std::sync::Mutex<Store>>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = persist(&memory, &store).await {
                    tracing::error!("snapshot write failed: {e:#}");
                }
            }
        }
    }
}

async fn persist(
    memory: &Arc<Mutex<AssociativeMemory>>,
    store: &Arc<std::sync::Mutex<Store>>,
) -> Result<usize> {
    let (json, nodes) = {
        let mut memory = memory.lock().await;
        let removed = memory.prune();
        if removed > 0 {
            tracing::debug!(removed, "pruned faded nodes");
        }
        let json = memory.export_json().context("failed to serialize graph")?;
        (json, memory.graph().len())
    };

    let store = store.clone();
    let now = now_millis();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let store = store.lock().map_err(|_| anyhow!("store lock poisoned"))?;
        store.save_snapshot_json(&json, now)?;
        Ok(())
    })
    .await??;

    tracing::debug!(nodes, "snapshot written");
    Ok(nodes)
}
