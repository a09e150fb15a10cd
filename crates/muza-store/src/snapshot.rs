
use muza_core::{NodeGraph, export_json, import_json};

use crate::error::{Result, StoreError};
use crate::store::Store;

/// Key the live graph is stored under.
pub const SNAPSHOT_KEY: &str = "muza_logos_brain";

/// Key used by older releases. Migrated to `SNAPSHOT_KEY` on startup.
pub const LEGACY_SNAPSHOT_KEY: &str = "muza_logos_v35_final_brain";

impl Store {
    /// Move a legacy snapshot under the current key.
    ///
    /// The legacy value is copied only when no current snapshot exists; the
    /// legacy key is removed either way. Returns true if a copy happened.
    pub fn migrate_legacy(&self) -> Result<bool> {
        let Some(legacy) = self.get(LEGACY_SNAPSHOT_KEY)? else {
            return Ok(false);
        };

        let tx = self.conn().unchecked_transaction()?;
        let copied = if self.get(SNAPSHOT_KEY)?.is_none() {
            let saved_at = self.saved_at(LEGACY_SNAPSHOT_KEY)?.unwrap_or(0);
            self.set(SNAPSHOT_KEY, &legacy, saved_at)?;
            true
        } else {
            false
        };
        self.remove(LEGACY_SNAPSHOT_KEY)?;
        tx.commit()?;

        if copied {
            tracing::info!("migrated legacy snapshot to {SNAPSHOT_KEY}");
        } else {
            tracing::info!("discarded legacy snapshot, current one exists");
        }
        Ok(copied)
    }

    /// Write an already serialized snapshot.
    pub fn save_snapshot_json(&self, json: &str, now_ms: u64) -> Result<()> {
        self.set(SNAPSHOT_KEY, json, now_ms)
    }

    pub fn save_graph(&self, graph: &NodeGraph, now_ms: u64) -> Result<()> {
        let json = export_json(graph)
            .map_err(|e| StoreError::InvalidData(format!("JSON export failed: {e}")))?;
        self.save_snapshot_json(&json, now_ms)
    }

    /// Load the stored graph, migrating a legacy snapshot first.
    /// `Ok(None)` when nothing has been saved yet.
    pub fn load_graph(&self) -> Result<Option<NodeGraph>> {
        self.migrate_legacy()?;
        let Some(json) = self.get(SNAPSHOT_KEY)? else {
            return Ok(None);
        };
        let graph = import_json(&json)
            .map_err(|e| StoreError::InvalidData(format!("invalid snapshot: {e}")))?;
        Ok(Some(graph))
    }

    /// Like `load_graph`, but any failure yields an empty graph.
    pub fn load_graph_or_empty(&self) -> NodeGraph {
        match self.load_graph() {
            Ok(Some(graph)) => {
                tracing::info!(nodes = graph.len(), "loaded snapshot");
                graph
            }
            Ok(None) => NodeGraph::new(),
            Err(e) => {
                tracing::warn!("snapshot unreadable, starting empty: {e}");
                NodeGraph::new()
            }
        }
    }
}
