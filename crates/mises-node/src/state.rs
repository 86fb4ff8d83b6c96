//! Shared node state for cross-task communication.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use mises_identity::MetricsRegistry;

use crate::commands::NodeCommand;

/// Shared state for the running node, accessible from HTTP handlers.
pub struct NodeState {
    /// When the node started.
    pub start_time: Instant,
    /// Counters collected by the identity module.
    pub metrics: Arc<MetricsRegistry>,
    /// Messages committed so far (updated by the event loop).
    applied_msgs: AtomicU64,
    /// Channel to send commands to the event loop.
    pub command_tx: mpsc::Sender<NodeCommand>,
}

impl NodeState {
    pub fn new(
        metrics: Arc<MetricsRegistry>,
        applied_msgs: u64,
        command_tx: mpsc::Sender<NodeCommand>,
    ) -> Self {
        Self {
            start_time: Instant::now(),
            metrics,
            applied_msgs: AtomicU64::new(applied_msgs),
            command_tx,
        }
    }

    pub fn applied_msgs(&self) -> u64 {
        self.applied_msgs.load(Ordering::Relaxed)
    }

    pub fn set_applied_msgs(&self, n: u64) {
        self.applied_msgs.store(n, Ordering::Relaxed);
    }
}
