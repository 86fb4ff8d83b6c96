//! The Mises node orchestrator.
//!
//! Owns the RocksDB store and the identity keeper. Every state transition and
//! query is serialized through one event loop fed by the HTTP API, so the
//! store has a single writer and needs no locks.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

use mises_identity::{
    IdentityError, Keeper, KvAccountKeeper, MetricsRegistry, NoopTelemetry, Telemetry,
};
use mises_store::{CacheStore, RocksStore};

use crate::commands::{NodeCommand, Reply};
use crate::config::MisesConfig;
use crate::state::NodeState;

/// Meta key holding the number of committed messages.
const APPLIED_MSGS_KEY: &str = "applied_msgs";

/// The Mises node.
pub struct MisesNode {
    /// Node configuration.
    config: MisesConfig,
    /// Identity module.
    keeper: Keeper,
    /// Counters shared with the HTTP API.
    metrics: Arc<MetricsRegistry>,
    /// Persistent storage (None until opened).
    store: Option<RocksStore>,
    /// Messages committed so far.
    applied_msgs: u64,
    /// Shared state accessible from HTTP handlers.
    node_state: Option<Arc<NodeState>>,
    /// Receives commands from the HTTP API.
    command_rx: Option<mpsc::Receiver<NodeCommand>>,
}

impl MisesNode {
    /// Create a new node with the given config.
    pub fn new(config: MisesConfig) -> Result<Self> {
        let metrics = Arc::new(MetricsRegistry::new());
        let telemetry: Arc<dyn Telemetry> = if config.telemetry.enabled {
            metrics.clone()
        } else {
            Arc::new(NoopTelemetry)
        };
        let keeper = Keeper::with_account_keeper(
            KvAccountKeeper::new(),
            telemetry,
            config.query.keeper_params(),
        );

        Ok(Self {
            config,
            keeper,
            metrics,
            store: None,
            applied_msgs: 0,
            node_state: None,
            command_rx: None,
        })
    }

    /// Open storage and create the command channel. Returns the state the
    /// HTTP API needs.
    pub fn open(&mut self) -> Result<Arc<NodeState>> {
        let data_dir = &self.config.storage.data_dir;
        let store = RocksStore::open(data_dir, self.config.storage.sync_writes)?;

        self.applied_msgs = match store.get_meta(APPLIED_MSGS_KEY)? {
            None => 0,
            Some(raw) => std::str::from_utf8(&raw)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "corrupt {} meta value: {:?}",
                        APPLIED_MSGS_KEY,
                        String::from_utf8_lossy(&raw)
                    )
                })?,
        };
        tracing::info!(
            path = %data_dir.display(),
            applied_msgs = self.applied_msgs,
            "storage initialized"
        );

        let (command_tx, command_rx) = mpsc::channel::<NodeCommand>(256);
        let node_state = Arc::new(NodeState::new(
            self.metrics.clone(),
            self.applied_msgs,
            command_tx,
        ));

        self.store = Some(store);
        self.command_rx = Some(command_rx);
        self.node_state = Some(node_state.clone());
        Ok(node_state)
    }

    /// Open storage and spawn the HTTP API server.
    pub async fn start(&mut self) -> Result<()> {
        tracing::info!("starting Mises node");
        let node_state = self.open()?;

        let api_addr: SocketAddr = self.config.api_addr().parse()?;
        tokio::spawn(async move {
            if let Err(e) = crate::api::start_api_server(api_addr, node_state).await {
                tracing::error!(error = %e, "HTTP API server error");
            }
        });
        Ok(())
    }

    /// Run the main event loop until the command channel closes or the
    /// store turns out to be corrupt.
    pub async fn run(&mut self) -> Result<()> {
        let mut command_rx = self
            .command_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("node not started"))?;

        tracing::info!("entering main event loop");

        while let Some(cmd) = command_rx.recv().await {
            self.handle_command(cmd)?;
        }

        tracing::info!("API command channel closed");
        Ok(())
    }

    /// Gracefully shut down the node.
    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("shutting down Mises node");

        self.node_state = None;
        self.command_rx = None;

        if let Some(store) = self.store.take() {
            drop(store);
            tracing::info!("storage closed");
        }

        tracing::info!(applied_msgs = self.applied_msgs(), "Mises node shut down");
        Ok(())
    }

    pub fn applied_msgs(&self) -> u64 {
        self.applied_msgs
    }

    /// Handle a command from the HTTP API. Errors only on fatal storage
    /// corruption.
    fn handle_command(&mut self, cmd: NodeCommand) -> Result<()> {
        let store = self
            .store
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("node not started"))?;
        let keeper = &self.keeper;
        let applied = &mut self.applied_msgs;
        let mutation = cmd.is_mutation();

        let outcome = match cmd {
            NodeCommand::CreateDidRegistry { msg, reply } => respond(
                reply,
                commit(store, applied, |tx| keeper.create_did_registry(tx, msg))
                    .map(|pending| keeper.publish(pending)),
            ),
            NodeCommand::UpdateUserInfo { msg, reply } => respond(
                reply,
                commit(store, applied, |tx| keeper.update_user_info(tx, msg)),
            ),
            NodeCommand::UpdateAppInfo { msg, reply } => respond(
                reply,
                commit(store, applied, |tx| keeper.update_app_info(tx, msg)),
            ),
            NodeCommand::UpdateUserRelation { msg, reply } => respond(
                reply,
                commit(store, applied, |tx| keeper.update_user_relation(tx, msg)),
            ),
            NodeCommand::QueryDid { req, reply } => respond(reply, keeper.query_did(&*store, &req)),
            NodeCommand::QueryUser { req, reply } => {
                respond(reply, keeper.query_user(&*store, &req))
            }
            NodeCommand::QueryApp { req, reply } => respond(reply, keeper.query_app(&*store, &req)),
            NodeCommand::QueryUserRelation { req, reply } => {
                respond(reply, keeper.query_user_relation(&*store, &req))
            }
        };

        if mutation {
            if let Some(state) = &self.node_state {
                state.set_applied_msgs(self.applied_msgs);
            }
        }
        outcome
    }
}

/// Run `f` in a fresh overlay of `store` and commit its writes together with
/// the bumped message counter. Returns only once the batch is durable, so
/// callers publish signals after this returns `Ok`.
fn commit<T, F>(store: &mut RocksStore, applied: &mut u64, f: F) -> Result<T, IdentityError>
where
    F: FnOnce(&mut CacheStore<'_, RocksStore>) -> Result<T, IdentityError>,
{
    let (value, ops) = {
        let mut tx = CacheStore::new(&*store);
        let value = f(&mut tx)?;
        (value, tx.into_batch())
    };
    let next = *applied + 1;
    store.commit(ops, &[(APPLIED_MSGS_KEY, next.to_string().into_bytes())])?;
    *applied = next;
    Ok(value)
}

/// Send `result` back to the API. Corruption is reported to the caller and
/// then stops the loop.
fn respond<T>(reply: Reply<T>, result: Result<T, IdentityError>) -> Result<()> {
    let fatal = match &result {
        Err(e) if e.is_fatal() => Some(e.to_string()),
        Err(e) => {
            tracing::debug!(error = %e, "command rejected");
            None
        }
        Ok(_) => None,
    };

    let _ = reply.send(result);

    match fatal {
        Some(error) => {
            tracing::error!(%error, "store corruption detected, stopping event loop");
            anyhow::bail!("store corruption: {}", error)
        }
        None => Ok(()),
    }
}
