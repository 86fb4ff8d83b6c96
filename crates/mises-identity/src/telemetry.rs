use dashmap::DashMap;
use std::collections::BTreeMap;

use mises_core::DidType;

/// Fire-and-forget counter sink. Implementations must never block or fail.
pub trait Telemetry: Send + Sync {
    fn incr_counter(&self, value: u64, keys: &[&str]);
}

/// Something a state transition did that observers care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// A DID was registered and its account created.
    AccountCreated { did: String, did_type: DidType },
}

impl Signal {
    fn publish(&self, telemetry: &dyn Telemetry) {
        match self {
            Signal::AccountCreated { did, did_type } => {
                telemetry.incr_counter(1, &["new", "account"]);
                tracing::info!(did = %did, did_type = did_type.as_str(), "DID registered");
            }
        }
    }
}

/// Handler output whose signals describe writes that are still buffered.
///
/// The caller owns the unit of work, so only the caller knows when those
/// writes become durable. Call [`Pending::publish`] after the commit; if the
/// writes are dropped, drop the signals with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending<T> {
    value: T,
    signals: Vec<Signal>,
}

impl<T> Pending<T> {
    pub fn new(value: T, signals: Vec<Signal>) -> Self {
        Self { value, signals }
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Emit the signals and return the handler's value.
    pub fn publish(self, telemetry: &dyn Telemetry) -> T {
        for signal in &self.signals {
            signal.publish(telemetry);
        }
        self.value
    }

    /// The handler's value without emitting anything.
    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Discards every signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn incr_counter(&self, _value: u64, _keys: &[&str]) {}
}

/// In-process counter registry. Counter names are the keys joined with `.`.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    counters: DashMap<String, u64>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter, zero if never incremented.
    pub fn get(&self, name: &str) -> u64 {
        self.counters.get(name).map(|v| *v).unwrap_or(0)
    }

    /// All counters, sorted by name.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counters
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}

impl Telemetry for MetricsRegistry {
    fn incr_counter(&self, value: u64, keys: &[&str]) {
        let name = keys.join(".");
        let mut entry = self.counters.entry(name.clone()).or_insert(0);
        let total = entry.saturating_add(value);
        *entry = total;
        tracing::debug!(metric = %name, total, "counter incremented");
    }
}
