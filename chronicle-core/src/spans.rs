//! Tracing span names.
//!
//! Every pass in the crate enters one of these spans so a host subscriber
//! can filter or time them. The library never installs a subscriber.

/// Episode insertion.
pub const STORE: &str = "chronicle::memory::store";
/// Episode retrieval.
pub const RETRIEVAL: &str = "chronicle::memory::retrieve";
/// Forgetting pass.
pub const FORGETTING: &str = "chronicle::memory::forgetting";
/// Consolidation pass.
pub const CONSOLIDATION: &str = "chronicle::memory::consolidation";
/// Forgetting, consolidation and index cleanup together.
pub const MAINTENANCE: &str = "chronicle::memory::maintenance";
/// Prediction error intake.
pub const PROCESS_ERROR: &str = "chronicle::prediction::process";
/// Signal propagation.
pub const PROPAGATION: &str = "chronicle::prediction::propagate";
/// Signal decay.
pub const SIGNAL_DECAY: &str = "chronicle::prediction::decay";
