//! # CHRONICLE Core Library
//!
//! Two in-process learning substrates for an agent that lives through
//! sequences of events:
//!
//! - **Episodic sequence memory** ([`SequenceMemory`]): stores sequences
//!   with temporal and spatial context, retrieves them by multi-criteria
//!   similarity, consolidates related episodes into an association graph
//!   and forgets unimportant ones over time.
//! - **Hierarchical prediction error processor**
//!   ([`PredictionErrorProcessor`]): scores prediction errors per
//!   abstraction level, propagates significant ones up, down and sideways
//!   with suppression and decay, and emits learning updates.
//!
//! Neither substrate calls the other. Both are plain owned values driven by
//! a host tick, with time read from an injected [`Clock`].
//!
//! ## Resource Contract
//!
//! Every collection is bounded by a configuration ceiling:
//! - Episodes: `max_episodes` (exceeding it runs a maintenance pass)
//! - Forgetting curve: 1000 samples
//! - Per-level error history: 1000 errors
//! - Resident signals per level: `signal_capacity`
//! - Learning updates: 1000 until drained

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod config;
pub mod consolidation;
pub mod decay;
pub mod error;
pub mod memory;
pub mod prediction;
pub mod retrieval;
pub mod ring;
pub mod similarity;
pub mod snapshot;
pub mod spans;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ChronicleConfig, MemoryConfig, ProcessorConfig};
pub use error::{ChronicleError, Result};
pub use memory::{SequenceEpisode, SequenceMemory};
pub use prediction::{ErrorType, PredictionErrorProcessor};
pub use retrieval::{MemoryQuery, RetrievalResult};
pub use similarity::SequenceElement;
pub use types::*;
