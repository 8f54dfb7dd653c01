//! spkplan CLI crate
//!
//! A thin driver over `spkplan-core`. It reads two TOML files:
//!
//! - a planning configuration (`--config`), the `[simulation]` and
//!   `[reports]` defaults of [`spkplan_core::PlanningConfig`];
//! - a network description (`--network`) listing spike sources, populations
//!   and the projections between them (see [`network`]).
//!
//! Commands (see [`commands`]):
//! - `estimate`: split every population into per-core slices and print the
//!   SDRAM breakdown, DTCM and cycles of each, as text or JSON.
//! - `shifts`: print the ring-buffer shift and weight scale of every synapse
//!   type of every population.
//!
//! The binary (src/main.rs) wires up logging and argument parsing and calls
//! [`PlanCli::execute`]. The modules are public so tests can build networks
//! without spawning a process.

pub mod commands;
pub mod config;
pub mod error;
pub mod network;

pub use commands::PlanCli;
