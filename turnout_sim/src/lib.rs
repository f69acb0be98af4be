//! Turnout Deterministic Scenario Harness
//!
//! Drives [`turnout_core::VotingModel`] through named scenarios and judges
//! each run with an invariant oracle that inspects the model after every
//! step.
//!
//! # Core Principle: One Seed
//!
//! All entropy is derived from a single 64-bit seed:
//! - **Placement**: voter cells and strata
//! - **Schedule**: per-breed activation shuffles
//! - **Movement**: random-walk steps and shuffled tie-breaks
//! - **Layout**: scattered machines when no capacity map is given
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                ScenarioRunner                │
//! │  ┌──────────────┐        ┌────────────────┐  │
//! │  │ VotingModel  │──step─►│     Oracle     │  │
//! │  │ (turnout_core)│       │ (invariants)   │  │
//! │  └──────┬───────┘        └────────────────┘  │
//! │         │ frames                             │
//! │  ┌──────▼───────┐        ┌────────────────┐  │
//! │  │  SimExport   │◄───────│   Portrayal    │  │
//! │  └──────────────┘        └────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use turnout_sim::{ScenarioRunner, ScenarioId};
//!
//! let result = ScenarioRunner::new(42)
//!     .with_grid(20, 20)
//!     .with_voters(80)
//!     .run(ScenarioId::Baseline);
//! assert!(result.passed);
//! ```

pub mod exporter;
pub mod oracle;
pub mod portrayal;
pub mod runner;
pub mod scenarios;

pub use exporter::{PollingFrame, SimExport, SimFrame, VoterFrame};
pub use oracle::{Oracle, Violation};
pub use portrayal::{ChartSeries, Portrayal};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use scenarios::ScenarioId;
