//! Headless mode for agentic testing
//!
//! This module provides functionality to run behavior scenarios without any
//! graphical output, suitable for automated testing and batch analysis.
//!
//! ## Usage
//!
//! ```bash
//! # Run a headless scenario
//! cargo run --release -- --scenario scenario.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "hostiles": [
//!     { "archetype": "grunt", "position": [4.0, 0.0, 0.0] },
//!     { "archetype": "summoner", "position": [10.0, 0.0, 2.0] }
//!   ],
//!   "events": [
//!     { "at": 0.3, "action": { "Knockback": { "actor_index": 0, "velocity": [0.0, 0.0, -4.0], "duration": 0.2 } } }
//!   ],
//!   "max_duration_secs": 30
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::{HeadlessScenarioConfig, ScriptedAction, ScriptedEvent};
pub use runner::{run_headless_scenario, ScenarioOutcome, ScenarioResult};
