//! mobsim - Hostile Actor Behavior Simulation
//!
//! The behavioral core for hostile actors in a real-time action setting:
//! token-based cancellation, timed multi-checkpoint actions, freeze-aware
//! timing, an interrupt policy, per-channel cooldowns, and the behavior
//! state machine, all running as a headless Bevy ECS simulation.
//!
//! This library exposes the core modules for testing and reuse.

pub mod behavior;
pub mod cli;
pub mod headless;
pub mod log;

// Re-export commonly used types
pub use behavior::{
    ActionTokens, ActiveAction, Actor, BehaviorState, Channel, Cooldowns, Health, SimTarget,
    SimulationSpeed,
};
pub use headless::{HeadlessScenarioConfig, ScenarioResult};
pub use log::{BehaviorEventType, BehaviorLog};
