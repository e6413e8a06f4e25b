//! Hostile actor behavior core
//!
//! Implements the action scheduler for hostile actors:
//! - Per-channel action tokens (cancellation by counter mismatch)
//! - Timed multi-checkpoint action sequences
//! - Freeze-aware timing and a global pause gate
//! - Per-channel cooldown tracking
//! - The interrupt policy (knockback, incoming damage, target loss, death)
//! - The behavior state machine published to presentation

pub mod archetype_config;
pub mod channels;
pub mod components;
pub mod cooldowns;
pub mod decision;
pub mod events;
pub mod interrupts;
pub mod sequence;
pub mod systems;

pub use archetype_config::{ArchetypeConfigPlugin, ArchetypeDefinitions};
pub use channels::{ActionToken, ActionTokens, Channel};
pub use components::{
    Actor, BehaviorState, Frozen, GameRng, Health, PresentationFlags, SimTarget, SimulationSpeed,
    StatusModifiers, TargetRef,
};
pub use cooldowns::Cooldowns;
pub use events::{DamageIntent, DamageResolved, KnockbackEvent, SpawnRequest, TeleportIntent};
pub use sequence::{ActionKind, ActionSpec, ActiveAction, StepEffect};
pub use systems::{
    ActorCounter, BehaviorSystemPhase, add_core_behavior_systems,
    configure_behavior_system_ordering, spawn_hostile,
};
