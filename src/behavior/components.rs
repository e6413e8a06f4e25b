//! Component Definitions for the Behavior Simulation
//!
//! This module contains the ECS components and resources that make up a
//! hostile actor's runtime state: identity, health, targeting, the behavior
//! state machine, freeze/knockback status, and the shared simulation clock.

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;

use super::channels::Channel;

// ============================================================================
// Resources
// ============================================================================

/// Seeded random number generator for deterministic scenario runs.
///
/// When a seed is provided (e.g., via scenario config), the same seed will
/// always produce the same run. Without a seed, uses system entropy.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a new GameRng with a specific seed for deterministic behavior
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create a new GameRng with random entropy (non-deterministic)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Generate a random f32 in the range [0.0, 1.0)
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Generate a random f32 in the given range
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.random_f32() * (max - min)
    }

    /// Generate a random u32 in the inclusive range [min, max]
    pub fn random_u32_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Controls the speed of the simulation. A multiplier of zero is the global
/// pause: all behavior time stops, but no action is cancelled by it.
#[derive(Resource)]
pub struct SimulationSpeed {
    pub multiplier: f32,
}

impl Default for SimulationSpeed {
    fn default() -> Self {
        Self { multiplier: 1.0 }
    }
}

impl SimulationSpeed {
    pub fn is_paused(&self) -> bool {
        self.multiplier == 0.0
    }
}

// ============================================================================
// Enums
// ============================================================================

/// The coarse behavior state of one actor, published for presentation.
///
/// Transitions are driven by the decision and executor systems; this enum is
/// descriptive, not authoritative — tokens and `ActiveAction` are.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BehaviorState {
    /// Running the spawn ritual; invulnerable to the decision loop.
    Summoning,
    /// No target in play, standing by.
    Idle,
    /// Chasing or repositioning toward the target.
    Locomotion,
    /// An action has begun but no payload checkpoint has fired yet.
    Windup,
    /// Payload checkpoints are firing.
    Effect,
    /// All checkpoints fired, serving out the remaining duration.
    Recovery,
    /// The finished action's channel is cooling down.
    Cooldown,
    /// An interrupt cancelled the current action this frame. Transient:
    /// resolves to Cooldown or Locomotion on the next decision pass.
    Interrupted,
    /// Health reached zero. Terminal.
    Dead,
}

// ============================================================================
// Actor Components
// ============================================================================

/// Core identity of a hostile actor.
#[derive(Component, Clone)]
pub struct Actor {
    /// Archetype key into the loaded definitions ("grunt", "archer", ...)
    pub archetype: String,
    /// Display name for the behavior log ("grunt#3")
    pub name: String,
    /// Base movement speed in units per second
    pub move_speed: f32,
    /// Distance at which the actor stops chasing and waits for an opening.
    /// Derived from the shortest-ranged action in the repertoire.
    pub engage_range: f32,
    /// The channel of the most recently completed or cancelled action.
    /// Drives the Interrupted -> Cooldown resolution.
    pub last_channel: Option<Channel>,
}

/// Current and maximum hit points.
#[derive(Component, Clone, Copy, Debug)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }
}

/// The actor's current target, if any. Cleared when the target dies or is
/// disabled; the decision loop re-acquires on the next pass.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct TargetRef(pub Option<Entity>);

/// Marker for entities that hostile actors may target. `enabled` models
/// target phases where the entity exists but is not attackable.
#[derive(Component, Clone, Copy, Debug)]
pub struct SimTarget {
    pub enabled: bool,
}

impl Default for SimTarget {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Per-actor freeze. While present, no behavior time elapses for this actor:
/// action clocks, cooldowns, and knockback timers all hold. Tokens are not
/// touched, so a thaw resumes exactly where the freeze hit.
#[derive(Component, Debug)]
pub struct Frozen {
    /// None = until explicitly removed; Some(t) = thaws after t seconds of
    /// real (unfrozen-by-pause) time.
    pub remaining: Option<f32>,
}

/// External displacement in progress. While present the decision loop is
/// suspended and the locomotion integrator applies this velocity instead.
#[derive(Component, Debug)]
pub struct KnockbackState {
    pub velocity: Vec3,
    pub remaining: f32,
}

/// Desired movement for this frame, consumed by the locomotion integrator.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct DesiredVelocity(pub Vec3);

/// Externally-owned stat adjustments sampled by this core. The cooldown
/// delta is folded in exactly once when a cooldown starts.
#[derive(Component, Clone, Copy, Debug)]
pub struct StatusModifiers {
    /// Seconds added to (or, if negative, removed from) each started cooldown
    pub cooldown_delta: f32,
    /// Multiplier on movement speed (1.0 = unmodified)
    pub speed_multiplier: f32,
}

impl StatusModifiers {
    pub fn neutral() -> Self {
        Self {
            cooldown_delta: 0.0,
            speed_multiplier: 1.0,
        }
    }
}

impl Default for StatusModifiers {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Damage-immune guard raised by a Guard checkpoint. Ticks down in behavior
/// time and is removed at zero.
#[derive(Component, Debug)]
pub struct Guarded {
    pub remaining: f32,
}

/// Gap-closer sprint toward the target, ended by the executor when the
/// committed follow-up fires or the action is cancelled.
#[derive(Component, Debug)]
pub struct Charging {
    /// Movement speed multiplier while charging
    pub speed_multiplier: f32,
}

impl Default for Charging {
    fn default() -> Self {
        Self { speed_multiplier: 4.0 }
    }
}

// ============================================================================
// Presentation
// ============================================================================

/// Write-only flags for the presentation layer. The behavior core sets these
/// from [`BehaviorState`] every frame and never reads them back.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresentationFlags {
    pub moving: bool,
    pub attacking: bool,
    pub winding_up: bool,
    pub recovering: bool,
    pub interrupted: bool,
    pub dead: bool,
}

/// Map a behavior state to its presentation flags.
pub fn presentation_flags(state: BehaviorState) -> PresentationFlags {
    match state {
        BehaviorState::Summoning | BehaviorState::Idle | BehaviorState::Cooldown => {
            PresentationFlags::default()
        }
        BehaviorState::Locomotion => PresentationFlags {
            moving: true,
            ..Default::default()
        },
        BehaviorState::Windup => PresentationFlags {
            winding_up: true,
            ..Default::default()
        },
        BehaviorState::Effect => PresentationFlags {
            attacking: true,
            ..Default::default()
        },
        BehaviorState::Recovery => PresentationFlags {
            recovering: true,
            ..Default::default()
        },
        BehaviorState::Interrupted => PresentationFlags {
            interrupted: true,
            ..Default::default()
        },
        BehaviorState::Dead => PresentationFlags {
            dead: true,
            ..Default::default()
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
