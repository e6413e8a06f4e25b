//! Behavior events
//!
//! The wire between the behavior core and its external seams: damage intents
//! go out to the damage sink, resolved damage and knockbacks come back in,
//! spawn and teleport requests go out to the spawner and the locomotion
//! integrator.

use bevy::prelude::*;

/// Event fired when a checkpoint wants to deal damage. The damage sink owns
/// mitigation and the final number; the behavior core never mutates target
/// health directly.
#[derive(Event)]
pub struct DamageIntent {
    /// Acting entity
    pub source: Entity,
    /// Entity to damage
    pub target: Entity,
    /// Requested damage before mitigation
    pub amount: f32,
    /// World-space hit point, anchored per the action's hit-origin setting
    pub point: Vec3,
    /// Name of the action for logging ("Claw Combo")
    pub action_name: String,
}

/// Event fired after the damage sink resolves an intent against an actor.
/// The interrupt policy consumes these before the victim's next checkpoint.
#[derive(Event)]
pub struct DamageResolved {
    /// Entity that was damaged
    pub target: Entity,
    /// Final damage applied
    pub amount: f32,
    /// Whether this damage reduced the target to zero health
    pub fatal: bool,
}

/// Event fired when an external force displaces an actor. Always cancels the
/// actor's current action, committed or not.
#[derive(Event)]
pub struct KnockbackEvent {
    /// Entity being displaced
    pub actor: Entity,
    /// Displacement velocity in units per second
    pub velocity: Vec3,
    /// How long the displacement lasts (seconds)
    pub duration: f32,
}

/// Event fired when a SummonWave checkpoint requests new actors. Consumed by
/// the spawner system.
#[derive(Event)]
pub struct SpawnRequest {
    /// Archetype key of the actor to spawn
    pub archetype: String,
    /// World position to spawn at
    pub position: Vec3,
    /// Entity that requested the spawn (for logging)
    pub summoner: Entity,
}

/// Event fired when a Blink checkpoint relocates an actor. Applied by the
/// locomotion integrator so all position writes stay in one place.
#[derive(Event)]
pub struct TeleportIntent {
    /// Entity to relocate
    pub actor: Entity,
    /// Destination in world space
    pub destination: Vec3,
}
