//! Timed multi-checkpoint action sequences.
//!
//! An action is a list of checkpoints at **absolute** offsets from action
//! start plus a total duration. Absolute offsets (rather than cumulative
//! deltas) are what keep a two-hit combo honest when an optional sub-phase is
//! skipped: the second hit is always due at its configured offset, with no
//! drift. The executor system (`advance_actions`) owns validation and effect
//! dispatch; this module owns the timing math.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::channels::{ActionToken, Channel};

/// Where a checkpoint's damage is anchored when handed to the damage sink.
///
/// Source variants disagree on this and it is deliberately a per-archetype
/// configuration value, not something this core standardizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum HitOrigin {
    /// Use the target's position at the moment the checkpoint fires.
    #[default]
    TargetPosition,
    /// Use the acting actor's own position as the hit-point origin.
    ActorPosition,
}

/// The effect a checkpoint fires once its offset elapses and validation
/// passes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StepEffect {
    /// Apply melee damage to the current target.
    MeleeHit { damage: f32 },
    /// Apply ranged damage to the current target.
    RangedShot { damage: f32 },
    /// End of the interruption window: from here on, incoming hits no longer
    /// cancel the action.
    Commit,
    /// Request `min..=max` spawns of the named archetype near the actor.
    SummonWave { archetype: String, min: u32, max: u32 },
    /// Teleport to within `standoff` units of the target.
    Blink { standoff: f32 },
    /// Raise a damage-immune guard for `duration` seconds.
    Guard { duration: f32 },
    /// Remove the actor from the simulation. Terminal cleanup only.
    Despawn,
}

impl StepEffect {
    /// Commit markers flip the interruption-window flag; everything else is
    /// an observable payload that moves the state machine into Effect.
    pub fn is_payload(&self) -> bool {
        !matches!(self, StepEffect::Commit)
    }
}

/// One checkpoint: an absolute offset from action start plus its effect.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionStep {
    /// Seconds from action start, in unfrozen time. Clamped to >= 0.
    pub at: f32,
    pub effect: StepEffect,
}

/// What kind of sequence this is. Rituals and death cleanups reuse the same
/// executor but bypass targeting, cooldown hand-off, and (for death)
/// interruption entirely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    /// A normal decision-loop action (attack, volley, special).
    Normal,
    /// Spawn ritual: runs once at spawn, no target, no cooldown.
    Ritual,
    /// Terminal cleanup after self-death. Immune to interruption.
    DeathCleanup,
}

/// A fully-resolved action blueprint, built from archetype config.
#[derive(Clone, Debug)]
pub struct ActionSpec {
    /// Display name for the log ("Claw Combo", "Volley", ...).
    pub name: String,
    pub channel: Channel,
    pub kind: ActionKind,
    /// Checkpoints sorted by ascending offset.
    pub steps: SmallVec<[ActionStep; 4]>,
    /// Total unfrozen seconds from start to hand-off.
    pub duration: f32,
    /// Cooldown handed to the tracker on completion (and forced in full on
    /// knockback).
    pub cooldown: f32,
    /// Maximum range to the target, checked at start and again at every
    /// damage checkpoint. Zero disables the check.
    pub range: f32,
    /// Minimum start range (gap-closers only make sense from a distance).
    pub min_range: f32,
    /// Whether start and checkpoints require a live, enabled target.
    pub needs_target: bool,
    pub hit_origin: HitOrigin,
}

impl ActionSpec {
    /// Normalize a raw step list: clamp negative offsets to zero, cap offsets
    /// at the total duration, and sort ascending so the executor's cursor
    /// only ever moves forward.
    pub fn normalize(&mut self) {
        for step in self.steps.iter_mut() {
            step.at = step.at.clamp(0.0, self.duration);
        }
        self.steps.sort_by(|a, b| a.at.total_cmp(&b.at));
    }

    /// True if any checkpoint is a Commit marker (i.e. the action declares an
    /// interruption window).
    pub fn has_commit(&self) -> bool {
        self.steps.iter().any(|s| s.effect == StepEffect::Commit)
    }
}

/// The resumable executor state for one action invocation.
///
/// At most one `ActiveAction` exists per actor at any time — the component
/// itself is the busy flag for its channel. A second request while this
/// component is present is dropped, not queued.
#[derive(Component, Debug)]
pub struct ActiveAction {
    pub spec: ActionSpec,
    /// Token captured from the ledger when the action began.
    pub token: ActionToken,
    /// Unfrozen seconds accumulated since start.
    pub elapsed: f32,
    /// Index of the next checkpoint not yet fired.
    pub next_step: usize,
    /// Set once the Commit checkpoint fires; consulted by the interrupt
    /// policy before cancelling on an incoming hit.
    pub committed: bool,
    /// Set once any payload checkpoint fires (drives Windup -> Effect).
    pub fired_payload: bool,
}

impl ActiveAction {
    pub fn new(spec: ActionSpec, token: ActionToken) -> Self {
        Self {
            spec,
            token,
            elapsed: 0.0,
            next_step: 0,
            committed: false,
            fired_payload: false,
        }
    }

    /// Accumulate unfrozen time. The caller is responsible for passing zero
    /// while the actor is frozen.
    pub fn advance(&mut self, dt: f32) {
        if dt > 0.0 {
            self.elapsed += dt;
        }
    }

    /// Pop the next checkpoint whose offset has elapsed, if any.
    ///
    /// The cursor moves before the effect is dispatched, so an effect that
    /// despawns the actor cannot be double-fired.
    pub fn next_due(&mut self) -> Option<ActionStep> {
        let step = self.spec.steps.get(self.next_step)?;
        if step.at <= self.elapsed {
            let step = step.clone();
            self.next_step += 1;
            Some(step)
        } else {
            None
        }
    }

    /// All checkpoints fired and the full duration served.
    pub fn is_complete(&self) -> bool {
        self.next_step >= self.spec.steps.len() && self.elapsed >= self.spec.duration
    }

    /// True while an incoming (non-knockback) hit should cancel this action.
    /// Actions without a Commit checkpoint never cancel on hits.
    pub fn hit_interruptible(&self) -> bool {
        self.spec.has_commit() && !self.committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn two_hit_spec() -> ActionSpec {
        ActionSpec {
            name: "Claw Combo".to_string(),
            channel: Channel::Melee,
            kind: ActionKind::Normal,
            steps: smallvec![
                ActionStep { at: 0.2, effect: StepEffect::MeleeHit { damage: 10.0 } },
                ActionStep { at: 0.45, effect: StepEffect::MeleeHit { damage: 10.0 } },
            ],
            duration: 0.7,
            cooldown: 1.0,
            range: 2.5,
            min_range: 0.0,
            needs_target: true,
            hit_origin: HitOrigin::TargetPosition,
        }
    }

    fn dummy_token() -> ActionToken {
        let mut tokens = super::super::channels::ActionTokens::default();
        tokens.begin(Channel::Melee)
    }

    #[test]
    fn test_checkpoints_fire_at_absolute_offsets() {
        let mut action = ActiveAction::new(two_hit_spec(), dummy_token());

        action.advance(0.1);
        assert!(action.next_due().is_none(), "nothing due before 0.2");

        action.advance(0.1);
        assert!(action.next_due().is_some(), "first hit due at 0.2");
        assert!(action.next_due().is_none(), "second hit not due until 0.45");

        // Uneven tick sizes must not drift the second offset.
        action.advance(0.24);
        assert!(action.next_due().is_none());
        action.advance(0.01);
        assert!(action.next_due().is_some(), "second hit due at 0.45");

        assert!(!action.is_complete(), "duration not served yet");
        action.advance(0.25);
        assert!(action.is_complete());
    }

    #[test]
    fn test_zero_offset_step_fires_without_advancing() {
        let mut spec = two_hit_spec();
        spec.steps[0].at = 0.0;
        let mut action = ActiveAction::new(spec, dummy_token());
        assert!(
            action.next_due().is_some(),
            "a zero-duration first delay fires synchronously"
        );
    }

    #[test]
    fn test_one_large_tick_fires_all_due_steps_in_order() {
        let mut action = ActiveAction::new(two_hit_spec(), dummy_token());
        action.advance(1.0);

        let first = action.next_due().expect("first due");
        let second = action.next_due().expect("second due");
        assert_eq!(first.at, 0.2);
        assert_eq!(second.at, 0.45);
        assert!(action.next_due().is_none());
        assert!(action.is_complete());
    }

    #[test]
    fn test_normalize_clamps_and_sorts() {
        let mut spec = two_hit_spec();
        spec.steps = smallvec![
            ActionStep { at: 5.0, effect: StepEffect::MeleeHit { damage: 1.0 } },
            ActionStep { at: -0.3, effect: StepEffect::Commit },
        ];
        spec.normalize();

        assert_eq!(spec.steps[0].at, 0.0, "negative offsets clamp to zero");
        assert_eq!(spec.steps[1].at, spec.duration, "offsets cap at duration");
    }

    #[test]
    fn test_hit_interruptible_only_before_commit() {
        let mut spec = two_hit_spec();
        spec.steps.insert(
            0,
            ActionStep { at: 0.1, effect: StepEffect::Commit },
        );
        let mut action = ActiveAction::new(spec, dummy_token());
        assert!(action.hit_interruptible(), "open window during early windup");

        action.advance(0.1);
        let step = action.next_due().expect("commit due");
        assert_eq!(step.effect, StepEffect::Commit);
        action.committed = true;
        assert!(!action.hit_interruptible(), "committed actions absorb hits");
    }

    #[test]
    fn test_actions_without_commit_are_never_hit_interruptible() {
        let action = ActiveAction::new(two_hit_spec(), dummy_token());
        assert!(!action.hit_interruptible());
    }

    #[test]
    fn test_advance_ignores_non_positive_dt() {
        let mut action = ActiveAction::new(two_hit_spec(), dummy_token());
        action.advance(0.0);
        action.advance(-1.0);
        assert_eq!(action.elapsed, 0.0);
    }
}
