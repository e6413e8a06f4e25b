//! Interrupt Policy
//!
//! Three interrupt sources, three different contracts:
//!
//! - **Knockback** always cancels the current action and charges the full
//!   cooldown, committed or not. The actor also gets displaced.
//! - **Incoming damage** cancels only while the action is inside its
//!   uncommitted interruption window; a committed action absorbs the hit.
//!   Fatal damage is the self-death flow and cancels everything.
//! - **Target loss** (death or disable) aborts target-dependent actions.
//!
//! The Death channel is immune to all of it: once the terminal cleanup
//! sequence starts, nothing here touches it again.

use bevy::prelude::*;

use crate::log::{BehaviorEventType, BehaviorLog};

use super::archetype_config::ArchetypeDefinitions;
use super::channels::ActionTokens;
use super::components::{
    Actor, BehaviorState, Charging, Guarded, Health, KnockbackState, SimTarget, StatusModifiers,
    TargetRef,
};
use super::cooldowns::Cooldowns;
use super::events::{DamageResolved, KnockbackEvent};
use super::sequence::{ActionKind, ActiveAction};

/// Apply knockback displacement and cancel whatever the victim was doing.
///
/// The full cooldown (base plus the current modifier delta) is charged so a
/// knocked-back actor cannot retry faster than if it had finished.
pub fn process_knockbacks(
    mut commands: Commands,
    mut events: EventReader<KnockbackEvent>,
    mut log: ResMut<BehaviorLog>,
    mut actors: Query<(
        &mut Actor,
        &mut BehaviorState,
        &mut ActionTokens,
        &mut Cooldowns,
        &StatusModifiers,
        Option<&ActiveAction>,
    )>,
) {
    for event in events.read() {
        let Ok((mut actor, mut state, mut tokens, mut cooldowns, status, active)) =
            actors.get_mut(event.actor)
        else {
            continue;
        };
        if *state == BehaviorState::Dead {
            // Corpses still slide, but the cleanup sequence is untouchable.
            commands.entity(event.actor).insert(KnockbackState {
                velocity: event.velocity,
                remaining: event.duration,
            });
            continue;
        }

        commands.entity(event.actor).insert(KnockbackState {
            velocity: event.velocity,
            remaining: event.duration,
        });

        if let Some(action) = active {
            let spec = &action.spec;
            tokens.cancel(spec.channel);
            cooldowns.start(spec.channel, spec.cooldown, status.cooldown_delta);
            actor.last_channel = Some(spec.channel);
            *state = BehaviorState::Interrupted;
            commands
                .entity(event.actor)
                .remove::<ActiveAction>()
                .remove::<Charging>();
            log.log(
                BehaviorEventType::ActionInterrupted,
                Some(actor.name.clone()),
                format!("{} knocked out of {}", actor.name, spec.name),
            );
        } else {
            *state = BehaviorState::Interrupted;
        }
    }
}

/// React to resolved damage against actors: fatal damage starts the terminal
/// cleanup, non-fatal damage cancels an action still inside its interruption
/// window.
pub fn process_struck(
    mut commands: Commands,
    mut events: EventReader<DamageResolved>,
    archetypes: Res<ArchetypeDefinitions>,
    mut log: ResMut<BehaviorLog>,
    mut actors: Query<(
        &mut Actor,
        &mut BehaviorState,
        &mut ActionTokens,
        Option<&ActiveAction>,
    )>,
) {
    for event in events.read() {
        let Ok((mut actor, mut state, mut tokens, active)) = actors.get_mut(event.target) else {
            continue;
        };
        if *state == BehaviorState::Dead {
            continue;
        }

        if event.fatal {
            // Self-death is irreversible: every channel is invalidated, then
            // the Death channel takes over with an interruption-immune
            // cleanup sequence.
            tokens.cancel_all();
            *state = BehaviorState::Dead;
            actor.last_channel = None;
            commands
                .entity(event.target)
                .remove::<ActiveAction>()
                .remove::<Charging>()
                .remove::<Guarded>();

            log.log(
                BehaviorEventType::Death,
                Some(actor.name.clone()),
                format!("{} dies", actor.name),
            );

            if let Some(archetype) = archetypes.get(&actor.archetype) {
                let spec = archetype.death.to_spec(ActionKind::DeathCleanup);
                let token = tokens.begin(spec.channel);
                commands
                    .entity(event.target)
                    .insert(ActiveAction::new(spec, token));
            }
            continue;
        }

        let Some(action) = active else {
            continue;
        };
        if action.spec.kind != ActionKind::Normal || !action.hit_interruptible() {
            continue;
        }

        // Inside the window the hit wins. The channel is invalidated but no
        // cooldown is charged: the actor never got its swing off.
        let spec = &action.spec;
        tokens.cancel(spec.channel);
        actor.last_channel = Some(spec.channel);
        *state = BehaviorState::Interrupted;
        commands
            .entity(event.target)
            .remove::<ActiveAction>()
            .remove::<Charging>();
        log.log(
            BehaviorEventType::ActionInterrupted,
            Some(actor.name.clone()),
            format!("{} struck out of {}", actor.name, spec.name),
        );
    }
}

/// Abort target-dependent actions when the target dies or is disabled.
/// Locomotion and the Death channel are left alone.
pub fn process_target_loss(
    mut commands: Commands,
    mut log: ResMut<BehaviorLog>,
    mut actors: Query<(
        Entity,
        &mut Actor,
        &mut BehaviorState,
        &mut ActionTokens,
        &TargetRef,
        &ActiveAction,
    )>,
    targets: Query<(&Health, &SimTarget), Without<Actor>>,
) {
    for (entity, mut actor, mut state, mut tokens, target_ref, action) in actors.iter_mut() {
        if action.spec.kind != ActionKind::Normal || !action.spec.needs_target {
            continue;
        }

        let target_alive = target_ref
            .0
            .and_then(|t| targets.get(t).ok())
            .map(|(health, sim)| health.is_alive() && sim.enabled)
            .unwrap_or(false);
        if target_alive {
            continue;
        }

        let spec = &action.spec;
        tokens.cancel(spec.channel);
        actor.last_channel = Some(spec.channel);
        *state = BehaviorState::Interrupted;
        commands.entity(entity).remove::<ActiveAction>().remove::<Charging>();
        log.log(
            BehaviorEventType::ActionAborted,
            Some(actor.name.clone()),
            format!("{} loses its target mid-{}", actor.name, spec.name),
        );
    }
}
