//! Decision Systems
//!
//! The per-frame loop that picks what each idle actor does next: re-validate
//! and re-acquire targets, resolve the transient Interrupted state, start
//! actions whose channel is ready, and steer locomotion.
//!
//! Actions are started here and only here. An actor that already carries an
//! [`ActiveAction`] is busy; a competing request this frame is dropped, never
//! queued.

use bevy::prelude::*;

use crate::log::{BehaviorEventType, BehaviorLog};

use super::archetype_config::ArchetypeDefinitions;
use super::channels::ActionTokens;
use super::components::{
    Actor, BehaviorState, Charging, DesiredVelocity, Frozen, Health, KnockbackState, SimTarget,
    SimulationSpeed, StatusModifiers, TargetRef,
};
use super::cooldowns::Cooldowns;
use super::sequence::{ActionKind, ActiveAction};

/// Drop dead or disabled targets and re-acquire the nearest live one.
///
/// Cancellation of in-flight actions on target death is the interrupt
/// policy's job (`process_target_loss`); this system only keeps `TargetRef`
/// honest for the decision pass that follows.
pub fn validate_targets(
    speed: Res<SimulationSpeed>,
    mut actors: Query<(&Transform, &mut TargetRef), With<Actor>>,
    targets: Query<(Entity, &Transform, &Health, &SimTarget), Without<Actor>>,
) {
    if speed.is_paused() {
        return;
    }

    for (transform, mut target_ref) in actors.iter_mut() {
        if let Some(current) = target_ref.0 {
            let still_valid = targets
                .get(current)
                .map(|(_, _, health, sim)| health.is_alive() && sim.enabled)
                .unwrap_or(false);
            if still_valid {
                continue;
            }
            target_ref.0 = None;
        }

        let mut best: Option<(Entity, f32)> = None;
        for (entity, target_transform, health, sim) in targets.iter() {
            if !health.is_alive() || !sim.enabled {
                continue;
            }
            let distance = transform.translation.distance(target_transform.translation);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((entity, distance));
            }
        }
        target_ref.0 = best.map(|(entity, _)| entity);
    }
}

/// Resolve Interrupted actors and start new actions on ready channels.
#[allow(clippy::too_many_arguments)]
pub fn decide_actions(
    mut commands: Commands,
    speed: Res<SimulationSpeed>,
    archetypes: Res<ArchetypeDefinitions>,
    mut log: ResMut<BehaviorLog>,
    mut actors: Query<
        (
            Entity,
            &mut Actor,
            &Transform,
            &mut BehaviorState,
            &mut ActionTokens,
            &Cooldowns,
            &TargetRef,
            Option<&ActiveAction>,
            Option<&Frozen>,
            Option<&KnockbackState>,
        ),
        With<Health>,
    >,
    targets: Query<&Transform, (With<SimTarget>, Without<Actor>)>,
) {
    if speed.is_paused() {
        return;
    }

    for (
        entity,
        mut actor,
        transform,
        mut state,
        mut tokens,
        cooldowns,
        target_ref,
        active,
        frozen,
        knockback,
    ) in actors.iter_mut()
    {
        if *state == BehaviorState::Dead || *state == BehaviorState::Summoning {
            continue;
        }
        if frozen.is_some() || knockback.is_some() {
            continue;
        }

        // Interrupted is transient: it lives exactly until this pass, then
        // lands on Cooldown (last channel still cooling) or Locomotion.
        if *state == BehaviorState::Interrupted {
            let cooling = actor
                .last_channel
                .map(|channel| !cooldowns.is_ready(channel))
                .unwrap_or(false);
            *state = if cooling {
                BehaviorState::Cooldown
            } else if target_ref.0.is_some() {
                BehaviorState::Locomotion
            } else {
                BehaviorState::Idle
            };
        }

        // Busy actors keep running; competing requests are dropped here.
        if active.is_some() {
            continue;
        }

        let Some(archetype) = archetypes.get(&actor.archetype) else {
            continue;
        };

        let target_distance = target_ref
            .0
            .and_then(|t| targets.get(t).ok())
            .map(|t| transform.translation.distance(t.translation));

        // First ready action in config order wins.
        for action in &archetype.actions {
            if !cooldowns.is_ready(action.channel) {
                continue;
            }
            if action.needs_target {
                let Some(distance) = target_distance else {
                    continue;
                };
                if action.range > 0.0 && distance > action.range {
                    continue;
                }
                if distance < action.min_range {
                    continue;
                }
            }

            let spec = action.to_spec(ActionKind::Normal);
            let token = tokens.begin(spec.channel);
            actor.last_channel = Some(spec.channel);
            *state = BehaviorState::Windup;

            // Gap closers sprint toward the target until their payload lands.
            if spec.min_range > 0.0 && spec.range > 0.0 {
                commands.entity(entity).insert(Charging {
                    speed_multiplier: archetype.charge_speed_multiplier,
                });
            }

            log.log(
                BehaviorEventType::ActionStarted,
                Some(actor.name.clone()),
                format!("{} starts {} on {}", actor.name, spec.name, spec.channel.name()),
            );
            commands.entity(entity).insert(ActiveAction::new(spec, token));
            break;
        }
    }
}

/// Steer actors toward their target (or hold position) and publish the
/// locomotion-facing states.
pub fn update_locomotion(
    speed: Res<SimulationSpeed>,
    mut actors: Query<(
        &Actor,
        &Transform,
        &mut DesiredVelocity,
        &mut BehaviorState,
        &Cooldowns,
        &TargetRef,
        &StatusModifiers,
        Option<&ActiveAction>,
        Option<&Charging>,
        Option<&Frozen>,
        Option<&KnockbackState>,
    )>,
    targets: Query<&Transform, (With<SimTarget>, Without<Actor>)>,
) {
    if speed.is_paused() {
        return;
    }

    for (
        actor,
        transform,
        mut desired,
        mut state,
        cooldowns,
        target_ref,
        status,
        active,
        charging,
        frozen,
        knockback,
    ) in actors.iter_mut()
    {
        desired.0 = Vec3::ZERO;

        if *state == BehaviorState::Dead || frozen.is_some() || knockback.is_some() {
            continue;
        }

        let target_transform = target_ref.0.and_then(|t| targets.get(t).ok());

        // Mid-action actors stand still, except a charge closing the gap.
        if let Some(action) = active {
            if action.spec.kind != ActionKind::Normal {
                continue;
            }
            if let (Some(charge), Some(target)) = (charging, target_transform) {
                let to_target = target.translation - transform.translation;
                if to_target.length() > actor.engage_range {
                    desired.0 = to_target.normalize_or_zero()
                        * actor.move_speed
                        * charge.speed_multiplier
                        * status.speed_multiplier;
                }
            }
            continue;
        }

        let Some(target) = target_transform else {
            *state = BehaviorState::Idle;
            continue;
        };

        let to_target = target.translation - transform.translation;
        if to_target.length() > actor.engage_range {
            desired.0 =
                to_target.normalize_or_zero() * actor.move_speed * status.speed_multiplier;
            *state = BehaviorState::Locomotion;
        } else if actor
            .last_channel
            .map(|channel| !cooldowns.is_ready(channel))
            .unwrap_or(false)
        {
            *state = BehaviorState::Cooldown;
        } else {
            *state = BehaviorState::Idle;
        }
    }
}
