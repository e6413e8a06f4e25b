//! Behavior Systems API
//!
//! This module provides a stable API for the behavior simulation systems.
//! Headless scenario runs and any future graphical shell should import from
//! here rather than from internal modules.
//!
//! ## System Phases
//!
//! Behavior systems run in three ordered phases each frame:
//!
//! 1. **TimersAndStatus** - Clock, freeze/thaw, cooldowns, guards, knockback timers
//! 2. **DecisionAndExecution** - Target upkeep, interrupts, decisions, checkpoint execution
//! 3. **Resolution** - Damage resolution, spawns, movement integration, presentation
//!
//! Interrupt processing runs at the head of phase 2, before the executor, so
//! damage resolved in the previous frame's phase 3 always lands before the
//! victim's next checkpoint can fire.

use bevy::prelude::*;

use crate::log::{BehaviorEventType, BehaviorLog};

pub use super::decision::{decide_actions, update_locomotion, validate_targets};
pub use super::interrupts::{process_knockbacks, process_struck, process_target_loss};

use super::archetype_config::{ArchetypeConfig, ArchetypeDefinitions};

// Re-export the component and event surface alongside the systems so
// external consumers have one stable import path.
pub use super::channels::{ActionToken, ActionTokens, Channel};
pub use super::components::{
    Actor, BehaviorState, Charging, DesiredVelocity, Frozen, GameRng, Guarded, Health,
    KnockbackState, PresentationFlags, SimTarget, SimulationSpeed, StatusModifiers, TargetRef,
    presentation_flags,
};
pub use super::cooldowns::Cooldowns;
pub use super::events::{
    DamageIntent, DamageResolved, KnockbackEvent, SpawnRequest, TeleportIntent,
};
pub use super::sequence::{ActionKind, ActionSpec, ActionStep, ActiveAction, HitOrigin, StepEffect};

/// Monotonic counter for actor display names ("grunt#3").
#[derive(Resource, Default)]
pub struct ActorCounter {
    next: u32,
}

impl ActorCounter {
    pub fn next_name(&mut self, archetype: &str) -> String {
        self.next += 1;
        format!("{}#{}", archetype, self.next)
    }
}

fn scaled_delta(time: &Time, speed: &SimulationSpeed) -> f32 {
    time.delta_secs() * speed.multiplier
}

// ============================================================================
// Phase 1: Timers and Status
// ============================================================================

/// Advance the shared behavior clock (the log timestamps).
pub fn tick_behavior_clock(
    time: Res<Time>,
    speed: Res<SimulationSpeed>,
    mut log: ResMut<BehaviorLog>,
) {
    log.sim_time += scaled_delta(&time, &speed);
}

/// Count down timed freezes and thaw actors whose time is up.
/// Indefinite freezes (`remaining: None`) wait for an explicit unfreeze.
pub fn tick_freezes(
    mut commands: Commands,
    time: Res<Time>,
    speed: Res<SimulationSpeed>,
    mut log: ResMut<BehaviorLog>,
    mut frozen: Query<(Entity, &Actor, &mut Frozen)>,
) {
    let dt = scaled_delta(&time, &speed);
    if dt <= 0.0 {
        return;
    }
    for (entity, actor, mut freeze) in frozen.iter_mut() {
        let Some(remaining) = freeze.remaining.as_mut() else {
            continue;
        };
        *remaining -= dt;
        if *remaining <= 0.0 {
            commands.entity(entity).remove::<Frozen>();
            log.log(
                BehaviorEventType::FreezeChanged,
                Some(actor.name.clone()),
                format!("{} thaws", actor.name),
            );
        }
    }
}

/// Tick every unfrozen actor's cooldown tracker.
pub fn tick_cooldowns(
    time: Res<Time>,
    speed: Res<SimulationSpeed>,
    mut actors: Query<(&mut Cooldowns, Option<&Frozen>)>,
) {
    let dt = scaled_delta(&time, &speed);
    for (mut cooldowns, frozen) in actors.iter_mut() {
        if frozen.is_none() {
            cooldowns.tick(dt);
        }
    }
}

/// Tick guard windows down and drop expired ones.
pub fn tick_guards(
    mut commands: Commands,
    time: Res<Time>,
    speed: Res<SimulationSpeed>,
    mut guarded: Query<(Entity, &mut Guarded, Option<&Frozen>)>,
) {
    let dt = scaled_delta(&time, &speed);
    if dt <= 0.0 {
        return;
    }
    for (entity, mut guard, frozen) in guarded.iter_mut() {
        if frozen.is_some() {
            continue;
        }
        guard.remaining -= dt;
        if guard.remaining <= 0.0 {
            commands.entity(entity).remove::<Guarded>();
        }
    }
}

/// Tick knockback displacement timers and release finished ones.
pub fn tick_knockbacks(
    mut commands: Commands,
    time: Res<Time>,
    speed: Res<SimulationSpeed>,
    mut knocked: Query<(Entity, &mut KnockbackState, Option<&Frozen>)>,
) {
    let dt = scaled_delta(&time, &speed);
    if dt <= 0.0 {
        return;
    }
    for (entity, mut knockback, frozen) in knocked.iter_mut() {
        if frozen.is_some() {
            continue;
        }
        knockback.remaining -= dt;
        if knockback.remaining <= 0.0 {
            commands.entity(entity).remove::<KnockbackState>();
        }
    }
}

// ============================================================================
// Phase 2: Execution
// ============================================================================

/// The timed phase executor: accumulate unfrozen time on every active
/// action, fire checkpoints that have come due, and hand completed actions
/// off to the cooldown tracker.
///
/// Every checkpoint re-validates the action's token against the ledger. A
/// stale token means the action was cancelled elsewhere this frame and the
/// executor aborts silently, with no partial effect.
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn advance_actions(
    mut commands: Commands,
    time: Res<Time>,
    speed: Res<SimulationSpeed>,
    mut log: ResMut<BehaviorLog>,
    mut rng: ResMut<GameRng>,
    mut damage: EventWriter<DamageIntent>,
    mut spawns: EventWriter<SpawnRequest>,
    mut teleports: EventWriter<TeleportIntent>,
    mut actors: Query<(
        Entity,
        &mut Actor,
        &Transform,
        &mut BehaviorState,
        &mut ActionTokens,
        &mut Cooldowns,
        &StatusModifiers,
        &TargetRef,
        &mut ActiveAction,
        Option<&Frozen>,
    )>,
    targets: Query<(&Transform, &Health, &SimTarget), Without<Actor>>,
) {
    if speed.is_paused() {
        return;
    }
    let dt = scaled_delta(&time, &speed);

    'actors: for (
        entity,
        mut actor,
        transform,
        mut state,
        mut tokens,
        mut cooldowns,
        status,
        target_ref,
        mut action,
        frozen,
    ) in actors.iter_mut()
    {
        // Frozen actors accumulate no time: the action resumes exactly where
        // the freeze caught it.
        if frozen.is_some() {
            continue;
        }
        action.advance(dt);

        while let Some(step) = action.next_due() {
            if !tokens.is_valid(action.spec.channel, action.token) {
                // Cancelled elsewhere; abort without firing anything more.
                commands.entity(entity).remove::<ActiveAction>().remove::<Charging>();
                log.log(
                    BehaviorEventType::ActionAborted,
                    Some(actor.name.clone()),
                    format!("{} abandons stale {}", actor.name, action.spec.name),
                );
                continue 'actors;
            }

            let target = target_ref.0.and_then(|t| {
                targets
                    .get(t)
                    .ok()
                    .filter(|(_, health, sim)| health.is_alive() && sim.enabled)
                    .map(|(transform, _, _)| (t, transform.translation))
            });

            if action.spec.needs_target
                && action.spec.kind == ActionKind::Normal
                && target.is_none()
            {
                tokens.cancel(action.spec.channel);
                actor.last_channel = Some(action.spec.channel);
                *state = BehaviorState::Interrupted;
                commands.entity(entity).remove::<ActiveAction>().remove::<Charging>();
                log.log(
                    BehaviorEventType::ActionAborted,
                    Some(actor.name.clone()),
                    format!("{} loses its target mid-{}", actor.name, action.spec.name),
                );
                continue 'actors;
            }

            match &step.effect {
                StepEffect::MeleeHit { damage: amount }
                | StepEffect::RangedShot { damage: amount } => {
                    let Some((target_entity, target_pos)) = target else {
                        continue;
                    };
                    // A target that fled out of range makes this hit whiff.
                    // The sequence keeps its clock; only the hit is skipped.
                    if action.spec.range > 0.0
                        && transform.translation.distance(target_pos) > action.spec.range
                    {
                        log.log(
                            BehaviorEventType::CheckpointFired,
                            Some(actor.name.clone()),
                            format!(
                                "{} whiffs {} (target out of range)",
                                actor.name, action.spec.name
                            ),
                        );
                        continue;
                    }
                    let point = match action.spec.hit_origin {
                        HitOrigin::TargetPosition => target_pos,
                        HitOrigin::ActorPosition => transform.translation,
                    };
                    damage.send(DamageIntent {
                        source: entity,
                        target: target_entity,
                        amount: *amount,
                        point,
                        action_name: action.spec.name.clone(),
                    });
                    action.fired_payload = true;
                    // The charge has landed; drop back to normal speed.
                    commands.entity(entity).remove::<Charging>();
                    log.log(
                        BehaviorEventType::CheckpointFired,
                        Some(actor.name.clone()),
                        format!("{} lands {} for {}", actor.name, action.spec.name, amount),
                    );
                }
                StepEffect::Commit => {
                    action.committed = true;
                }
                StepEffect::SummonWave { archetype, min, max } => {
                    let count = rng.random_u32_inclusive(*min, *max);
                    for i in 0..count {
                        let angle =
                            (i as f32 / count.max(1) as f32) * std::f32::consts::TAU;
                        let radius = rng.random_range(1.5, 3.0);
                        let offset = Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius);
                        spawns.send(SpawnRequest {
                            archetype: archetype.clone(),
                            position: transform.translation + offset,
                            summoner: entity,
                        });
                    }
                    action.fired_payload = true;
                    log.log(
                        BehaviorEventType::CheckpointFired,
                        Some(actor.name.clone()),
                        format!("{} conjures {} x{}", actor.name, archetype, count),
                    );
                }
                StepEffect::Blink { standoff } => {
                    let Some((_, target_pos)) = target else {
                        continue;
                    };
                    let away = (transform.translation - target_pos).normalize_or_zero();
                    let destination = target_pos + away * *standoff;
                    teleports.send(TeleportIntent {
                        actor: entity,
                        destination,
                    });
                    action.fired_payload = true;
                    log.log(
                        BehaviorEventType::CheckpointFired,
                        Some(actor.name.clone()),
                        format!("{} blinks to its target", actor.name),
                    );
                }
                StepEffect::Guard { duration } => {
                    commands.entity(entity).insert(Guarded {
                        remaining: *duration,
                    });
                    action.fired_payload = true;
                }
                StepEffect::Despawn => {
                    log.log(
                        BehaviorEventType::CheckpointFired,
                        Some(actor.name.clone()),
                        format!("{} is removed", actor.name),
                    );
                    commands.entity(entity).despawn();
                    continue 'actors;
                }
            }

            // Summoning and Dead own their whole sequence; only normal
            // actions walk the Windup -> Effect ladder.
            if action.spec.kind == ActionKind::Normal && action.fired_payload {
                *state = BehaviorState::Effect;
            }
        }

        if action.is_complete() {
            let spec = action.spec.clone();
            commands.entity(entity).remove::<ActiveAction>().remove::<Charging>();
            match spec.kind {
                ActionKind::Normal => {
                    cooldowns.start(spec.channel, spec.cooldown, status.cooldown_delta);
                    actor.last_channel = Some(spec.channel);
                    *state = BehaviorState::Cooldown;
                    log.log(
                        BehaviorEventType::ActionCompleted,
                        Some(actor.name.clone()),
                        format!("{} completes {}", actor.name, spec.name),
                    );
                }
                ActionKind::Ritual => {
                    *state = BehaviorState::Idle;
                    log.log(
                        BehaviorEventType::ActionCompleted,
                        Some(actor.name.clone()),
                        format!("{} finishes its ritual", actor.name),
                    );
                }
                // A cleanup without a Despawn step leaves a corpse behind.
                ActionKind::DeathCleanup => {}
            }
        } else if action.spec.kind == ActionKind::Normal
            && action.next_step >= action.spec.steps.len()
            && action.fired_payload
        {
            *state = BehaviorState::Recovery;
        }
    }
}

// ============================================================================
// Phase 3: Resolution
// ============================================================================

/// Reference damage sink: applies intents to health and reports what
/// happened back to the interrupt policy. Guarded or already-dead victims
/// swallow the intent.
pub fn resolve_damage(
    mut intents: EventReader<DamageIntent>,
    mut resolved: EventWriter<DamageResolved>,
    mut log: ResMut<BehaviorLog>,
    sources: Query<&Actor>,
    mut victims: Query<(&mut Health, Option<&Guarded>)>,
) {
    for intent in intents.read() {
        let Ok((mut health, guarded)) = victims.get_mut(intent.target) else {
            continue;
        };
        if guarded.is_some() || !health.is_alive() {
            continue;
        }

        let applied = intent.amount.min(health.current);
        health.current = (health.current - intent.amount).max(0.0);
        let fatal = !health.is_alive();

        log.log(
            BehaviorEventType::CheckpointFired,
            sources.get(intent.source).ok().map(|a| a.name.clone()),
            format!(
                "{} deals {:.1} damage at ({:.1}, {:.1}, {:.1})",
                intent.action_name, applied, intent.point.x, intent.point.y, intent.point.z
            ),
        );
        resolved.send(DamageResolved {
            target: intent.target,
            amount: applied,
            fatal,
        });
    }
}

/// Spawn requested actors. Unknown archetype keys are logged and skipped so
/// one bad config entry cannot take the scenario down mid-run.
pub fn process_spawn_requests(
    mut commands: Commands,
    mut requests: EventReader<SpawnRequest>,
    archetypes: Res<ArchetypeDefinitions>,
    mut counter: ResMut<ActorCounter>,
    mut log: ResMut<BehaviorLog>,
) {
    for request in requests.read() {
        let Some(archetype) = archetypes.get(&request.archetype) else {
            warn!("spawn request for unknown archetype '{}'", request.archetype);
            continue;
        };
        let (_, name) = spawn_hostile(
            &mut commands,
            &request.archetype,
            archetype,
            request.position,
            &mut counter,
        );
        log.log(
            BehaviorEventType::Spawn,
            Some(name.clone()),
            format!("{} enters at {:?}", name, request.position),
        );
    }
}

/// Spawn one hostile actor with the full behavior component set. Returns the
/// new entity and the display name assigned to it.
pub fn spawn_hostile(
    commands: &mut Commands,
    key: &str,
    archetype: &ArchetypeConfig,
    position: Vec3,
    counter: &mut ActorCounter,
) -> (Entity, String) {
    let name = counter.next_name(key);

    // Chase up to the shortest attack range so every action stays usable.
    let engage_range = archetype
        .actions
        .iter()
        .filter(|a| a.needs_target && a.range > 0.0)
        .map(|a| a.range)
        .fold(f32::INFINITY, f32::min);
    let engage_range = if engage_range.is_finite() {
        engage_range * 0.8
    } else {
        2.0
    };

    let mut tokens = ActionTokens::default();
    let (state, ritual_action) = match &archetype.ritual {
        Some(ritual) => {
            let spec = ritual.to_spec(ActionKind::Ritual);
            let token = tokens.begin(spec.channel);
            (BehaviorState::Summoning, Some(ActiveAction::new(spec, token)))
        }
        None => (BehaviorState::Idle, None),
    };

    let entity = commands
        .spawn((
            Actor {
                archetype: key.to_string(),
                name: name.clone(),
                move_speed: archetype.move_speed,
                engage_range,
                last_channel: None,
            },
            Health::new(archetype.max_health),
            tokens,
            Cooldowns::default(),
            TargetRef::default(),
            StatusModifiers::neutral(),
            DesiredVelocity::default(),
            PresentationFlags::default(),
            state,
            Transform::from_translation(position),
        ))
        .id();

    if let Some(action) = ritual_action {
        commands.entity(entity).insert(action);
    }
    (entity, name)
}

/// Integrate all position writes in one place: teleports first, then
/// knockback displacement or steering.
pub fn apply_locomotion(
    time: Res<Time>,
    speed: Res<SimulationSpeed>,
    mut teleports: EventReader<TeleportIntent>,
    mut movers: Query<(
        Entity,
        &mut Transform,
        &DesiredVelocity,
        Option<&KnockbackState>,
        Option<&Frozen>,
    )>,
) {
    let dt = scaled_delta(&time, &speed);

    for teleport in teleports.read() {
        if let Ok((_, mut transform, _, _, _)) = movers.get_mut(teleport.actor) {
            transform.translation = teleport.destination;
        }
    }

    if dt <= 0.0 {
        return;
    }
    for (_, mut transform, desired, knockback, frozen) in movers.iter_mut() {
        if frozen.is_some() {
            continue;
        }
        if let Some(knockback) = knockback {
            transform.translation += knockback.velocity * dt;
        } else {
            transform.translation += desired.0 * dt;
        }
    }
}

/// Mirror every actor's behavior state into its write-only presentation
/// flags.
pub fn update_presentation(mut actors: Query<(&BehaviorState, &mut PresentationFlags)>) {
    for (state, mut flags) in actors.iter_mut() {
        let next = presentation_flags(*state);
        if *flags != next {
            *flags = next;
        }
    }
}

// ============================================================================
// Wiring
// ============================================================================

/// System set labels for behavior system ordering.
///
/// Use these to ensure proper ordering when adding custom systems that
/// interact with the behavior core.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum BehaviorSystemPhase {
    /// Phase 1: Clock, freezes, cooldowns, guards, knockback timers
    TimersAndStatus,
    /// Phase 2: Targeting, interrupts, decisions, checkpoint execution
    DecisionAndExecution,
    /// Phase 3: Damage resolution, spawns, movement, presentation
    Resolution,
}

/// Configures the ordering between behavior system phases.
///
/// Call this once during app setup before adding behavior systems.
pub fn configure_behavior_system_ordering(app: &mut App) {
    app.configure_sets(
        Update,
        (
            BehaviorSystemPhase::TimersAndStatus,
            BehaviorSystemPhase::DecisionAndExecution,
            BehaviorSystemPhase::Resolution,
        )
            .chain(),
    );
}

/// Adds the core behavior simulation systems to the app.
///
/// # Arguments
/// * `app` - The Bevy App to add systems to
/// * `run_condition` - A run condition (e.g., a scenario-active check, or
///   `|| true` for headless runs)
pub fn add_core_behavior_systems<M>(app: &mut App, run_condition: impl Condition<M> + Clone)
where
    M: 'static,
{
    app.add_event::<DamageIntent>()
        .add_event::<DamageResolved>()
        .add_event::<KnockbackEvent>()
        .add_event::<SpawnRequest>()
        .add_event::<TeleportIntent>()
        .init_resource::<ActorCounter>();

    // Phase 1: Timers and Status
    app.add_systems(
        Update,
        (
            tick_behavior_clock,
            tick_freezes,
            tick_cooldowns,
            tick_guards,
            tick_knockbacks,
        )
            .chain()
            .in_set(BehaviorSystemPhase::TimersAndStatus)
            .run_if(run_condition.clone()),
    );

    // Flush deferred commands between phases
    app.add_systems(
        Update,
        apply_deferred
            .after(BehaviorSystemPhase::TimersAndStatus)
            .before(BehaviorSystemPhase::DecisionAndExecution)
            .run_if(run_condition.clone()),
    );

    // Phase 2: Decision and Execution
    app.add_systems(
        Update,
        (
            validate_targets,
            process_knockbacks,
            process_struck,
            process_target_loss,
            apply_deferred, // Flush cancellations before the executor runs
            decide_actions,
            apply_deferred, // Flush freshly started actions
            advance_actions,
            update_locomotion,
        )
            .chain()
            .in_set(BehaviorSystemPhase::DecisionAndExecution)
            .run_if(run_condition.clone()),
    );

    // Phase 3: Resolution
    app.add_systems(
        Update,
        (
            resolve_damage,
            process_spawn_requests,
            apply_locomotion,
            update_presentation,
        )
            .chain()
            .in_set(BehaviorSystemPhase::Resolution)
            .run_if(run_condition),
    );
}
