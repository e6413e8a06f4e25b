//! Integration tests for the behavior core
//!
//! These tests drive a manually-clocked Bevy app through the full system
//! schedule and verify the scheduler's observable guarantees: checkpoint
//! timing, token cancellation, freeze/pause semantics, the interrupt policy,
//! and cooldown hand-off.

use std::time::Duration;

use bevy::prelude::*;

use mobsim::behavior::archetype_config::ArchetypeDefinitions;
use mobsim::behavior::components::{GameRng, StatusModifiers};
use mobsim::behavior::systems::{
    add_core_behavior_systems, configure_behavior_system_ordering, spawn_hostile, ActorCounter,
};
use mobsim::behavior::{
    ActiveAction, Actor, BehaviorState, Channel, Cooldowns, DamageIntent, Frozen, Health,
    KnockbackEvent, SimTarget, SimulationSpeed,
};
use mobsim::log::{BehaviorEventType, BehaviorLog};

const STEP: f32 = 0.05;

fn test_app() -> App {
    let mut app = App::new();
    app.init_resource::<Time>();
    app.insert_resource(SimulationSpeed::default());
    app.insert_resource(GameRng::from_seed(7));
    app.init_resource::<BehaviorLog>();
    app.insert_resource(ArchetypeDefinitions::default());
    configure_behavior_system_ordering(&mut app);
    add_core_behavior_systems(&mut app, || true);
    app
}

fn tick(app: &mut App, secs: f32) {
    app.world_mut()
        .resource_mut::<Time>()
        .advance_by(Duration::from_secs_f32(secs));
    app.update();
}

fn run_for(app: &mut App, total: f32) {
    let steps = (total / STEP).round() as usize;
    for _ in 0..steps {
        tick(app, STEP);
    }
}

fn spawn_target(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            SimTarget::default(),
            Health::new(1000.0),
            Transform::from_translation(position),
        ))
        .id()
}

fn spawn_actor(app: &mut App, key: &str, position: Vec3) -> Entity {
    let world = app.world_mut();
    let archetype = world
        .resource::<ArchetypeDefinitions>()
        .get_unchecked(key)
        .clone();
    let (entity, _name) = world.resource_scope(|world, mut counter: Mut<ActorCounter>| {
        let mut commands = world.commands();
        spawn_hostile(&mut commands, key, &archetype, position, counter.as_mut())
    });
    world.flush();
    entity
}

fn target_health(app: &App, target: Entity) -> f32 {
    app.world().get::<Health>(target).map(|h| h.current).unwrap_or(0.0)
}

fn strike(app: &mut App, source: Entity, victim: Entity, amount: f32) {
    app.world_mut().send_event(DamageIntent {
        source,
        target: victim,
        amount,
        point: Vec3::ZERO,
        action_name: "Test Strike".to_string(),
    });
}

fn interrupt_count(app: &App) -> usize {
    app.world()
        .resource::<BehaviorLog>()
        .count_of(BehaviorEventType::ActionInterrupted)
}

// =============================================================================
// Checkpoint Timing and Cooldown Hand-off
// =============================================================================

#[test]
fn test_melee_combo_lands_both_hits_then_cools_down() {
    let mut app = test_app();
    let target = spawn_target(&mut app, Vec3::ZERO);
    let grunt = spawn_actor(&mut app, "grunt", Vec3::new(1.0, 0.0, 0.0));

    // Only the first hit (6 damage at 0.2s) has fired by 0.3s.
    run_for(&mut app, 0.3);
    assert_eq!(target_health(&app, target), 994.0);

    // The second hit (8 damage at 0.45s) lands before 0.5s.
    run_for(&mut app, 0.2);
    assert_eq!(target_health(&app, target), 986.0);

    // Duration 0.7s served, channel hands off to a 1.0s cooldown.
    run_for(&mut app, 0.3);
    let cooldowns = app.world().get::<Cooldowns>(grunt).expect("has cooldowns");
    assert!(!cooldowns.is_ready(Channel::Melee));
    assert!(cooldowns.remaining(Channel::Melee) > 0.8);
    assert_eq!(
        *app.world().get::<BehaviorState>(grunt).expect("has state"),
        BehaviorState::Cooldown
    );

    // Ready again at roughly start + 1.7s; a second combo begins.
    run_for(&mut app, 1.3);
    let log = app.world().resource::<BehaviorLog>();
    assert!(log.count_of(BehaviorEventType::ActionStarted) >= 2);
    assert!(target_health(&app, target) < 986.0);
}

#[test]
fn test_second_hit_whiffs_when_target_flees_mid_combo() {
    let mut app = test_app();
    let target = spawn_target(&mut app, Vec3::ZERO);
    let grunt = spawn_actor(&mut app, "grunt", Vec3::new(1.0, 0.0, 0.0));

    // First hit lands as usual.
    run_for(&mut app, 0.3);
    assert_eq!(target_health(&app, target), 994.0);

    // The target escapes far past the 2.5 unit reach before the 0.45s hit.
    app.world_mut()
        .get_mut::<Transform>(target)
        .expect("target")
        .translation = Vec3::new(100.0, 0.0, 0.0);
    run_for(&mut app, 0.3);

    // The landed hit stands; the remaining checkpoint whiffs, nothing is
    // retracted.
    assert_eq!(target_health(&app, target), 994.0);

    // The sequence still serves its full duration and hands off the channel.
    run_for(&mut app, 0.2);
    let cooldowns = app.world().get::<Cooldowns>(grunt).expect("has cooldowns");
    assert!(!cooldowns.is_ready(Channel::Melee));
    let log = app.world().resource::<BehaviorLog>();
    assert_eq!(log.count_of(BehaviorEventType::ActionCompleted), 1);
}

#[test]
fn test_cooldown_modifier_sampled_once_at_start() {
    let mut app = test_app();
    spawn_target(&mut app, Vec3::ZERO);
    let grunt = spawn_actor(&mut app, "grunt", Vec3::new(1.0, 0.0, 0.0));
    app.world_mut().entity_mut(grunt).insert(StatusModifiers {
        cooldown_delta: 0.5,
        speed_multiplier: 1.0,
    });

    // Action completes at 0.7s; cooldown starts at 1.0 + 0.5.
    run_for(&mut app, 0.75);
    let remaining = app
        .world()
        .get::<Cooldowns>(grunt)
        .expect("has cooldowns")
        .remaining(Channel::Melee);
    assert!(remaining > 1.3, "folded cooldown should be ~1.5s, got {}", remaining);

    // A modifier change mid-countdown never re-sums the running cooldown.
    app.world_mut().entity_mut(grunt).insert(StatusModifiers {
        cooldown_delta: -10.0,
        speed_multiplier: 1.0,
    });
    run_for(&mut app, 0.2);
    let remaining = app
        .world()
        .get::<Cooldowns>(grunt)
        .expect("has cooldowns")
        .remaining(Channel::Melee);
    assert!(remaining > 1.0, "countdown only ticks, got {}", remaining);
}

// =============================================================================
// Knockback Policy
// =============================================================================

#[test]
fn test_knockback_cancels_combo_and_charges_full_cooldown() {
    let mut app = test_app();
    let target = spawn_target(&mut app, Vec3::ZERO);
    let grunt = spawn_actor(&mut app, "grunt", Vec3::new(1.0, 0.0, 0.0));

    // First hit has landed, second is pending.
    run_for(&mut app, 0.3);
    assert_eq!(target_health(&app, target), 994.0);

    app.world_mut().send_event(KnockbackEvent {
        actor: grunt,
        velocity: Vec3::new(0.0, 0.0, -4.0),
        duration: 0.2,
    });
    run_for(&mut app, 0.3);

    // The second hit never fires, the actor got displaced, and the full
    // cooldown was charged even though the action never completed.
    assert_eq!(target_health(&app, target), 994.0);
    assert!(interrupt_count(&app) >= 1);
    let transform = app.world().get::<Transform>(grunt).expect("has transform");
    assert!(transform.translation.z < -0.5);
    let cooldowns = app.world().get::<Cooldowns>(grunt).expect("has cooldowns");
    assert!(cooldowns.remaining(Channel::Melee) > 0.5);
}

// =============================================================================
// Freeze Semantics
// =============================================================================

#[test]
fn test_freeze_suspends_progress_and_resumes_exactly() {
    let mut app = test_app();
    let target = spawn_target(&mut app, Vec3::ZERO);
    let grunt = spawn_actor(&mut app, "grunt", Vec3::new(1.0, 0.0, 0.0));

    // 0.1s of windup, then a 0.5s freeze.
    run_for(&mut app, 0.1);
    app.world_mut()
        .entity_mut(grunt)
        .insert(Frozen { remaining: None });
    run_for(&mut app, 0.5);
    assert_eq!(target_health(&app, target), 1000.0, "no progress while frozen");

    // Thaw; the first hit is still 0.1s of action time away.
    app.world_mut().entity_mut(grunt).remove::<Frozen>();
    run_for(&mut app, 0.15);
    assert_eq!(
        target_health(&app, target),
        994.0,
        "first hit fires at original offset after thaw"
    );
}

#[test]
fn test_timed_freeze_thaws_on_its_own() {
    let mut app = test_app();
    spawn_target(&mut app, Vec3::ZERO);
    let grunt = spawn_actor(&mut app, "grunt", Vec3::new(1.0, 0.0, 0.0));

    app.world_mut()
        .entity_mut(grunt)
        .insert(Frozen { remaining: Some(0.2) });
    run_for(&mut app, 0.35);

    assert!(app.world().get::<Frozen>(grunt).is_none());
    let log = app.world().resource::<BehaviorLog>();
    assert_eq!(log.count_of(BehaviorEventType::FreezeChanged), 1);
}

#[test]
fn test_global_pause_halts_all_behavior_time() {
    let mut app = test_app();
    let target = spawn_target(&mut app, Vec3::ZERO);
    spawn_actor(&mut app, "grunt", Vec3::new(1.0, 0.0, 0.0));

    run_for(&mut app, 0.1);
    app.world_mut().resource_mut::<SimulationSpeed>().multiplier = 0.0;
    run_for(&mut app, 1.0);
    assert_eq!(target_health(&app, target), 1000.0, "nothing fires while paused");

    app.world_mut().resource_mut::<SimulationSpeed>().multiplier = 1.0;
    run_for(&mut app, 0.15);
    assert_eq!(target_health(&app, target), 994.0, "resumes where it left off");
}

// =============================================================================
// Hit Interrupts and the Commit Window
// =============================================================================

#[test]
fn test_strike_during_windup_cancels_without_cooldown() {
    let mut app = test_app();
    let target = spawn_target(&mut app, Vec3::ZERO);
    let grunt = spawn_actor(&mut app, "grunt", Vec3::new(1.0, 0.0, 0.0));

    // One tick of windup (0.05s), well before the 0.15s commit point.
    tick(&mut app, STEP);
    strike(&mut app, target, grunt, 5.0);
    tick(&mut app, STEP);
    tick(&mut app, STEP);

    assert!(interrupt_count(&app) >= 1);
    assert_eq!(target_health(&app, target), 1000.0, "no hit from the cancelled combo");
    assert_eq!(
        app.world().get::<Health>(grunt).expect("alive").current,
        25.0
    );

    // No cooldown was charged, so the decision loop can retry immediately.
    run_for(&mut app, 0.1);
    let log = app.world().resource::<BehaviorLog>();
    assert!(log.count_of(BehaviorEventType::ActionStarted) >= 2);
    assert_eq!(target_health(&app, target), 1000.0, "retry has not reached its first hit yet");
}

#[test]
fn test_strike_after_commit_is_absorbed() {
    let mut app = test_app();
    let target = spawn_target(&mut app, Vec3::ZERO);
    let grunt = spawn_actor(&mut app, "grunt", Vec3::new(1.0, 0.0, 0.0));

    // Past the 0.15s commit and the first hit.
    run_for(&mut app, 0.25);
    assert_eq!(target_health(&app, target), 994.0);

    strike(&mut app, target, grunt, 5.0);
    run_for(&mut app, 0.35);

    assert_eq!(interrupt_count(&app), 0, "committed actions absorb hits");
    assert_eq!(target_health(&app, target), 986.0, "second hit still lands");
}

// =============================================================================
// Death
// =============================================================================

#[test]
fn test_fatal_strike_cancels_everything_and_schedules_cleanup() {
    let mut app = test_app();
    let target = spawn_target(&mut app, Vec3::ZERO);
    let grunt = spawn_actor(&mut app, "grunt", Vec3::new(1.0, 0.0, 0.0));

    run_for(&mut app, 0.1);
    strike(&mut app, target, grunt, 999.0);
    run_for(&mut app, 0.1);

    assert_eq!(
        *app.world().get::<BehaviorState>(grunt).expect("has state"),
        BehaviorState::Dead
    );
    let action = app.world().get::<ActiveAction>(grunt).expect("cleanup running");
    assert_eq!(action.spec.channel, Channel::Death);

    // The pending melee hit never fires after death.
    run_for(&mut app, 0.5);
    assert_eq!(target_health(&app, target), 1000.0);

    // Collapse despawns the corpse after its 1.0s sequence.
    run_for(&mut app, 0.6);
    assert!(app.world().get_entity(grunt).is_err(), "corpse despawned");
}

#[test]
fn test_death_cleanup_is_immune_to_knockback_cancel() {
    let mut app = test_app();
    let target = spawn_target(&mut app, Vec3::ZERO);
    let grunt = spawn_actor(&mut app, "grunt", Vec3::new(1.0, 0.0, 0.0));

    run_for(&mut app, 0.1);
    strike(&mut app, target, grunt, 999.0);
    run_for(&mut app, 0.1);

    app.world_mut().send_event(KnockbackEvent {
        actor: grunt,
        velocity: Vec3::new(2.0, 0.0, 0.0),
        duration: 0.1,
    });
    run_for(&mut app, 1.1);

    assert!(app.world().get_entity(grunt).is_err(), "cleanup still ran to despawn");
}

// =============================================================================
// Target Loss
// =============================================================================

#[test]
fn test_target_disable_aborts_action_and_idles() {
    let mut app = test_app();
    let target = spawn_target(&mut app, Vec3::ZERO);
    let grunt = spawn_actor(&mut app, "grunt", Vec3::new(1.0, 0.0, 0.0));

    run_for(&mut app, 0.1);
    app.world_mut().get_mut::<SimTarget>(target).expect("target").enabled = false;
    run_for(&mut app, 1.0);

    assert_eq!(target_health(&app, target), 1000.0, "no hit after target loss");
    assert_eq!(
        *app.world().get::<BehaviorState>(grunt).expect("has state"),
        BehaviorState::Idle
    );
    let log = app.world().resource::<BehaviorLog>();
    assert!(log.count_of(BehaviorEventType::ActionAborted) >= 1);
}

// =============================================================================
// Archetype Behaviors
// =============================================================================

#[test]
fn test_brute_charge_closes_gap_and_lands_committed_slam() {
    let mut app = test_app();
    let target = spawn_target(&mut app, Vec3::ZERO);
    let brute = spawn_actor(&mut app, "brute", Vec3::new(0.0, 0.0, 8.0));

    run_for(&mut app, 1.0);

    assert_eq!(target_health(&app, target), 985.0, "charge hit for 15");
    let transform = app.world().get::<Transform>(brute).expect("has transform");
    assert!(
        transform.translation.distance(Vec3::ZERO) < 4.0,
        "charge closed most of the gap"
    );
    assert!(
        app.world()
            .get::<mobsim::behavior::components::Charging>(brute)
            .is_none(),
        "charge flag dropped once the payload landed"
    );
}

#[test]
fn test_summoner_ritual_guards_then_conjures_a_wave() {
    let mut app = test_app();
    let target = spawn_target(&mut app, Vec3::new(20.0, 0.0, 0.0));
    let summoner = spawn_actor(&mut app, "summoner", Vec3::ZERO);

    run_for(&mut app, 0.5);
    assert_eq!(
        *app.world().get::<BehaviorState>(summoner).expect("has state"),
        BehaviorState::Summoning
    );

    // Strikes bounce off the ritual guard.
    strike(&mut app, target, summoner, 10.0);
    run_for(&mut app, 0.2);
    assert_eq!(
        app.world().get::<Health>(summoner).expect("alive").current,
        40.0
    );

    // Ritual ends at 2.5s; the wave checkpoint fires 1.1s into Conjure Wave.
    run_for(&mut app, 3.5);
    let mut actors = app.world_mut().query::<&Actor>();
    let grunts = actors
        .iter(app.world())
        .filter(|a| a.archetype == "grunt")
        .count();
    assert!((2..=3).contains(&grunts), "wave spawned 2-3 grunts, got {}", grunts);
}

#[test]
fn test_shade_blinks_to_standoff_distance() {
    let mut app = test_app();
    spawn_target(&mut app, Vec3::ZERO);
    let shade = spawn_actor(&mut app, "shade", Vec3::new(10.0, 0.0, 0.0));

    run_for(&mut app, 0.5);

    let transform = app.world().get::<Transform>(shade).expect("has transform");
    assert!(
        transform.translation.distance(Vec3::ZERO) < 2.0,
        "blink placed the shade at melee standoff"
    );
}
