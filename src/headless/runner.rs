//! Headless scenario execution
//!
//! Runs behavior scenarios without any graphical output, suitable for
//! automated testing and batch analysis.

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use std::time::Duration;

use crate::behavior::archetype_config::{ArchetypeConfigPlugin, ArchetypeDefinitions};
use crate::behavior::components::{
    BehaviorState, Frozen, GameRng, Health, SimTarget, SimulationSpeed,
};
use crate::behavior::events::{DamageIntent, KnockbackEvent};
use crate::behavior::systems::{
    self, ActorCounter, Actor, BehaviorSystemPhase, spawn_hostile,
};
use crate::log::{BehaviorEventType, BehaviorLog};

use super::config::{HeadlessScenarioConfig, ScriptedAction};

/// Result of a completed headless scenario
///
/// This struct provides programmatic access to the run's outcome for testing
/// and analysis.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Why the scenario ended
    pub outcome: ScenarioOutcome,
    /// Real elapsed scenario time in seconds
    pub elapsed: f32,
    /// Final state of every hostile that was spawned
    pub actors: Vec<ActorResult>,
    /// Whether the target dummy survived
    pub target_survived: bool,
    /// Random seed used (if deterministic mode)
    pub random_seed: Option<u64>,
}

/// How a scenario finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioOutcome {
    /// Every hostile died and was cleaned up
    HostilesEliminated,
    /// The max duration elapsed
    TimedOut,
}

/// Final state of one hostile
#[derive(Debug, Clone)]
pub struct ActorResult {
    /// Display name ("grunt#1")
    pub name: String,
    /// Archetype key
    pub archetype: String,
    /// Health remaining at scenario end (0 if dead or despawned)
    pub final_health: f32,
    /// Whether the actor was still alive at the end
    pub survived: bool,
}

/// Resource tracking headless scenario state
#[derive(Resource)]
pub struct ScenarioState {
    /// Maximum duration before the run is cut off
    pub max_duration: f32,
    /// Real elapsed time (unaffected by pause, so scripted Resume still fires)
    pub elapsed: f32,
    /// Custom output path for the behavior log
    pub output_path: Option<String>,
    /// Whether the scenario has completed
    pub complete: bool,
    /// Random seed for deterministic simulation (if provided)
    pub random_seed: Option<u64>,
    /// Scenario result (populated when the run completes)
    pub result: Option<ScenarioResult>,
    /// Index of the next scripted event not yet dispatched
    next_event: usize,
}

/// Entities spawned at setup, in config order, for script index resolution.
#[derive(Resource)]
pub struct ScenarioRoster {
    pub hostiles: Vec<Entity>,
    pub target: Entity,
}

/// Plugin for headless scenario execution
pub struct HeadlessPlugin {
    pub config: HeadlessScenarioConfig,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        self.config.validate().expect("Invalid scenario configuration");

        app.insert_resource(self.config.clone())
            .insert_resource(ScenarioState {
                max_duration: self.config.max_duration_secs,
                elapsed: 0.0,
                output_path: self.config.output_path.clone(),
                complete: false,
                random_seed: self.config.random_seed,
                result: None,
                next_event: 0,
            })
            .init_resource::<BehaviorLog>();

        systems::configure_behavior_system_ordering(app);
        systems::add_core_behavior_systems(app, || true);

        app.add_systems(Startup, scenario_setup).add_systems(
            Update,
            (
                scenario_dispatch_events
                    .after(BehaviorSystemPhase::TimersAndStatus)
                    .before(BehaviorSystemPhase::DecisionAndExecution),
                (scenario_track_time, scenario_check_end)
                    .chain()
                    .after(BehaviorSystemPhase::Resolution),
            ),
        );
        app.add_systems(PostUpdate, scenario_exit_on_complete);
    }
}

/// Setup system for a headless scenario
fn scenario_setup(
    mut commands: Commands,
    config: Res<HeadlessScenarioConfig>,
    archetypes: Res<ArchetypeDefinitions>,
    state: Res<ScenarioState>,
    mut counter: ResMut<ActorCounter>,
    mut log: ResMut<BehaviorLog>,
) {
    log.clear();
    log.log(
        BehaviorEventType::ScenarioEvent,
        None,
        "Scenario started (headless mode)".to_string(),
    );

    commands.insert_resource(SimulationSpeed { multiplier: 1.0 });

    let game_rng = match state.random_seed {
        Some(seed) => {
            info!("Using deterministic RNG with seed: {}", seed);
            GameRng::from_seed(seed)
        }
        None => {
            info!("Using non-deterministic RNG (no seed provided)");
            GameRng::from_entropy()
        }
    };
    commands.insert_resource(game_rng);

    let target = commands
        .spawn((
            SimTarget::default(),
            Health::new(config.target.health),
            Transform::from_translation(Vec3::from_array(config.target.position)),
        ))
        .id();

    let mut hostiles = Vec::with_capacity(config.hostiles.len());
    for spawn in &config.hostiles {
        let archetype = archetypes.get_unchecked(&spawn.archetype);
        let position = Vec3::from_array(spawn.position);
        let (entity, name) =
            spawn_hostile(&mut commands, &spawn.archetype, archetype, position, &mut counter);
        log.log(
            BehaviorEventType::Spawn,
            Some(name),
            format!("{} enters at {:?}", spawn.archetype, position),
        );
        hostiles.push(entity);
    }

    commands.insert_resource(ScenarioRoster { hostiles, target });

    info!(
        "Headless scenario setup complete: {} hostiles vs one target",
        config.hostiles.len()
    );
}

/// Dispatch scripted events whose time has come.
#[allow(clippy::too_many_arguments)]
fn scenario_dispatch_events(
    mut commands: Commands,
    config: Res<HeadlessScenarioConfig>,
    mut state: ResMut<ScenarioState>,
    roster: Option<Res<ScenarioRoster>>,
    mut speed: ResMut<SimulationSpeed>,
    mut log: ResMut<BehaviorLog>,
    mut knockbacks: EventWriter<KnockbackEvent>,
    mut damage: EventWriter<DamageIntent>,
    mut targets: Query<(&mut Health, &mut SimTarget, &mut Transform), Without<Actor>>,
) {
    let Some(roster) = roster else {
        return;
    };

    while let Some(event) = config.events.get(state.next_event) {
        if event.at > state.elapsed {
            break;
        }
        state.next_event += 1;

        log.log(
            BehaviorEventType::ScenarioEvent,
            None,
            format!("Scripted event at {:.2}s: {:?}", event.at, event.action),
        );

        match &event.action {
            ScriptedAction::Knockback {
                actor_index,
                velocity,
                duration,
            } => {
                if let Some(&actor) = roster.hostiles.get(*actor_index) {
                    knockbacks.send(KnockbackEvent {
                        actor,
                        velocity: Vec3::from_array(*velocity),
                        duration: *duration,
                    });
                }
            }
            ScriptedAction::Freeze {
                actor_index,
                duration,
            } => {
                if let Some(&actor) = roster.hostiles.get(*actor_index) {
                    if let Some(mut entity) = commands.get_entity(actor) {
                        entity.insert(Frozen {
                            remaining: *duration,
                        });
                    }
                }
            }
            ScriptedAction::Unfreeze { actor_index } => {
                if let Some(&actor) = roster.hostiles.get(*actor_index) {
                    if let Some(mut entity) = commands.get_entity(actor) {
                        entity.remove::<Frozen>();
                    }
                }
            }
            ScriptedAction::Pause => {
                speed.multiplier = 0.0;
            }
            ScriptedAction::Resume => {
                speed.multiplier = 1.0;
            }
            ScriptedAction::Strike {
                actor_index,
                damage: amount,
            } => {
                if let Some(&actor) = roster.hostiles.get(*actor_index) {
                    damage.send(DamageIntent {
                        source: roster.target,
                        target: actor,
                        amount: *amount,
                        point: Vec3::ZERO,
                        action_name: "Scripted Strike".to_string(),
                    });
                }
            }
            ScriptedAction::KillTarget => {
                if let Ok((mut health, _, _)) = targets.get_mut(roster.target) {
                    health.current = 0.0;
                }
            }
            ScriptedAction::DisableTarget => {
                if let Ok((_, mut sim, _)) = targets.get_mut(roster.target) {
                    sim.enabled = false;
                }
            }
            ScriptedAction::EnableTarget => {
                if let Ok((_, mut sim, _)) = targets.get_mut(roster.target) {
                    sim.enabled = true;
                }
            }
            ScriptedAction::MoveTarget { position } => {
                if let Ok((_, _, mut transform)) = targets.get_mut(roster.target) {
                    transform.translation = Vec3::from_array(*position);
                }
            }
        }
    }
}

/// Track real elapsed time (ignores pause so scripted Resume still fires).
fn scenario_track_time(time: Res<Time>, mut state: ResMut<ScenarioState>) {
    state.elapsed += time.delta_secs();
}

/// End the scenario on timeout or when every hostile is gone and the script
/// has run dry.
fn scenario_check_end(
    mut state: ResMut<ScenarioState>,
    config: Res<HeadlessScenarioConfig>,
    log: Res<BehaviorLog>,
    actors: Query<(&Actor, &Health, &BehaviorState)>,
    targets: Query<&Health, (With<SimTarget>, Without<Actor>)>,
) {
    if state.complete {
        return;
    }

    let timed_out = state.elapsed >= state.max_duration;
    let hostiles_gone = actors.is_empty() && state.next_event >= config.events.len();

    if !timed_out && !hostiles_gone {
        return;
    }

    let outcome = if hostiles_gone {
        info!("Scenario ended: all hostiles eliminated after {:.1}s", state.elapsed);
        ScenarioOutcome::HostilesEliminated
    } else {
        info!("Scenario timed out after {:.1}s", state.elapsed);
        ScenarioOutcome::TimedOut
    };

    let actor_results = actors
        .iter()
        .map(|(actor, health, behavior_state)| ActorResult {
            name: actor.name.clone(),
            archetype: actor.archetype.clone(),
            final_health: health.current,
            survived: health.is_alive() && *behavior_state != BehaviorState::Dead,
        })
        .collect();

    let target_survived = targets.iter().any(|health| health.is_alive());

    if let Some(path) = state.output_path.as_deref() {
        match log.save_to_file(path) {
            Ok(()) => println!("Scenario complete. Log saved to: {}", path),
            Err(e) => eprintln!("Failed to save behavior log: {}", e),
        }
    }

    state.result = Some(ScenarioResult {
        outcome,
        elapsed: state.elapsed,
        actors: actor_results,
        target_survived,
        random_seed: state.random_seed,
    });
    state.complete = true;
}

/// Exit the app when the scenario is complete
fn scenario_exit_on_complete(state: Res<ScenarioState>, mut exit: EventWriter<AppExit>) {
    if state.complete {
        exit.send(AppExit::Success);
    }
}

/// Run a headless scenario with the given configuration
pub fn run_headless_scenario(config: HeadlessScenarioConfig) -> Result<(), String> {
    println!("Starting headless behavior scenario...");
    println!(
        "  Hostiles: {:?}",
        config
            .hostiles
            .iter()
            .map(|h| h.archetype.as_str())
            .collect::<Vec<_>>()
    );
    println!("  Scripted events: {}", config.events.len());
    println!("  Max duration: {:.0}s", config.max_duration_secs);

    App::new()
        // Minimal plugins - no window, no rendering
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 60.0,
            ))),
        )
        // Transform plugin needed for entity positions
        .add_plugins(TransformPlugin)
        // Load archetype definitions from config
        .add_plugins(ArchetypeConfigPlugin)
        // Our headless scenario plugin
        .add_plugins(HeadlessPlugin { config })
        .run();

    Ok(())
}
