//! JSON configuration parsing for headless scenarios
//!
//! A scenario describes the hostile roster, the target dummy, and a script
//! of timed external events (knockbacks, freezes, strikes, pauses) to inject
//! while the behavior simulation runs.

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Headless scenario configuration loaded from JSON. Doubles as a resource
/// so the scripted-event dispatcher can walk it during the run.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessScenarioConfig {
    /// Hostile actors to spawn at scenario start
    pub hostiles: Vec<HostileSpawn>,
    /// The target dummy the hostiles act against
    #[serde(default)]
    pub target: TargetConfig,
    /// Timed external events, dispatched when scenario time passes `at`
    #[serde(default)]
    pub events: Vec<ScriptedEvent>,
    /// Maximum scenario duration in seconds (default: 60)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Random seed for deterministic scenario reproduction
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Custom output path for the behavior log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
}

/// One hostile actor to spawn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostileSpawn {
    /// Archetype key ("grunt", "archer", "brute", "summoner", "shade")
    pub archetype: String,
    /// World-space spawn position
    #[serde(default)]
    pub position: [f32; 3],
}

/// The target dummy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Target hit points
    #[serde(default = "default_target_health")]
    pub health: f32,
    /// Target position
    #[serde(default)]
    pub position: [f32; 3],
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            health: default_target_health(),
            position: [0.0, 0.0, 0.0],
        }
    }
}

/// One scripted external event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedEvent {
    /// Scenario time (real seconds since start) at which to dispatch
    pub at: f32,
    /// What to do
    pub action: ScriptedAction,
}

/// External actions the scenario script can inject. Indices refer to the
/// `hostiles` list in spawn order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScriptedAction {
    /// Knock a hostile back with the given velocity for `duration` seconds
    Knockback {
        actor_index: usize,
        velocity: [f32; 3],
        duration: f32,
    },
    /// Freeze a hostile (None = until an explicit Unfreeze)
    Freeze {
        actor_index: usize,
        duration: Option<f32>,
    },
    /// Thaw a frozen hostile
    Unfreeze { actor_index: usize },
    /// Pause the whole simulation
    Pause,
    /// Resume a paused simulation
    Resume,
    /// Deal external damage to a hostile
    Strike { actor_index: usize, damage: f32 },
    /// Reduce the target dummy to zero health
    KillTarget,
    /// Make the target untargetable without killing it
    DisableTarget,
    /// Re-enable a disabled target
    EnableTarget,
    /// Relocate the target dummy
    MoveTarget { position: [f32; 3] },
}

fn default_max_duration() -> f32 {
    60.0
}

fn default_target_health() -> f32 {
    1000.0
}

impl HeadlessScenarioConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: HeadlessScenarioConfig = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.hostiles.is_empty() {
            return Err("hostiles must have at least one entry".to_string());
        }
        if self.target.health <= 0.0 {
            return Err("target.health must be positive".to_string());
        }
        if self.max_duration_secs <= 0.0 {
            return Err("max_duration_secs must be positive".to_string());
        }

        for (i, event) in self.events.iter().enumerate() {
            if event.at < 0.0 {
                return Err(format!("events[{}].at must not be negative", i));
            }
            if let Some(index) = event.action.actor_index() {
                if index >= self.hostiles.len() {
                    return Err(format!(
                        "events[{}] references actor_index {} but only {} hostiles are defined",
                        i,
                        index,
                        self.hostiles.len()
                    ));
                }
            }
            if let ScriptedAction::Knockback { duration, .. } = &event.action {
                if *duration <= 0.0 {
                    return Err(format!("events[{}]: knockback duration must be positive", i));
                }
            }
        }

        Ok(())
    }
}

impl ScriptedAction {
    /// The hostile index this action targets, if any
    pub fn actor_index(&self) -> Option<usize> {
        match self {
            ScriptedAction::Knockback { actor_index, .. }
            | ScriptedAction::Freeze { actor_index, .. }
            | ScriptedAction::Unfreeze { actor_index }
            | ScriptedAction::Strike { actor_index, .. } => Some(*actor_index),
            _ => None,
        }
    }
}
