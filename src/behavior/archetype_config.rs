//! Data-Driven Archetype Configuration
//!
//! This module provides data-driven archetype definitions loaded from RON
//! config files. Instead of hardcoding actor stats and action timings in
//! Rust, archetypes are defined in `assets/config/archetypes.ron`.
//!
//! ## Benefits
//! - Balance changes don't require recompilation
//! - Easier to review and modify checkpoint timings
//! - Validates all archetypes exist at startup
//!
//! ## Usage
//! ```ignore
//! fn my_system(archetypes: Res<ArchetypeDefinitions>) {
//!     let def = archetypes.get("grunt").unwrap();
//!     println!("grunt move speed: {}", def.move_speed);
//! }
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

use super::channels::Channel;
use super::sequence::{ActionKind, ActionSpec, ActionStep, HitOrigin, StepEffect};

fn default_speed_one() -> f32 {
    1.0
}

fn default_needs_target() -> bool {
    true
}

/// One checkpoint as written in config: offset in seconds from action start
/// plus the effect to fire.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepConfig {
    /// Seconds from action start (absolute, not cumulative)
    pub at: f32,
    /// Effect fired at this offset
    pub effect: StepEffect,
}

/// Complete action configuration loaded from RON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Display name of the action
    pub name: String,
    /// Which channel the action occupies
    pub channel: Channel,
    /// Checkpoints at absolute offsets
    pub steps: Vec<StepConfig>,
    /// Total duration in seconds (start to channel hand-off)
    pub duration: f32,
    /// Cooldown started on the channel at completion
    #[serde(default)]
    pub cooldown: f32,
    /// Maximum range in units, checked at start and at damage checkpoints
    /// (0.0 = unlimited)
    #[serde(default)]
    pub range: f32,
    /// Minimum start range in units (gap closers)
    #[serde(default)]
    pub min_range: f32,
    /// Whether start and checkpoints require a live target
    #[serde(default = "default_needs_target")]
    pub needs_target: bool,
    /// Where checkpoint damage is anchored
    #[serde(default)]
    pub hit_origin: HitOrigin,
}

impl ActionConfig {
    /// Build the runtime blueprint: copy steps, clamp and sort offsets.
    pub fn to_spec(&self, kind: ActionKind) -> ActionSpec {
        let mut spec = ActionSpec {
            name: self.name.clone(),
            channel: self.channel,
            kind,
            steps: self
                .steps
                .iter()
                .map(|s| ActionStep {
                    at: s.at,
                    effect: s.effect.clone(),
                })
                .collect::<SmallVec<[ActionStep; 4]>>(),
            duration: self.duration.max(0.0),
            cooldown: self.cooldown.max(0.0),
            range: self.range,
            min_range: self.min_range,
            needs_target: self.needs_target,
            hit_origin: self.hit_origin,
        };
        spec.normalize();
        spec
    }
}

/// Complete archetype configuration loaded from RON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchetypeConfig {
    /// Display name ("Grunt")
    pub name: String,
    /// Maximum health
    pub max_health: f32,
    /// Base movement speed in units per second
    pub move_speed: f32,
    /// Movement speed multiplier while a Charging flag is active
    #[serde(default = "default_speed_one")]
    pub charge_speed_multiplier: f32,
    /// Spawn ritual run once at spawn (None = becomes active immediately)
    #[serde(default)]
    pub ritual: Option<ActionConfig>,
    /// Terminal cleanup sequence run on self-death
    pub death: ActionConfig,
    /// The decision loop's action repertoire, highest priority first
    pub actions: Vec<ActionConfig>,
}

/// Root structure for the archetypes.ron file
#[derive(Debug, Serialize, Deserialize)]
pub struct ArchetypesConfig {
    pub archetypes: HashMap<String, ArchetypeConfig>,
}

/// Resource containing all archetype definitions.
///
/// Loaded from `assets/config/archetypes.ron` at startup.
/// Access via `Res<ArchetypeDefinitions>` in systems.
#[derive(Resource)]
pub struct ArchetypeDefinitions {
    definitions: HashMap<String, ArchetypeConfig>,
}

impl Default for ArchetypeDefinitions {
    /// Load archetype definitions from the default config file.
    /// Panics if the file cannot be loaded - use for tests only.
    fn default() -> Self {
        load_archetype_definitions()
            .expect("Failed to load archetype definitions in Default impl")
    }
}

impl ArchetypeDefinitions {
    /// Create from a loaded config
    pub fn new(config: ArchetypesConfig) -> Self {
        Self {
            definitions: config.archetypes,
        }
    }

    /// Get the configuration for an archetype key
    pub fn get(&self, archetype: &str) -> Option<&ArchetypeConfig> {
        self.definitions.get(archetype)
    }

    /// Get the configuration for an archetype key, panicking if not found.
    /// Use this when you know the archetype must exist (validated at startup).
    pub fn get_unchecked(&self, archetype: &str) -> &ArchetypeConfig {
        self.definitions
            .get(archetype)
            .unwrap_or_else(|| panic!("Archetype {:?} not found in definitions", archetype))
    }

    /// Check that the stock roster is defined and every definition is
    /// internally consistent (positive stats, checkpoints inside their
    /// duration, summon references resolving to known archetypes).
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let expected = ["grunt", "archer", "brute", "summoner", "shade"];

        let mut problems: Vec<String> = expected
            .into_iter()
            .filter(|key| !self.definitions.contains_key(*key))
            .map(|key| format!("missing archetype '{}'", key))
            .collect();

        for (key, archetype) in &self.definitions {
            if archetype.max_health <= 0.0 {
                problems.push(format!("{}: max_health must be positive", key));
            }
            if archetype.move_speed < 0.0 {
                problems.push(format!("{}: move_speed must not be negative", key));
            }

            let mut all_actions: Vec<&ActionConfig> = archetype.actions.iter().collect();
            all_actions.push(&archetype.death);
            if let Some(ritual) = &archetype.ritual {
                all_actions.push(ritual);
            }

            for action in all_actions {
                if action.duration <= 0.0 {
                    problems.push(format!("{}/{}: duration must be positive", key, action.name));
                }
                for step in &action.steps {
                    if step.at > action.duration {
                        problems.push(format!(
                            "{}/{}: checkpoint at {}s exceeds duration {}s",
                            key, action.name, step.at, action.duration
                        ));
                    }
                    if let StepEffect::SummonWave { archetype, min, max } = &step.effect {
                        if !self.definitions.contains_key(archetype) {
                            problems.push(format!(
                                "{}/{}: summons unknown archetype '{}'",
                                key, action.name, archetype
                            ));
                        }
                        if min > max {
                            problems.push(format!(
                                "{}/{}: summon min {} exceeds max {}",
                                key, action.name, min, max
                            ));
                        }
                    }
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    /// Get all archetype keys that are defined
    pub fn archetype_keys(&self) -> impl Iterator<Item = &String> {
        self.definitions.keys()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Load archetype definitions from assets/config/archetypes.ron
pub fn load_archetype_definitions() -> Result<ArchetypeDefinitions, String> {
    let config_path = "assets/config/archetypes.ron";

    let contents = std::fs::read_to_string(config_path)
        .map_err(|e| format!("Failed to read {}: {}", config_path, e))?;

    let config: ArchetypesConfig = ron::from_str(&contents)
        .map_err(|e| format!("Failed to parse {}: {}", config_path, e))?;

    let definitions = ArchetypeDefinitions::new(config);

    definitions
        .validate()
        .map_err(|problems| format!("Invalid archetype definitions: {:?}", problems))?;

    info!(
        "Loaded {} archetype definitions from {}",
        definitions.definitions.len(),
        config_path
    );

    Ok(definitions)
}

/// Bevy plugin for archetype configuration loading
pub struct ArchetypeConfigPlugin;

impl Plugin for ArchetypeConfigPlugin {
    fn build(&self, app: &mut App) {
        match load_archetype_definitions() {
            Ok(definitions) => {
                app.insert_resource(definitions);
            }
            Err(e) => {
                panic!("Failed to load archetype definitions: {}", e);
            }
        }
    }
}
