//! Behavior logging
//!
//! Records behavior events (action starts, checkpoints, interrupts, deaths)
//! for display and post-run analysis. Entries serialize to JSON so headless
//! scenario runs can dump their full event stream.

use bevy::prelude::*;
use serde::Serialize;

/// A single entry in the behavior log
#[derive(Debug, Clone, Serialize)]
pub struct BehaviorLogEntry {
    /// Timestamp in behavior time (seconds since scenario start)
    pub timestamp: f32,
    /// The type of event
    pub event_type: BehaviorEventType,
    /// Display name of the actor involved, if any
    pub actor: Option<String>,
    /// Human-readable description of the event
    pub message: String,
}

/// Types of behavior log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BehaviorEventType {
    /// An action started on a channel
    ActionStarted,
    /// A checkpoint effect fired
    CheckpointFired,
    /// An action ran its full duration and handed off to cooldown
    ActionCompleted,
    /// An action was cancelled by the interrupt policy
    ActionInterrupted,
    /// A running action found its token stale or its target gone and aborted
    ActionAborted,
    /// An actor was frozen or thawed
    FreezeChanged,
    /// An actor died
    Death,
    /// An actor was spawned
    Spawn,
    /// Scenario event (start, end, scripted injections)
    ScenarioEvent,
}

/// The behavior log resource storing all events
#[derive(Resource, Default)]
pub struct BehaviorLog {
    /// All log entries in chronological order
    pub entries: Vec<BehaviorLogEntry>,
    /// Current behavior time
    pub sim_time: f32,
}

impl BehaviorLog {
    /// Clear the log for a new scenario
    pub fn clear(&mut self) {
        self.entries.clear();
        self.sim_time = 0.0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: BehaviorEventType, actor: Option<String>, message: String) {
        self.entries.push(BehaviorLogEntry {
            timestamp: self.sim_time,
            event_type,
            actor,
            message,
        });
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: BehaviorEventType) -> Vec<&BehaviorLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get entries for a single actor by display name
    pub fn for_actor(&self, actor: &str) -> Vec<&BehaviorLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.actor.as_deref() == Some(actor))
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&BehaviorLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Count entries of one event type
    pub fn count_of(&self, event_type: BehaviorEventType) -> usize {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    /// Write the full log as pretty JSON
    pub fn save_to_file(&self, path: &str) -> Result<(), String> {
        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| format!("Failed to serialize behavior log: {}", e))?;
        std::fs::write(path, json)
            .map_err(|e| format!("Failed to write {}: {}", path, e))?;
        Ok(())
    }
}
