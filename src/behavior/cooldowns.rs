//! Per-channel cooldown tracking.
//!
//! A channel that just finished (or was knocked out of) an action enters a
//! refractory window before the decision loop may start it again. Remaining
//! time only ever decreases, is clamped at zero, and is never re-summed
//! mid-countdown: external modifier deltas are folded in once, at start.

use std::collections::HashMap;

use bevy::prelude::*;

use super::channels::Channel;

/// Remaining cooldown seconds per channel. Channels with no entry are ready.
#[derive(Component, Debug, Default)]
pub struct Cooldowns {
    remaining: HashMap<Channel, f32>,
}

impl Cooldowns {
    /// Begin a cooldown: `remaining = max(0, base + modifier_delta)`.
    ///
    /// The modifier delta comes from the external status-modifier source and
    /// is sampled exactly once here — a status change mid-cooldown does not
    /// retroactively lengthen or shorten a running countdown.
    pub fn start(&mut self, channel: Channel, base: f32, modifier_delta: f32) {
        let duration = (base + modifier_delta).max(0.0);
        if duration > 0.0 {
            self.remaining.insert(channel, duration);
        } else {
            self.remaining.remove(&channel);
        }
    }

    /// Advance every countdown by `dt` seconds of unfrozen time.
    pub fn tick(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        for remaining in self.remaining.values_mut() {
            *remaining -= dt;
        }
        self.remaining.retain(|_, remaining| *remaining > 0.0);
    }

    /// True when `channel` may start a new action.
    pub fn is_ready(&self, channel: Channel) -> bool {
        !self.remaining.contains_key(&channel)
    }

    /// Remaining seconds on `channel`, zero when ready.
    pub fn remaining(&self, channel: Channel) -> f32 {
        self.remaining.get(&channel).copied().unwrap_or(0.0)
    }
}
