//! Action channels and the per-actor token ledger.
//!
//! Every actor owns one monotonic counter per channel. Beginning or
//! cancelling an action on a channel bumps its counter; a running action
//! captures the counter value at start and re-checks it at every checkpoint.
//! Equality is the only admissible proof that the action is still
//! authoritative — a mismatch means the action was cancelled and must abort
//! silently.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// A mutually-exclusive category of activity on one actor.
///
/// At most one live executor may exist per (actor, channel) pair.
/// Channels have independent token counters, so cancelling Melee never
/// disturbs an outstanding Ranged token.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Channel {
    /// Steering/chase movement. Never cancelled by Melee/Ranged interrupts.
    Locomotion,
    /// Close-range attacks.
    Melee,
    /// Projectile/volley attacks.
    Ranged,
    /// Charge, summon, teleport, shield — one slot shared by all of them.
    Special,
    /// Terminal cleanup after self-death. Immune to interruption.
    Death,
}

impl Channel {
    /// All channels, in counter-index order.
    pub const ALL: [Channel; 5] = [
        Channel::Locomotion,
        Channel::Melee,
        Channel::Ranged,
        Channel::Special,
        Channel::Death,
    ];

    fn index(self) -> usize {
        match self {
            Channel::Locomotion => 0,
            Channel::Melee => 1,
            Channel::Ranged => 2,
            Channel::Special => 3,
            Channel::Death => 4,
        }
    }

    /// Display name for log messages.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Locomotion => "Locomotion",
            Channel::Melee => "Melee",
            Channel::Ranged => "Ranged",
            Channel::Special => "Special",
            Channel::Death => "Death",
        }
    }
}

/// An opaque proof-of-ownership for one action invocation on a channel.
///
/// Captured from [`ActionTokens::begin`] when the action starts; compared
/// against the ledger at every checkpoint.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ActionToken(u32);

/// Per-actor token ledger: one monotonic counter per channel.
#[derive(Component, Debug, Default)]
pub struct ActionTokens {
    counters: [u32; Channel::ALL.len()],
}

impl ActionTokens {
    /// Start a new action on `channel`: bump the counter and capture it.
    /// Any token captured earlier on this channel becomes stale.
    pub fn begin(&mut self, channel: Channel) -> ActionToken {
        let slot = &mut self.counters[channel.index()];
        *slot = slot.wrapping_add(1);
        ActionToken(*slot)
    }

    /// Invalidate whatever action currently holds `channel`, if any.
    pub fn cancel(&mut self, channel: Channel) {
        let slot = &mut self.counters[channel.index()];
        *slot = slot.wrapping_add(1);
    }

    /// Invalidate every channel at once. Used on self-death.
    pub fn cancel_all(&mut self) {
        for channel in Channel::ALL {
            self.cancel(channel);
        }
    }

    /// True while `token` is still the authoritative invocation on `channel`.
    pub fn is_valid(&self, channel: Channel, token: ActionToken) -> bool {
        self.counters[channel.index()] == token.0
    }
}
