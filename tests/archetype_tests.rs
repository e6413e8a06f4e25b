//! Roster-wide checks against the stock archetype definitions
//!
//! Per-field parsing is covered in the config module's unit tests; these
//! assert properties every shipped archetype must hold so a config edit
//! cannot silently break the scheduler's assumptions.

use mobsim::behavior::archetype_config::ArchetypeDefinitions;
use mobsim::behavior::{ActionKind, Channel, StepEffect};

#[test]
fn test_stock_roster_is_complete_and_valid() {
    let defs = ArchetypeDefinitions::default();
    defs.validate().expect("stock config validates");
    for key in ["grunt", "archer", "brute", "summoner", "shade"] {
        assert!(defs.get(key).is_some(), "missing archetype {}", key);
    }
}

#[test]
fn test_every_death_sequence_ends_in_despawn() {
    let defs = ArchetypeDefinitions::default();
    for key in defs.archetype_keys() {
        let archetype = defs.get_unchecked(key);
        let spec = archetype.death.to_spec(ActionKind::DeathCleanup);
        assert_eq!(spec.channel, Channel::Death, "{}: death sequence channel", key);
        let last = spec.steps.last().unwrap_or_else(|| panic!("{}: empty death sequence", key));
        assert!(
            matches!(last.effect, StepEffect::Despawn),
            "{}: death sequence must end by despawning the corpse",
            key
        );
    }
}

#[test]
fn test_normal_actions_have_payloads_within_duration() {
    let defs = ArchetypeDefinitions::default();
    for key in defs.archetype_keys() {
        let archetype = defs.get_unchecked(key);
        for action in &archetype.actions {
            let spec = action.to_spec(ActionKind::Normal);
            assert!(
                spec.steps.iter().any(|s| s.effect.is_payload()),
                "{}: action '{}' has no payload checkpoint",
                key,
                spec.name
            );
            for step in &spec.steps {
                assert!(
                    step.at <= spec.duration,
                    "{}: '{}' checkpoint past the end of the action",
                    key,
                    spec.name
                );
            }
            assert!(
                spec.cooldown > 0.0,
                "{}: '{}' must charge a cooldown",
                key,
                spec.name
            );
        }
    }
}

#[test]
fn test_commit_points_precede_payloads() {
    let defs = ArchetypeDefinitions::default();
    for key in defs.archetype_keys() {
        let archetype = defs.get_unchecked(key);
        for action in &archetype.actions {
            let spec = action.to_spec(ActionKind::Normal);
            let commit_at = spec
                .steps
                .iter()
                .find(|s| matches!(s.effect, StepEffect::Commit))
                .map(|s| s.at);
            let first_payload = spec
                .steps
                .iter()
                .find(|s| s.effect.is_payload())
                .map(|s| s.at);
            if let (Some(commit), Some(payload)) = (commit_at, first_payload) {
                assert!(
                    commit <= payload,
                    "{}: '{}' commits after its first payload",
                    key,
                    spec.name
                );
            }
        }
    }
}
