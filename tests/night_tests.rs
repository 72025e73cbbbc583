//! Night resolution tests.
//!
//! These drive `NightCollector` and `resolve` directly against a seated
//! registry and check protection, the pack slot, investigations and every
//! chain reaction the death pipeline can produce.

use werewolf_engine::core::{ActionPayload, GameMode, PlayerId, Potion};
use werewolf_engine::effects::Shield;
use werewolf_engine::error::{GameError, Ineligibility};
use werewolf_engine::night::{resolve, NightCollector, NightReport, Reading};
use werewolf_engine::registry::{DeathCause, Player, PlayerRegistry, StatusFlags};
use werewolf_engine::roles::{Appearance, RoleId, Team};

fn p(i: u8) -> PlayerId {
    PlayerId(i)
}

fn seat(roles: &[RoleId]) -> PlayerRegistry {
    PlayerRegistry::from_players(
        roles
            .iter()
            .enumerate()
            .map(|(i, &r)| Player::new(p(i as u8), format!("P{i}"), r)),
    )
}

/// Run one night with the given submissions.
fn run_night(registry: &mut PlayerRegistry, night: u32, actions: &[(u8, ActionPayload)]) -> NightReport {
    registry.clear_status(StatusFlags::NIGHTLY | StatusFlags::DEFENDED | StatusFlags::ACTED);
    let mut collector = NightCollector::new(night, GameMode::Standard);
    for &(actor, payload) in actions {
        collector.submit(registry, p(actor), payload).unwrap();
    }
    resolve(&mut collector, registry).unwrap()
}

#[test]
fn test_bodyguard_saves_pack_target() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, Bodyguard, Villager, Villager, Villager]);
    let report = run_night(
        &mut reg,
        1,
        &[
            (0, ActionPayload::single(p(2))),
            (1, ActionPayload::single(p(2))),
        ],
    );

    assert!(reg.is_alive(p(2)));
    assert!(report.deaths.is_empty());
    assert_eq!(report.survivals.len(), 1);
    assert_eq!(report.survivals[0].shield, Shield::Protected);
}

#[test]
fn test_bodyguard_cannot_repeat() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, Bodyguard, Villager, Villager, Villager]);
    run_night(&mut reg, 1, &[(1, ActionPayload::single(p(2)))]);

    reg.clear_status(StatusFlags::NIGHTLY | StatusFlags::ACTED);
    let mut collector = NightCollector::new(2, GameMode::Standard);
    let err = collector
        .submit(&mut reg, p(1), ActionPayload::single(p(2)))
        .unwrap_err();
    assert!(matches!(err, GameError::InvalidTarget { .. }));
    collector
        .submit(&mut reg, p(1), ActionPayload::single(p(3)))
        .unwrap();
}

#[test]
fn test_six_player_seer_scenario() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, Werewolf, Seer, Villager, Villager, Villager]);
    let report = run_night(
        &mut reg,
        1,
        &[
            (0, ActionPayload::single(p(3))),
            (1, ActionPayload::single(p(3))),
            (2, ActionPayload::single(p(0))),
        ],
    );

    assert!(!reg.is_alive(p(3)));
    assert_eq!(report.deaths.len(), 1);
    assert_eq!(report.deaths[0].cause, DeathCause::PackAttack);
    assert_eq!(reg.living_count(), 5);

    let reading = report
        .readings
        .iter()
        .find(|r| r.actor == p(2))
        .expect("seer reading");
    assert_eq!(reading.target, p(0));
    assert_eq!(reading.reading, Reading::Appearance(Appearance::Werewolf));
}

#[test]
fn test_split_pack_kills_nobody() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, Werewolf, Seer, Villager, Villager, Villager, Villager]);
    let report = run_night(
        &mut reg,
        1,
        &[
            (0, ActionPayload::single(p(3))),
            (1, ActionPayload::single(p(4))),
        ],
    );
    assert!(report.wolves_disagreed);
    assert!(report.deaths.is_empty());
}

#[test]
fn test_second_submission_rejected() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, SerialKiller, Villager, Villager, Villager, Villager]);
    let mut collector = NightCollector::new(1, GameMode::Standard);
    collector
        .submit(&mut reg, p(1), ActionPayload::single(p(2)))
        .unwrap();
    let err = collector
        .submit(&mut reg, p(1), ActionPayload::single(p(2)))
        .unwrap_err();
    assert_eq!(
        err,
        GameError::NotEligible {
            player: p(1),
            reason: Ineligibility::AlreadyActed,
        }
    );

    let report = resolve(&mut collector, &mut reg).unwrap();
    let kills = report
        .deaths
        .iter()
        .filter(|d| d.cause == DeathCause::SerialKiller)
        .count();
    assert_eq!(kills, 1);
}

#[test]
fn test_pack_identical_vote_rejected_but_change_allowed() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, Villager, Villager, Villager]);
    let mut collector = NightCollector::new(1, GameMode::Standard);
    collector
        .submit(&mut reg, p(0), ActionPayload::single(p(1)))
        .unwrap();
    assert!(collector
        .submit(&mut reg, p(0), ActionPayload::single(p(1)))
        .is_err());
    collector
        .submit(&mut reg, p(0), ActionPayload::single(p(2)))
        .unwrap();

    let report = resolve(&mut collector, &mut reg).unwrap();
    assert!(reg.is_alive(p(1)));
    assert!(!reg.is_alive(p(2)));
    assert_eq!(report.deaths.len(), 1);
}

#[test]
fn test_lovers_die_together() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, Cupid, Villager, Villager, Villager, Villager]);
    let first = run_night(&mut reg, 1, &[(1, ActionPayload::dual(p(3), p(4)))]);
    assert_eq!(first.lovers, Some((p(3), p(4))));
    assert_eq!(reg.get(p(4)).unwrap().lover, Some(p(3)));

    let second = run_night(&mut reg, 2, &[(0, ActionPayload::single(p(3)))]);
    assert!(!reg.is_alive(p(3)));
    assert!(!reg.is_alive(p(4)));
    let grief = second.deaths.iter().find(|d| d.player == p(4)).unwrap();
    assert_eq!(grief.cause, DeathCause::Heartbreak);
}

#[test]
fn test_cupid_only_on_first_night() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, Cupid, Villager, Villager]);
    let mut collector = NightCollector::new(2, GameMode::Standard);
    let err = collector
        .submit(&mut reg, p(1), ActionPayload::dual(p(2), p(3)))
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::NotEligible {
            reason: Ineligibility::FirstNightOnly,
            ..
        }
    ));
}

#[test]
fn test_honeypot_traps_serial_killer() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, SerialKiller, Honeypot, Villager, Villager, Villager]);
    let report = run_night(&mut reg, 1, &[(1, ActionPayload::single(p(2)))]);

    assert!(!reg.is_alive(p(2)));
    assert!(!reg.is_alive(p(1)));
    let trap = report.deaths.iter().find(|d| d.player == p(1)).unwrap();
    assert_eq!(trap.cause, DeathCause::HoneypotTrap);
}

#[test]
fn test_honeypot_does_not_trap_the_pack() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, Werewolf, Honeypot, Villager, Villager, Villager, Villager]);
    let report = run_night(
        &mut reg,
        1,
        &[
            (0, ActionPayload::single(p(2))),
            (1, ActionPayload::single(p(2))),
        ],
    );

    assert!(!reg.is_alive(p(2)));
    assert!(reg.is_alive(p(0)));
    assert!(reg.is_alive(p(1)));
    assert_eq!(report.deaths.len(), 1);
}

#[test]
fn test_tough_villager_needs_two_attacks() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, ToughVillager, Villager, Villager]);
    let first = run_night(&mut reg, 1, &[(0, ActionPayload::single(p(1)))]);
    assert!(reg.is_alive(p(1)));
    assert_eq!(first.survivals[0].shield, Shield::ExtraLife);

    run_night(&mut reg, 2, &[(0, ActionPayload::single(p(1)))]);
    assert!(!reg.is_alive(p(1)));
}

#[test]
fn test_witch_heal_then_poison() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, Witch, Villager, Villager, Villager]);
    let report = run_night(
        &mut reg,
        1,
        &[
            (0, ActionPayload::single(p(2))),
            (1, ActionPayload::potion(Potion::Heal, p(2))),
        ],
    );
    assert!(reg.is_alive(p(2)));
    assert_eq!(report.survivals[0].shield, Shield::Healed);
    assert!(reg.has_status(p(1), StatusFlags::HEAL_SPENT));

    // the heal is gone for good
    reg.clear_status(StatusFlags::NIGHTLY | StatusFlags::ACTED);
    let mut collector = NightCollector::new(2, GameMode::Standard);
    let err = collector
        .submit(&mut reg, p(1), ActionPayload::potion(Potion::Heal, p(3)))
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::NotEligible {
            reason: Ineligibility::PotionSpent,
            ..
        }
    ));

    let report = run_night(&mut reg, 3, &[(1, ActionPayload::potion(Potion::Poison, p(0)))]);
    assert!(!reg.is_alive(p(0)));
    assert_eq!(report.deaths[0].cause, DeathCause::Poison);
}

#[test]
fn test_monster_shrugs_off_the_pack() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, Monster, Villager, Villager, Villager]);
    let report = run_night(&mut reg, 1, &[(0, ActionPayload::single(p(1)))]);
    assert!(reg.is_alive(p(1)));
    assert_eq!(report.survivals[0].shield, Shield::Immune);
}

#[test]
fn test_prostitute_blocks_and_shares_fate() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, Prostitute, Seer, Villager, Villager, Villager]);
    let report = run_night(
        &mut reg,
        1,
        &[
            (1, ActionPayload::single(p(2))),
            (2, ActionPayload::single(p(0))),
            (0, ActionPayload::single(p(2))),
        ],
    );

    // the Seer was visited, so no reading
    assert!(report.readings.is_empty());
    assert_eq!(report.blocked, vec![p(2)]);
    // the Seer died and took the visitor along
    assert!(!reg.is_alive(p(2)));
    assert!(!reg.is_alive(p(1)));
    let link = report.deaths.iter().find(|d| d.player == p(1)).unwrap();
    assert_eq!(link.cause, DeathCause::VisitLink);
}

#[test]
fn test_hunter_takes_mark_along() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, Hunter, Villager, Villager, Villager]);
    let report = run_night(
        &mut reg,
        1,
        &[
            (1, ActionPayload::single(p(0))),
            (0, ActionPayload::single(p(1))),
        ],
    );
    assert!(!reg.is_alive(p(1)));
    assert!(!reg.is_alive(p(0)));
    assert!(report
        .deaths
        .iter()
        .any(|d| d.player == p(0) && d.cause == DeathCause::HunterArrow));
}

#[test]
fn test_wild_child_joins_pack() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, WildChild, Villager, Villager, Villager, Villager]);
    run_night(&mut reg, 1, &[(1, ActionPayload::single(p(2)))]);
    let report = run_night(&mut reg, 2, &[(0, ActionPayload::single(p(2)))]);

    assert_eq!(report.transformed, vec![p(1)]);
    let child = reg.get(p(1)).unwrap();
    assert_eq!(child.role, Werewolf);
    assert_eq!(child.original_role, WildChild);
    assert_eq!(reg.living_pack(), vec![p(0), p(1)]);
}

#[test]
fn test_martyr_bequest() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, Martyr, Villager, Villager, Villager]);
    let report = run_night(
        &mut reg,
        1,
        &[
            (1, ActionPayload::single(p(2))),
            (0, ActionPayload::single(p(1))),
        ],
    );
    assert_eq!(report.bequests, vec![(p(1), p(2))]);
    assert_eq!(reg.get(p(2)).unwrap().extra_lives, 1);
}

#[test]
fn test_revealer_outcomes() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, Werewolf, Revealer, Villager, Villager, Villager, Villager]);
    let report = run_night(&mut reg, 1, &[(2, ActionPayload::single(p(0)))]);
    assert!(!reg.is_alive(p(0)));
    assert_eq!(report.readings[0].reading, Reading::Team(Team::Werewolves));

    let report = run_night(&mut reg, 2, &[(2, ActionPayload::single(p(3)))]);
    assert!(!reg.is_alive(p(2)));
    assert_eq!(report.deaths[0].cause, DeathCause::RevealBackfire);
}

#[test]
fn test_sorcerer_senses_magic() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, Sorcerer, Seer, Villager, Villager, Villager, Villager]);
    let report = run_night(&mut reg, 1, &[(1, ActionPayload::single(p(2)))]);
    assert_eq!(report.readings[0].reading, Reading::Magic(true));
}

#[test]
fn test_blocked_wolf_excluded_from_consensus() {
    use RoleId::*;
    let mut reg = seat(&[Werewolf, Werewolf, Prostitute, Villager, Villager, Villager, Villager]);
    let report = run_night(
        &mut reg,
        1,
        &[
            (2, ActionPayload::single(p(1))),
            (0, ActionPayload::single(p(3))),
            (1, ActionPayload::single(p(4))),
        ],
    );
    // seat 1 was visited, so seat 0 decides alone
    assert!(!reg.is_alive(p(3)));
    assert!(reg.is_alive(p(4)));
    assert!(!report.wolves_disagreed);
}
