//! Tests for skill ownership, slot caps and the selection pool

use crate::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::collections::HashSet;
use strum::IntoEnumIterator;

fn rng(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

const PASSIVES: [SkillId; 7] = [
    SkillId::Vitality,
    SkillId::Swiftness,
    SkillId::Haste,
    SkillId::Wisdom,
    SkillId::Might,
    SkillId::Fortitude,
    SkillId::Regeneration,
];

#[test]
fn test_learn_then_upgrade_to_max() {
    for id in SkillId::iter() {
        let mut manager = SkillManager::default();
        assert!(manager.learn_or_upgrade_skill(id));
        assert_eq!(manager.skill_level(id), Some(0));

        for k in 1..=MAX_SKILL_LEVEL {
            assert!(manager.learn_or_upgrade_skill(id));
            assert_eq!(manager.skill_level(id), Some(k));
        }

        assert!(!manager.learn_or_upgrade_skill(id));
        assert_eq!(manager.skill_level(id), Some(MAX_SKILL_LEVEL));
        assert!(matches!(
            manager.try_learn_or_upgrade(id),
            Err(error::GameError::SkillMaxed(_))
        ));
    }
}

#[test]
fn test_unknown_skill_is_noop() {
    let mut manager = SkillManager::default();
    assert!(!manager.learn_or_upgrade_by_name("fireball"));
    assert!(manager.learn_or_upgrade_by_name("nova"));
    assert_eq!(manager.skill_level(SkillId::Nova), Some(0));

    // 目录中缺失的技能同样视为未知
    let catalog = default_catalog()
        .into_iter()
        .filter(|d| d.id != SkillId::Aegis)
        .collect();
    let mut partial = SkillManager::new(catalog);
    assert!(!partial.learn_or_upgrade_skill(SkillId::Aegis));
    assert!(!partial.has_skill(SkillId::Aegis));
}

#[test]
fn test_fourth_passive_is_rejected() {
    let mut manager = SkillManager::default();
    for id in &PASSIVES[..3] {
        assert!(manager.learn_or_upgrade_skill(*id));
    }
    assert!(!manager.learn_or_upgrade_skill(SkillId::Might));
    assert!(!manager.has_skill(SkillId::Might));
    assert!(matches!(
        manager.try_learn_or_upgrade(SkillId::Might),
        Err(error::GameError::PassiveSlotsFull(3))
    ));

    // 已拥有的被动仍可升级
    assert!(manager.learn_or_upgrade_skill(SkillId::Haste));
    assert_eq!(manager.skill_level(SkillId::Haste), Some(1));
}

#[test]
fn test_slots_follow_acquisition_order() {
    let mut manager = SkillManager::default();
    manager.learn_or_upgrade_skill(SkillId::Aegis);
    manager.learn_or_upgrade_skill(SkillId::Wisdom);
    manager.learn_or_upgrade_skill(SkillId::Crescent);

    let actives: Vec<Option<SkillId>> = manager
        .player_active_skills()
        .iter()
        .map(|s| s.map(|s| s.id()))
        .collect();
    assert_eq!(
        actives,
        vec![Some(SkillId::Aegis), Some(SkillId::Crescent), None, None]
    );

    let passives: Vec<Option<SkillId>> = manager
        .player_passive_skills()
        .iter()
        .map(|s| s.map(|s| s.id()))
        .collect();
    assert_eq!(passives, vec![Some(SkillId::Wisdom), None, None]);
}

#[test]
fn test_first_pick_offers_three_actives() {
    for seed in 0..50 {
        let manager = SkillManager::default();
        let options = manager.random_skill_options(&mut rng(seed));
        assert_eq!(options.len(), 3);
        let distinct: HashSet<_> = options.iter().collect();
        assert_eq!(distinct.len(), 3);
        assert!(options.iter().all(|id| id.natural_type() == SkillType::Active));
    }
}

#[test]
fn test_later_picks_offer_two_actives_and_one_passive() {
    let mut manager = SkillManager::default();
    manager.learn_or_upgrade_skill(SkillId::Nova);

    for seed in 0..50 {
        let options = manager.random_skill_options(&mut rng(seed));
        assert_eq!(options.len(), 3);
        let actives = options
            .iter()
            .filter(|id| id.natural_type() == SkillType::Active)
            .count();
        assert_eq!(actives, 2);
        assert_eq!(options[2].natural_type(), SkillType::Passive);
    }
}

#[test]
fn test_maxed_skills_leave_the_pool() {
    let mut manager = SkillManager::default();
    for _ in 0..=MAX_SKILL_LEVEL {
        manager.learn_or_upgrade_skill(SkillId::Nova);
    }
    for seed in 0..50 {
        let options = manager.random_skill_options(&mut rng(seed));
        assert!(!options.contains(&SkillId::Nova));
    }
}

#[test]
fn test_only_actives_when_no_passive_is_eligible() {
    let mut manager = SkillManager::default();
    manager.learn_or_upgrade_skill(SkillId::Nova);
    for id in &PASSIVES[..3] {
        for _ in 0..=MAX_SKILL_LEVEL {
            manager.learn_or_upgrade_skill(*id);
        }
    }
    let options = manager.random_skill_options(&mut rng(7));
    assert_eq!(options.len(), 2);
    assert!(options.iter().all(|id| id.natural_type() == SkillType::Active));
}

#[test]
fn test_has_upgradeable_skills() {
    let mut manager = SkillManager::default();
    assert!(manager.has_upgradeable_skills());

    for id in [SkillId::Crescent, SkillId::Nova, SkillId::Lightning, SkillId::Aegis]
        .into_iter()
        .chain(PASSIVES[..3].iter().copied())
    {
        for _ in 0..=MAX_SKILL_LEVEL {
            manager.learn_or_upgrade_skill(id);
        }
    }
    // 剩下的被动技能因槽位已满不可选
    assert!(!manager.has_upgradeable_skills());
    assert!(manager.random_skill_options(&mut rng(1)).is_empty());
}

#[test]
fn test_passive_getters() {
    let mut manager = SkillManager::default();
    assert_eq!(manager.max_hp_bonus(), 0.0);
    assert_eq!(manager.regen_interval_ms(), None);

    manager.learn_or_upgrade_skill(SkillId::Vitality);
    manager.learn_or_upgrade_skill(SkillId::Regeneration);
    manager.learn_or_upgrade_skill(SkillId::Regeneration);
    assert_eq!(manager.max_hp_bonus(), 0.1);
    assert_eq!(manager.regen_interval_ms(), Some(14_000));
    assert!(!manager.revive_unlocked());

    for _ in 0..MAX_SKILL_LEVEL {
        manager.learn_or_upgrade_skill(SkillId::Vitality);
    }
    assert!(manager.revive_unlocked());
    assert_eq!(manager.dodge_chance(), 0.0);
    assert_eq!(manager.final_move_speed(100.0), 100.0);
}

proptest! {
    #[test]
    fn prop_never_offers_a_fourth_passive(
        picks in proptest::collection::vec(0usize..11, 1..60),
        seed in any::<u64>(),
    ) {
        let mut manager = SkillManager::default();
        let mut rng = rng(seed);
        let all: Vec<SkillId> = SkillId::iter().collect();
        for pick in picks {
            manager.learn_or_upgrade_skill(all[pick]);
            let owned_passives: HashSet<SkillId> = manager
                .player_passive_skills()
                .iter()
                .flatten()
                .map(|s| s.id())
                .collect();
            prop_assert!(owned_passives.len() <= PASSIVE_SLOTS);

            let options = manager.random_skill_options(&mut rng);
            for id in options {
                if owned_passives.len() == PASSIVE_SLOTS && id.natural_type() == SkillType::Passive {
                    prop_assert!(owned_passives.contains(&id));
                }
                prop_assert!(manager.is_upgradeable(id));
            }
        }
    }
}
