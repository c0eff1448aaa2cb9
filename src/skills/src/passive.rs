//! 被动技能加成
//!
//! 每个被动技能在 0 级时就提供第一档加成，之后每升一级再加一档。
//! 系数必须逐位一致：所有计算都使用 f64，并只在数量类结果上取整一次。

use serde::{Deserialize, Serialize};

use crate::catalog::SkillId;

/// Passive balance constants
pub mod constants {
    pub const MAX_HP_PER_TIER: f64 = 0.10;
    pub const MOVE_SPEED_PER_TIER: f64 = 0.10;
    pub const COOLDOWN_PER_TIER: f64 = 0.08;
    pub const EXP_PER_TIER: f64 = 0.30;
    pub const DAMAGE_PER_TIER: f64 = 0.25;
    pub const DAMAGE_TAKEN_PER_TIER: f64 = 0.05;
    /// 恢复间隔 = (15 - level) 秒
    pub const REGEN_BASE_SECS: u64 = 15;
    /// Swiftness 满级后的闪避率
    pub const MAXED_DODGE_CHANCE: f64 = 0.10;
}

/// 被动技能对应的属性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassiveEffect {
    MaxHp,
    MoveSpeed,
    CooldownReduction,
    ExpGain,
    Damage,
    DamageTaken,
    Regeneration,
}

impl PassiveEffect {
    pub fn for_skill(id: SkillId) -> Option<Self> {
        match id {
            SkillId::Vitality => Some(Self::MaxHp),
            SkillId::Swiftness => Some(Self::MoveSpeed),
            SkillId::Haste => Some(Self::CooldownReduction),
            SkillId::Wisdom => Some(Self::ExpGain),
            SkillId::Might => Some(Self::Damage),
            SkillId::Fortitude => Some(Self::DamageTaken),
            SkillId::Regeneration => Some(Self::Regeneration),
            _ => None,
        }
    }
}

fn tier(level: Option<u8>, per_tier: f64) -> f64 {
    level.map_or(0.0, |l| (l as f64 + 1.0) * per_tier)
}

/// 被动加成快照，由 `SkillManager` 生成并传给进度/战斗模块
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PassiveBonuses {
    pub max_hp: f64,
    pub move_speed: f64,
    pub cooldown_reduction: f64,
    pub exp_gain: f64,
    pub damage: f64,
    pub damage_taken_reduction: f64,
    /// 未拥有恢复技能时为 None
    pub regen_interval_ms: Option<u64>,
    pub dodge_chance: f64,
    pub revive_unlocked: bool,
}

impl PassiveBonuses {
    /// 由各被动技能的等级（未拥有为 None）计算加成
    pub fn from_levels(
        level_of: impl Fn(PassiveEffect) -> Option<u8>,
        maxed: impl Fn(SkillId) -> bool,
    ) -> Self {
        Self {
            max_hp: tier(level_of(PassiveEffect::MaxHp), constants::MAX_HP_PER_TIER),
            move_speed: tier(level_of(PassiveEffect::MoveSpeed), constants::MOVE_SPEED_PER_TIER),
            cooldown_reduction: tier(
                level_of(PassiveEffect::CooldownReduction),
                constants::COOLDOWN_PER_TIER,
            ),
            exp_gain: tier(level_of(PassiveEffect::ExpGain), constants::EXP_PER_TIER),
            damage: tier(level_of(PassiveEffect::Damage), constants::DAMAGE_PER_TIER),
            damage_taken_reduction: tier(
                level_of(PassiveEffect::DamageTaken),
                constants::DAMAGE_TAKEN_PER_TIER,
            ),
            regen_interval_ms: level_of(PassiveEffect::Regeneration)
                .map(|l| constants::REGEN_BASE_SECS.saturating_sub(l as u64) * 1000),
            dodge_chance: if maxed(SkillId::Swiftness) {
                constants::MAXED_DODGE_CHANCE
            } else {
                0.0
            },
            revive_unlocked: maxed(SkillId::Vitality),
        }
    }

    pub fn calculate_final_max_hp(&self, base: u32) -> u32 {
        (base as f64 * (1.0 + self.max_hp)).floor() as u32
    }

    pub fn calculate_final_exp(&self, base: u32) -> u32 {
        (base as f64 * (1.0 + self.exp_gain)).floor() as u32
    }

    pub fn calculate_final_damage(&self, base: u32) -> u32 {
        (base as f64 * (1.0 + self.damage)).floor() as u32
    }

    pub fn calculate_final_damage_taken(&self, incoming: u32) -> u32 {
        (incoming as f64 * (1.0 - self.damage_taken_reduction)).floor() as u32
    }

    pub fn calculate_final_move_speed(&self, base: f64) -> f64 {
        base * (1.0 + self.move_speed)
    }

    pub fn calculate_final_cooldown(&self, base_ms: f64) -> f64 {
        base_ms * (1.0 - self.cooldown_reduction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(effect: PassiveEffect, level: u8) -> PassiveBonuses {
        PassiveBonuses::from_levels(|e| (e == effect).then_some(level), |_| false)
    }

    #[test]
    fn test_no_passives_is_neutral() {
        let b = PassiveBonuses::default();
        assert_eq!(b.calculate_final_max_hp(200), 200);
        assert_eq!(b.calculate_final_damage(30), 30);
        assert_eq!(b.calculate_final_damage_taken(10), 10);
        assert_eq!(b.regen_interval_ms, None);
        assert_eq!(b.calculate_final_cooldown(1000.0), 1000.0);
    }

    #[test]
    fn test_level_zero_grants_first_tier() {
        assert_eq!(only(PassiveEffect::MaxHp, 0).calculate_final_max_hp(200), 220);
        assert_eq!(only(PassiveEffect::ExpGain, 0).calculate_final_exp(20), 26);
        assert_eq!(only(PassiveEffect::Damage, 0).calculate_final_damage(20), 25);
        assert_eq!(only(PassiveEffect::DamageTaken, 0).calculate_final_damage_taken(10), 9);
        assert!((only(PassiveEffect::CooldownReduction, 0).cooldown_reduction - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_formulas_match_float_semantics() {
        // (2+1) * 0.1 == 0.30000000000000004
        let b = only(PassiveEffect::MaxHp, 2);
        assert_eq!(b.max_hp, 3.0 * 0.10);
        assert_eq!(b.calculate_final_max_hp(250), 325);

        let d = only(PassiveEffect::Damage, 5);
        assert_eq!(d.damage, 1.5);
        assert_eq!(d.calculate_final_damage(10), 25);
    }

    #[test]
    fn test_regen_interval() {
        assert_eq!(only(PassiveEffect::Regeneration, 0).regen_interval_ms, Some(15_000));
        assert_eq!(only(PassiveEffect::Regeneration, 5).regen_interval_ms, Some(10_000));
    }

    #[test]
    fn test_maxed_unlocks() {
        let b = PassiveBonuses::from_levels(|_| None, |id| id == SkillId::Swiftness);
        assert_eq!(b.dodge_chance, constants::MAXED_DODGE_CHANCE);
        assert!(!b.revive_unlocked);

        let b = PassiveBonuses::from_levels(|_| None, |id| id == SkillId::Vitality);
        assert!(b.revive_unlocked);
    }
}
