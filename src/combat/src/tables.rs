// src/combat/src/tables.rs

use rand::Rng;
use serde::{Deserialize, Serialize};
use skills::PassiveBonuses;

/// Combat configuration constants
pub mod constants {
    /// 每个伤害单位对应的伤害
    pub const DAMAGE_PER_UNIT: u32 = 10;
    /// 攻击动画标记持续时间（毫秒），不阻塞其他技能
    pub const ATTACK_ANIMATION_MS: u64 = 300;
}

/// 暴击曲线与后续效果触发率（随等级成长的进度表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTables {
    pub crit_base_chance: f64,
    pub crit_chance_per_level: f64,
    pub crit_max_chance: f64,
    pub crit_multiplier: f64,
    /// 每档后续效果（波动/爆裂/连锁/爆炸）的触发率，超出部分沿用最后一档
    pub follow_up_chances: Vec<f64>,
    /// 每档包含的等级数
    pub levels_per_tier: u32,
}

impl Default for CombatTables {
    fn default() -> Self {
        Self {
            crit_base_chance: 0.05,
            crit_chance_per_level: 0.01,
            crit_max_chance: 0.50,
            crit_multiplier: 1.5,
            follow_up_chances: vec![0.10, 0.20, 0.30, 0.40, 0.50],
            levels_per_tier: 10,
        }
    }
}

impl CombatTables {
    /// 暴击率，结果总在 [0, 1] 内（NaN 视为 0）
    pub fn crit_chance(&self, player_level: u32) -> f64 {
        let cap = self.crit_max_chance.max(0.0).min(1.0);
        (self.crit_base_chance + self.crit_chance_per_level * player_level as f64)
            .max(0.0)
            .min(cap)
    }

    pub fn tier(&self, player_level: u32) -> usize {
        (player_level / self.levels_per_tier.max(1)) as usize
    }

    pub fn follow_up_chance(&self, player_level: u32) -> f64 {
        let tier = self.tier(player_level);
        self.follow_up_chances
            .get(tier)
            .or(self.follow_up_chances.last())
            .copied()
            .unwrap_or(0.0)
            .max(0.0)
            .min(1.0)
    }

    pub fn roll_follow_up<R: Rng + ?Sized>(&self, player_level: u32, rng: &mut R) -> bool {
        rng.random_bool(self.follow_up_chance(player_level))
    }

    /// 掷暴击并返回 (伤害, 是否暴击)
    pub fn roll_crit<R: Rng + ?Sized>(
        &self,
        damage: u32,
        player_level: u32,
        rng: &mut R,
    ) -> (u32, bool) {
        if rng.random_bool(self.crit_chance(player_level)) {
            ((damage as f64 * self.crit_multiplier).floor() as u32, true)
        } else {
            (damage, false)
        }
    }

    /// 伤害单位 → 最终伤害：floor(units × 10 × (1 + 伤害加成))，再掷暴击
    pub fn calculate_final_damage_with_crit<R: Rng + ?Sized>(
        &self,
        damage_units: u32,
        player_level: u32,
        bonuses: &PassiveBonuses,
        rng: &mut R,
    ) -> (u32, bool) {
        let base = bonuses.calculate_final_damage(damage_units * constants::DAMAGE_PER_UNIT);
        self.roll_crit(base, player_level, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_crit_curve() {
        let tables = CombatTables::default();
        assert!((tables.crit_chance(0) - 0.05).abs() < 1e-12);
        assert!((tables.crit_chance(10) - 0.15).abs() < 1e-12);
        assert_eq!(tables.crit_chance(200), 0.50);
    }

    #[test]
    fn test_out_of_range_tables_never_panic() {
        let mut rng = Pcg32::seed_from_u64(3);
        let tables = CombatTables {
            crit_base_chance: 1.5,
            crit_max_chance: 2.0,
            ..CombatTables::default()
        };
        assert_eq!(tables.crit_chance(0), 1.0);
        assert_eq!(tables.roll_crit(10, 0, &mut rng), (15, true));

        let tables = CombatTables {
            crit_max_chance: -0.5,
            follow_up_chances: vec![f64::NAN, 3.0],
            levels_per_tier: 1,
            ..CombatTables::default()
        };
        assert_eq!(tables.crit_chance(5), 0.0);
        assert_eq!(tables.roll_crit(10, 5, &mut rng), (10, false));
        assert_eq!(tables.follow_up_chance(0), 0.0);
        assert_eq!(tables.follow_up_chance(1), 1.0);
        assert!(tables.roll_follow_up(1, &mut rng));
    }

    #[test]
    fn test_follow_up_tiers() {
        let tables = CombatTables::default();
        assert_eq!(tables.follow_up_chance(0), 0.10);
        assert_eq!(tables.follow_up_chance(9), 0.10);
        assert_eq!(tables.follow_up_chance(10), 0.20);
        assert_eq!(tables.follow_up_chance(99), 0.50);

        let empty = CombatTables {
            follow_up_chances: Vec::new(),
            ..CombatTables::default()
        };
        assert_eq!(empty.follow_up_chance(5), 0.0);
    }

    #[test]
    fn test_damage_with_crit() {
        let never = CombatTables {
            crit_base_chance: 0.0,
            crit_chance_per_level: 0.0,
            ..CombatTables::default()
        };
        let always = CombatTables {
            crit_base_chance: 1.0,
            crit_max_chance: 1.0,
            ..CombatTables::default()
        };
        let mut rng = Pcg32::seed_from_u64(5);
        let bonuses = PassiveBonuses::default();
        assert_eq!(
            never.calculate_final_damage_with_crit(3, 0, &bonuses, &mut rng),
            (30, false)
        );
        assert_eq!(
            always.calculate_final_damage_with_crit(3, 0, &bonuses, &mut rng),
            (45, true)
        );
    }
}
