// src/progression/src/state.rs

use log::info;
use serde::{Deserialize, Serialize};
use skills::PassiveBonuses;

/// 成长曲线与计时参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// 0 级基础生命
    pub base_hp: u32,
    /// 每级增加的基础生命
    pub hp_per_level: u32,
    /// 0 级升级所需经验
    pub base_exp: u32,
    /// 升级经验的指数成长
    pub exp_growth: f64,
    /// 受伤硬直（毫秒）
    pub hurt_stun_ms: u64,
    /// 受伤残影追上真实生命的延迟（毫秒）
    pub damage_ghost_lag_ms: u64,
    /// 每次被动恢复占最大生命的比例
    pub regen_fraction: f64,
    /// 护盾值占最大生命的比例
    pub shield_fraction: f64,
    /// 每隔多少级请求一次 boss
    pub boss_level_interval: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            base_hp: 200,
            hp_per_level: 50,
            base_exp: 100,
            exp_growth: 1.2,
            hurt_stun_ms: 200,
            damage_ghost_lag_ms: 1000,
            regen_fraction: 0.01,
            shield_fraction: 0.30,
            boss_level_interval: 10,
        }
    }
}

/// 升级结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub new_level: u32,
    pub max_hp: u32,
    pub max_exp: u32,
    /// 每 10 级请求生成 boss
    pub boss_due: bool,
}

/// 玩家进度：生命、护盾、经验与等级
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressionState {
    #[serde(skip)]
    pub(crate) config: ProgressionConfig,
    pub current_hp: u32,
    pub max_hp: u32,
    /// 受伤残影，仅用于显示
    pub damaged_hp: u32,
    pub(crate) ghost_catch_up_at: Option<u64>,
    pub current_shield: u32,
    pub max_shield: u32,
    pub shield_reflect_damage: u32,
    pub current_exp: u32,
    pub max_exp: u32,
    pub current_level: u32,
    pub revive_used: bool,
    pub dead: bool,
    pub(crate) stun_until: u64,
    pub(crate) last_regen_time: u64,
}

impl ProgressionState {
    pub fn new(config: ProgressionConfig, bonuses: &PassiveBonuses) -> Self {
        let mut state = Self {
            config,
            current_hp: 0,
            max_hp: 0,
            damaged_hp: 0,
            ghost_catch_up_at: None,
            current_shield: 0,
            max_shield: 0,
            shield_reflect_damage: 0,
            current_exp: 0,
            max_exp: 0,
            current_level: 0,
            revive_used: false,
            dead: false,
            stun_until: 0,
            last_regen_time: 0,
        };
        state.max_exp = state.compute_max_exp(0);
        state.max_hp = state.compute_max_hp(0, bonuses);
        state.current_hp = state.max_hp;
        state.damaged_hp = state.max_hp;
        state
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// 基础生命：200 + 50 × level
    pub fn base_hp(&self, level: u32) -> u32 {
        self.config.base_hp + self.config.hp_per_level * level
    }

    pub fn compute_max_hp(&self, level: u32, bonuses: &PassiveBonuses) -> u32 {
        bonuses.calculate_final_max_hp(self.base_hp(level))
    }

    /// 升级所需经验：floor(100 × 1.2^level)
    pub fn compute_max_exp(&self, level: u32) -> u32 {
        (self.config.base_exp as f64 * self.config.exp_growth.powf(level as f64)).floor() as u32
    }

    /// 被动技能变化后重新计算最大生命，当前生命不超过上限
    pub fn refresh_max_hp(&mut self, bonuses: &PassiveBonuses) {
        self.max_hp = self.compute_max_hp(self.current_level, bonuses);
        self.current_hp = self.current_hp.min(self.max_hp);
        self.damaged_hp = self.damaged_hp.min(self.max_hp);
    }

    /// 治疗，返回实际恢复量
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.current_hp;
        self.current_hp = self.current_hp.saturating_add(amount).min(self.max_hp);
        if self.damaged_hp < self.current_hp {
            self.damaged_hp = self.current_hp;
        }
        self.current_hp - before
    }

    /// 获得经验
    ///
    /// 正数经过经验加成后取整；负数（调试用）不经过加成。
    /// 达到上限时升级：经验清零，重算上限与最大生命并回满。
    pub fn add_exp(&mut self, amount: i64, bonuses: &PassiveBonuses) -> Option<LevelUp> {
        if amount > 0 {
            let gained = bonuses.calculate_final_exp(amount.min(u32::MAX as i64) as u32);
            self.current_exp = self.current_exp.saturating_add(gained);
        } else {
            let loss = amount.unsigned_abs().min(u32::MAX as u64) as u32;
            self.current_exp = self.current_exp.saturating_sub(loss);
        }

        if self.current_exp < self.max_exp {
            return None;
        }
        Some(self.level_up(bonuses))
    }

    fn level_up(&mut self, bonuses: &PassiveBonuses) -> LevelUp {
        self.current_level += 1;
        self.current_exp = 0;
        self.max_exp = self.compute_max_exp(self.current_level);
        self.max_hp = self.compute_max_hp(self.current_level, bonuses);
        self.heal(self.max_hp);

        let interval = self.config.boss_level_interval;
        let boss_due = interval > 0 && self.current_level % interval == 0;
        info!(
            "level up -> {} (max hp {}, next exp {})",
            self.current_level, self.max_hp, self.max_exp
        );
        LevelUp {
            new_level: self.current_level,
            max_hp: self.max_hp,
            max_exp: self.max_exp,
            boss_due,
        }
    }

    /// 被动恢复：每个恢复间隔在生命未满时恢复 max(1, floor(maxHp × 1%))
    pub fn regenerate(&mut self, now: u64, bonuses: &PassiveBonuses) -> Option<u32> {
        let interval = bonuses.regen_interval_ms?;
        if now.saturating_sub(self.last_regen_time) < interval {
            return None;
        }
        self.last_regen_time = now;
        if self.dead || self.current_hp >= self.max_hp {
            return None;
        }
        let amount = ((self.max_hp as f64 * self.config.regen_fraction).floor() as u32).max(1);
        Some(self.heal(amount))
    }

    /// 释放护盾：覆盖当前护盾为 30% 最大生命，并设置反伤值 (1 + 1.5 × level) × 10
    pub fn cast_shield(&mut self, skill_level: u8) {
        let shield = (self.max_hp as f64 * self.config.shield_fraction).floor() as u32;
        self.current_shield = shield;
        self.max_shield = shield;
        self.shield_reflect_damage = ((1.0 + 1.5 * skill_level as f64) * 10.0).floor() as u32;
    }

    pub fn has_shield(&self) -> bool {
        self.current_shield > 0
    }

    /// 受伤残影在延迟后追上真实生命
    pub fn update_damage_ghost(&mut self, now: u64) {
        if let Some(at) = self.ghost_catch_up_at {
            if now >= at {
                self.damaged_hp = self.current_hp;
                self.ghost_catch_up_at = None;
            }
        }
    }

    /// 硬直期间不能移动（技能冷却与释放不受影响）
    pub fn can_move(&self, now: u64) -> bool {
        !self.dead && now >= self.stun_until
    }

    pub fn is_stunned(&self, now: u64) -> bool {
        now < self.stun_until
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn hp_ratio(&self) -> f64 {
        ratio(self.current_hp, self.max_hp)
    }

    pub fn damaged_hp_ratio(&self) -> f64 {
        ratio(self.damaged_hp, self.max_hp)
    }

    pub fn shield_ratio(&self) -> f64 {
        ratio(self.current_shield, self.max_shield)
    }

    pub fn exp_ratio(&self) -> f64 {
        ratio(self.current_exp, self.max_exp)
    }
}

/// 分母为 0 时返回 0
pub fn ratio(value: u32, max: u32) -> f64 {
    if max == 0 {
        0.0
    } else {
        (value as f64 / max as f64).min(1.0)
    }
}
