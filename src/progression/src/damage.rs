//! 承伤管线
//!
//! 闪避 → 减伤 → 护盾吸收 → 破盾治疗 → 扣除生命 → 死亡判定。
//! 护盾从有到无的那一下会按本次护盾的最大值治疗玩家，与这一击实际吸收了多少无关。

use log::{debug, info};
use rand::Rng;
use skills::PassiveBonuses;

use crate::state::ProgressionState;

/// 一次承伤的结算结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DamageOutcome {
    pub incoming: u32,
    pub dodged: bool,
    /// 减伤后的伤害
    pub after_reduction: u32,
    pub absorbed: u32,
    pub hp_damage: u32,
    pub shield_broken: bool,
    /// 护盾破碎带来的治疗（实际恢复量）
    pub shield_heal: u32,
    /// 生命降到 0
    pub lethal: bool,
}

/// 死亡判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathOutcome {
    /// 复活并回满生命
    Revived { hp: u32 },
    /// 不可恢复的死亡
    Dead,
}

impl ProgressionState {
    /// 结算一次来自怪物的伤害
    pub fn apply_incoming_damage<R: Rng + ?Sized>(
        &mut self,
        incoming: u32,
        now: u64,
        bonuses: &PassiveBonuses,
        rng: &mut R,
    ) -> DamageOutcome {
        let mut outcome = DamageOutcome {
            incoming,
            ..DamageOutcome::default()
        };
        if self.dead || incoming == 0 {
            return outcome;
        }

        if bonuses.dodge_chance > 0.0 && rng.random_bool(bonuses.dodge_chance.min(1.0)) {
            outcome.dodged = true;
            debug!("dodged {} damage", incoming);
            return outcome;
        }

        let actual = bonuses.calculate_final_damage_taken(incoming);
        outcome.after_reduction = actual;
        if actual == 0 {
            return outcome;
        }
        self.stun_until = now + self.config.hurt_stun_ms;

        let had_shield = self.current_shield > 0;
        let absorbed = actual.min(self.current_shield);
        self.current_shield -= absorbed;
        outcome.absorbed = absorbed;

        // 先结算破盾治疗，再扣除溢出伤害；治疗受生命上限约束
        if had_shield && self.current_shield == 0 {
            outcome.shield_broken = true;
            outcome.shield_heal = self.heal(self.max_shield);
            debug!("shield broke, healed {}", outcome.shield_heal);
        }

        let excess = actual - absorbed;
        if excess > 0 {
            let before = self.current_hp;
            self.current_hp = self.current_hp.saturating_sub(excess);
            outcome.hp_damage = before - self.current_hp;
            if self.ghost_catch_up_at.is_none() {
                self.damaged_hp = self.damaged_hp.max(before);
                self.ghost_catch_up_at = Some(now + self.config.damage_ghost_lag_ms);
            }
        }

        outcome.lethal = self.current_hp == 0;
        outcome
    }

    /// 生命归零后的死亡判定：若复活已解锁且未使用则回满，否则进入终局
    pub fn resolve_death(&mut self, bonuses: &PassiveBonuses) -> DeathOutcome {
        if bonuses.revive_unlocked && !self.revive_used {
            self.revive_used = true;
            self.heal(self.max_hp);
            info!("revived with {} hp", self.current_hp);
            return DeathOutcome::Revived {
                hp: self.current_hp,
            };
        }
        self.dead = true;
        info!("player died at level {}", self.current_level);
        DeathOutcome::Dead
    }
}
