// src/monsters/src/monster.rs

use std::sync::Arc;

use serde::Serialize;

use crate::catalog::MonsterDefinition;
use crate::geometry::{Position, Units};

/// 场上的怪物实例
#[derive(Debug, Clone, Serialize)]
pub struct Monster {
    /// 单调递增且唯一
    pub id: u32,
    pub definition: Arc<MonsterDefinition>,
    pub position: Position,
    pub hp: u32,
    /// 出生时按玩家等级缩放后的生命值
    pub max_hp: u32,
    /// 上一次造成接触伤害的时间（毫秒）
    pub last_damage_time: Option<u64>,
}

impl Monster {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn radius(&self, units: &Units) -> f64 {
        units.radius(self.definition.size)
    }

    /// 受到伤害，返回是否死亡
    pub fn take_damage(&mut self, amount: u32) -> bool {
        self.hp = self.hp.saturating_sub(amount);
        !self.is_alive()
    }

    /// 生命比例，max_hp 为 0 时视为 0
    pub fn hp_ratio(&self) -> f64 {
        if self.max_hp == 0 {
            0.0
        } else {
            self.hp as f64 / self.max_hp as f64
        }
    }

    /// 接触伤害冷却是否结束
    pub fn can_contact(&self, now: u64, cooldown_ms: u64) -> bool {
        self.last_damage_time
            .is_none_or(|last| now.saturating_sub(last) >= cooldown_ms)
    }
}
