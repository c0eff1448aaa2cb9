//! 技能冷却账本
//!
//! 记录每个技能最后一次释放的时间。首次释放时创建条目，之后每次释放覆盖，
//! 会话期间从不删除。没有条目的技能视为就绪。

use std::collections::HashMap;

use skills::{SkillDefinition, SkillId};

/// Aegis 每级缩短的基础冷却（毫秒）
pub const AEGIS_COOLDOWN_STEP_MS: u64 = 500;

#[derive(Debug, Clone, Default)]
pub struct CooldownLedger {
    last_activation: HashMap<SkillId, u64>,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_activation(&self, id: SkillId) -> Option<u64> {
        self.last_activation.get(&id).copied()
    }

    /// now − last ≥ 有效冷却 时就绪
    pub fn is_ready(&self, id: SkillId, now: u64, effective_cooldown_ms: f64) -> bool {
        match self.last_activation(id) {
            Some(last) => now.saturating_sub(last) as f64 >= effective_cooldown_ms,
            None => true,
        }
    }

    pub fn stamp(&mut self, id: SkillId, now: u64) {
        self.last_activation.insert(id, now);
    }

    /// 剩余冷却（毫秒），供技能栏显示
    pub fn remaining(&self, id: SkillId, now: u64, effective_cooldown_ms: f64) -> f64 {
        match self.last_activation(id) {
            Some(last) => (effective_cooldown_ms - now.saturating_sub(last) as f64).max(0.0),
            None => 0.0,
        }
    }
}

/// 当前等级的基础冷却；Aegis 每级减少 500 毫秒
pub fn base_cooldown_for_level(definition: &SkillDefinition, level: u8) -> u64 {
    let base = definition.cooldown_ms.unwrap_or(0);
    match definition.id {
        SkillId::Aegis => base.saturating_sub(AEGIS_COOLDOWN_STEP_MS * level as u64),
        _ => base,
    }
}

/// 有效冷却 = 基础冷却 × (1 − 冷却缩减)
pub fn effective_cooldown(definition: &SkillDefinition, level: u8, cooldown_reduction: f64) -> f64 {
    base_cooldown_for_level(definition, level) as f64 * (1.0 - cooldown_reduction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skills::default_catalog;

    fn def(id: SkillId) -> SkillDefinition {
        default_catalog().into_iter().find(|d| d.id == id).unwrap()
    }

    #[test]
    fn test_aegis_cooldown_shrinks_per_level() {
        let aegis = def(SkillId::Aegis);
        assert_eq!(base_cooldown_for_level(&aegis, 0), 8000);
        assert_eq!(base_cooldown_for_level(&aegis, 3), 6500);
        assert_eq!(base_cooldown_for_level(&def(SkillId::Nova), 3), 2000);
    }

    #[test]
    fn test_effective_cooldown_applies_reduction() {
        let nova = def(SkillId::Nova);
        assert_eq!(effective_cooldown(&nova, 0, 0.0), 2000.0);
        assert_eq!(effective_cooldown(&nova, 0, 0.5), 1000.0);
    }

    #[test]
    fn test_ledger() {
        let mut ledger = CooldownLedger::new();
        assert!(ledger.is_ready(SkillId::Nova, 0, 2000.0));
        ledger.stamp(SkillId::Nova, 100);
        assert!(!ledger.is_ready(SkillId::Nova, 2099, 2000.0));
        assert!(ledger.is_ready(SkillId::Nova, 2100, 2000.0));
        assert_eq!(ledger.remaining(SkillId::Nova, 1100, 2000.0), 1000.0);
        assert_eq!(ledger.remaining(SkillId::Lightning, 1100, 2000.0), 0.0);
    }
}
