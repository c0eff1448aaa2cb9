// src/skills/src/catalog.rs

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// 技能最高等级（等级范围 0..=5）
pub const MAX_SKILL_LEVEL: u8 = 5;

/// 主动技能槽位数
pub const ACTIVE_SLOTS: usize = 4;

/// 被动技能槽位数
pub const PASSIVE_SLOTS: usize = 3;

/// 技能标识，同时作为技能效果分发的键
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkillId {
    // 主动技能
    /// 扇形斩击，瞄准最近的怪物
    Crescent,
    /// 以玩家为中心的圆形新星
    Nova,
    /// 多道随机锁定的光束
    Lightning,
    /// 护盾，吸收伤害并反伤
    Aegis,

    // 被动技能
    /// 最大生命
    Vitality,
    /// 移动速度
    Swiftness,
    /// 冷却缩减
    Haste,
    /// 经验加成
    Wisdom,
    /// 伤害加成
    Might,
    /// 承伤减免
    Fortitude,
    /// 生命恢复
    Regeneration,
}

impl SkillId {
    /// 该技能天然所属的类型（目录校验用）
    pub fn natural_type(self) -> SkillType {
        match self {
            SkillId::Crescent | SkillId::Nova | SkillId::Lightning | SkillId::Aegis => {
                SkillType::Active
            }
            _ => SkillType::Passive,
        }
    }
}

/// 技能类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkillType {
    Active,
    Passive,
}

/// 技能定义（静态目录条目，启动时加载一次）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: SkillId,
    pub name: String,
    #[serde(rename = "type")]
    pub skill_type: SkillType,
    /// 0xRRGGBB
    pub color: u32,
    #[serde(default)]
    pub flash_color: Option<u32>,
    /// 基础冷却（毫秒），被动技能为 None
    #[serde(default)]
    pub cooldown_ms: Option<u64>,
    #[serde(default = "default_max_level")]
    pub max_level: u8,
}

fn default_max_level() -> u8 {
    MAX_SKILL_LEVEL
}

impl SkillDefinition {
    fn active(id: SkillId, name: &str, color: u32, flash: u32, cooldown_ms: u64) -> Self {
        Self {
            id,
            name: name.to_string(),
            skill_type: SkillType::Active,
            color,
            flash_color: Some(flash),
            cooldown_ms: Some(cooldown_ms),
            max_level: MAX_SKILL_LEVEL,
        }
    }

    fn passive(id: SkillId, name: &str, color: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            skill_type: SkillType::Passive,
            color,
            flash_color: None,
            cooldown_ms: None,
            max_level: MAX_SKILL_LEVEL,
        }
    }

    pub fn is_active(&self) -> bool {
        self.skill_type == SkillType::Active
    }

    pub fn is_passive(&self) -> bool {
        self.skill_type == SkillType::Passive
    }
}

/// 内置技能目录
pub fn default_catalog() -> Vec<SkillDefinition> {
    vec![
        SkillDefinition::active(SkillId::Crescent, "Crescent Slash", 0xE8E8E8, 0xFFFFFF, 1000),
        SkillDefinition::active(SkillId::Nova, "Frost Nova", 0x6FC3FF, 0xCFEFFF, 2000),
        SkillDefinition::active(SkillId::Lightning, "Chain Lightning", 0xFFE066, 0xFFF7C2, 1500),
        SkillDefinition::active(SkillId::Aegis, "Aegis", 0x7CFFB2, 0xD9FFE9, 8000),
        SkillDefinition::passive(SkillId::Vitality, "Vitality", 0xFF5A5A),
        SkillDefinition::passive(SkillId::Swiftness, "Swiftness", 0x9CFF6B),
        SkillDefinition::passive(SkillId::Haste, "Haste", 0x62E0E0),
        SkillDefinition::passive(SkillId::Wisdom, "Wisdom", 0xB58CFF),
        SkillDefinition::passive(SkillId::Might, "Might", 0xFF9F43),
        SkillDefinition::passive(SkillId::Fortitude, "Fortitude", 0xA0A0B0),
        SkillDefinition::passive(SkillId::Regeneration, "Regeneration", 0xFF7EB6),
    ]
}
