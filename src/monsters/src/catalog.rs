// src/monsters/src/catalog.rs

use serde::{Deserialize, Serialize};

/// Boss 的目录 id
pub const BOSS_ID: &str = "boss";

/// 怪物定义（静态目录条目）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterDefinition {
    pub id: String,
    pub name: String,
    /// 0xRRGGBB
    pub color: u32,
    /// 单位/秒
    pub speed: f64,
    /// 目录伤害值，仅供展示；接触伤害按玩家等级计算
    pub damage: u32,
    /// 视口高度的比例
    pub size: f64,
    /// 0 级时的生命值
    pub hp: u32,
    pub exp: u32,
    /// Boss 不会被常规刷怪选中
    #[serde(default)]
    pub boss: bool,
}

impl MonsterDefinition {
    fn regular(
        id: &str,
        name: &str,
        color: u32,
        speed: f64,
        size: f64,
        hp: u32,
        exp: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            color,
            speed,
            damage: 1,
            size,
            hp,
            exp,
            boss: false,
        }
    }
}

/// 内置怪物目录
pub fn default_catalog() -> Vec<MonsterDefinition> {
    vec![
        MonsterDefinition::regular("slime", "Slime", 0x5CD65C, 0.8, 0.06, 30, 20),
        MonsterDefinition::regular("bat", "Bat", 0x8E5CD6, 1.6, 0.05, 20, 15),
        MonsterDefinition::regular("skeleton", "Skeleton", 0xDCDCC8, 1.0, 0.07, 45, 30),
        MonsterDefinition {
            damage: 2,
            ..MonsterDefinition::regular("golem", "Golem", 0x8C7B6B, 0.5, 0.10, 90, 60)
        },
        MonsterDefinition {
            damage: 3,
            boss: true,
            ..MonsterDefinition::regular(BOSS_ID, "Abyss Lord", 0xD62F2F, 0.6, 0.20, 1000, 500)
        },
    ]
}
