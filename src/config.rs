//! 游戏配置
//!
//! 所有可调参数汇总在 `GameConfig` 中。内置默认值即常量表，
//! 也可以从 JSON 加载，缺省字段沿用默认值。

use std::fs;
use std::path::Path;

use combat::CombatTables;
use error::GameError;
use monsters::{MapBounds, MonsterConfig, MonsterDefinition, Units};
use progression::ProgressionConfig;
use serde::{Deserialize, Serialize};
use skills::{MAX_SKILL_LEVEL, SkillDefinition};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub viewport_width: f64,
    /// 视口高度决定单位换算（1 单位 = 高度的 10%）
    pub viewport_height: f64,
    pub map: MapBounds,
    pub seed: u64,
    /// 玩家基础移动速度（单位/秒），供外部移动逻辑使用
    pub player_base_speed: f64,
    pub skills: Vec<SkillDefinition>,
    pub monsters: Vec<MonsterDefinition>,
    pub monster: MonsterConfig,
    pub progression: ProgressionConfig,
    pub combat: CombatTables,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1600.0,
            viewport_height: 900.0,
            map: MapBounds {
                width: 4800.0,
                height: 4800.0,
            },
            seed: 0,
            player_base_speed: 3.0,
            skills: skills::default_catalog(),
            monsters: monsters::default_catalog(),
            monster: MonsterConfig::default(),
            progression: ProgressionConfig::default(),
            combat: CombatTables::default(),
        }
    }
}

impl GameConfig {
    pub fn from_json_str(json: &str) -> Result<Self, GameError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, GameError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if !(self.viewport_height > 0.0) {
            return Err(GameError::InvalidConfig(
                "viewport_height must be positive".into(),
            ));
        }
        if !(self.map.width > 0.0 && self.map.height > 0.0) {
            return Err(GameError::InvalidConfig("map size must be positive".into()));
        }
        if self.monster.spawn_interval_ms == 0 {
            return Err(GameError::InvalidConfig(
                "spawn_interval_ms must be non-zero".into(),
            ));
        }
        if self.skills.is_empty() {
            return Err(GameError::InvalidConfig("skill catalog is empty".into()));
        }
        if self.monsters.iter().all(|m| m.boss) {
            return Err(GameError::InvalidConfig(
                "monster catalog has no regular monsters".into(),
            ));
        }
        if let Some(skill) = self
            .skills
            .iter()
            .find(|s| s.max_level == 0 || s.max_level > MAX_SKILL_LEVEL)
        {
            return Err(GameError::InvalidConfig(format!(
                "skill {} has max level {} outside 1..={}",
                skill.id, skill.max_level, MAX_SKILL_LEVEL
            )));
        }
        self.validate_combat()
    }

    /// 暴击与后续效果的概率必须落在 [0, 1]
    fn validate_combat(&self) -> Result<(), GameError> {
        let combat = &self.combat;
        let probabilities = [
            ("crit_base_chance", combat.crit_base_chance),
            ("crit_max_chance", combat.crit_max_chance),
        ]
        .into_iter()
        .chain(
            combat
                .follow_up_chances
                .iter()
                .map(|&chance| ("follow_up_chances", chance)),
        );
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(GameError::InvalidConfig(format!(
                    "{} value {} outside [0, 1]",
                    name, value
                )));
            }
        }
        if !combat.crit_chance_per_level.is_finite() || combat.crit_chance_per_level < 0.0 {
            return Err(GameError::InvalidConfig(
                "crit_chance_per_level must be a non-negative number".into(),
            ));
        }
        if !(combat.crit_multiplier >= 1.0 && combat.crit_multiplier.is_finite()) {
            return Err(GameError::InvalidConfig(
                "crit_multiplier must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn units(&self) -> Units {
        Units::new(self.viewport_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            GameConfig::from_json_str(r#"{ "seed": 7, "monster": { "spawn_interval_ms": 500 } }"#)
                .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.monster.spawn_interval_ms, 500);
        assert_eq!(config.monster.contact_cooldown_ms, 3000);
        assert_eq!(config.skills, skills::default_catalog());
    }

    #[test]
    fn test_rejects_invalid_values() {
        for json in [
            r#"{ "viewport_height": 0 }"#,
            r#"{ "monster": { "spawn_interval_ms": 0 } }"#,
            r#"{ "skills": [] }"#,
            r#"{ "monsters": [] }"#,
            r#"{ "combat": { "crit_base_chance": 1.5, "crit_max_chance": 2.0 } }"#,
            r#"{ "combat": { "crit_max_chance": -0.1 } }"#,
            r#"{ "combat": { "crit_chance_per_level": -0.01 } }"#,
            r#"{ "combat": { "crit_multiplier": 0.5 } }"#,
            r#"{ "combat": { "follow_up_chances": [0.1, 1.2] } }"#,
        ] {
            assert!(
                matches!(
                    GameConfig::from_json_str(json),
                    Err(GameError::InvalidConfig(_))
                ),
                "{json} should be rejected"
            );
        }

        let mut config = GameConfig::default();
        config.skills[0].max_level = 6;
        assert!(matches!(
            config.validate(),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            GameConfig::from_json_str("{ not json"),
            Err(GameError::JsonError(_))
        ));
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = GameConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(GameConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            GameConfig::load("/definitely/not/here.json"),
            Err(GameError::IoError(_))
        ));
    }
}
