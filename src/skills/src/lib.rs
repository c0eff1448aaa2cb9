//! 技能系统
//!
//! 负责技能目录、玩家技能的学习与升级、槽位上限、升级候选池，
//! 以及所有由被动技能派生的属性加成。

pub mod catalog;
pub mod manager;
pub mod passive;

#[cfg(test)]
mod tests;

pub use catalog::{
    ACTIVE_SLOTS, MAX_SKILL_LEVEL, PASSIVE_SLOTS, SkillDefinition, SkillId, SkillType,
    default_catalog,
};
pub use manager::{PlayerSkill, SkillManager};
pub use passive::{PassiveBonuses, PassiveEffect};
