//! 战斗结算
//!
//! 每帧决定哪些主动技能释放，用几何测试计算命中集合，结算伤害与暴击，
//! 调度延迟的后续效果，并驱动护盾、生命与经验之间的经济循环。

pub mod cooldown;
pub mod follow_up;
pub mod resolver;
pub mod shapes;
pub mod tables;


pub use cooldown::{CooldownLedger, base_cooldown_for_level, effective_cooldown};
pub use follow_up::{FollowUp, FollowUpKind, FollowUpQueue, FollowUpTag};
pub use resolver::{
    CombatContext, CombatResolver, ContactOutcome, DeathResolution, FollowUpResolution, Harvest,
    ReflectReport, SkillActivation,
};
pub use shapes::{Caster, HitResult, HitShape, SkillBehavior, behavior_for};
pub use tables::CombatTables;
