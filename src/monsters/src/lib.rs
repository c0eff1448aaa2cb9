//! 怪物系统
//!
//! 管理怪物种群：刷怪、朝玩家移动、接触伤害、受伤与死亡结算。
//! 同时提供全核心共用的单位换算和命中几何。

pub mod catalog;
pub mod geometry;
pub mod manager;
pub mod monster;

pub use catalog::{BOSS_ID, MonsterDefinition, default_catalog};
pub use geometry::{MapBounds, Position, Units, Viewport};
pub use manager::{ContactReport, DamageReport, Kill, MonsterConfig, MonsterManager, SpawnSide};
pub use monster::Monster;
