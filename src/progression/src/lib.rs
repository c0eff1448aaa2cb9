//! 玩家进度
//!
//! 生命、护盾、经验与等级计数器，承伤管线，被动恢复和经验曲线。

pub mod damage;
pub mod state;


pub use damage::{DamageOutcome, DeathOutcome};
pub use state::{LevelUp, ProgressionConfig, ProgressionState, ratio};
