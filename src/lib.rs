//! 幸存者类动作游戏的模拟核心
//!
//! 技能、怪物、战斗与成长分别位于独立的子 crate，
//! 这里把它们编排成按帧推进的 `Simulation`，并提供配置、随机数与事件总线。

pub mod clock;
pub mod config;
pub mod event_bus;
pub mod game_loop;
pub mod rng;

pub use clock::GameClock;
pub use config::GameConfig;
pub use event_bus::{EventBus, EventCategory, EventHandler, GameEvent, HealSource};
pub use game_loop::{HudSnapshot, Simulation, SkillSlot, TickInput, TickReport};
pub use rng::GameRng;

pub use combat;
pub use error;
pub use monsters;
pub use progression;
pub use skills;
