//! 事件总线系统，把模拟核心的输出交给表现层
//!
//! 该系统提供了简单的发布-订阅机制：
//! - 模拟每帧把事件发布到总线
//! - 表现层可以注册监听器，或在帧末一次性取走事件
//! - 保留最近的事件历史用于调试

use std::collections::{HashMap, VecDeque};

use combat::{FollowUpResolution, ReflectReport, SkillActivation};
use error::GameError;
use monsters::{Kill, Position};
use serde::Serialize;
use skills::SkillId;

/// 事件类别 - 用于事件分组和过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventCategory {
    /// 技能与伤害结算
    Combat,
    /// 怪物生成与死亡
    Monster,
    /// 玩家生命与护盾
    Player,
    /// 等级与技能选择
    Progression,
    /// 会话状态
    System,
}

/// 治疗来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealSource {
    Regeneration,
    ShieldBreak,
    ShieldExplosion,
}

/// 游戏事件定义
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum GameEvent {
    // ===== 战斗事件 =====
    /// 技能释放
    SkillActivated(SkillActivation),
    /// 延迟的后续效果结算
    FollowUpResolved(FollowUpResolution),
    /// 护盾吸收攻击后反伤
    ShieldReflected(ReflectReport),

    // ===== 怪物事件 =====
    MonsterSpawned {
        id: u32,
        kind: String,
        position: Position,
        hp: u32,
        boss: bool,
    },
    MonsterKilled(Kill),
    /// 每 10 级请求生成 boss
    BossSpawnRequested { level: u32, monster: Option<u32> },

    // ===== 玩家事件 =====
    PlayerDamaged {
        incoming: u32,
        absorbed: u32,
        hp_damage: u32,
        hp: u32,
        shield: u32,
    },
    PlayerDodged { incoming: u32 },
    /// 护盾从有到无
    ShieldBroken { max_shield: u32 },
    PlayerHealed { amount: u32, source: HealSource },
    Revived { hp: u32, kill_count: u32 },

    // ===== 成长事件 =====
    SkillChoicesOffered {
        level: u32,
        options: Vec<SkillId>,
        first_pick: bool,
    },
    /// 技能学习或升级完成
    LevelUp { skill: SkillId, new_level: u8 },
    /// 升级但没有可选技能，只有属性成长
    GrowthOnly { level: u32, max_hp: u32 },

    // ===== 系统事件 =====
    GamePaused,
    GameResumed,
    GameOver {
        level: u32,
        elapsed_ms: u64,
        kills: u32,
    },
}

impl GameEvent {
    /// 获取事件类型的字符串表示
    pub fn event_type(&self) -> &'static str {
        match self {
            GameEvent::SkillActivated(_) => "SkillActivated",
            GameEvent::FollowUpResolved(_) => "FollowUpResolved",
            GameEvent::ShieldReflected(_) => "ShieldReflected",
            GameEvent::MonsterSpawned { .. } => "MonsterSpawned",
            GameEvent::MonsterKilled(_) => "MonsterKilled",
            GameEvent::BossSpawnRequested { .. } => "BossSpawnRequested",
            GameEvent::PlayerDamaged { .. } => "PlayerDamaged",
            GameEvent::PlayerDodged { .. } => "PlayerDodged",
            GameEvent::ShieldBroken { .. } => "ShieldBroken",
            GameEvent::PlayerHealed { .. } => "PlayerHealed",
            GameEvent::Revived { .. } => "Revived",
            GameEvent::SkillChoicesOffered { .. } => "SkillChoicesOffered",
            GameEvent::LevelUp { .. } => "LevelUp",
            GameEvent::GrowthOnly { .. } => "GrowthOnly",
            GameEvent::GamePaused => "GamePaused",
            GameEvent::GameResumed => "GameResumed",
            GameEvent::GameOver { .. } => "GameOver",
        }
    }

    /// 获取事件的类别
    pub fn category(&self) -> EventCategory {
        match self {
            GameEvent::SkillActivated(_)
            | GameEvent::FollowUpResolved(_)
            | GameEvent::ShieldReflected(_) => EventCategory::Combat,
            GameEvent::MonsterSpawned { .. }
            | GameEvent::MonsterKilled(_)
            | GameEvent::BossSpawnRequested { .. } => EventCategory::Monster,
            GameEvent::PlayerDamaged { .. }
            | GameEvent::PlayerDodged { .. }
            | GameEvent::ShieldBroken { .. }
            | GameEvent::PlayerHealed { .. }
            | GameEvent::Revived { .. } => EventCategory::Player,
            GameEvent::SkillChoicesOffered { .. }
            | GameEvent::LevelUp { .. }
            | GameEvent::GrowthOnly { .. } => EventCategory::Progression,
            GameEvent::GamePaused | GameEvent::GameResumed | GameEvent::GameOver { .. } => {
                EventCategory::System
            }
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self, GameEvent::GameOver { .. })
    }

    /// 单行 JSON，便于表现层或控制台镜像事件流
    pub fn to_json_line(&self) -> Result<String, GameError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// 事件处理器 trait
pub trait EventHandler {
    /// 处理事件
    fn handle(&mut self, event: &GameEvent);

    /// 事件处理器的名称（用于调试）
    fn name(&self) -> &str;

    /// 是否应该处理此事件（事件过滤）
    fn should_handle(&self, _event: &GameEvent) -> bool {
        true
    }
}

/// 事件总线 - 队列模式 + 订阅者模式
pub struct EventBus {
    /// 当前帧的事件队列
    events: Vec<GameEvent>,
    /// 注册的事件处理器（按事件类型分组）
    handlers: HashMap<&'static str, Vec<Box<dyn EventHandler>>>,
    /// 全局事件处理器（处理所有事件）
    global_handlers: Vec<Box<dyn EventHandler>>,
    /// 事件历史（用于调试和回放）
    history: VecDeque<GameEvent>,
    /// 历史记录的最大长度
    max_history: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_history_size(100)
    }

    /// 创建一个指定历史记录大小的事件总线
    pub fn with_history_size(max_history: usize) -> Self {
        Self {
            events: Vec::new(),
            handlers: HashMap::new(),
            global_handlers: Vec::new(),
            history: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    /// 发布事件（添加到当前帧队列）
    pub fn publish(&mut self, event: GameEvent) {
        self.add_to_history(event.clone());
        self.dispatch_to_handlers(&event);
        self.events.push(event);
    }

    /// 获取所有待处理事件并清空队列
    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain(..)
    }

    /// 检查是否有待处理事件
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// 清空所有事件
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// 注册事件处理器（处理特定类型的事件）
    pub fn subscribe(&mut self, event_type: &'static str, handler: Box<dyn EventHandler>) {
        self.handlers.entry(event_type).or_default().push(handler);
    }

    /// 注册全局事件处理器（处理所有事件）
    pub fn subscribe_all(&mut self, handler: Box<dyn EventHandler>) {
        self.global_handlers.push(handler);
    }

    pub fn subscriber_count(&self) -> usize {
        self.global_handlers.len() + self.handlers.values().map(Vec::len).sum::<usize>()
    }

    fn dispatch_to_handlers(&mut self, event: &GameEvent) {
        for handler in &mut self.global_handlers {
            if handler.should_handle(event) {
                handler.handle(event);
            }
        }
        if let Some(handlers) = self.handlers.get_mut(event.event_type()) {
            for handler in handlers {
                if handler.should_handle(event) {
                    handler.handle(event);
                }
            }
        }
    }

    fn add_to_history(&mut self, event: GameEvent) {
        if self.max_history == 0 {
            return;
        }
        if self.history.len() >= self.max_history {
            self.history.pop_front();
        }
        self.history.push_back(event);
    }

    /// 获取事件历史（最近的 n 个事件）
    pub fn get_history(&self, count: usize) -> Vec<&GameEvent> {
        let start = self.history.len().saturating_sub(count);
        self.history.range(start..).collect()
    }

    pub fn full_history(&self) -> &VecDeque<GameEvent> {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("pending", &self.events.len())
            .field("subscribers", &self.subscriber_count())
            .field("history", &self.history.len())
            .finish()
    }
}
