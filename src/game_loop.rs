//! 游戏循环，按固定顺序推进一帧模拟。
//!
//! 每帧的阶段：
//! - 推进逻辑时钟
//! - 结算到期的后续效果
//! - 释放冷却结束的技能
//! - 刷怪
//! - 怪物移动与接触伤害（承伤管线、护盾反伤、死亡判定）
//! - 被动恢复、受伤残影
//! - 收取经验并处理升级
//!
//! 暂停（技能选择面板或外部菜单）与游戏结束时整帧跳过，时钟不前进。

use combat::{CombatContext, CombatResolver, ContactOutcome, DeathResolution};
use error::GameError;
use log::{debug, info, warn};
use monsters::{MonsterManager, Position, Units, Viewport};
use progression::{LevelUp, ProgressionState, ratio};
use serde::Serialize;
use skills::{PlayerSkill, SkillId, SkillManager};

use crate::clock::GameClock;
use crate::config::GameConfig;
use crate::event_bus::{EventBus, GameEvent, HealSource};
use crate::rng::GameRng;

/// 每帧的外部输入
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInput {
    pub delta_ms: u64,
    /// 玩家世界坐标（由外部移动逻辑更新）
    pub player: Position,
    /// 当前相机视口，高度决定单位换算
    pub viewport: Viewport,
}

/// 一帧的摘要
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub now: u64,
    /// 是否实际推进（暂停或结束时为 false）
    pub advanced: bool,
    pub activations: u32,
    pub follow_ups: u32,
    pub spawned: Vec<u32>,
    pub contact_damage: u32,
    pub kills: u32,
    pub exp_gained: u32,
    pub level_up: Option<u32>,
    pub game_over: bool,
}

/// 技能栏中的一格
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillSlot {
    pub skill: SkillId,
    pub name: String,
    pub level: u8,
    pub max_level: u8,
    pub cooldown_remaining_ms: f64,
}

/// 表现层需要的所有数值
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub hp: u32,
    pub max_hp: u32,
    pub damaged_hp: u32,
    pub shield: u32,
    pub max_shield: u32,
    pub exp: u32,
    pub max_exp: u32,
    pub level: u32,
    pub hp_ratio: f64,
    pub damaged_hp_ratio: f64,
    pub shield_ratio: f64,
    pub exp_ratio: f64,
    pub active_slots: Vec<Option<SkillSlot>>,
    pub passive_slots: Vec<Option<SkillSlot>>,
    pub monster_count: usize,
    pub elapsed_ms: u64,
    pub can_move: bool,
    pub attacking: bool,
    pub paused: bool,
    pub game_over: bool,
}

/// 模拟编排器：持有全部子系统，按帧推进
#[derive(Debug)]
pub struct Simulation {
    config: GameConfig,
    clock: GameClock,
    rng: GameRng,
    skills: SkillManager,
    monsters: MonsterManager,
    progression: ProgressionState,
    combat: CombatResolver,
    events: EventBus,
    pending_choice: Option<Vec<SkillId>>,
    paused: bool,
    started: bool,
    game_over: bool,
    total_kills: u32,
    viewport: Viewport,
}

impl Simulation {
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let skills = SkillManager::new(config.skills.clone());
        let monsters = MonsterManager::new(
            config.monster.clone(),
            config.monsters.clone(),
            config.map,
        );
        let progression =
            ProgressionState::new(config.progression.clone(), &skills.passive_bonuses());
        let center = Position::new(config.map.width / 2.0, config.map.height / 2.0);
        let viewport =
            Viewport::centered_on(center, config.viewport_width, config.viewport_height);

        Ok(Self {
            rng: GameRng::new(config.seed),
            combat: CombatResolver::new(config.combat.clone()),
            config,
            clock: GameClock::new(),
            skills,
            monsters,
            progression,
            events: EventBus::new(),
            pending_choice: None,
            paused: false,
            started: false,
            game_over: false,
            total_kills: 0,
            viewport,
        })
    }

    /// 开局：提供第一次技能选择（3 个主动技能）并暂停
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        info!("simulation started with seed {}", self.rng.seed());
        self.offer_choices();
    }

    pub fn tick(&mut self, input: TickInput) -> TickReport {
        let mut report = TickReport {
            now: self.clock.now(),
            ..TickReport::default()
        };
        if self.game_over || self.is_paused() {
            return report;
        }

        let now = self.clock.advance(input.delta_ms);
        report.now = now;
        report.advanced = true;
        self.viewport = input.viewport;
        let units = Units::new(input.viewport.height);

        self.run_combat(&input, units, now, &mut report);

        if let Some(id) = self
            .monsters
            .update_spawning(now, &input.viewport, &units, &mut self.rng)
        {
            self.publish_spawn(id);
            report.spawned.push(id);
        }

        let contact = self
            .monsters
            .update(now, input.delta_ms, input.player, &units);
        report.contact_damage = contact.damage;
        let outcome = {
            let mut ctx = CombatContext {
                skills: &self.skills,
                monsters: &mut self.monsters,
                progression: &mut self.progression,
                rng: &mut self.rng,
                units,
                player: input.player,
                now,
            };
            self.combat.apply_contact(&contact, &mut ctx)
        };
        if let Some(outcome) = outcome {
            self.publish_contact(outcome);
        }

        if self.progression.is_dead() {
            self.harvest(&mut report, false);
            self.finish(&mut report);
            return report;
        }

        let bonuses = self.skills.passive_bonuses();
        if let Some(amount) = self.progression.regenerate(now, &bonuses) {
            if amount > 0 {
                self.events.publish(GameEvent::PlayerHealed {
                    amount,
                    source: HealSource::Regeneration,
                });
            }
        }
        self.progression.update_damage_ghost(now);

        self.harvest(&mut report, true);
        report
    }

    fn run_combat(&mut self, input: &TickInput, units: Units, now: u64, report: &mut TickReport) {
        let mut ctx = CombatContext {
            skills: &self.skills,
            monsters: &mut self.monsters,
            progression: &mut self.progression,
            rng: &mut self.rng,
            units,
            player: input.player,
            now,
        };

        for resolution in self.combat.process_follow_ups(&mut ctx) {
            report.follow_ups += 1;
            self.events.publish(GameEvent::FollowUpResolved(resolution));
        }

        for activation in self.combat.fire_ready_skills(&mut ctx) {
            report.activations += 1;
            if activation.healed > 0 {
                self.events.publish(GameEvent::PlayerHealed {
                    amount: activation.healed,
                    source: HealSource::ShieldExplosion,
                });
            }
            self.events.publish(GameEvent::SkillActivated(activation));
        }
    }

    fn publish_spawn(&mut self, id: u32) {
        if let Some(monster) = self.monsters.get(id) {
            self.events.publish(GameEvent::MonsterSpawned {
                id,
                kind: monster.definition.id.clone(),
                position: monster.position,
                hp: monster.hp,
                boss: monster.definition.boss,
            });
        }
    }

    fn publish_contact(&mut self, outcome: ContactOutcome) {
        let damage = outcome.damage;
        if damage.dodged {
            self.events.publish(GameEvent::PlayerDodged {
                incoming: damage.incoming,
            });
        } else if damage.after_reduction > 0 {
            self.events.publish(GameEvent::PlayerDamaged {
                incoming: damage.incoming,
                absorbed: damage.absorbed,
                hp_damage: damage.hp_damage,
                hp: self.progression.current_hp,
                shield: self.progression.current_shield,
            });
        }
        if damage.shield_broken {
            self.events.publish(GameEvent::ShieldBroken {
                max_shield: self.progression.max_shield,
            });
            if damage.shield_heal > 0 {
                self.events.publish(GameEvent::PlayerHealed {
                    amount: damage.shield_heal,
                    source: HealSource::ShieldBreak,
                });
            }
        }
        if let Some(reflect) = outcome.reflect {
            self.events.publish(GameEvent::ShieldReflected(reflect));
        }
        if let Some(DeathResolution::Revived { hp, kill_count, .. }) = outcome.death {
            self.events.publish(GameEvent::Revived { hp, kill_count });
        }
    }

    /// 收取本帧击杀；`grant_exp` 为 false 时（玩家已死亡）只发布击杀事件
    fn harvest(&mut self, report: &mut TickReport, grant_exp: bool) {
        let harvest = self.combat.take_harvest();
        report.kills = harvest.kills.len() as u32;
        self.total_kills += report.kills;
        for kill in harvest.kills {
            self.events.publish(GameEvent::MonsterKilled(kill));
        }

        if !grant_exp || harvest.exp == 0 {
            return;
        }
        let bonuses = self.skills.passive_bonuses();
        report.exp_gained = bonuses.calculate_final_exp(harvest.exp);
        if let Some(level_up) = self.progression.add_exp(harvest.exp as i64, &bonuses) {
            report.level_up = Some(level_up.new_level);
            self.on_level_up(level_up);
        }
    }

    fn on_level_up(&mut self, level_up: LevelUp) {
        self.monsters.set_player_level(level_up.new_level);
        if level_up.boss_due {
            let units = Units::new(self.viewport.height);
            let monster = self
                .monsters
                .spawn_boss(&self.viewport, &units, &mut self.rng);
            info!("boss requested at level {}", level_up.new_level);
            self.events.publish(GameEvent::BossSpawnRequested {
                level: level_up.new_level,
                monster,
            });
            if let Some(id) = monster {
                self.publish_spawn(id);
            }
        }
        self.offer_choices();
    }

    /// 生成技能候选；没有可升级技能时只发布属性成长
    fn offer_choices(&mut self) {
        let level = self.progression.current_level;
        let options = if self.skills.has_upgradeable_skills() {
            self.skills.random_skill_options(&mut self.rng)
        } else {
            Vec::new()
        };

        if options.is_empty() {
            self.events.publish(GameEvent::GrowthOnly {
                level,
                max_hp: self.progression.max_hp,
            });
            return;
        }

        debug!("offering {:?} at level {}", options, level);
        self.events.publish(GameEvent::SkillChoicesOffered {
            level,
            options: options.clone(),
            first_pick: self.skills.is_first_pick(),
        });
        self.pending_choice = Some(options);
    }

    /// 处理玩家的技能选择；没有待选或 id 不在候选中时返回 false
    pub fn choose_skill(&mut self, id: SkillId) -> bool {
        let Some(options) = &self.pending_choice else {
            warn!("chose {} with no pending choice", id);
            return false;
        };
        if !options.contains(&id) {
            warn!("chose {} which was not offered", id);
            return false;
        }
        if !self.skills.learn_or_upgrade_skill(id) {
            return false;
        }

        self.pending_choice = None;
        self.progression
            .refresh_max_hp(&self.skills.passive_bonuses());
        let new_level = self.skills.skill_level(id).unwrap_or(0);
        self.events.publish(GameEvent::LevelUp {
            skill: id,
            new_level,
        });
        true
    }

    /// 外部暂停菜单
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        self.paused = paused;
        self.events.publish(if paused {
            GameEvent::GamePaused
        } else {
            GameEvent::GameResumed
        });
    }

    fn finish(&mut self, report: &mut TickReport) {
        report.game_over = true;
        if self.game_over {
            return;
        }
        self.game_over = true;
        self.monsters.set_spawning(false);
        info!(
            "game over at level {} after {} ms with {} kills",
            self.progression.current_level,
            self.clock.now(),
            self.total_kills
        );
        self.events.publish(GameEvent::GameOver {
            level: self.progression.current_level,
            elapsed_ms: self.clock.now(),
            kills: self.total_kills,
        });
    }

    /// 在指定位置生成怪物（调试与脚本用）
    pub fn spawn_monster(&mut self, kind: &str, position: Position) -> Result<u32, GameError> {
        if self.game_over {
            return Err(GameError::InvalidGameState("game is over".into()));
        }
        let id = self.monsters.spawn_monster(kind, position)?;
        self.publish_spawn(id);
        Ok(id)
    }

    /// 调试用经验调整；负数不经过经验加成
    pub fn debug_add_exp(&mut self, amount: i64) -> Option<u32> {
        if self.game_over {
            return None;
        }
        let bonuses = self.skills.passive_bonuses();
        let level_up = self.progression.add_exp(amount, &bonuses)?;
        let level = level_up.new_level;
        self.on_level_up(level_up);
        Some(level)
    }

    pub fn set_spawning(&mut self, enabled: bool) {
        self.monsters.set_spawning(enabled);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain().collect()
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn hud(&self) -> HudSnapshot {
        let now = self.clock.now();
        let p = &self.progression;
        HudSnapshot {
            hp: p.current_hp,
            max_hp: p.max_hp,
            damaged_hp: p.damaged_hp,
            shield: p.current_shield,
            max_shield: p.max_shield,
            exp: p.current_exp,
            max_exp: p.max_exp,
            level: p.current_level,
            hp_ratio: p.hp_ratio(),
            damaged_hp_ratio: p.damaged_hp_ratio(),
            shield_ratio: p.shield_ratio(),
            exp_ratio: ratio(p.current_exp, p.max_exp),
            active_slots: self
                .skills
                .player_active_skills()
                .into_iter()
                .map(|s| s.map(|s| self.slot(s, now)))
                .collect(),
            passive_slots: self
                .skills
                .player_passive_skills()
                .into_iter()
                .map(|s| s.map(|s| self.slot(s, now)))
                .collect(),
            monster_count: self.monsters.len(),
            elapsed_ms: now,
            can_move: self.can_move(),
            attacking: self.combat.is_attacking(now),
            paused: self.is_paused(),
            game_over: self.game_over,
        }
    }

    fn slot(&self, skill: &PlayerSkill, now: u64) -> SkillSlot {
        SkillSlot {
            skill: skill.id(),
            name: skill.definition.name.clone(),
            level: skill.level,
            max_level: skill.definition.max_level,
            cooldown_remaining_ms: self.combat.cooldown_remaining(&self.skills, skill.id(), now),
        }
    }

    /// 当前移动速度（单位/秒），含被动加成
    pub fn player_speed(&self) -> f64 {
        self.skills.final_move_speed(self.config.player_base_speed)
    }

    /// 硬直或死亡时不能移动
    pub fn can_move(&self) -> bool {
        self.progression.can_move(self.clock.now())
    }

    pub fn is_paused(&self) -> bool {
        self.paused || self.pending_choice.is_some()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn pending_choice(&self) -> Option<&[SkillId]> {
        self.pending_choice.as_deref()
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn total_kills(&self) -> u32 {
        self.total_kills
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn skills(&self) -> &SkillManager {
        &self.skills
    }

    pub fn monsters(&self) -> &MonsterManager {
        &self.monsters
    }

    pub fn progression(&self) -> &ProgressionState {
        &self.progression
    }

    pub fn combat(&self) -> &CombatResolver {
        &self.combat
    }
}
