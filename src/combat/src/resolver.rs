// src/combat/src/resolver.rs

use std::collections::HashSet;
use std::f64::consts::TAU;

use log::{debug, info};
use monsters::{ContactReport, DamageReport, Kill, Monster, MonsterManager, Position, Units};
use progression::{DamageOutcome, DeathOutcome, ProgressionState};
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore};
use serde::Serialize;
use skills::{SkillId, SkillManager};

use crate::cooldown::{CooldownLedger, effective_cooldown};
use crate::follow_up::{
    BURST_DELAY_MS, CHAIN_DELAY_MS, CHAIN_MIN_SEPARATION_UNITS, FollowUp, FollowUpKind,
    FollowUpQueue, FollowUpTag, WAVE_STAGE_INTERVAL_MS, WAVE_STAGES,
};
use crate::shapes::constants::{BEAM_HALF_WIDTH_UNITS, BEAM_RANGE_UNITS};
use crate::shapes::{
    Caster, HitResult, HitShape, beam_targets, behavior_for, circle_targets, sector_targets,
};
use crate::tables::{CombatTables, constants::ATTACK_ANIMATION_MS};

/// 护盾爆炸半径（单位）
pub const EXPLOSION_RANGE_UNITS: f64 = 3.0;
/// 复活时即死新星的半径（单位）
pub const REVIVE_NOVA_RANGE_UNITS: f64 = 6.0;

/// 单次结算需要借用的全部状态
pub struct CombatContext<'a> {
    pub skills: &'a SkillManager,
    pub monsters: &'a mut MonsterManager,
    pub progression: &'a mut ProgressionState,
    pub rng: &'a mut dyn RngCore,
    pub units: Units,
    pub player: Position,
    pub now: u64,
}

/// 一次技能释放的事件载荷
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillActivation {
    pub skill: SkillId,
    pub level: u8,
    pub shape: HitShape,
    pub hit_positions: Vec<Position>,
    pub crit: bool,
    pub damage: u32,
    pub kill_count: u32,
    pub exp: u32,
    /// 护盾爆炸的治疗量
    pub healed: u32,
    /// 本次释放触发的后续效果
    pub follow_up: Option<FollowUpTag>,
}

impl SkillActivation {
    fn new(skill: SkillId, level: u8, shape: HitShape) -> Self {
        Self {
            skill,
            level,
            shape,
            hit_positions: Vec::new(),
            crit: false,
            damage: 0,
            kill_count: 0,
            exp: 0,
            healed: 0,
            follow_up: None,
        }
    }
}

/// 一次后续效果的结算结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowUpResolution {
    pub skill: SkillId,
    pub kind: FollowUpTag,
    pub hit_positions: Vec<Position>,
    pub damage: u32,
    pub crit: bool,
    pub kill_count: u32,
    pub exp: u32,
}

/// 护盾吸收攻击后对攻击者的反伤
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReflectReport {
    pub damage: u32,
    pub attackers: Vec<u32>,
    pub hit_positions: Vec<Position>,
    pub kill_count: u32,
    pub exp: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeathResolution {
    /// 复活：回满生命并以即死新星清场
    Revived { hp: u32, kill_count: u32, exp: u32 },
    GameOver,
}

/// 一帧接触伤害的完整结算
#[derive(Debug, Clone, PartialEq)]
pub struct ContactOutcome {
    pub damage: DamageOutcome,
    pub reflect: Option<ReflectReport>,
    pub death: Option<DeathResolution>,
}

/// 本帧待收取的经验与击杀
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Harvest {
    pub exp: u32,
    pub kills: Vec<Kill>,
}

/// 战斗结算器：冷却、命中、暴击、后续效果与护盾经济
#[derive(Debug, Default)]
pub struct CombatResolver {
    tables: CombatTables,
    ledger: CooldownLedger,
    queue: FollowUpQueue,
    attacking_until: u64,
    harvest: Harvest,
}

impl CombatResolver {
    pub fn new(tables: CombatTables) -> Self {
        Self {
            tables,
            ..Self::default()
        }
    }

    pub fn tables(&self) -> &CombatTables {
        &self.tables
    }

    pub fn ledger(&self) -> &CooldownLedger {
        &self.ledger
    }

    pub fn pending_follow_ups(&self) -> usize {
        self.queue.len()
    }

    /// 攻击动画标记，不阻塞其他技能结算
    pub fn is_attacking(&self, now: u64) -> bool {
        now < self.attacking_until
    }

    /// 技能剩余冷却（毫秒），未拥有的技能为 0
    pub fn cooldown_remaining(&self, skills: &SkillManager, id: SkillId, now: u64) -> f64 {
        let Some(skill) = skills.player_skill(id) else {
            return 0.0;
        };
        let cooldown =
            effective_cooldown(&skill.definition, skill.level, skills.cooldown_reduction());
        self.ledger.remaining(id, now, cooldown)
    }

    /// 取走本帧累计的经验与击杀
    pub fn take_harvest(&mut self) -> Harvest {
        std::mem::take(&mut self.harvest)
    }

    fn record(&mut self, report: &DamageReport) {
        self.harvest.exp += report.total_exp;
        self.harvest.kills.extend(report.kills.iter().cloned());
    }

    /// 释放所有冷却结束的主动技能（按获得顺序，互不阻塞）
    pub fn fire_ready_skills(&mut self, ctx: &mut CombatContext<'_>) -> Vec<SkillActivation> {
        let skills = ctx.skills;
        let cooldown_reduction = skills.cooldown_reduction();
        let mut activations = Vec::new();

        for id in skills.active_skill_ids() {
            let Some(skill) = skills.player_skill(id) else {
                continue;
            };
            let cooldown = effective_cooldown(&skill.definition, skill.level, cooldown_reduction);
            if !self.ledger.is_ready(id, ctx.now, cooldown) {
                continue;
            }
            if let Some(activation) = self.resolve_skill(id, skill.level, ctx) {
                self.ledger.stamp(id, ctx.now);
                activations.push(activation);
            }
        }
        activations
    }

    /// 不检查冷却直接结算一次释放；形状函数放弃释放时返回 None
    pub fn resolve_skill(
        &mut self,
        id: SkillId,
        level: u8,
        ctx: &mut CombatContext<'_>,
    ) -> Option<SkillActivation> {
        let behavior = behavior_for(id)?;
        let caster = Caster {
            position: ctx.player,
            skill_level: level,
            units: ctx.units,
        };
        let hit = behavior(&caster, ctx.monsters.monsters(), &mut *ctx.rng)?;
        self.attacking_until = ctx.now + ATTACK_ANIMATION_MS;

        if hit.shape == HitShape::Shield {
            return Some(self.resolve_shield(id, level, ctx));
        }

        let bonuses = ctx.skills.passive_bonuses();
        let player_level = ctx.progression.current_level;
        let (damage, crit) = self.tables.calculate_final_damage_with_crit(
            hit.damage_units,
            player_level,
            &bonuses,
            &mut *ctx.rng,
        );

        let mut activation = SkillActivation::new(id, level, hit.shape.clone());
        activation.hit_positions = positions_of(ctx.monsters.monsters(), &hit.targets);
        activation.damage = damage;
        activation.crit = crit;

        let report = ctx.monsters.damage_monsters(&hit.targets, damage);
        self.record(&report);
        activation.kill_count = report.kill_count;
        activation.exp = report.total_exp;
        activation.follow_up = self.schedule_follow_up(&hit, &activation, &report, ctx);

        debug!(
            "{} lv{} hit {} for {}{} ({} kills)",
            id,
            level,
            hit.targets.len(),
            damage,
            if crit { " crit" } else { "" },
            report.kill_count
        );
        Some(activation)
    }

    /// 护盾：已有护盾时先判定爆炸，再覆盖为新护盾
    fn resolve_shield(
        &mut self,
        id: SkillId,
        level: u8,
        ctx: &mut CombatContext<'_>,
    ) -> SkillActivation {
        let mut activation = SkillActivation::new(id, level, HitShape::Shield);
        let player_level = ctx.progression.current_level;

        if ctx.progression.has_shield()
            && self.tables.roll_follow_up(player_level, &mut *ctx.rng)
        {
            let (damage, crit) = self.tables.roll_crit(
                ctx.progression.shield_reflect_damage,
                player_level,
                &mut *ctx.rng,
            );
            let range = ctx.units.to_px(EXPLOSION_RANGE_UNITS);
            let targets = ctx.monsters.monsters_within(ctx.player, range, &ctx.units);
            activation.hit_positions = positions_of(ctx.monsters.monsters(), &targets);

            let report = ctx.monsters.damage_monsters(&targets, damage);
            self.record(&report);
            let max_shield = ctx.progression.max_shield;
            activation.healed = ctx.progression.heal(max_shield);
            activation.damage = damage;
            activation.crit = crit;
            activation.kill_count = report.kill_count;
            activation.exp = report.total_exp;
            activation.follow_up = Some(FollowUpTag::Explosion);
            debug!("shield exploded on {} monsters for {}", targets.len(), damage);
        }

        ctx.progression.cast_shield(level);
        activation
    }

    fn schedule_follow_up(
        &mut self,
        hit: &HitResult,
        activation: &SkillActivation,
        report: &DamageReport,
        ctx: &mut CombatContext<'_>,
    ) -> Option<FollowUpTag> {
        let (kind, delay) = match &hit.shape {
            HitShape::Sector {
                origin,
                facing,
                half_angle,
                range,
            } => (
                FollowUpKind::Wave {
                    origin: *origin,
                    facing: *facing,
                    half_angle: *half_angle,
                    base_range: *range,
                    stage: 1,
                    already_hit: hit.targets.iter().copied().collect(),
                },
                WAVE_STAGE_INTERVAL_MS,
            ),
            HitShape::Circle { range, .. } if !report.kills.is_empty() => (
                FollowUpKind::Burst {
                    centers: report.kill_positions(),
                    range: range / 2.0,
                },
                BURST_DELAY_MS,
            ),
            HitShape::Beams { .. } if !hit.targets.is_empty() => (
                FollowUpKind::Chain {
                    origins: activation.hit_positions.clone(),
                    exclude: hit.targets.iter().copied().collect(),
                },
                CHAIN_DELAY_MS,
            ),
            _ => return None,
        };

        if !self
            .tables
            .roll_follow_up(ctx.progression.current_level, &mut *ctx.rng)
        {
            return None;
        }
        let tag = kind.tag();
        self.queue.schedule(FollowUp {
            skill: activation.skill,
            due: ctx.now + delay,
            damage: activation.damage,
            crit: activation.crit,
            kind,
        });
        Some(tag)
    }

    /// 结算所有到期的后续效果
    ///
    /// 目标可能在释放与结算之间已经死亡，这些 id 直接跳过。
    pub fn process_follow_ups(&mut self, ctx: &mut CombatContext<'_>) -> Vec<FollowUpResolution> {
        let mut resolved = Vec::new();
        while let Some(follow_up) = self.queue.pop_due(ctx.now) {
            resolved.push(self.resolve_follow_up(follow_up, ctx));
        }
        resolved
    }

    fn resolve_follow_up(
        &mut self,
        follow_up: FollowUp,
        ctx: &mut CombatContext<'_>,
    ) -> FollowUpResolution {
        let FollowUp {
            skill,
            due,
            damage,
            crit,
            kind,
        } = follow_up;
        let mut resolution = FollowUpResolution {
            skill,
            kind: kind.tag(),
            hit_positions: Vec::new(),
            damage,
            crit,
            kill_count: 0,
            exp: 0,
        };

        let report = match kind {
            FollowUpKind::Wave {
                origin,
                facing,
                half_angle,
                base_range,
                stage,
                mut already_hit,
            } => {
                let range = base_range * (1.0 + stage as f64 / WAVE_STAGES as f64);
                let targets = sector_targets(
                    ctx.monsters.monsters(),
                    &ctx.units,
                    origin,
                    facing,
                    half_angle,
                    range,
                    &already_hit,
                );
                resolution.hit_positions = positions_of(ctx.monsters.monsters(), &targets);
                let report = ctx.monsters.damage_monsters(&targets, damage);
                already_hit.extend(targets);
                if stage < WAVE_STAGES {
                    self.queue.schedule(FollowUp {
                        skill,
                        due: due + WAVE_STAGE_INTERVAL_MS,
                        damage,
                        crit,
                        kind: FollowUpKind::Wave {
                            origin,
                            facing,
                            half_angle,
                            base_range,
                            stage: stage + 1,
                            already_hit,
                        },
                    });
                }
                report
            }
            FollowUpKind::Burst { centers, range } => {
                let mut total = DamageReport::default();
                for center in centers {
                    let targets = circle_targets(
                        ctx.monsters.monsters(),
                        &ctx.units,
                        center,
                        range,
                        &HashSet::new(),
                    );
                    resolution
                        .hit_positions
                        .extend(positions_of(ctx.monsters.monsters(), &targets));
                    total.combine(ctx.monsters.damage_monsters(&targets, damage));
                }
                total
            }
            FollowUpKind::Chain { origins, exclude } => {
                let min_separation = ctx.units.to_px(CHAIN_MIN_SEPARATION_UNITS);
                let range = ctx.units.to_px(BEAM_RANGE_UNITS);
                let half_width = ctx.units.to_px(BEAM_HALF_WIDTH_UNITS);
                let mut seen = exclude.clone();
                let mut targets = Vec::new();
                for origin in origins {
                    let angle = chain_angle(
                        ctx.monsters.monsters(),
                        origin,
                        min_separation,
                        &exclude,
                        &mut *ctx.rng,
                    );
                    let hits = beam_targets(
                        ctx.monsters.monsters(),
                        &ctx.units,
                        origin,
                        &[angle],
                        range,
                        half_width,
                        &seen,
                    );
                    seen.extend(hits.iter().copied());
                    targets.extend(hits);
                }
                resolution.hit_positions = positions_of(ctx.monsters.monsters(), &targets);
                ctx.monsters.damage_monsters(&targets, damage)
            }
        };

        self.record(&report);
        resolution.kill_count = report.kill_count;
        resolution.exp = report.total_exp;
        debug!(
            "{:?} follow-up of {} hit {} ({} kills)",
            resolution.kind,
            skill,
            report.hit.len(),
            report.kill_count
        );
        resolution
    }

    /// 结算本帧的接触伤害：承伤管线、护盾反伤、死亡判定
    pub fn apply_contact(
        &mut self,
        contact: &ContactReport,
        ctx: &mut CombatContext<'_>,
    ) -> Option<ContactOutcome> {
        if contact.damage == 0 {
            return None;
        }
        let bonuses = ctx.skills.passive_bonuses();
        let damage = ctx.progression.apply_incoming_damage(
            contact.damage,
            ctx.now,
            &bonuses,
            &mut *ctx.rng,
        );
        let mut outcome = ContactOutcome {
            damage,
            reflect: None,
            death: None,
        };

        let reflect_damage = ctx.progression.shield_reflect_damage;
        if damage.absorbed > 0 && reflect_damage > 0 {
            let hit_positions = positions_of(ctx.monsters.monsters(), &contact.attackers);
            let report = ctx
                .monsters
                .damage_monsters(&contact.attackers, reflect_damage);
            self.record(&report);
            outcome.reflect = Some(ReflectReport {
                damage: reflect_damage,
                attackers: contact.attackers.clone(),
                hit_positions,
                kill_count: report.kill_count,
                exp: report.total_exp,
            });
        }

        if damage.lethal {
            outcome.death = Some(match ctx.progression.resolve_death(&bonuses) {
                DeathOutcome::Revived { hp } => {
                    let range = ctx.units.to_px(REVIVE_NOVA_RANGE_UNITS);
                    let targets = ctx.monsters.monsters_within(ctx.player, range, &ctx.units);
                    let report = ctx.monsters.damage_monsters(&targets, u32::MAX);
                    self.record(&report);
                    info!("revive nova cleared {} monsters", report.kill_count);
                    DeathResolution::Revived {
                        hp,
                        kill_count: report.kill_count,
                        exp: report.total_exp,
                    }
                }
                DeathOutcome::Dead => {
                    self.queue.clear();
                    DeathResolution::GameOver
                }
            });
        }
        Some(outcome)
    }
}

fn positions_of(monsters: &[Monster], ids: &[u32]) -> Vec<Position> {
    ids.iter()
        .filter_map(|id| monsters.iter().find(|m| m.id == *id))
        .map(|m| m.position)
        .collect()
}

/// 连锁方向：离起点超过最小距离的随机存活怪物，没有则随机角度
fn chain_angle(
    monsters: &[Monster],
    origin: Position,
    min_separation: f64,
    exclude: &HashSet<u32>,
    rng: &mut dyn RngCore,
) -> f64 {
    let candidates: Vec<&Monster> = monsters
        .iter()
        .filter(|m| m.is_alive() && !exclude.contains(&m.id))
        .filter(|m| origin.distance_to(m.position) > min_separation)
        .collect();
    match candidates.choose(rng) {
        Some(m) => origin.angle_to(m.position),
        None => rng.random_range(0.0..TAU),
    }
}
