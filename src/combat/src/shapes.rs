//! 技能形状策略表
//!
//! 每个主动技能对应一个纯函数 `(施法者, 怪物列表, rng) -> HitResult`，
//! 只负责计算命中集合与伤害单位，不修改任何状态。

use std::collections::HashSet;
use std::f64::consts::TAU;

use monsters::geometry::{in_beam, in_circle, in_sector};
use monsters::{Monster, Position, Units};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::Serialize;
use skills::SkillId;

/// 形状参数（单位均为“单位”，1 单位 = 视口高度的 10%）
pub mod constants {
    pub const SECTOR_BASE_ANGLE_DEG: f64 = 60.0;
    pub const SECTOR_ANGLE_PER_LEVEL_DEG: f64 = 10.0;
    pub const SECTOR_RANGE_UNITS: f64 = 3.0;
    pub const SECTOR_BASE_DAMAGE_UNITS: u32 = 2;

    pub const NOVA_BASE_RANGE_UNITS: f64 = 2.0;
    pub const NOVA_RANGE_PER_LEVEL_UNITS: f64 = 0.5;
    pub const NOVA_BASE_DAMAGE_UNITS: u32 = 1;

    pub const BEAM_RANGE_UNITS: f64 = 10.0;
    pub const BEAM_HALF_WIDTH_UNITS: f64 = 0.5;
    pub const BEAM_BASE_DAMAGE_UNITS: u32 = 1;
}

use constants::*;

/// 施法者快照
#[derive(Debug, Clone, Copy)]
pub struct Caster {
    pub position: Position,
    pub skill_level: u8,
    pub units: Units,
}

/// 命中形状（像素坐标），交给表现层绘制
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum HitShape {
    Sector {
        origin: Position,
        facing: f64,
        half_angle: f64,
        range: f64,
    },
    Circle {
        origin: Position,
        range: f64,
    },
    Beams {
        origin: Position,
        angles: Vec<f64>,
        range: f64,
        half_width: f64,
    },
    Shield,
}

/// 一次释放的命中结果
#[derive(Debug, Clone, PartialEq)]
pub struct HitResult {
    pub shape: HitShape,
    /// 命中的怪物 id（已去重，按怪物列表顺序）
    pub targets: Vec<u32>,
    pub damage_units: u32,
}

pub type SkillBehavior = fn(&Caster, &[Monster], &mut dyn RngCore) -> Option<HitResult>;

/// 技能 id → 形状函数；被动技能返回 None
pub fn behavior_for(id: SkillId) -> Option<SkillBehavior> {
    match id {
        SkillId::Crescent => Some(sector),
        SkillId::Nova => Some(nova),
        SkillId::Lightning => Some(beam),
        SkillId::Aegis => Some(shield),
        _ => None,
    }
}

/// 扇形半角（弧度）：(60° + 10° × level) / 2
pub fn sector_half_angle(level: u8) -> f64 {
    ((SECTOR_BASE_ANGLE_DEG + SECTOR_ANGLE_PER_LEVEL_DEG * level as f64) / 2.0).to_radians()
}

pub fn nova_range_units(level: u8) -> f64 {
    NOVA_BASE_RANGE_UNITS + NOVA_RANGE_PER_LEVEL_UNITS * level as f64
}

pub fn sector_targets(
    monsters: &[Monster],
    units: &Units,
    origin: Position,
    facing: f64,
    half_angle: f64,
    range: f64,
    skip: &HashSet<u32>,
) -> Vec<u32> {
    monsters
        .iter()
        .filter(|m| m.is_alive() && !skip.contains(&m.id))
        .filter(|m| in_sector(origin, facing, half_angle, range, m.position, m.radius(units)))
        .map(|m| m.id)
        .collect()
}

pub fn circle_targets(
    monsters: &[Monster],
    units: &Units,
    origin: Position,
    range: f64,
    skip: &HashSet<u32>,
) -> Vec<u32> {
    monsters
        .iter()
        .filter(|m| m.is_alive() && !skip.contains(&m.id))
        .filter(|m| in_circle(origin, range, m.position, m.radius(units)))
        .map(|m| m.id)
        .collect()
}

/// 任意一道光束命中即算命中，天然去重
pub fn beam_targets(
    monsters: &[Monster],
    units: &Units,
    origin: Position,
    angles: &[f64],
    range: f64,
    half_width: f64,
    skip: &HashSet<u32>,
) -> Vec<u32> {
    monsters
        .iter()
        .filter(|m| m.is_alive() && !skip.contains(&m.id))
        .filter(|m| {
            let radius = m.radius(units);
            angles
                .iter()
                .any(|&a| in_beam(origin, a, range, half_width, m.position, radius))
        })
        .map(|m| m.id)
        .collect()
}

/// 月牙斩：朝最近的怪物挥出扇形，场上没有怪物时不释放
fn sector(caster: &Caster, monsters: &[Monster], _rng: &mut dyn RngCore) -> Option<HitResult> {
    let nearest = monsters.iter().filter(|m| m.is_alive()).min_by(|a, b| {
        caster
            .position
            .distance_to(a.position)
            .total_cmp(&caster.position.distance_to(b.position))
    })?;
    let facing = caster.position.angle_to(nearest.position);
    let half_angle = sector_half_angle(caster.skill_level);
    let range = caster.units.to_px(SECTOR_RANGE_UNITS);
    let targets = sector_targets(
        monsters,
        &caster.units,
        caster.position,
        facing,
        half_angle,
        range,
        &HashSet::new(),
    );
    Some(HitResult {
        shape: HitShape::Sector {
            origin: caster.position,
            facing,
            half_angle,
            range,
        },
        targets,
        damage_units: SECTOR_BASE_DAMAGE_UNITS + caster.skill_level as u32,
    })
}

/// 冰霜新星：以玩家为中心的圆形，总会释放
fn nova(caster: &Caster, monsters: &[Monster], _rng: &mut dyn RngCore) -> Option<HitResult> {
    let range = caster.units.to_px(nova_range_units(caster.skill_level));
    let targets = circle_targets(monsters, &caster.units, caster.position, range, &HashSet::new());
    Some(HitResult {
        shape: HitShape::Circle {
            origin: caster.position,
            range,
        },
        targets,
        damage_units: NOVA_BASE_DAMAGE_UNITS + caster.skill_level as u32,
    })
}

/// 闪电：level + 1 道光束，各自瞄准不同的随机怪物，怪物不够时随机方向（空场也会释放）
fn beam(caster: &Caster, monsters: &[Monster], rng: &mut dyn RngCore) -> Option<HitResult> {
    let mut living: Vec<&Monster> = monsters.iter().filter(|m| m.is_alive()).collect();
    living.shuffle(rng);

    let count = caster.skill_level as usize + 1;
    let angles: Vec<f64> = (0..count)
        .map(|i| match living.get(i) {
            Some(m) => caster.position.angle_to(m.position),
            None => rng.random_range(0.0..TAU),
        })
        .collect();
    let range = caster.units.to_px(BEAM_RANGE_UNITS);
    let half_width = caster.units.to_px(BEAM_HALF_WIDTH_UNITS);
    let targets = beam_targets(
        monsters,
        &caster.units,
        caster.position,
        &angles,
        range,
        half_width,
        &HashSet::new(),
    );
    Some(HitResult {
        shape: HitShape::Beams {
            origin: caster.position,
            angles,
            range,
            half_width,
        },
        targets,
        damage_units: BEAM_BASE_DAMAGE_UNITS + caster.skill_level as u32,
    })
}

/// 护盾释放时不命中怪物
fn shield(_caster: &Caster, _monsters: &[Monster], _rng: &mut dyn RngCore) -> Option<HitResult> {
    Some(HitResult {
        shape: HitShape::Shield,
        targets: Vec::new(),
        damage_units: 0,
    })
}
