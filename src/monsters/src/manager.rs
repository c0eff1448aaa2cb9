// src/monsters/src/manager.rs

use std::collections::HashSet;
use std::sync::Arc;

use error::GameError;
use log::{debug, info};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::catalog::{BOSS_ID, MonsterDefinition, default_catalog};
use crate::geometry::{MapBounds, Position, Units, Viewport, edge_distance};
use crate::monster::Monster;

/// 怪物系统的可调参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterConfig {
    /// 刷怪间隔（毫秒）
    pub spawn_interval_ms: u64,
    /// 视口外的刷怪距离（单位）
    pub spawn_margin_units: f64,
    /// 接触范围（单位）
    pub contact_range_units: f64,
    /// 每只怪物两次接触伤害的最短间隔（毫秒）
    pub contact_cooldown_ms: u64,
    /// 每个伤害单位对应的伤害
    pub damage_per_unit: u32,
    /// 每级玩家等级的生命成长
    pub hp_growth_per_level: f64,
}

impl Default for MonsterConfig {
    fn default() -> Self {
        Self {
            spawn_interval_ms: 2000,
            spawn_margin_units: 0.5,
            contact_range_units: 1.0,
            contact_cooldown_ms: 3000,
            damage_per_unit: 10,
            hp_growth_per_level: 1.10,
        }
    }
}

/// 刷怪方位（没有"下方"，引导玩家向前推进）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnSide {
    Above,
    Left,
    Right,
}

impl SpawnSide {
    const ALL: [SpawnSide; 3] = [SpawnSide::Above, SpawnSide::Left, SpawnSide::Right];
}

/// 单帧接触伤害结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactReport {
    /// 本帧接触伤害总和
    pub damage: u32,
    /// 本帧造成伤害的怪物（用于护盾反伤）
    pub attackers: Vec<u32>,
}

/// 被击杀的怪物
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kill {
    pub id: u32,
    pub definition_id: String,
    pub position: Position,
    pub exp: u32,
    pub boss: bool,
}

/// 伤害结算结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DamageReport {
    pub total_exp: u32,
    pub kill_count: u32,
    /// 被命中（且在命中前存活）的怪物
    pub hit: Vec<u32>,
    pub kills: Vec<Kill>,
}

impl DamageReport {
    pub fn combine(&mut self, other: DamageReport) {
        self.total_exp += other.total_exp;
        self.kill_count += other.kill_count;
        self.hit.extend(other.hit);
        self.kills.extend(other.kills);
    }

    pub fn kill_positions(&self) -> Vec<Position> {
        self.kills.iter().map(|k| k.position).collect()
    }
}

/// 怪物管理器：生命周期、移动 AI、接触伤害、伤害与死亡结算
#[derive(Debug, Clone)]
pub struct MonsterManager {
    config: MonsterConfig,
    catalog: Vec<Arc<MonsterDefinition>>,
    map: MapBounds,
    monsters: Vec<Monster>,
    next_id: u32,
    player_level: u32,
    spawning: bool,
    next_spawn_at: u64,
}

impl MonsterManager {
    pub fn new(config: MonsterConfig, catalog: Vec<MonsterDefinition>, map: MapBounds) -> Self {
        let next_spawn_at = config.spawn_interval_ms;
        Self {
            config,
            catalog: catalog.into_iter().map(Arc::new).collect(),
            map,
            monsters: Vec::new(),
            next_id: 1,
            player_level: 0,
            spawning: true,
            next_spawn_at,
        }
    }

    pub fn with_defaults(map: MapBounds) -> Self {
        Self::new(MonsterConfig::default(), default_catalog(), map)
    }

    pub fn config(&self) -> &MonsterConfig {
        &self.config
    }

    /// 设置玩家等级；只影响之后出生的怪物，已存在的怪物不会重新缩放
    pub fn set_player_level(&mut self, level: u32) {
        self.player_level = level;
    }

    pub fn player_level(&self) -> u32 {
        self.player_level
    }

    pub fn set_spawning(&mut self, enabled: bool) {
        self.spawning = enabled;
    }

    pub fn is_spawning(&self) -> bool {
        self.spawning
    }

    pub fn monsters(&self) -> &[Monster] {
        &self.monsters
    }

    pub fn get(&self, id: u32) -> Option<&Monster> {
        self.monsters.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.monsters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monsters.is_empty()
    }

    pub fn definition(&self, id: &str) -> Option<&Arc<MonsterDefinition>> {
        self.catalog.iter().find(|d| d.id == id)
    }

    /// 按当前玩家等级缩放的生命值：base × 1.10^level
    pub fn scaled_hp(&self, definition: &MonsterDefinition) -> u32 {
        let factor = self.config.hp_growth_per_level.powf(self.player_level as f64);
        (definition.hp as f64 * factor).floor() as u32
    }

    /// 在指定位置生成怪物
    pub fn spawn_monster(
        &mut self,
        definition_id: &str,
        position: Position,
    ) -> Result<u32, GameError> {
        let definition = self
            .definition(definition_id)
            .cloned()
            .ok_or_else(|| GameError::UnknownMonster(definition_id.to_string()))?;
        let hp = self.scaled_hp(&definition);
        let id = self.next_id;
        self.next_id += 1;
        self.monsters.push(Monster {
            id,
            definition,
            position: self.map.clamp(position),
            hp,
            max_hp: hp,
            last_damage_time: None,
        });
        debug!("spawned {} #{} with {} hp", definition_id, id, hp);
        Ok(id)
    }

    /// 视口外的随机出生点（上、左、右等概率），限制在地图内
    pub fn random_spawn_position<R: Rng + ?Sized>(
        &self,
        viewport: &Viewport,
        units: &Units,
        radius: f64,
        rng: &mut R,
    ) -> (SpawnSide, Position) {
        let margin = units.to_px(self.config.spawn_margin_units) + radius;
        let side = SpawnSide::ALL[rng.random_range(0..SpawnSide::ALL.len())];
        let position = match side {
            SpawnSide::Above => Position::new(
                rng.random_range(viewport.x..=viewport.right()),
                viewport.y - margin,
            ),
            SpawnSide::Left => Position::new(
                viewport.x - margin,
                rng.random_range(viewport.y..=viewport.bottom()),
            ),
            SpawnSide::Right => Position::new(
                viewport.right() + margin,
                rng.random_range(viewport.y..=viewport.bottom()),
            ),
        };
        (side, self.map.clamp(position))
    }

    /// 随机生成一只普通怪物
    pub fn spawn_random<R: Rng + ?Sized>(
        &mut self,
        viewport: &Viewport,
        units: &Units,
        rng: &mut R,
    ) -> Option<u32> {
        let regular: Vec<Arc<MonsterDefinition>> =
            self.catalog.iter().filter(|d| !d.boss).cloned().collect();
        let definition = regular.choose(rng)?.clone();
        let (_, position) =
            self.random_spawn_position(viewport, units, units.radius(definition.size), rng);
        self.spawn_monster(&definition.id, position).ok()
    }

    /// 处理 boss 生成请求（行为与普通怪物相同）
    pub fn spawn_boss<R: Rng + ?Sized>(
        &mut self,
        viewport: &Viewport,
        units: &Units,
        rng: &mut R,
    ) -> Option<u32> {
        let definition = self.definition(BOSS_ID)?.clone();
        let (_, position) =
            self.random_spawn_position(viewport, units, units.radius(definition.size), rng);
        let id = self.spawn_monster(&definition.id, position).ok()?;
        info!("boss #{} spawned at ({:.0}, {:.0})", id, position.x, position.y);
        Some(id)
    }

    /// 按固定间隔刷怪，返回本帧生成的怪物
    pub fn update_spawning<R: Rng + ?Sized>(
        &mut self,
        now: u64,
        viewport: &Viewport,
        units: &Units,
        rng: &mut R,
    ) -> Option<u32> {
        if !self.spawning || now < self.next_spawn_at {
            return None;
        }
        self.next_spawn_at = now + self.config.spawn_interval_ms;
        self.spawn_random(viewport, units, rng)
    }

    /// 每帧更新：接触范围外的怪物直线追向玩家，范围内的怪物停下并按冷却造成伤害
    pub fn update(
        &mut self,
        now: u64,
        delta_ms: u64,
        player: Position,
        units: &Units,
    ) -> ContactReport {
        let mut report = ContactReport::default();
        let contact_range = units.to_px(self.config.contact_range_units);
        let damage_units = self.player_level.max(1);
        let contact_damage = damage_units * self.config.damage_per_unit;
        let cooldown = self.config.contact_cooldown_ms;

        for monster in &mut self.monsters {
            let radius = monster.radius(units);
            let distance = monster.position.distance_to(player);

            if distance - radius <= contact_range {
                if monster.can_contact(now, cooldown) {
                    monster.last_damage_time = Some(now);
                    report.damage += contact_damage;
                    report.attackers.push(monster.id);
                }
                continue;
            }

            let step = units.to_px(monster.definition.speed) * delta_ms as f64 / 1000.0;
            let angle = monster.position.angle_to(player);
            monster.position = monster.position.offset(angle, step.min(distance));
        }

        report
    }

    /// 对指定怪物造成伤害；死亡的怪物移除并累计经验，不存在的 id 忽略
    pub fn damage_monsters(&mut self, ids: &[u32], amount: u32) -> DamageReport {
        let mut report = DamageReport::default();
        let unique: HashSet<u32> = ids.iter().copied().collect();

        for monster in self.monsters.iter_mut().filter(|m| unique.contains(&m.id)) {
            report.hit.push(monster.id);
            if monster.take_damage(amount) {
                report.total_exp += monster.definition.exp;
                report.kill_count += 1;
                report.kills.push(Kill {
                    id: monster.id,
                    definition_id: monster.definition.id.clone(),
                    position: monster.position,
                    exp: monster.definition.exp,
                    boss: monster.definition.boss,
                });
            }
        }

        if report.kill_count > 0 {
            self.monsters.retain(|m| m.is_alive());
        }
        report
    }

    /// 移除怪物（不结算经验）
    pub fn remove_monster(&mut self, id: u32) -> Option<Monster> {
        let index = self.monsters.iter().position(|m| m.id == id)?;
        Some(self.monsters.remove(index))
    }

    /// 原点附近（边缘距离）范围内的怪物
    pub fn monsters_within(&self, origin: Position, range: f64, units: &Units) -> Vec<u32> {
        self.monsters
            .iter()
            .filter(|m| edge_distance(origin, m.position, m.radius(units)) <= range)
            .map(|m| m.id)
            .collect()
    }

    /// 距离最近（中心欧氏距离）的怪物
    pub fn nearest(&self, origin: Position) -> Option<&Monster> {
        self.monsters.iter().min_by(|a, b| {
            origin
                .distance_to(a.position)
                .total_cmp(&origin.distance_to(b.position))
        })
    }

    pub fn clear(&mut self) {
        self.monsters.clear();
    }
}
