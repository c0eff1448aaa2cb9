// src/skills/src/manager.rs

use std::collections::HashMap;

use error::GameError;
use log::{debug, warn};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::{
    ACTIVE_SLOTS, PASSIVE_SLOTS, SkillDefinition, SkillId, SkillType, default_catalog,
};
use crate::passive::{PassiveBonuses, PassiveEffect};

/// 首次选择时提供的主动技能数量
const FIRST_PICK_ACTIVE_OPTIONS: usize = 3;
/// 之后每次选择提供的主动技能数量
const ACTIVE_OPTIONS: usize = 2;
/// 之后每次选择提供的被动技能数量（若有可选）
const PASSIVE_OPTIONS: usize = 1;

/// 玩家拥有的技能及其当前等级
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSkill {
    pub definition: SkillDefinition,
    pub level: u8,
}

impl PlayerSkill {
    pub fn id(&self) -> SkillId {
        self.definition.id
    }

    pub fn is_maxed(&self) -> bool {
        self.level >= self.definition.max_level
    }
}

/// 技能管理器：技能归属、升级、候选池以及被动加成计算
#[derive(Debug, Clone)]
pub struct SkillManager {
    /// 目录（定义顺序）
    catalog: Vec<SkillDefinition>,
    /// 已拥有的技能，每个 id 唯一
    skills: HashMap<SkillId, PlayerSkill>,
    /// 获得顺序，决定技能栏位置
    acquisition: Vec<SkillId>,
}

impl SkillManager {
    pub fn new(catalog: Vec<SkillDefinition>) -> Self {
        Self {
            catalog,
            skills: HashMap::new(),
            acquisition: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &[SkillDefinition] {
        &self.catalog
    }

    /// 获取技能定义
    pub fn definition(&self, id: SkillId) -> Option<&SkillDefinition> {
        self.catalog.iter().find(|d| d.id == id)
    }

    pub fn has_skill(&self, id: SkillId) -> bool {
        self.skills.contains_key(&id)
    }

    /// 获取技能等级，未拥有返回 None
    pub fn skill_level(&self, id: SkillId) -> Option<u8> {
        self.skills.get(&id).map(|s| s.level)
    }

    pub fn player_skill(&self, id: SkillId) -> Option<&PlayerSkill> {
        self.skills.get(&id)
    }

    fn owned_count(&self, skill_type: SkillType) -> usize {
        self.skills
            .values()
            .filter(|s| s.definition.skill_type == skill_type)
            .count()
    }

    fn slot_cap(skill_type: SkillType) -> usize {
        match skill_type {
            SkillType::Active => ACTIVE_SLOTS,
            SkillType::Passive => PASSIVE_SLOTS,
        }
    }

    /// 学习或升级技能，返回新等级
    ///
    /// 首次学习创建 0 级技能（算作第一点），之后每次 +1 直到满级。
    /// 槽位已满时学习新技能不会插入第五个主动或第四个被动。
    pub fn try_learn_or_upgrade(&mut self, id: SkillId) -> Result<u8, GameError> {
        let definition = self
            .definition(id)
            .cloned()
            .ok_or_else(|| GameError::UnknownSkill(id.to_string()))?;

        if let Some(skill) = self.skills.get_mut(&id) {
            if skill.is_maxed() {
                return Err(GameError::SkillMaxed(id.to_string()));
            }
            skill.level += 1;
            return Ok(skill.level);
        }

        let owned = self.owned_count(definition.skill_type);
        if owned >= Self::slot_cap(definition.skill_type) {
            return Err(match definition.skill_type {
                SkillType::Active => GameError::ActiveSlotsFull(owned),
                SkillType::Passive => GameError::PassiveSlotsFull(owned),
            });
        }

        self.skills.insert(
            id,
            PlayerSkill {
                definition,
                level: 0,
            },
        );
        self.acquisition.push(id);
        Ok(0)
    }

    /// 学习或升级技能；失败时为空操作并返回 false
    pub fn learn_or_upgrade_skill(&mut self, id: SkillId) -> bool {
        match self.try_learn_or_upgrade(id) {
            Ok(level) => {
                debug!("skill {} now at level {}", id, level);
                true
            }
            Err(e @ (GameError::PassiveSlotsFull(_) | GameError::ActiveSlotsFull(_))) => {
                warn!("rejected learning {}: {}", id, e);
                false
            }
            Err(e) => {
                debug!("rejected learning {}: {}", id, e);
                false
            }
        }
    }

    /// 按名称学习或升级，未知名称返回 false
    pub fn learn_or_upgrade_by_name(&mut self, name: &str) -> bool {
        match name.parse::<SkillId>() {
            Ok(id) => self.learn_or_upgrade_skill(id),
            Err(_) => {
                debug!("rejected learning unknown skill {:?}", name);
                false
            }
        }
    }

    fn slots<const N: usize>(&self, skill_type: SkillType) -> [Option<&PlayerSkill>; N] {
        let mut slots = [None; N];
        let owned = self
            .acquisition
            .iter()
            .filter_map(|id| self.skills.get(id))
            .filter(|s| s.definition.skill_type == skill_type);
        for (slot, skill) in slots.iter_mut().zip(owned) {
            *slot = Some(skill);
        }
        slots
    }

    /// 主动技能栏（按获得顺序，空位为 None）
    pub fn player_active_skills(&self) -> [Option<&PlayerSkill>; ACTIVE_SLOTS] {
        self.slots(SkillType::Active)
    }

    /// 被动技能栏（按获得顺序，空位为 None）
    pub fn player_passive_skills(&self) -> [Option<&PlayerSkill>; PASSIVE_SLOTS] {
        self.slots(SkillType::Passive)
    }

    /// 已拥有的主动技能 id（按获得顺序）
    pub fn active_skill_ids(&self) -> Vec<SkillId> {
        self.player_active_skills()
            .iter()
            .flatten()
            .map(|s| s.id())
            .collect()
    }

    /// 是否可以出现在候选池中
    pub fn is_upgradeable(&self, id: SkillId) -> bool {
        let Some(definition) = self.definition(id) else {
            return false;
        };
        match self.skills.get(&id) {
            Some(skill) => !skill.is_maxed(),
            None => self.owned_count(definition.skill_type) < Self::slot_cap(definition.skill_type),
        }
    }

    fn upgradeable(&self, skill_type: SkillType) -> Vec<SkillId> {
        self.catalog
            .iter()
            .filter(|d| d.skill_type == skill_type)
            .map(|d| d.id)
            .filter(|id| self.is_upgradeable(*id))
            .collect()
    }

    /// 是否为第一次选择（尚未拥有任何技能）
    pub fn is_first_pick(&self) -> bool {
        self.skills.is_empty()
    }

    /// 生成技能候选
    ///
    /// 第一次：3 个不同的主动技能，保证玩家有攻击手段。
    /// 之后：2 个主动 + 1 个被动（没有可选被动时只有 2 个主动）。
    pub fn random_skill_options<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<SkillId> {
        let mut actives = self.upgradeable(SkillType::Active);
        actives.shuffle(rng);

        if self.is_first_pick() {
            actives.truncate(FIRST_PICK_ACTIVE_OPTIONS);
            return actives;
        }

        actives.truncate(ACTIVE_OPTIONS);
        let mut passives = self.upgradeable(SkillType::Passive);
        passives.shuffle(rng);
        actives.extend(passives.into_iter().take(PASSIVE_OPTIONS));
        actives
    }

    /// 是否还有可升级的技能（决定是否显示选择面板）
    pub fn has_upgradeable_skills(&self) -> bool {
        self.catalog.iter().any(|d| self.is_upgradeable(d.id))
    }

    fn passive_level(&self, effect: PassiveEffect) -> Option<u8> {
        self.skills
            .values()
            .filter(|s| s.definition.is_passive())
            .find(|s| PassiveEffect::for_skill(s.id()) == Some(effect))
            .map(|s| s.level)
    }

    fn is_maxed(&self, id: SkillId) -> bool {
        self.skills.get(&id).is_some_and(|s| s.is_maxed())
    }

    /// 当前被动加成快照
    pub fn passive_bonuses(&self) -> PassiveBonuses {
        PassiveBonuses::from_levels(|e| self.passive_level(e), |id| self.is_maxed(id))
    }

    pub fn max_hp_bonus(&self) -> f64 {
        self.passive_bonuses().max_hp
    }

    pub fn move_speed_bonus(&self) -> f64 {
        self.passive_bonuses().move_speed
    }

    pub fn cooldown_reduction(&self) -> f64 {
        self.passive_bonuses().cooldown_reduction
    }

    pub fn exp_bonus(&self) -> f64 {
        self.passive_bonuses().exp_gain
    }

    pub fn damage_bonus(&self) -> f64 {
        self.passive_bonuses().damage
    }

    pub fn damage_taken_reduction(&self) -> f64 {
        self.passive_bonuses().damage_taken_reduction
    }

    pub fn regen_interval_ms(&self) -> Option<u64> {
        self.passive_bonuses().regen_interval_ms
    }

    pub fn dodge_chance(&self) -> f64 {
        self.passive_bonuses().dodge_chance
    }

    pub fn revive_unlocked(&self) -> bool {
        self.passive_bonuses().revive_unlocked
    }

    pub fn final_move_speed(&self, base: f64) -> f64 {
        self.passive_bonuses().calculate_final_move_speed(base)
    }
}

impl Default for SkillManager {
    fn default() -> Self {
        Self::new(default_catalog())
    }
}
