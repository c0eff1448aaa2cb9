// src/combat/src/follow_up.rs

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use monsters::Position;
use serde::Serialize;
use skills::SkillId;

/// 波动每一段的间隔（毫秒）
pub const WAVE_STAGE_INTERVAL_MS: u64 = 100;
/// 波动总段数（共 500 毫秒）
pub const WAVE_STAGES: u8 = 5;
pub const BURST_DELAY_MS: u64 = 150;
pub const CHAIN_DELAY_MS: u64 = 100;
/// 连锁目标离起点的最小距离（单位）
pub const CHAIN_MIN_SEPARATION_UNITS: f64 = 1.0;

/// 后续效果种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpTag {
    Wave,
    Burst,
    Chain,
    Explosion,
}

/// 延迟结算所需的输入快照
#[derive(Debug, Clone, PartialEq)]
pub enum FollowUpKind {
    /// 沿释放方向扩张的弧，每只怪物最多命中一次
    Wave {
        origin: Position,
        facing: f64,
        half_angle: f64,
        base_range: f64,
        stage: u8,
        already_hit: HashSet<u32>,
    },
    /// 在每个击杀位置触发半径减半的新星
    Burst { centers: Vec<Position>, range: f64 },
    /// 从每个命中位置再射出一道光束
    Chain {
        origins: Vec<Position>,
        exclude: HashSet<u32>,
    },
}

impl FollowUpKind {
    pub fn tag(&self) -> FollowUpTag {
        match self {
            FollowUpKind::Wave { .. } => FollowUpTag::Wave,
            FollowUpKind::Burst { .. } => FollowUpTag::Burst,
            FollowUpKind::Chain { .. } => FollowUpTag::Chain,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FollowUp {
    pub skill: SkillId,
    pub due: u64,
    /// 释放时已掷过暴击的伤害
    pub damage: u32,
    pub crit: bool,
    pub kind: FollowUpKind,
}

#[derive(Debug)]
struct Scheduled {
    seq: u64,
    follow_up: FollowUp,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // BinaryHeap 是大顶堆，反转后最早到期（同时到期按入队顺序）的在堆顶
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .follow_up
            .due
            .cmp(&self.follow_up.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// 按游戏时间排序的后续效果队列
#[derive(Debug, Default)]
pub struct FollowUpQueue {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl FollowUpQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, follow_up: FollowUp) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled { seq, follow_up });
    }

    /// 取出一个已到期的效果
    pub fn pop_due(&mut self, now: u64) -> Option<FollowUp> {
        if self.heap.peek()?.follow_up.due > now {
            return None;
        }
        self.heap.pop().map(|s| s.follow_up)
    }

    pub fn next_due(&self) -> Option<u64> {
        self.heap.peek().map(|s| s.follow_up.due)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
