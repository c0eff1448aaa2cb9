//! 单位换算与命中判定
//!
//! 所有距离都以"单位"表示：1 单位 = 视口高度的 10%。
//! 命中判定一律使用"欧氏距离减去目标半径"，只要命中形状与怪物占地
//! 有任何重叠即算命中，而不是只看中心点。

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// 1 单位占视口高度的比例
pub const UNIT_FRACTION: f64 = 0.1;

/// 世界坐标（y 轴向下）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Position) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// 指向 other 的角度（弧度）
    pub fn angle_to(&self, other: Position) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// 沿角度方向移动 distance
    pub fn offset(&self, angle: f64, distance: f64) -> Position {
        Position::new(
            self.x + angle.cos() * distance,
            self.y + angle.sin() * distance,
        )
    }
}

/// 摄像机视口（世界坐标中的左上角与尺寸）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// 以 center 为中心的视口
    pub fn centered_on(center: Position, width: f64, height: f64) -> Self {
        Self {
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// 地图边界
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub width: f64,
    pub height: f64,
}

impl MapBounds {
    pub fn clamp(&self, p: Position) -> Position {
        Position::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }
}

/// 单位换算，随视口高度缩放
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Units {
    viewport_height: f64,
}

impl Units {
    pub fn new(viewport_height: f64) -> Self {
        Self { viewport_height }
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    /// 1 单位对应的像素
    pub fn unit(&self) -> f64 {
        self.viewport_height * UNIT_FRACTION
    }

    pub fn to_px(&self, units: f64) -> f64 {
        units * self.unit()
    }

    /// 怪物半径：视口高度 × 体型比例 × 0.5
    pub fn radius(&self, size_fraction: f64) -> f64 {
        self.viewport_height * size_fraction * 0.5
    }
}

/// 把角度差规范到 [-PI, PI]
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a < -PI {
        a += 2.0 * PI;
    }
    a
}

/// 目标边缘到原点的距离
pub fn edge_distance(origin: Position, target: Position, radius: f64) -> f64 {
    origin.distance_to(target) - radius
}

/// 圆形命中
pub fn in_circle(origin: Position, range: f64, target: Position, radius: f64) -> bool {
    edge_distance(origin, target, radius) <= range
}

/// 扇形命中：角度按目标半径展开后与扇形相交，且边缘距离不超过射程
pub fn in_sector(
    origin: Position,
    facing: f64,
    half_angle: f64,
    range: f64,
    target: Position,
    radius: f64,
) -> bool {
    let dist = origin.distance_to(target);
    if dist - radius > range {
        return false;
    }
    // 原点落在怪物占地内
    if dist <= radius {
        return true;
    }
    let spread = (radius / dist).min(1.0).asin();
    let diff = normalize_angle(origin.angle_to(target) - facing).abs();
    diff <= half_angle + spread
}

/// 光束命中：到光束所在直线的垂直距离不超过半宽，只计算前方
pub fn in_beam(
    origin: Position,
    angle: f64,
    range: f64,
    half_width: f64,
    target: Position,
    radius: f64,
) -> bool {
    let dx = target.x - origin.x;
    let dy = target.y - origin.y;
    let (sin, cos) = angle.sin_cos();
    let along = dx * cos + dy * sin;
    if along < -radius || along - radius > range {
        return false;
    }
    let perpendicular = (dx * sin - dy * cos).abs();
    perpendicular - radius <= half_width
}
