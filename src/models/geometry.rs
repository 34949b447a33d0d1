//! 几何基础类型
//!
//! 所有矩形都使用 (top, left, bottom, right) 的排版坐标顺序，
//! y 轴向下增长，与排版软件的 geometric bounds 一致。

use serde::{Deserialize, Serialize};

use crate::error::{AppResult, GeometryError};

/// 二维坐标点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// 轴对齐矩形
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// 由左上角和右下角构造
    pub fn from_corners(top_left: Point, bottom_right: Point) -> Self {
        Self::new(top_left.y, top_left.x, bottom_right.y, bottom_right.x)
    }

    pub fn width(&self) -> f64 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.bottom - self.top).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.right, self.bottom)
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }

    /// 是否满足 top < bottom 且 left < right
    pub fn is_valid(&self) -> bool {
        self.top < self.bottom && self.left < self.right
    }

    /// 与另一个矩形相交部分的面积（不相交为 0）
    pub fn intersection_area(&self, other: &Self) -> f64 {
        let inter = Rect::new(
            self.top.max(other.top),
            self.left.max(other.left),
            self.bottom.min(other.bottom),
            self.right.min(other.right),
        );
        inter.area()
    }

    /// 转换为排版软件使用的 [top, left, bottom, right] 数组
    pub fn to_bounds(&self) -> [f64; 4] {
        [self.top, self.left, self.bottom, self.right]
    }
}

/// 绝对坐标下的区域（两角表示）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub top_left: Point,
    pub bottom_right: Point,
}

impl Region {
    pub fn new(top_left: impl Into<Point>, bottom_right: impl Into<Point>) -> Self {
        Self {
            top_left: top_left.into(),
            bottom_right: bottom_right.into(),
        }
    }

    pub fn left(&self) -> f64 {
        self.top_left.x
    }

    pub fn top(&self) -> f64 {
        self.top_left.y
    }

    pub fn right(&self) -> f64 {
        self.bottom_right.x
    }

    pub fn bottom(&self) -> f64 {
        self.bottom_right.y
    }

    pub fn width(&self) -> f64 {
        self.right() - self.left()
    }

    pub fn height(&self) -> f64 {
        self.bottom() - self.top()
    }

    /// 区域退化（right ≤ left 或 bottom ≤ top）时返回 GeometryError
    pub fn validate(&self) -> AppResult<()> {
        if self.right() <= self.left() || self.bottom() <= self.top() {
            return Err(GeometryError::DegenerateRegion {
                left: self.left(),
                top: self.top(),
                right: self.right(),
                bottom: self.bottom(),
            }
            .into());
        }
        Ok(())
    }

    pub fn to_rect(&self) -> Rect {
        Rect::from_corners(self.top_left, self.bottom_right)
    }
}

/// 比例坐标下的区域，各分量位于 [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioRegion {
    pub top_left: (f64, f64),
    pub bottom_right: (f64, f64),
}

impl RatioRegion {
    pub fn new(top_left: (f64, f64), bottom_right: (f64, f64)) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// 由两次点击的像素坐标构造，点击顺序无关
    pub fn from_clicks(first: Point, second: Point, extent_width: f64, extent_height: f64) -> AppResult<Self> {
        if extent_width <= 0.0 || extent_height <= 0.0 {
            return Err(GeometryError::NonPositiveExtent {
                width: extent_width,
                height: extent_height,
            }
            .into());
        }

        let left = first.x.min(second.x);
        let right = first.x.max(second.x);
        let top = first.y.min(second.y);
        let bottom = first.y.max(second.y);

        Ok(Self::new(
            (left / extent_width, top / extent_height),
            (right / extent_width, bottom / extent_height),
        ))
    }

    /// 换算为给定尺寸下的绝对区域
    pub fn to_absolute(&self, extent_width: f64, extent_height: f64) -> Region {
        Region::new(
            (self.top_left.0 * extent_width, self.top_left.1 * extent_height),
            (
                self.bottom_right.0 * extent_width,
                self.bottom_right.1 * extent_height,
            ),
        )
    }
}
