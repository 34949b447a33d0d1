//! 说明文字框几何 - 业务能力层
//!
//! 根据行数、字号和锚定方式，在给定区域内计算文本框。
//! 文本框宽度始终等于区域宽度，高度溢出时退化为整块区域。

use tracing::debug;

use crate::error::{AppResult, GeometryError};
use crate::models::caption::{AnchorPolicy, CaptionSpec};
use crate::models::geometry::{Point, Rect, Region};

/// 文本框几何结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBoxGeometry {
    pub rect: Rect,
    /// 文本框中点，用作插入光标的点击位置
    pub center: Point,
}

impl TextBoxGeometry {
    pub fn top_left(&self) -> Point {
        self.rect.top_left()
    }

    pub fn bottom_right(&self) -> Point {
        self.rect.bottom_right()
    }
}

/// 原始框高：行数 x 字号 x 行高倍数，四舍五入
pub fn raw_box_height(spec: &CaptionSpec) -> f64 {
    (spec.line_count() as f64 * spec.font_size * spec.line_height).round()
}

/// 在区域内计算文本框
///
/// 区域退化或框高不是正数时返回 GeometryError
pub fn build_text_box(region: &Region, spec: &CaptionSpec) -> AppResult<TextBoxGeometry> {
    region.validate()?;
    let height = raw_box_height(spec);
    if !(height.is_finite() && height > 0.0) {
        return Err(GeometryError::NonPositiveHeight { height }.into());
    }
    Ok(place_box(region, height, &spec.anchor))
}

/// 按给定框高放置并钳制到区域内
pub fn place_box(region: &Region, box_height: f64, anchor: &AnchorPolicy) -> TextBoxGeometry {
    let region_height = region.height();

    let (top, height) = if box_height > region_height {
        debug!("文本框高度 {} 超过区域高度 {}，改用整块区域", box_height, region_height);
        (region.top(), region_height)
    } else {
        let initial = match anchor {
            AnchorPolicy::TopCenter => region.top(),
            AnchorPolicy::BottomCenter => region.bottom() - box_height,
            AnchorPolicy::Center | AnchorPolicy::Other(_) => {
                region.top() + (region_height - box_height) / 2.0
            }
        };
        let top = if initial < region.top() {
            region.top()
        } else if initial + box_height > region.bottom() {
            region.bottom() - box_height
        } else {
            initial
        };
        (top, box_height)
    };

    let rect = Rect::new(top, region.left(), top + height, region.left() + region.width());
    TextBoxGeometry {
        rect,
        center: rect.center(),
    }
}
