//! 网格几何 - 业务能力层
//!
//! 按排版方式把页面切成互不重叠的单元格。

use crate::error::{AppResult, GeometryError};
use crate::models::geometry::Rect;
use crate::models::layout::LayoutArrangement;

/// 计算页面上的单元格，按阅读顺序（先左后右、先上后下）返回
///
/// 单元格恰好铺满 [0, W] x [0, H]。W 或 H 非正时返回 GeometryError。
pub fn build_cells(width: f64, height: f64, arrangement: LayoutArrangement) -> AppResult<Vec<Rect>> {
    if !(width > 0.0 && height > 0.0) {
        return Err(GeometryError::NonPositiveExtent { width, height }.into());
    }

    Ok(arrangement
        .template()
        .iter()
        .map(|&(top, left, bottom, right)| {
            Rect::new(top * height, left * width, bottom * height, right * width)
        })
        .collect())
}
