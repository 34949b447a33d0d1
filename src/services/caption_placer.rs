//! 说明文字放置 - 业务能力层
//!
//! 两种方式创建文本框：
//! - 脚本方式：直接调用文档后端 `add_text_frame` / `set_font` / `set_fill_color` / `type_text`
//! - 指针方式：按 `t` 切换文字工具，拖出文本框，点击中心后逐字输入
//!
//! 所有创建过的文本框都记录为 [`CaptionFrame`]，由调用方统一调整行距。

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::backend::{DocumentBackend, ItemHandle, PageHandle};
use crate::infrastructure::input_driver::{settle, InputDriver};
use crate::models::caption::{AnchorPolicy, CaptionMode};
use crate::models::geometry::Rect;
use crate::services::text_box::TextBoxGeometry;

/// 默认字体（字体名与样式之间用制表符分隔）
pub const DEFAULT_FONT: &str = "Arial\tRegular";

/// 指针方式下逐字输入的间隔（秒）
const TYPE_INTERVAL_SEC: f64 = 0.05;
/// 移动到起点、移动到点击点的耗时（秒）
const APPROACH_SEC: f64 = 0.5;
/// 拖拽耗时（秒）
const DRAG_SEC: f64 = 1.0;

/// 一个批次的文本框样式
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionStyle {
    pub font_name: String,
    pub font_size: f64,
    pub fill_color: Option<String>,
    pub anchor: AnchorPolicy,
}

impl CaptionStyle {
    /// 从候选列表中各均匀抽取一个字体、颜色和锚定方式
    ///
    /// 字体列表为空时使用默认字体，颜色列表为空时不设置颜色，
    /// 锚定列表为空时居中。
    pub fn choose<R: Rng>(
        fonts: &[String],
        colors: &[String],
        anchors: &[AnchorPolicy],
        font_size: f64,
        rng: &mut R,
    ) -> Self {
        Self {
            font_name: fonts
                .choose(rng)
                .cloned()
                .unwrap_or_else(|| DEFAULT_FONT.to_string()),
            font_size,
            fill_color: colors.choose(rng).cloned(),
            anchor: anchors.choose(rng).cloned().unwrap_or_default(),
        }
    }
}

/// 已创建的说明文字框
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionFrame {
    /// 所属批次（文件夹名）
    pub batch: String,
    pub mode: CaptionMode,
    /// 文本框项目，指针方式下后端不返回句柄
    pub item: Option<ItemHandle>,
    pub rect: Rect,
    pub line_count: usize,
    pub style: CaptionStyle,
}

/// 文本框放置器
pub enum CaptionPlacer<'d, D: InputDriver> {
    Scripted,
    Pointer { driver: &'d mut D, settle_ms: u64 },
}

impl<'d, D: InputDriver> CaptionPlacer<'d, D> {
    pub fn mode(&self) -> CaptionMode {
        match self {
            CaptionPlacer::Scripted => CaptionMode::Scripted,
            CaptionPlacer::Pointer { .. } => CaptionMode::Pointer,
        }
    }

    /// 在 `page` 上按 `geometry` 创建文本框并输入文字
    ///
    /// 失败统一返回放置错误，由调用方记录后继续。
    pub async fn place<B: DocumentBackend>(
        &mut self,
        backend: &mut B,
        page: PageHandle,
        geometry: &TextBoxGeometry,
        text: &str,
        style: &CaptionStyle,
    ) -> AppResult<Option<ItemHandle>> {
        let result = match self {
            CaptionPlacer::Scripted => place_scripted(backend, page, geometry, text, style).await.map(Some),
            CaptionPlacer::Pointer { driver, settle_ms } => {
                place_with_pointer(&mut **driver, geometry, text, *settle_ms).await.map(|_| None)
            }
        };
        result.map_err(|e| match e {
            AppError::Placement(_) => e,
            other => AppError::text_placement(other.to_string()),
        })
    }
}

/// 脚本方式创建文本框
pub async fn place_scripted<B: DocumentBackend>(
    backend: &mut B,
    page: PageHandle,
    geometry: &TextBoxGeometry,
    text: &str,
    style: &CaptionStyle,
) -> AppResult<ItemHandle> {
    let item = backend.add_text_frame(page, geometry.rect).await?;
    backend.set_font(item, &style.font_name, style.font_size).await?;
    if let Some(color) = &style.fill_color {
        backend.set_fill_color(item, color).await?;
    }
    backend.type_text(item, text).await?;
    debug!(
        "文本框已创建: font={:?}, size={}, color={:?}",
        style.font_name, style.font_size, style.fill_color
    );
    Ok(item)
}

/// 指针方式创建文本框
///
/// 每个改变界面的步骤之后等待 `settle_ms` 毫秒。
pub async fn place_with_pointer<D: InputDriver>(
    driver: &mut D,
    geometry: &TextBoxGeometry,
    text: &str,
    settle_ms: u64,
) -> AppResult<()> {
    info!("通过模拟输入创建文本框...");
    settle(settle_ms * 2).await;

    driver.key_press("t").await?;
    settle(settle_ms).await;

    driver.drag(geometry.top_left(), geometry.bottom_right(), DRAG_SEC).await?;
    settle(settle_ms).await;

    driver.move_to(geometry.center.x, geometry.center.y, APPROACH_SEC).await?;
    driver.click().await?;
    settle(settle_ms).await;

    driver.type_text(text, TYPE_INTERVAL_SEC).await?;
    info!("文字输入完成");
    Ok(())
}

/// 行距：字号 x 行高倍数 x 行距缩减系数
pub fn leading_for(style: &CaptionStyle, line_height: f64, leading_decrease: f64) -> f64 {
    style.font_size * line_height * leading_decrease
}

/// 所有批次完成后统一设置行距，返回成功设置的文本框数量
///
/// 指针方式创建的文本框没有句柄，跳过。单个失败只记录警告。
pub async fn apply_leading<B: DocumentBackend>(
    backend: &mut B,
    frames: &[CaptionFrame],
    line_height: f64,
    leading_decrease: f64,
) -> usize {
    let mut applied = 0;
    for frame in frames {
        let Some(item) = frame.item else {
            debug!("[{}] 文本框没有句柄，跳过行距调整", frame.batch);
            continue;
        };
        let leading = leading_for(&frame.style, line_height, leading_decrease);
        match backend.set_leading(item, leading).await {
            Ok(()) => applied += 1,
            Err(e) => warn!("[{}] 设置行距失败: {}", frame.batch, e),
        }
    }
    applied
}
