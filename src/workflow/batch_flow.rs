//! 批次处理流程 - 流程层
//!
//! 核心职责：定义"一批图片"的完整排版流程
//!
//! 状态顺序：
//! 1. SelectingLayout：找空白页（找不到就追加），按剩余图片数选排版方式
//! 2. PlacingCells：计算单元格，每格放一张图片，游标前进
//! 3. PlacingCaption：只在本批第一页，且有说明文字时创建文本框
//! 4. 还有图片则回到 1，否则 Done

use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::backend::{DocumentBackend, DocumentHandle, PageHandle};
use crate::infrastructure::input_driver::InputDriver;
use crate::models::caption::{AnchorPolicy, CaptionSpec};
use crate::models::geometry::{Rect, Region};
use crate::models::layout::LayoutArrangement;
use crate::models::project::ImageBatch;
use crate::services::caption_placer::{CaptionFrame, CaptionPlacer, CaptionStyle};
use crate::services::empty_page::find_empty_page;
use crate::services::grid_geometry::build_cells;
use crate::services::layout_selector::LayoutSelector;
use crate::services::text_box::build_text_box;
use crate::utils::logging::truncate_text;
use crate::workflow::batch_ctx::BatchCtx;

/// 批次状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    SelectingLayout,
    PlacingCells(LayoutArrangement),
    PlacingCaption,
    Done,
}

/// 批次处理结果
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub pages_used: usize,
    pub images_placed: usize,
    pub images_skipped: usize,
    /// 本批创建的文本框（每批至多一个）
    pub caption: Option<CaptionFrame>,
}

/// 批次处理流程
///
/// - 编排单个批次的排版
/// - 不持有文档后端，调用方传入
/// - 只依赖业务能力（services）
pub struct BatchFlow {
    selector: LayoutSelector,
    region: Region,
    fonts: Vec<String>,
    colors: Vec<String>,
    anchors: Vec<AnchorPolicy>,
    font_size: f64,
    line_height: f64,
}

impl BatchFlow {
    /// `region` 是说明文字区域，坐标系与文本框的创建方式一致
    pub fn new(config: &Config, region: Region) -> Self {
        Self {
            selector: LayoutSelector::new(config.layout_weights()),
            region,
            fonts: config.credits_font.clone(),
            colors: config.credits_colors.clone(),
            anchors: config.text_box_position.clone(),
            font_size: config.credits_font_size,
            line_height: config.line_height,
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// 处理一批图片
    ///
    /// `preferred_page` 只用于本批的第一页，调用方负责只在第一批传入。
    /// 单张图片或文本框放置失败只记录日志，不中断本批。
    #[allow(clippy::too_many_arguments)]
    pub async fn run<B, D, R>(
        &self,
        backend: &mut B,
        placer: &mut CaptionPlacer<'_, D>,
        doc: DocumentHandle,
        batch: &ImageBatch,
        ctx: &BatchCtx,
        preferred_page: Option<usize>,
        rng: &mut R,
    ) -> AppResult<BatchOutcome>
    where
        B: DocumentBackend,
        D: InputDriver,
        R: Rng,
    {
        let (page_width, page_height) = backend.page_size(doc).await?;
        let total = batch.images.len();

        let mut outcome = BatchOutcome::default();
        let mut preferred = preferred_page;
        let mut cursor = 0;
        let mut caption_done = false;
        let mut page: Option<PageHandle> = None;
        let mut state = BatchState::SelectingLayout;

        loop {
            state = match state {
                BatchState::SelectingLayout => {
                    if cursor >= total {
                        BatchState::Done
                    } else {
                        page = Some(self.next_page(backend, doc, preferred.take(), ctx).await?);
                        let arrangement = self.selector.select(total - cursor, rng);
                        info!("{} 📐 剩余 {} 张，排版方式: {}", ctx, total - cursor, arrangement);
                        BatchState::PlacingCells(arrangement)
                    }
                }

                BatchState::PlacingCells(arrangement) => {
                    let target = current_page(page)?;
                    let cells = build_cells(page_width, page_height, arrangement)?;

                    for cell in cells.into_iter().take(total - cursor) {
                        let image = &batch.images[cursor];
                        match place_image(backend, target, cell, image).await {
                            Ok(()) => {
                                debug!("{} 已放置 {}", ctx, image.display());
                                outcome.images_placed += 1;
                            }
                            Err(e) => {
                                warn!("{} ⚠️ 跳过图片: {}", ctx, e);
                                outcome.images_skipped += 1;
                            }
                        }
                        cursor += 1;
                    }
                    outcome.pages_used += 1;

                    if outcome.pages_used == 1 && !caption_done {
                        BatchState::PlacingCaption
                    } else {
                        BatchState::SelectingLayout
                    }
                }

                BatchState::PlacingCaption => {
                    caption_done = true;
                    if let Some(text) = &batch.caption {
                        let target = current_page(page)?;
                        outcome.caption = self
                            .place_caption(backend, placer, target, text, ctx, rng)
                            .await?;
                    } else {
                        debug!("{} 没有说明文字", ctx);
                    }
                    BatchState::SelectingLayout
                }

                BatchState::Done => break,
            };
        }

        Ok(outcome)
    }

    /// 找到下一张空白页，没有就在末尾追加
    async fn next_page<B: DocumentBackend>(
        &self,
        backend: &mut B,
        doc: DocumentHandle,
        preferred: Option<usize>,
        ctx: &BatchCtx,
    ) -> AppResult<PageHandle> {
        match find_empty_page(backend, doc, preferred).await? {
            Some(page) => Ok(page),
            None => {
                debug!("{} 没有空白页，追加新页", ctx);
                backend.add_page(doc).await
            }
        }
    }

    /// 计算文本框并创建
    ///
    /// 放置失败只记录警告并返回 None；几何错误向上传递。
    async fn place_caption<B, D, R>(
        &self,
        backend: &mut B,
        placer: &mut CaptionPlacer<'_, D>,
        page: PageHandle,
        text: &str,
        ctx: &BatchCtx,
        rng: &mut R,
    ) -> AppResult<Option<CaptionFrame>>
    where
        B: DocumentBackend,
        D: InputDriver,
        R: Rng,
    {
        let style = CaptionStyle::choose(&self.fonts, &self.colors, &self.anchors, self.font_size, rng);
        let spec = CaptionSpec::new(text, style.font_size, style.anchor.clone())
            .with_line_height(self.line_height);
        let geometry = build_text_box(&self.region, &spec)?;
        debug!("{} 说明文字: {}", ctx, truncate_text(text, 30));

        info!(
            "{} 📝 说明文字 {} 行，锚定 {}，文本框 ({:.1}, {:.1}) - ({:.1}, {:.1})",
            ctx,
            spec.line_count(),
            style.anchor.as_str(),
            geometry.rect.left,
            geometry.rect.top,
            geometry.rect.right,
            geometry.rect.bottom
        );

        match placer.place(backend, page, &geometry, text, &style).await {
            Ok(item) => Ok(Some(CaptionFrame {
                batch: ctx.folder.clone(),
                mode: placer.mode(),
                item,
                rect: geometry.rect,
                line_count: spec.line_count(),
                style,
            })),
            Err(e) if !e.is_fatal() => {
                warn!("{} ⚠️ 说明文字放置失败: {}", ctx, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn current_page(page: Option<PageHandle>) -> AppResult<PageHandle> {
    page.ok_or_else(|| AppError::backend("current_page", "尚未选定页面"))
}

/// 在单元格中放一张图片，任何失败都归为放置错误
async fn place_image<B: DocumentBackend>(
    backend: &mut B,
    page: PageHandle,
    cell: Rect,
    image: &std::path::Path,
) -> AppResult<()> {
    let result = async {
        let item = backend.add_rectangle(page, cell).await?;
        backend.place_image(item, image).await
    }
    .await;

    result.map_err(|e| match e {
        AppError::Placement(_) => e,
        other => AppError::image_placement(image.display().to_string(), other.to_string()),
    })
}
