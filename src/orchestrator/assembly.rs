//! 排版总流程 - 编排层
//!
//! 一次运行的完整顺序：
//! 1. 检查配置，扫描图片批次
//! 2. 打开模板，确定说明文字区域
//! 3. 以拆分页为界拆出 start / finish 两段并保存，抽出拆分页作为工作文档
//! 4. 逐批排版（BatchFlow）
//! 5. 统一调整所有文本框的行距
//! 6. 按 start + 工作文档 + finish 合并并保存
//!
//! 拆分页非法、缺少必需配置、后端无法打开/保存都会中止运行；
//! 单张图片或文本框失败只记录并继续。
//! 中止时关闭所有仍打开的文档；合并中断时已合并的部分照样写到输出路径。

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError};
use crate::infrastructure::backend::{DocumentBackend, DocumentHandle};
use crate::infrastructure::input_driver::{InputDriver, RegionSelector};
use crate::models::caption::CaptionMode;
use crate::models::geometry::Region;
use crate::models::loaders::load_image_batches;
use crate::models::project::ImageBatch;
use crate::services::caption_placer::{apply_leading, CaptionFrame, CaptionPlacer};
use crate::services::page_range::{DocumentMerger, Fragment, PageRangeSplitter, SplitResult};
use crate::utils::logging::{log_batch_complete, log_batch_start, log_batches_loaded};
use crate::workflow::{BatchCtx, BatchFlow};

/// 一次运行的结果
#[derive(Debug, Clone, Default)]
pub struct AssemblyReport {
    pub output_path: PathBuf,
    pub batches: usize,
    pub pages_used: usize,
    pub images_placed: usize,
    pub images_skipped: usize,
    /// 本次创建的所有文本框，顺序与批次一致
    pub captions: Vec<CaptionFrame>,
    /// 成功设置行距的文本框数量
    pub leading_applied: usize,
}

/// 拆分后的三段
struct Prepared {
    split: SplitResult,
    working: Fragment,
    region: Region,
}

/// 排版总调度
///
/// 持有配置和唯一的后端会话；输入驱动和区域选择器可选。
pub struct AssemblyOrchestrator<'a, B, D, S>
where
    B: DocumentBackend,
    D: InputDriver,
    S: RegionSelector,
{
    config: Config,
    backend: &'a mut B,
    driver: Option<&'a mut D>,
    selector: Option<&'a mut S>,
}

impl<'a, B, D, S> AssemblyOrchestrator<'a, B, D, S>
where
    B: DocumentBackend,
    D: InputDriver,
    S: RegionSelector,
{
    pub fn new(
        config: Config,
        backend: &'a mut B,
        driver: Option<&'a mut D>,
        selector: Option<&'a mut S>,
    ) -> Self {
        Self {
            config,
            backend,
            driver,
            selector,
        }
    }

    /// 运行过程中可能写回了标定区域
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 执行一次完整的排版
    pub async fn run(&mut self) -> AppResult<AssemblyReport> {
        self.config.validate()?;
        let pivot = self.config.split_page()?;

        if self.config.caption_mode == CaptionMode::Pointer && self.driver.is_none() {
            return Err(ConfigError::InvalidValue {
                key: "caption_mode".to_string(),
                value: "pointer（没有连接输入设备）".to_string(),
            }
            .into());
        }

        let project_dir = self.config.project_dir()?.to_path_buf();
        info!("\n📁 正在扫描图片批次...");
        let batches = load_image_batches(&project_dir, &self.config.credits_file).await?;
        let image_total: usize = batches.iter().map(|b| b.images.len()).sum();
        log_batches_loaded(batches.len(), image_total);

        let mut report = AssemblyReport {
            output_path: self.config.output_path()?,
            batches: batches.len(),
            ..Default::default()
        };

        let template_path = self.config.template_path()?;
        let template = self.backend.open(&template_path).await?;
        info!("✓ 已打开模板: {}", template_path.display());

        let prepared = match self.prepare(template, pivot).await {
            Ok(prepared) => prepared,
            Err(e) => {
                if let Err(close_err) = self.backend.close(template).await {
                    warn!("关闭模板失败: {}", close_err);
                }
                return Err(e);
            }
        };
        if let Err(e) = self.backend.close(template).await {
            self.close_quietly(&[
                prepared.split.prefix.doc,
                prepared.working.doc,
                prepared.split.suffix.doc,
            ])
            .await;
            return Err(e);
        }

        let Prepared {
            split,
            working,
            region,
        } = prepared;

        let working = match self
            .place_batches(&batches, working.doc, region, pivot, &mut report)
            .await
        {
            Ok(working) => working,
            Err(e) => {
                self.close_quietly(&[split.prefix.doc, working.doc, split.suffix.doc])
                    .await;
                return Err(e);
            }
        };

        let merged = match DocumentMerger::new_target(&mut *self.backend).await {
            Ok(merged) => merged,
            Err(e) => {
                self.close_quietly(&[split.prefix.doc, working.doc, split.suffix.doc])
                    .await;
                return Err(e);
            }
        };
        if let Err(e) = DocumentMerger::merge_into(
            &mut *self.backend,
            merged,
            vec![split.prefix, working, split.suffix],
        )
        .await
        {
            match self.backend.save(merged, &report.output_path).await {
                Ok(()) => warn!(
                    "⚠️ 合并中断，已合并的部分保存至: {}",
                    report.output_path.display()
                ),
                Err(save_err) => warn!("保存未完成的合并文档失败: {}", save_err),
            }
            self.close_quietly(&[merged]).await;
            return Err(e);
        }

        if let Err(e) = self.write_output(merged, &report.output_path).await {
            self.close_quietly(&[merged]).await;
            return Err(e);
        }
        self.backend.close(merged).await?;
        info!("💾 输出已保存: {}", report.output_path.display());

        Ok(report)
    }

    /// 逐批排版并统一调整行距，返回排版完成的工作文档片段
    async fn place_batches(
        &mut self,
        batches: &[ImageBatch],
        working_doc: DocumentHandle,
        region: Region,
        pivot: i64,
        report: &mut AssemblyReport,
    ) -> AppResult<Fragment> {
        let preferred = working_page_index(self.config.target_page, pivot);
        let mut rng = match self.config.seed {
            Some(seed) => {
                info!("🎲 使用固定随机种子: {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_os_rng(),
        };

        let flow = BatchFlow::new(&self.config, region);
        let mut placer = match self.config.caption_mode {
            CaptionMode::Scripted => CaptionPlacer::Scripted,
            CaptionMode::Pointer => match self.driver.as_deref_mut() {
                Some(driver) => CaptionPlacer::Pointer {
                    driver,
                    settle_ms: self.config.settle_ms,
                },
                None => return Err(AppError::missing_key("browser_debug_port")),
            },
        };

        for (i, batch) in batches.iter().enumerate() {
            let ctx = BatchCtx::new(i + 1, batches.len(), batch.display_name());
            log_batch_start(ctx.batch_index, ctx.batch_total, &ctx.folder, batch.images.len());

            let outcome = flow
                .run(
                    &mut *self.backend,
                    &mut placer,
                    working_doc,
                    batch,
                    &ctx,
                    if ctx.is_first { preferred } else { None },
                    &mut rng,
                )
                .await
                .map_err(|e| {
                    error!("{} ❌ 批次处理失败: {}", ctx, e);
                    e
                })?;

            log_batch_complete(
                ctx.batch_index,
                outcome.images_placed,
                batch.images.len(),
                outcome.pages_used,
            );
            report.pages_used += outcome.pages_used;
            report.images_placed += outcome.images_placed;
            report.images_skipped += outcome.images_skipped;
            report.captions.extend(outcome.caption);
        }
        drop(placer);

        report.leading_applied = apply_leading(
            &mut *self.backend,
            &report.captions,
            self.config.line_height,
            self.config.leading_decrease,
        )
        .await;
        info!(
            "✓ 行距调整完成: {}/{} 个文本框",
            report.leading_applied,
            report.captions.len()
        );

        Ok(Fragment {
            doc: working_doc,
            page_count: self.backend.page_count(working_doc).await?,
        })
    }

    async fn write_output(&mut self, merged: DocumentHandle, output: &Path) -> AppResult<()> {
        DocumentMerger::finish(&mut *self.backend, merged).await?;
        self.backend.save(merged, output).await
    }

    /// 出错时关闭仍然打开的文档，关闭失败只记录
    async fn close_quietly(&mut self, docs: &[DocumentHandle]) {
        for &doc in docs {
            if let Err(e) = self.backend.close(doc).await {
                warn!("关闭文档失败: {}", e);
            }
        }
    }

    /// 确定区域、拆分模板、保存前后两段、抽出工作页
    ///
    /// 拆分页非法时不会创建任何文档
    async fn prepare(&mut self, template: DocumentHandle, pivot: i64) -> AppResult<Prepared> {
        let page_count = self.backend.page_count(template).await?;
        PageRangeSplitter::validate_pivot(pivot, page_count)?;

        let region = self.resolve_region(template).await?;

        let split = PageRangeSplitter::split(&mut *self.backend, template, pivot).await?;
        let working = match self.save_fragments_and_extract(template, pivot, &split).await {
            Ok(working) => working,
            Err(e) => {
                self.close_quietly(&[split.prefix.doc, split.suffix.doc]).await;
                return Err(e);
            }
        };

        Ok(Prepared {
            split,
            working,
            region,
        })
    }

    /// 保存 start / finish 两段，再抽出拆分页
    async fn save_fragments_and_extract(
        &mut self,
        template: DocumentHandle,
        pivot: i64,
        split: &SplitResult,
    ) -> AppResult<Fragment> {
        let (start_path, finish_path) = self.config.fragment_paths()?;
        self.backend.save(split.prefix.doc, &start_path).await?;
        self.backend.save(split.suffix.doc, &finish_path).await?;
        info!(
            "✓ 拆分完成: start {} 页 → {}，finish {} 页 → {}",
            split.prefix.page_count,
            start_path.display(),
            split.suffix.page_count,
            finish_path.display()
        );

        PageRangeSplitter::extract_page(&mut *self.backend, template, pivot as usize).await
    }

    /// 说明文字区域
    ///
    /// 优先级：比例坐标 → 绝对坐标 → 交互选择（结果写回配置文件）。
    /// 比例坐标的参照尺寸：脚本方式为页面尺寸，指针方式为屏幕/视口尺寸。
    async fn resolve_region(&mut self, template: DocumentHandle) -> AppResult<Region> {
        let ratio = match (self.config.ratio_region(), self.config.absolute_region()) {
            (Some(ratio), _) => ratio,
            (None, Some(region)) => {
                region.validate()?;
                info!("使用配置中的绝对坐标区域");
                return Ok(region);
            }
            (None, None) => {
                let Some(selector) = self.selector.as_deref_mut() else {
                    return Err(AppError::missing_key("text_frame_top_left_ratio"));
                };
                let ratio = selector.select_ratio_region().await?;
                self.config.set_ratio_region(&ratio);
                self.config.save(&self.config.config_path()?).await?;
                ratio
            }
        };

        let (width, height) = match (self.config.caption_mode, self.driver.as_deref_mut()) {
            (CaptionMode::Pointer, Some(driver)) => driver.extent().await?,
            _ => self.backend.page_size(template).await?,
        };
        let region = ratio.to_absolute(width, height);
        region.validate()?;
        info!(
            "说明文字区域: ({:.1}, {:.1}) - ({:.1}, {:.1})",
            region.left(),
            region.top(),
            region.right(),
            region.bottom()
        );
        Ok(region)
    }
}

/// 把原文档页码换算成工作文档页码
///
/// 工作文档的第 1 页就是拆分页；拆分页之前的页码无法对应，忽略。
pub fn working_page_index(target_page: Option<usize>, pivot: i64) -> Option<usize> {
    let target = target_page?;
    let pivot = usize::try_from(pivot).ok()?;
    if target >= pivot {
        Some(target - pivot + 1)
    } else {
        warn!("目标页 {} 位于拆分页 {} 之前，忽略", target, pivot);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_page_index() {
        assert_eq!(working_page_index(Some(8), 8), Some(1));
        assert_eq!(working_page_index(Some(10), 8), Some(3));
        assert_eq!(working_page_index(Some(3), 8), None);
        assert_eq!(working_page_index(None, 8), None);
    }
}
