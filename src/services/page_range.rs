//! 页面拆分与合并 - 业务能力层
//!
//! 拆分：以拆分页为界，把文档复制成"前段"和"后段"两个新文档，拆分页本身不在其中。
//! 合并：按顺序把多个片段的页面复制进一个新文档，最后删掉开头的占位页。
//!
//! 页面总是复制而不是移动，输出和来源不共享任何内容。

use std::ops::RangeInclusive;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, MergeError, RangeError};
use crate::infrastructure::backend::{DocumentBackend, DocumentHandle, PageHandle};

/// 拆分或抽取得到的文档片段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    pub doc: DocumentHandle,
    /// 真实内容页数；为 0 时文档里只有一张占位页
    pub page_count: usize,
}

impl Fragment {
    pub fn is_empty(&self) -> bool {
        self.page_count == 0
    }
}

/// 拆分结果
#[derive(Debug, Clone, Copy)]
pub struct SplitResult {
    /// 第 1 页到拆分页前一页
    pub prefix: Fragment,
    /// 拆分页后一页到最后一页
    pub suffix: Fragment,
}

/// 页面拆分器
pub struct PageRangeSplitter;

impl PageRangeSplitter {
    /// 检查拆分页是否位于 [1, page_count]
    pub fn validate_pivot(pivot: i64, page_count: usize) -> AppResult<usize> {
        if pivot < 1 || pivot as u64 > page_count as u64 {
            return Err(RangeError::PivotOutOfRange { pivot, page_count }.into());
        }
        Ok(pivot as usize)
    }

    /// 以 `pivot`（从 1 开始）为界拆分文档
    ///
    /// 拆分页非法时在创建任何文档之前返回 RangeError
    pub async fn split<B: DocumentBackend>(
        backend: &mut B,
        source: DocumentHandle,
        pivot: i64,
    ) -> AppResult<SplitResult> {
        let total = backend.page_count(source).await?;
        let pivot = Self::validate_pivot(pivot, total)?;

        info!("📄 拆分文档: 共 {} 页，拆分页 {}", total, pivot);

        let prefix = Self::copy_range(backend, source, 1..=pivot - 1).await?;
        let suffix = Self::copy_range(backend, source, pivot + 1..=total).await?;

        debug!(
            "拆分完成: 前段 {} 页，后段 {} 页",
            prefix.page_count, suffix.page_count
        );
        Ok(SplitResult { prefix, suffix })
    }

    /// 把第 `index` 页单独复制成一个片段
    pub async fn extract_page<B: DocumentBackend>(
        backend: &mut B,
        source: DocumentHandle,
        index: usize,
    ) -> AppResult<Fragment> {
        let total = backend.page_count(source).await?;
        if index < 1 || index > total {
            return Err(RangeError::PageOutOfRange {
                index,
                page_count: total,
            }
            .into());
        }
        Self::copy_range(backend, source, index..=index).await
    }

    /// 把来源文档的一段页面复制进新文档
    ///
    /// 范围为空时新文档保留占位页
    async fn copy_range<B: DocumentBackend>(
        backend: &mut B,
        source: DocumentHandle,
        range: RangeInclusive<usize>,
    ) -> AppResult<Fragment> {
        let doc = backend.new_document().await?;
        let placeholder = backend.page(doc, 1).await?;
        let mut last = placeholder;
        let mut copied = 0;

        for index in range {
            let page = backend.page(source, index).await?;
            last = backend.duplicate_page(page, last).await?;
            copied += 1;
        }

        if copied > 0 {
            backend.delete_page(placeholder).await?;
        }

        Ok(Fragment {
            doc,
            page_count: copied,
        })
    }
}

/// 文档合并器
pub struct DocumentMerger;

impl DocumentMerger {
    /// 新建文档并按顺序合并所有片段
    ///
    /// 每个片段复制完后即被关闭。合并失败时部分结果也会被关闭；
    /// 需要保留部分结果的调用方应改用 `new_target` + `merge_into` + `finish`。
    pub async fn merge<B: DocumentBackend>(
        backend: &mut B,
        fragments: Vec<Fragment>,
    ) -> AppResult<DocumentHandle> {
        let merged = Self::new_target(backend).await?;

        if let Err(e) = Self::merge_into(backend, merged, fragments).await {
            if let Err(close_err) = backend.close(merged).await {
                warn!("关闭未完成的合并文档失败: {}", close_err);
            }
            return Err(e);
        }

        Self::finish(backend, merged).await?;
        Ok(merged)
    }

    /// 新建只含一张占位页的合并目标
    pub async fn new_target<B: DocumentBackend>(backend: &mut B) -> AppResult<DocumentHandle> {
        backend.new_document().await
    }

    /// 合并完成后删掉开头的占位页（文档多于一页时）
    pub async fn finish<B: DocumentBackend>(
        backend: &mut B,
        target: DocumentHandle,
    ) -> AppResult<()> {
        if backend.page_count(target).await? > 1 {
            let placeholder = backend.page(target, 1).await?;
            backend.delete_page(placeholder).await?;
        }

        info!("✓ 合并完成，共 {} 页", backend.page_count(target).await?);
        Ok(())
    }

    /// 把片段依次追加到 `target` 末尾
    ///
    /// 某个片段失败时立即返回 MergeError，之前已合并的内容保留在 `target` 中，
    /// 失败的片段和尚未处理的片段都会被关闭。
    pub async fn merge_into<B: DocumentBackend>(
        backend: &mut B,
        target: DocumentHandle,
        fragments: Vec<Fragment>,
    ) -> AppResult<()> {
        let mut pending = fragments.into_iter().enumerate();

        while let Some((i, fragment)) = pending.next() {
            let number = i + 1;
            if let Err(e) = Self::merge_fragment(backend, target, fragment, number).await {
                warn!("片段 {} 合并失败: {}", number, e);
                if backend.close(fragment.doc).await.is_err() {
                    debug!("片段 {} 已不可用", number);
                }
                for (_, rest) in pending.by_ref() {
                    if let Err(close_err) = backend.close(rest.doc).await {
                        warn!("关闭未合并的片段失败: {}", close_err);
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// 复制单个片段的全部页面并关闭它
    ///
    /// 片段级的失败（读取页数、关闭）记为第 0 页
    async fn merge_fragment<B: DocumentBackend>(
        backend: &mut B,
        target: DocumentHandle,
        fragment: Fragment,
        number: usize,
    ) -> AppResult<()> {
        let copy_failed = |page: usize, e: AppError| -> AppError {
            MergeError::CopyFailed {
                fragment: number,
                page,
                reason: e.to_string(),
            }
            .into()
        };

        if fragment.is_empty() {
            debug!("片段 {} 没有内容页，跳过", number);
            return backend.close(fragment.doc).await.map_err(|e| copy_failed(0, e));
        }

        let count = backend
            .page_count(fragment.doc)
            .await
            .map_err(|e| copy_failed(0, e))?;
        for index in 1..=count {
            Self::copy_page(backend, fragment.doc, target, index)
                .await
                .map_err(|e| copy_failed(index, e))?;
        }

        debug!("片段 {} 已合并 ({} 页)", number, count);
        backend.close(fragment.doc).await.map_err(|e| copy_failed(0, e))
    }

    /// 合并磁盘上的多个文档并保存到 `output`
    pub async fn merge_files<B: DocumentBackend>(
        backend: &mut B,
        paths: &[&Path],
        output: &Path,
    ) -> AppResult<()> {
        if paths.is_empty() {
            return Err(MergeError::NoFragments.into());
        }

        let mut fragments = Vec::with_capacity(paths.len());
        for path in paths {
            let opened = backend.open(path).await;
            let doc = match opened {
                Ok(doc) => doc,
                Err(e) => {
                    warn!("打开片段失败 {}: {}", path.display(), e);
                    for fragment in fragments {
                        let Fragment { doc, .. } = fragment;
                        backend.close(doc).await?;
                    }
                    return Err(MergeError::OpenFailed {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    }
                    .into());
                }
            };
            let page_count = backend.page_count(doc).await?;
            fragments.push(Fragment { doc, page_count });
        }

        let merged = Self::merge(backend, fragments).await?;
        backend.save(merged, output).await?;
        backend.close(merged).await?;

        info!("合并后的文档已保存至: {}", output.display());
        Ok(())
    }

    async fn copy_page<B: DocumentBackend>(
        backend: &mut B,
        source: DocumentHandle,
        target: DocumentHandle,
        index: usize,
    ) -> AppResult<PageHandle> {
        let page = backend.page(source, index).await?;
        let count = backend.page_count(target).await?;
        let last = backend.page(target, count).await?;
        backend.duplicate_page(page, last).await
    }
}
