//! 空白页查找 - 业务能力层

use tracing::debug;

use crate::error::AppResult;
use crate::infrastructure::backend::{DocumentBackend, DocumentHandle, PageHandle};

/// 查找第一张没有任何项目的页面
///
/// `preferred` 合法（1 ≤ preferred ≤ 页数）且该页为空时直接返回它，
/// 否则按页码升序扫描。全部有内容时返回 None，由调用方追加新页。
pub async fn find_empty_page<B: DocumentBackend>(
    backend: &mut B,
    doc: DocumentHandle,
    preferred: Option<usize>,
) -> AppResult<Option<PageHandle>> {
    let count = backend.page_count(doc).await?;

    if let Some(index) = preferred.filter(|i| (1..=count).contains(i)) {
        let page = backend.page(doc, index).await?;
        if backend.item_count(page).await? == 0 {
            debug!("使用指定页 {}", index);
            return Ok(Some(page));
        }
        debug!("指定页 {} 已有内容，改为顺序查找", index);
    }

    for index in 1..=count {
        let page = backend.page(doc, index).await?;
        if backend.item_count(page).await? == 0 {
            debug!("找到空白页 {}", index);
            return Ok(Some(page));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryBackend;
    use crate::models::geometry::Rect;

    /// 新建 n 页文档，`filled` 中的页码放一个项目
    async fn document_with(backend: &mut MemoryBackend, n: usize, filled: &[usize]) -> DocumentHandle {
        let doc = backend.new_document().await.unwrap();
        for _ in 1..n {
            backend.add_page(doc).await.unwrap();
        }
        for &index in filled {
            let page = backend.page(doc, index).await.unwrap();
            backend
                .add_rectangle(page, Rect::new(0.0, 0.0, 1.0, 1.0))
                .await
                .unwrap();
        }
        doc
    }

    async fn position(backend: &mut MemoryBackend, doc: DocumentHandle, page: PageHandle) -> usize {
        let count = backend.page_count(doc).await.unwrap();
        for i in 1..=count {
            if backend.page(doc, i).await.unwrap() == page {
                return i;
            }
        }
        panic!("页面不在文档中");
    }

    #[tokio::test]
    async fn test_preferred_empty_page_wins() {
        let mut backend = MemoryBackend::new();
        let doc = document_with(&mut backend, 5, &[1]).await;

        let page = find_empty_page(&mut backend, doc, Some(4)).await.unwrap().unwrap();
        assert_eq!(position(&mut backend, doc, page).await, 4);
    }

    #[tokio::test]
    async fn test_falls_back_to_scan() {
        let mut backend = MemoryBackend::new();
        let doc = document_with(&mut backend, 4, &[1, 2, 4]).await;

        // 指定页有内容
        let page = find_empty_page(&mut backend, doc, Some(4)).await.unwrap().unwrap();
        assert_eq!(position(&mut backend, doc, page).await, 3);

        // 指定页越界
        let page = find_empty_page(&mut backend, doc, Some(9)).await.unwrap().unwrap();
        assert_eq!(position(&mut backend, doc, page).await, 3);

        let page = find_empty_page(&mut backend, doc, None).await.unwrap().unwrap();
        assert_eq!(position(&mut backend, doc, page).await, 3);
    }

    #[tokio::test]
    async fn test_none_when_all_pages_have_content() {
        let mut backend = MemoryBackend::new();
        let doc = document_with(&mut backend, 2, &[1, 2]).await;

        assert_eq!(find_empty_page(&mut backend, doc, Some(1)).await.unwrap(), None);
        assert_eq!(find_empty_page(&mut backend, doc, Some(0)).await.unwrap(), None);
    }
}
