//! 内存文档后端 - 基础设施层
//!
//! 在进程内维护 Document 模型，保存/打开时读写 JSON 文件。

use std::collections::HashMap;
use std::path::Path;

use tokio::fs;
use tracing::debug;

use crate::error::{AppError, AppResult, BackendError};
use crate::infrastructure::backend::{DocumentBackend, DocumentHandle, ItemHandle, PageHandle};
use crate::models::document::{
    Document, ItemKind, Page, PlacedItem, DEFAULT_PAGE_HEIGHT, DEFAULT_PAGE_WIDTH,
};
use crate::models::geometry::Rect;

/// 内存文档后端
pub struct MemoryBackend {
    documents: HashMap<u64, Document>,
    next_handle: u64,
    page_width: f64,
    page_height: f64,
    /// 放置图片前检查文件是否存在
    verify_image_paths: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_WIDTH, DEFAULT_PAGE_HEIGHT)
    }

    /// 指定新建文档的页面尺寸
    pub fn with_page_size(page_width: f64, page_height: f64) -> Self {
        Self {
            documents: HashMap::new(),
            next_handle: 1,
            page_width,
            page_height,
            verify_image_paths: true,
        }
    }

    pub fn verify_image_paths(mut self, verify: bool) -> Self {
        self.verify_image_paths = verify;
        self
    }

    /// 在会话中直接登记一份文档
    pub fn insert_document(&mut self, document: Document) -> DocumentHandle {
        let handle = DocumentHandle(self.next_handle);
        self.next_handle += 1;
        self.documents.insert(handle.0, document);
        handle
    }

    /// 读取文档快照
    pub fn document(&self, doc: DocumentHandle) -> Option<&Document> {
        self.documents.get(&doc.0)
    }

    /// 当前打开的文档数量
    pub fn open_count(&self) -> usize {
        self.documents.len()
    }

    fn doc(&self, doc: DocumentHandle) -> AppResult<&Document> {
        self.documents
            .get(&doc.0)
            .ok_or_else(|| BackendError::InvalidHandle(format!("文档 {}", doc.0)).into())
    }

    fn doc_mut(&mut self, doc: DocumentHandle) -> AppResult<&mut Document> {
        self.documents
            .get_mut(&doc.0)
            .ok_or_else(|| BackendError::InvalidHandle(format!("文档 {}", doc.0)).into())
    }

    fn page_ref(&self, page: PageHandle) -> AppResult<&Page> {
        self.doc(page.document)?
            .page_by_id(page.id)
            .ok_or_else(|| BackendError::InvalidHandle(format!("页面 {}", page.id)).into())
    }

    fn page_mut(&mut self, page: PageHandle) -> AppResult<&mut Page> {
        self.doc_mut(page.document)?
            .page_by_id_mut(page.id)
            .ok_or_else(|| BackendError::InvalidHandle(format!("页面 {}", page.id)).into())
    }

    fn item_mut(&mut self, item: ItemHandle) -> AppResult<&mut PlacedItem> {
        self.page_mut(item.page)?
            .items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or_else(|| BackendError::InvalidHandle(format!("项目 {}", item.id)).into())
    }

    fn add_item(&mut self, page: PageHandle, kind: ItemKind, bounds: Rect) -> AppResult<ItemHandle> {
        let doc = self.doc_mut(page.document)?;
        let id = doc.allocate_id();
        let target = doc
            .page_by_id_mut(page.id)
            .ok_or_else(|| AppError::from(BackendError::InvalidHandle(format!("页面 {}", page.id))))?;
        target.items.push(PlacedItem::new(id, kind, bounds));
        Ok(ItemHandle { page, id })
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBackend for MemoryBackend {
    async fn open(&mut self, path: &Path) -> AppResult<DocumentHandle> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| BackendError::OpenFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        let document: Document =
            serde_json::from_str(&content).map_err(|e| BackendError::OpenFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        debug!("打开文档 {} ({} 页)", path.display(), document.page_count());
        Ok(self.insert_document(document))
    }

    async fn new_document(&mut self) -> AppResult<DocumentHandle> {
        let name = format!("未命名-{}", self.next_handle);
        let document = Document::new(name, self.page_width, self.page_height);
        Ok(self.insert_document(document))
    }

    async fn save(&mut self, doc: DocumentHandle, path: &Path) -> AppResult<()> {
        let document = self.doc(doc)?;
        let content = serde_json::to_string_pretty(document)?;
        fs::write(path, content)
            .await
            .map_err(|e| BackendError::SaveFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        debug!("文档已保存: {}", path.display());
        Ok(())
    }

    async fn close(&mut self, doc: DocumentHandle) -> AppResult<()> {
        self.documents
            .remove(&doc.0)
            .map(|_| ())
            .ok_or_else(|| BackendError::InvalidHandle(format!("文档 {}", doc.0)).into())
    }

    async fn page_count(&mut self, doc: DocumentHandle) -> AppResult<usize> {
        Ok(self.doc(doc)?.page_count())
    }

    async fn page(&mut self, doc: DocumentHandle, index: usize) -> AppResult<PageHandle> {
        let document = self.doc(doc)?;
        let page = index
            .checked_sub(1)
            .and_then(|i| document.pages.get(i))
            .ok_or_else(|| BackendError::InvalidHandle(format!("页码 {}", index)))?;
        Ok(PageHandle {
            document: doc,
            id: page.id,
        })
    }

    async fn page_size(&mut self, doc: DocumentHandle) -> AppResult<(f64, f64)> {
        let document = self.doc(doc)?;
        Ok((document.page_width, document.page_height))
    }

    async fn add_page(&mut self, doc: DocumentHandle) -> AppResult<PageHandle> {
        let id = self.doc_mut(doc)?.append_page();
        Ok(PageHandle { document: doc, id })
    }

    async fn delete_page(&mut self, page: PageHandle) -> AppResult<()> {
        if self.doc_mut(page.document)?.remove_page(page.id) {
            Ok(())
        } else {
            Err(BackendError::InvalidHandle(format!("页面 {}", page.id)).into())
        }
    }

    async fn duplicate_page(&mut self, source: PageHandle, after: PageHandle) -> AppResult<PageHandle> {
        let copy = self.page_ref(source)?.clone();
        let id = self
            .doc_mut(after.document)?
            .insert_copy_after(&copy, after.id)
            .ok_or_else(|| BackendError::InvalidHandle(format!("页面 {}", after.id)))?;
        Ok(PageHandle {
            document: after.document,
            id,
        })
    }

    async fn add_rectangle(&mut self, page: PageHandle, bounds: Rect) -> AppResult<ItemHandle> {
        self.add_item(page, ItemKind::Image, bounds)
    }

    async fn place_image(&mut self, item: ItemHandle, path: &Path) -> AppResult<()> {
        if self.verify_image_paths && !path.is_file() {
            return Err(AppError::image_placement(
                path.display().to_string(),
                "文件不存在",
            ));
        }
        self.item_mut(item)?.content = Some(path.display().to_string());
        Ok(())
    }

    async fn add_text_frame(&mut self, page: PageHandle, bounds: Rect) -> AppResult<ItemHandle> {
        self.add_item(page, ItemKind::Text, bounds)
    }

    async fn set_font(&mut self, item: ItemHandle, font_name: &str, size: f64) -> AppResult<()> {
        let target = self.item_mut(item)?;
        target.style.font_name = Some(font_name.to_string());
        target.style.font_size = Some(size);
        Ok(())
    }

    async fn set_fill_color(&mut self, item: ItemHandle, color_name: &str) -> AppResult<()> {
        self.item_mut(item)?.style.fill_color = Some(color_name.to_string());
        Ok(())
    }

    async fn set_leading(&mut self, item: ItemHandle, leading: f64) -> AppResult<()> {
        self.item_mut(item)?.style.leading = Some(leading);
        Ok(())
    }

    async fn type_text(&mut self, item: ItemHandle, text: &str) -> AppResult<()> {
        let target = self.item_mut(item)?;
        let mut content = target.content.take().unwrap_or_default();
        content.push_str(text);
        target.content = Some(content);
        Ok(())
    }

    async fn item_count(&mut self, page: PageHandle) -> AppResult<usize> {
        Ok(self.page_ref(page)?.items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        let image = dir.path().join("a.jpg");
        std::fs::write(&image, b"").unwrap();

        let mut backend = MemoryBackend::with_page_size(500.0, 700.0);
        let doc = backend.new_document().await.unwrap();
        let page = backend.page(doc, 1).await.unwrap();
        let item = backend
            .add_rectangle(page, Rect::new(0.0, 0.0, 700.0, 500.0))
            .await
            .unwrap();
        backend.place_image(item, &image).await.unwrap();
        backend.save(doc, &path).await.unwrap();
        backend.close(doc).await.unwrap();
        assert_eq!(backend.open_count(), 0);

        let reopened = backend.open(&path).await.unwrap();
        assert_eq!(backend.page_count(reopened).await.unwrap(), 1);
        assert_eq!(backend.page_size(reopened).await.unwrap(), (500.0, 700.0));
        let page = backend.page(reopened, 1).await.unwrap();
        assert_eq!(backend.item_count(page).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_place_missing_image_is_placement_error() {
        let mut backend = MemoryBackend::new();
        let doc = backend.new_document().await.unwrap();
        let page = backend.page(doc, 1).await.unwrap();
        let item = backend
            .add_rectangle(page, Rect::new(0.0, 0.0, 10.0, 10.0))
            .await
            .unwrap();

        let err = backend
            .place_image(item, Path::new("/nonexistent/missing.jpg"))
            .await
            .unwrap_err();
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_open_missing_file_is_fatal() {
        let mut backend = MemoryBackend::new();
        let err = backend
            .open(Path::new("/nonexistent/template.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Backend(BackendError::OpenFailed { .. })));
    }

    #[tokio::test]
    async fn test_page_index_is_one_based() {
        let mut backend = MemoryBackend::new();
        let doc = backend.new_document().await.unwrap();
        assert!(backend.page(doc, 0).await.is_err());
        assert!(backend.page(doc, 1).await.is_ok());
        assert!(backend.page(doc, 2).await.is_err());
    }

    #[tokio::test]
    async fn test_text_frame_styling() {
        let mut backend = MemoryBackend::new();
        let doc = backend.new_document().await.unwrap();
        let page = backend.page(doc, 1).await.unwrap();
        let item = backend
            .add_text_frame(page, Rect::new(10.0, 10.0, 50.0, 200.0))
            .await
            .unwrap();
        backend.set_font(item, "Arial\tRegular", 24.0).await.unwrap();
        backend.set_fill_color(item, "Red").await.unwrap();
        backend.type_text(item, "摄影: 张三").await.unwrap();

        let placed = &backend.document(doc).unwrap().pages[0].items[0];
        assert_eq!(placed.kind, ItemKind::Text);
        assert_eq!(placed.content.as_deref(), Some("摄影: 张三"));
        assert_eq!(placed.style.font_size, Some(24.0));
        assert_eq!(placed.style.fill_color.as_deref(), Some("Red"));
    }
}
