//! 文档后端 - 基础设施层
//!
//! 描述排版软件对外暴露的最小能力集合。
//! 所有调用都是阻塞语义：同一时刻只有一个调用在修改文档，
//! 由 `&mut self` 保证整个会话只有一个使用者。

use std::path::Path;

use crate::error::AppResult;
use crate::models::geometry::Rect;

/// 文档句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentHandle(pub u64);

/// 页面句柄（不随页码变化）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageHandle {
    pub document: DocumentHandle,
    pub id: u64,
}

/// 页面项目句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemHandle {
    pub page: PageHandle,
    pub id: u64,
}

/// 文档后端
///
/// 页码从 1 开始。新建文档自带一张占位页。
#[allow(async_fn_in_trait)]
pub trait DocumentBackend {
    /// 打开已有文档
    async fn open(&mut self, path: &Path) -> AppResult<DocumentHandle>;

    /// 新建文档（含一张空白占位页）
    async fn new_document(&mut self) -> AppResult<DocumentHandle>;

    /// 保存文档到指定路径
    async fn save(&mut self, doc: DocumentHandle, path: &Path) -> AppResult<()>;

    /// 关闭文档，不保存
    async fn close(&mut self, doc: DocumentHandle) -> AppResult<()>;

    async fn page_count(&mut self, doc: DocumentHandle) -> AppResult<usize>;

    /// 获取第 `index` 页（从 1 开始）
    async fn page(&mut self, doc: DocumentHandle, index: usize) -> AppResult<PageHandle>;

    /// 页面宽高
    async fn page_size(&mut self, doc: DocumentHandle) -> AppResult<(f64, f64)>;

    /// 在文档末尾追加一页
    async fn add_page(&mut self, doc: DocumentHandle) -> AppResult<PageHandle>;

    async fn delete_page(&mut self, page: PageHandle) -> AppResult<()>;

    /// 把 `source` 深拷贝到 `after` 所在文档，插在 `after` 之后
    async fn duplicate_page(&mut self, source: PageHandle, after: PageHandle) -> AppResult<PageHandle>;

    async fn add_rectangle(&mut self, page: PageHandle, bounds: Rect) -> AppResult<ItemHandle>;

    async fn place_image(&mut self, item: ItemHandle, path: &Path) -> AppResult<()>;

    async fn add_text_frame(&mut self, page: PageHandle, bounds: Rect) -> AppResult<ItemHandle>;

    async fn set_font(&mut self, item: ItemHandle, font_name: &str, size: f64) -> AppResult<()>;

    async fn set_fill_color(&mut self, item: ItemHandle, color_name: &str) -> AppResult<()>;

    /// 设置行距（pt）
    async fn set_leading(&mut self, item: ItemHandle, leading: f64) -> AppResult<()>;

    async fn type_text(&mut self, item: ItemHandle, text: &str) -> AppResult<()>;

    async fn item_count(&mut self, page: PageHandle) -> AppResult<usize>;
}
