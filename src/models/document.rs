//! 文档数据模型
//!
//! Document 独占它的 Page，Page 独占它的 PlacedItem。
//! 页码（从 1 开始）在插入/删除页面后会变化，所以页面另有一个稳定的 id。

use serde::{Deserialize, Serialize};

use crate::models::geometry::Rect;

/// 默认页面宽度（pt）
pub const DEFAULT_PAGE_WIDTH: f64 = 612.0;
/// 默认页面高度（pt）
pub const DEFAULT_PAGE_HEIGHT: f64 = 792.0;

/// 已放置项目的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Image,
    Text,
}

/// 文本框样式
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leading: Option<f64>,
}

/// 页面上的一个项目（图片框或文本框）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub id: u64,
    pub kind: ItemKind,
    pub bounds: Rect,
    /// 图片路径或文本内容，空框为 None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub style: TextStyle,
}

impl PlacedItem {
    pub fn new(id: u64, kind: ItemKind, bounds: Rect) -> Self {
        Self {
            id,
            kind,
            bounds,
            content: None,
            style: TextStyle::default(),
        }
    }
}

/// 文档中的一页
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: u64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub items: Vec<PlacedItem>,
}

impl Page {
    pub fn new(id: u64, width: f64, height: f64) -> Self {
        Self {
            id,
            width,
            height,
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 页面内容指纹，用于按内容（而非对象）比较页面
    pub fn content_signature(&self) -> Vec<(ItemKind, Option<String>)> {
        self.items
            .iter()
            .map(|item| (item.kind, item.content.clone()))
            .collect()
    }
}

/// 有序页面序列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub page_width: f64,
    pub page_height: f64,
    pub pages: Vec<Page>,
    /// 下一个可用的页面/项目 id
    #[serde(default)]
    pub next_id: u64,
}

impl Document {
    /// 新建文档，自带一张空白占位页
    pub fn new(name: impl Into<String>, page_width: f64, page_height: f64) -> Self {
        let mut doc = Self {
            name: name.into(),
            page_width,
            page_height,
            pages: Vec::new(),
            next_id: 1,
        };
        let id = doc.allocate_id();
        doc.pages.push(Page::new(id, page_width, page_height));
        doc
    }

    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 按稳定 id 查找页面在序列中的下标（从 0 开始）
    pub fn position_of(&self, page_id: u64) -> Option<usize> {
        self.pages.iter().position(|p| p.id == page_id)
    }

    pub fn page_by_id(&self, page_id: u64) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == page_id)
    }

    pub fn page_by_id_mut(&mut self, page_id: u64) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == page_id)
    }

    /// 追加一张新页面，返回其 id
    pub fn append_page(&mut self) -> u64 {
        let id = self.allocate_id();
        self.pages
            .push(Page::new(id, self.page_width, self.page_height));
        id
    }

    /// 在 `after_id` 之后插入 `source` 的深拷贝，返回新页面 id
    ///
    /// 项目 id 全部重新分配，新页面不与来源共享任何内容
    pub fn insert_copy_after(&mut self, source: &Page, after_id: u64) -> Option<u64> {
        let position = self.position_of(after_id)?;
        let page_id = self.allocate_id();
        let mut copy = Page::new(page_id, source.width, source.height);
        for item in &source.items {
            let mut item = item.clone();
            item.id = self.allocate_id();
            copy.items.push(item);
        }
        self.pages.insert(position + 1, copy);
        Some(page_id)
    }

    /// 删除页面，返回是否存在
    pub fn remove_page(&mut self, page_id: u64) -> bool {
        match self.position_of(page_id) {
            Some(position) => {
                self.pages.remove(position);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_has_placeholder_page() {
        let doc = Document::new("新文档", 600.0, 800.0);
        assert_eq!(doc.page_count(), 1);
        assert!(doc.pages[0].is_empty());
        assert_eq!(doc.pages[0].width, 600.0);
    }

    #[test]
    fn test_insert_copy_is_independent() {
        let mut doc = Document::new("文档", 600.0, 800.0);
        let first = doc.pages[0].id;
        let item_id = doc.allocate_id();
        let mut item = PlacedItem::new(item_id, ItemKind::Image, Rect::new(0.0, 0.0, 10.0, 10.0));
        item.content = Some("a.jpg".to_string());
        doc.pages[0].items.push(item);

        let source = doc.pages[0].clone();
        let copy_id = doc.insert_copy_after(&source, first).unwrap();

        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.position_of(copy_id), Some(1));
        assert_ne!(doc.pages[1].items[0].id, doc.pages[0].items[0].id);
        assert_eq!(doc.pages[1].content_signature(), doc.pages[0].content_signature());

        doc.pages[1].items.clear();
        assert_eq!(doc.pages[0].items.len(), 1);
    }

    #[test]
    fn test_remove_page_shifts_positions() {
        let mut doc = Document::new("文档", 600.0, 800.0);
        let first = doc.pages[0].id;
        let second = doc.append_page();
        assert!(doc.remove_page(first));
        assert_eq!(doc.position_of(second), Some(0));
        assert!(!doc.remove_page(first));
    }
}
