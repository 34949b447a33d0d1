use serde::{Deserialize, Serialize};

/// 正文为空时使用的占位行数
pub const PLACEHOLDER_LINE_COUNT: usize = 3;
/// 默认行高倍数
pub const DEFAULT_LINE_HEIGHT: f64 = 1.2;

/// 文本框在区域内的垂直锚定方式
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnchorPolicy {
    #[default]
    Center,
    TopCenter,
    BottomCenter,
    /// 无法识别的名称，按 Center 处理
    Other(String),
}

impl AnchorPolicy {
    pub fn as_str(&self) -> &str {
        match self {
            AnchorPolicy::Center => "center",
            AnchorPolicy::TopCenter => "top_center",
            AnchorPolicy::BottomCenter => "bottom_center",
            AnchorPolicy::Other(name) => name,
        }
    }
}

impl From<&str> for AnchorPolicy {
    fn from(value: &str) -> Self {
        match value {
            "center" => AnchorPolicy::Center,
            "top_center" => AnchorPolicy::TopCenter,
            "bottom_center" => AnchorPolicy::BottomCenter,
            other => AnchorPolicy::Other(other.to_string()),
        }
    }
}

impl From<String> for AnchorPolicy {
    fn from(value: String) -> Self {
        AnchorPolicy::from(value.as_str())
    }
}

impl From<AnchorPolicy> for String {
    fn from(value: AnchorPolicy) -> Self {
        value.as_str().to_string()
    }
}

/// 文本框的创建方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionMode {
    /// 直接调用文档后端
    #[default]
    Scripted,
    /// 通过模拟鼠标键盘在界面上拖出文本框
    Pointer,
}

/// 说明文字规格
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSpec {
    pub text: String,
    pub font_size: f64,
    pub line_height: f64,
    pub anchor: AnchorPolicy,
}

impl CaptionSpec {
    pub fn new(text: impl Into<String>, font_size: f64, anchor: AnchorPolicy) -> Self {
        Self {
            text: text.into(),
            font_size,
            line_height: DEFAULT_LINE_HEIGHT,
            anchor,
        }
    }

    pub fn with_line_height(mut self, line_height: f64) -> Self {
        self.line_height = line_height;
        self
    }

    /// 行数：空文本使用占位行数，否则至少为 1
    pub fn line_count(&self) -> usize {
        if self.text.is_empty() {
            return PLACEHOLDER_LINE_COUNT;
        }
        self.text.lines().count().max(1)
    }
}
