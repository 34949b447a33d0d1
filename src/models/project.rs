use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// 一个来源文件夹对应的一批图片和一段说明文字
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBatch {
    pub folder: PathBuf,
    pub images: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl ImageBatch {
    pub fn new(folder: impl Into<PathBuf>, images: Vec<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            images,
            caption: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// 用于日志显示的文件夹名
    pub fn display_name(&self) -> String {
        self.folder
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}
