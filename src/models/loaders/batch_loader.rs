use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tokio::fs;

use crate::error::{AppResult, ConfigError};
use crate::models::project::ImageBatch;

fn image_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\.jpe?g$").expect("static regex"))
}

/// 是否为可放置的图片文件
pub fn is_image_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| image_pattern().is_match(name))
        .unwrap_or(false)
}

/// 读取说明文字文件，去掉首尾空白
pub async fn load_caption(path: &Path) -> AppResult<String> {
    let content = fs::read_to_string(path).await?;
    Ok(content.trim().to_string())
}

/// 扫描项目目录，每个直接包含图片的文件夹为一批
///
/// 批次按文件夹路径排序，批内图片按文件名排序
pub async fn load_image_batches(project_dir: &Path, credits_file: &str) -> AppResult<Vec<ImageBatch>> {
    if !project_dir.is_dir() {
        return Err(ConfigError::InvalidValue {
            key: "project_dir".to_string(),
            value: project_dir.display().to_string(),
        }
        .into());
    }

    let mut batches = Vec::new();
    let mut pending: Vec<PathBuf> = vec![project_dir.to_path_buf()];

    while let Some(folder) = pending.pop() {
        let mut images = Vec::new();
        let mut credits_path = None;

        let mut entries = fs::read_dir(&folder).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;

            if file_type.is_dir() {
                pending.push(path);
            } else if is_image_file(&path) {
                images.push(path);
            } else if path.file_name().and_then(|n| n.to_str()) == Some(credits_file) {
                credits_path = Some(path);
            }
        }

        if images.is_empty() {
            continue;
        }

        images.sort();
        let mut batch = ImageBatch::new(folder.clone(), images);

        if let Some(path) = credits_path {
            match load_caption(&path).await {
                Ok(caption) => batch = batch.with_caption(caption),
                Err(e) => tracing::warn!("读取说明文字失败 {}: {}", path.display(), e),
            }
        }

        tracing::info!(
            "找到批次 {}: {} 张图片{}",
            batch.display_name(),
            batch.images.len(),
            if batch.caption.is_some() { "，含说明文字" } else { "" }
        );
        batches.push(batch);
    }

    if batches.is_empty() {
        return Err(ConfigError::NoImages {
            path: project_dir.display().to_string(),
        }
        .into());
    }

    batches.sort_by(|a, b| a.folder.cmp(&b.folder));
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a/b/photo.JPG")));
        assert!(is_image_file(Path::new("photo.jpeg")));
        assert!(!is_image_file(Path::new("photo.png")));
        assert!(!is_image_file(Path::new("jpg")));
    }

    #[tokio::test]
    async fn test_load_image_batches_groups_by_folder() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("b_story")).unwrap();
        std::fs::create_dir_all(root.join("a_story")).unwrap();
        std::fs::create_dir_all(root.join("empty")).unwrap();
        std::fs::write(root.join("a_story/2.jpg"), b"").unwrap();
        std::fs::write(root.join("a_story/1.JPG"), b"").unwrap();
        std::fs::write(root.join("a_story/Credits.txt"), "摄影: 王五\n").unwrap();
        std::fs::write(root.join("b_story/x.jpeg"), b"").unwrap();
        std::fs::write(root.join("template.json"), b"{}").unwrap();

        let batches = load_image_batches(root, "Credits.txt").await.unwrap();

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].display_name(), "a_story");
        assert_eq!(
            batches[0].images,
            vec![root.join("a_story/1.JPG"), root.join("a_story/2.jpg")]
        );
        assert_eq!(batches[0].caption.as_deref(), Some("摄影: 王五"));
        assert_eq!(batches[1].caption, None);
    }

    #[tokio::test]
    async fn test_load_image_batches_without_images_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_image_batches(dir.path(), "Credits.txt").await;
        assert!(matches!(
            result,
            Err(crate::error::AppError::Config(ConfigError::NoImages { .. }))
        ));
    }
}
