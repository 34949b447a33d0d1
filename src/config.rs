//! 项目配置
//!
//! 以 TOML 形式保存在 `<project_dir>/config.toml`，环境变量可以覆盖其中一部分。

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::caption::{AnchorPolicy, CaptionMode, DEFAULT_LINE_HEIGHT};
use crate::models::geometry::{RatioRegion, Region};
use crate::models::layout::{LayoutArrangement, LayoutWeights};

/// 项目目录下的配置文件名
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// 程序配置文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 项目目录（图片文件夹所在位置）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<PathBuf>,
    /// 模板文件名，相对于项目目录
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_file: Option<String>,
    /// 每个批次文件夹中的说明文字文件名
    pub credits_file: String,
    /// 合并后的输出文件名，相对于项目目录
    pub output_file: String,
    /// 第一批图片优先使用的页码（原文档页码）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_page: Option<usize>,
    /// 拆分页码（标记页，从 1 开始）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_page: Option<i64>,
    pub credits_font: Vec<String>,
    pub credits_colors: Vec<String>,
    pub credits_font_size: f64,
    /// 行高倍数
    pub line_height: f64,
    /// 行距缩减系数
    pub leading_decrease: f64,
    /// 候选的文本框锚定方式
    pub text_box_position: Vec<AnchorPolicy>,
    /// 启用的排版方式
    pub layouts: Vec<LayoutArrangement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_frame_top_left_ratio: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_frame_bottom_right_ratio: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_frame_top_left: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_frame_bottom_right: Option<[f64; 2]>,
    pub caption_mode: CaptionMode,
    /// 界面操作之间的等待时间（毫秒）
    pub settle_ms: u64,
    /// 浏览器调试端口，设置后连接浏览器用于指针模式和区域标定
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_debug_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_target_url: Option<String>,
    /// 随机种子，不设置时每次运行结果不同
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub verbose_logging: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_log_file: Option<String>,
    /// 排版方式权重（相对值）
    pub layout_probabilities: LayoutWeights,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_dir: None,
            template_file: None,
            credits_file: "Credits.txt".to_string(),
            output_file: "merged_output.indd".to_string(),
            target_page: None,
            split_page: None,
            credits_font: vec!["Blackadder ITC\tRegular".to_string(), "Arial\tRegular".to_string()],
            credits_colors: vec!["Black".to_string()],
            credits_font_size: 24.0,
            line_height: DEFAULT_LINE_HEIGHT,
            leading_decrease: 1.0,
            text_box_position: vec![AnchorPolicy::BottomCenter],
            layouts: LayoutArrangement::ALL.to_vec(),
            text_frame_top_left_ratio: None,
            text_frame_bottom_right_ratio: None,
            text_frame_top_left: None,
            text_frame_bottom_right: None,
            caption_mode: CaptionMode::Scripted,
            settle_ms: 500,
            browser_debug_port: None,
            browser_target_url: None,
            seed: None,
            verbose_logging: false,
            output_log_file: None,
            layout_probabilities: LayoutWeights::new(0.3, 0.4, 0.3),
        }
    }
}

impl Config {
    /// 读取配置文件，文件不存在时返回默认配置
    pub async fn load(path: &Path) -> AppResult<Self> {
        if !fs::try_exists(path).await? {
            info!("配置文件 {} 不存在，使用默认配置", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).await?;
        Ok(toml::from_str(&content)?)
    }

    /// 写回配置文件
    pub async fn save(&self, path: &Path) -> AppResult<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).await?;
        info!("配置已保存到: {}", path.display());
        Ok(())
    }

    /// 用环境变量覆盖配置
    pub fn apply_env(&mut self) -> AppResult<()> {
        if let Ok(dir) = std::env::var("PROJECT_DIR") {
            self.project_dir = Some(PathBuf::from(dir));
        }
        if let Ok(file) = std::env::var("TEMPLATE_FILE") {
            self.template_file = Some(file);
        }
        if let Some(page) = env_value("SPLIT_PAGE", "i64")? {
            self.split_page = Some(page);
        }
        if let Some(page) = env_value("TARGET_PAGE", "usize")? {
            self.target_page = Some(page);
        }
        if let Some(verbose) = env_value("VERBOSE_LOGGING", "bool")? {
            self.verbose_logging = verbose;
        }
        if let Some(port) = env_value("BROWSER_DEBUG_PORT", "u16")? {
            self.browser_debug_port = Some(port);
        }
        if let Some(seed) = env_value("LAYOUT_SEED", "u64")? {
            self.seed = Some(seed);
        }
        Ok(())
    }

    /// 检查运行必需的配置项
    pub fn validate(&self) -> AppResult<()> {
        if self.project_dir.is_none() {
            return Err(AppError::missing_key("project_dir"));
        }
        if self.template_file.as_deref().map_or(true, str::is_empty) {
            return Err(AppError::missing_key("template_file"));
        }
        if self.split_page.is_none() {
            return Err(AppError::missing_key("split_page"));
        }
        for (key, value) in [
            ("credits_font_size", self.credits_font_size),
            ("line_height", self.line_height),
            ("leading_decrease", self.leading_decrease),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    pub fn project_dir(&self) -> AppResult<&Path> {
        self.project_dir
            .as_deref()
            .ok_or_else(|| AppError::missing_key("project_dir"))
    }

    pub fn split_page(&self) -> AppResult<i64> {
        self.split_page.ok_or_else(|| AppError::missing_key("split_page"))
    }

    /// 项目配置文件路径
    pub fn config_path(&self) -> AppResult<PathBuf> {
        Ok(self.project_dir()?.join(CONFIG_FILE_NAME))
    }

    pub fn template_path(&self) -> AppResult<PathBuf> {
        let file = self
            .template_file
            .as_deref()
            .ok_or_else(|| AppError::missing_key("template_file"))?;
        Ok(self.project_dir()?.join(file))
    }

    pub fn output_path(&self) -> AppResult<PathBuf> {
        Ok(self.project_dir()?.join(&self.output_file))
    }

    /// 拆分片段的保存位置：与模板同目录的 start / finish 文件
    pub fn fragment_paths(&self) -> AppResult<(PathBuf, PathBuf)> {
        let template = self.template_path()?;
        let dir = template.parent().map(Path::to_path_buf).unwrap_or_default();
        let name = |stem: &str| match template.extension() {
            Some(ext) => dir.join(format!("{}.{}", stem, ext.to_string_lossy())),
            None => dir.join(stem),
        };
        Ok((name("start"), name("finish")))
    }

    /// 只保留启用排版方式的权重
    pub fn layout_weights(&self) -> LayoutWeights {
        self.layout_probabilities.restricted_to(&self.layouts)
    }

    /// 配置中的比例区域
    pub fn ratio_region(&self) -> Option<RatioRegion> {
        match (self.text_frame_top_left_ratio, self.text_frame_bottom_right_ratio) {
            (Some([l, t]), Some([r, b])) => Some(RatioRegion::new((l, t), (r, b))),
            _ => None,
        }
    }

    /// 配置中的绝对坐标区域
    pub fn absolute_region(&self) -> Option<Region> {
        match (self.text_frame_top_left, self.text_frame_bottom_right) {
            (Some([l, t]), Some([r, b])) => Some(Region::new((l, t), (r, b))),
            _ => None,
        }
    }

    pub fn set_ratio_region(&mut self, ratio: &RatioRegion) {
        self.text_frame_top_left_ratio = Some([ratio.top_left.0, ratio.top_left.1]);
        self.text_frame_bottom_right_ratio = Some([ratio.bottom_right.0, ratio.bottom_right.1]);
    }
}

/// 读取并解析环境变量，未设置时返回 None
fn env_value<T: FromStr>(var_name: &str, expected_type: &str) -> AppResult<Option<T>> {
    match std::env::var(var_name) {
        Ok(value) => parse_value(var_name, &value, expected_type).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_value<T: FromStr>(var_name: &str, value: &str, expected_type: &str) -> AppResult<T> {
    value.trim().parse().map_err(|_| {
        ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn complete() -> Config {
        Config {
            project_dir: Some(PathBuf::from("/tmp/project")),
            template_file: Some("template.indd".to_string()),
            split_page: Some(8),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("none.toml")).await.unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = complete();
        config.set_ratio_region(&RatioRegion::new((0.1, 0.7), (0.9, 0.95)));
        config.seed = Some(7);
        config.text_box_position = vec![AnchorPolicy::TopCenter, AnchorPolicy::from("left")];
        config.save(&path).await.unwrap();

        let loaded = Config::load(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            project_dir = "/data/issue-12"
            template_file = "template.indd"
            split_page = 8
            credits_font = ["Arial\tRegular"]
            text_box_position = ["bottom_center", "center"]
            layouts = ["single", "four"]
            caption_mode = "pointer"
            text_frame_top_left_ratio = [0.1, 0.8]
            text_frame_bottom_right_ratio = [0.9, 0.95]

            [layout_probabilities]
            single = 0.2
            double = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.split_page, Some(8));
        assert_eq!(config.caption_mode, CaptionMode::Pointer);
        assert_eq!(config.credits_file, "Credits.txt");
        assert_eq!(config.credits_font_size, 24.0);
        assert_eq!(
            config.ratio_region(),
            Some(RatioRegion::new((0.1, 0.8), (0.9, 0.95)))
        );

        let weights = config.layout_weights();
        assert_eq!(weights.single, Some(0.2));
        assert_eq!(weights.double, Some(0.0));
        assert_eq!(weights.four, None);
    }

    #[test]
    fn test_validate_reports_missing_keys() {
        let err = Config::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "配置错误: 缺少配置项: project_dir");

        let config = Config {
            split_page: None,
            ..complete()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "配置错误: 缺少配置项: split_page");

        assert!(complete().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive_factors() {
        let cases = [
            Config {
                line_height: -1.2,
                ..complete()
            },
            Config {
                line_height: f64::NAN,
                ..complete()
            },
            Config {
                leading_decrease: 0.0,
                ..complete()
            },
            Config {
                credits_font_size: f64::INFINITY,
                ..complete()
            },
        ];
        for config in cases {
            assert!(matches!(
                config.validate(),
                Err(AppError::Config(ConfigError::InvalidValue { .. }))
            ));
        }
    }

    #[tokio::test]
    async fn test_negative_line_height_from_file_fails_validation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "project_dir = \"/tmp/project\"\ntemplate_file = \"template.indd\"\nsplit_page = 8\nline_height = -1.2\n",
        )
        .unwrap();

        let config = Config::load(&path).await.unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "配置错误: 配置项 line_height 的值非法: -1.2");
    }

    #[test]
    fn test_derived_paths() {
        let config = complete();
        assert_eq!(
            config.template_path().unwrap(),
            PathBuf::from("/tmp/project/template.indd")
        );
        let (start, finish) = config.fragment_paths().unwrap();
        assert_eq!(start, PathBuf::from("/tmp/project/start.indd"));
        assert_eq!(finish, PathBuf::from("/tmp/project/finish.indd"));
        assert_eq!(
            config.config_path().unwrap(),
            PathBuf::from("/tmp/project/config.toml")
        );
    }

    #[test]
    fn test_parse_value() {
        let page: i64 = parse_value("SPLIT_PAGE", " 8 ", "i64").unwrap();
        assert_eq!(page, 8);

        let err = parse_value::<u16>("BROWSER_DEBUG_PORT", "abc", "u16").unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::EnvVarParseFailed { .. })
        ));
    }
}
