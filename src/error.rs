use thiserror::Error;

/// 应用程序错误类型
///
/// 分类与处理策略：
/// - `Range`：拆分页码非法，在任何文档修改之前中止
/// - `Merge`：片段复制失败，中止合并，已合并内容保留
/// - `Geometry`：尺寸非正，拒绝该页/该文本框
/// - `Config`：缺少必需配置，中止运行（权重退化除外，退化时回退为均匀分布）
/// - `Backend`：启动/打开/保存失败，本次运行致命
/// - `Placement`：单张图片或单个文本框放置失败，记录日志后继续
#[derive(Debug, Error)]
pub enum AppError {
    #[error("页码范围错误: {0}")]
    Range(#[from] RangeError),

    #[error("合并错误: {0}")]
    Merge(#[from] MergeError),

    #[error("几何错误: {0}")]
    Geometry(#[from] GeometryError),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("文档后端错误: {0}")]
    Backend(#[from] BackendError),

    #[error("放置错误: {0}")]
    Placement(#[from] PlacementError),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML解析失败: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML序列化失败: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// 是否需要中止当前运行
    ///
    /// 只有放置错误属于"跳过并继续"
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AppError::Placement(_))
    }

    /// 创建后端调用失败错误
    pub fn backend(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Backend(BackendError::CallFailed {
            operation: operation.into(),
            reason: reason.into(),
        })
    }

    /// 创建图片放置失败错误
    pub fn image_placement(path: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Placement(PlacementError::Image {
            path: path.into(),
            reason: reason.into(),
        })
    }

    /// 创建文本框放置失败错误
    pub fn text_placement(reason: impl Into<String>) -> Self {
        AppError::Placement(PlacementError::Text {
            reason: reason.into(),
        })
    }

    /// 创建缺少配置项错误
    pub fn missing_key(key: impl Into<String>) -> Self {
        AppError::Config(ConfigError::MissingKey { key: key.into() })
    }
}

/// 拆分页码错误
#[derive(Debug, Error)]
pub enum RangeError {
    #[error("拆分页 {pivot} 超出范围 [1, {page_count}]")]
    PivotOutOfRange { pivot: i64, page_count: usize },

    #[error("页码 {index} 超出范围 [1, {page_count}]")]
    PageOutOfRange { index: usize, page_count: usize },
}

/// 合并错误
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("复制片段 {fragment} 的第 {page} 页失败: {reason}")]
    CopyFailed {
        fragment: usize,
        page: usize,
        reason: String,
    },

    #[error("打开片段 {path} 失败: {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("没有可合并的片段")]
    NoFragments,
}

/// 几何错误
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("页面尺寸必须为正: {width} x {height}")]
    NonPositiveExtent { width: f64, height: f64 },

    #[error("文本框高度必须为正: {height}")]
    NonPositiveHeight { height: f64 },

    #[error("区域退化: ({left}, {top}) - ({right}, {bottom})")]
    DegenerateRegion {
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("缺少配置项: {key}")]
    MissingKey { key: String },

    #[error("配置项 {key} 的值非法: {value}")]
    InvalidValue { key: String, value: String },

    #[error("权重全部为 0，分布无定义")]
    DegenerateWeights,

    #[error("项目目录中没有找到图片: {path}")]
    NoImages { path: String },

    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

/// 文档后端错误
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("无法打开文档 {path}: {reason}")]
    OpenFailed { path: String, reason: String },

    #[error("无法保存文档 {path}: {reason}")]
    SaveFailed { path: String, reason: String },

    #[error("后端调用 {operation} 失败: {reason}")]
    CallFailed { operation: String, reason: String },

    #[error("无效的句柄: {0}")]
    InvalidHandle(String),
}

/// 单项放置错误（非致命）
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("放置图片 {path} 失败: {reason}")]
    Image { path: String, reason: String },

    #[error("创建文本框失败: {reason}")]
    Text { reason: String },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
