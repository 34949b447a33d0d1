//! JS 执行器 - 基础设施层
//!
//! 持有浏览器中排版页面的 Page，只暴露"在页面里执行脚本"的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult};

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识文档、批次和排版
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于派发输入事件）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果，Promise 会被等待
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self
            .page
            .evaluate(js_code.into())
            .await
            .map_err(|e| AppError::backend("evaluate", e.to_string()))?;
        let json_value = result
            .into_value()
            .map_err(|e| AppError::backend("evaluate", e.to_string()))?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 当前视口尺寸
    pub async fn viewport_size(&self) -> AppResult<(f64, f64)> {
        self.eval_as("[window.innerWidth, window.innerHeight]").await
    }
}
