//! 输入驱动 - 基础设施层
//!
//! 没有脚本接口的后端只能靠模拟鼠标/键盘来操作。
//! 每个改变界面的步骤之后都要 `settle`，等界面重绘完成再进行下一次观察。

use std::time::Duration;

use tokio::time::sleep;

use crate::error::{AppError, AppResult};
use crate::models::geometry::{Point, RatioRegion};

/// 模拟输入驱动
#[allow(async_fn_in_trait)]
pub trait InputDriver {
    /// 在 `duration_sec` 秒内把指针移动到 (x, y)
    async fn move_to(&mut self, x: f64, y: f64, duration_sec: f64) -> AppResult<()>;

    async fn mouse_down(&mut self) -> AppResult<()>;

    async fn mouse_up(&mut self) -> AppResult<()>;

    /// 在当前位置单击
    async fn click(&mut self) -> AppResult<()>;

    async fn key_press(&mut self, key: &str) -> AppResult<()>;

    /// 组合键，按顺序按下、逆序松开
    async fn hotkey(&mut self, keys: &[&str]) -> AppResult<()>;

    /// 逐字输入，每个字符之间间隔 `interval_sec` 秒
    async fn type_text(&mut self, text: &str, interval_sec: f64) -> AppResult<()>;

    /// 可操作区域的尺寸（屏幕或视口）
    async fn extent(&mut self) -> AppResult<(f64, f64)>;

    /// 按住左键从 `from` 拖拽到 `to`
    async fn drag(&mut self, from: Point, to: Point, duration_sec: f64) -> AppResult<()> {
        self.move_to(from.x, from.y, 0.5).await?;
        self.mouse_down().await?;
        self.move_to(to.x, to.y, duration_sec).await?;
        self.mouse_up().await
    }
}

/// 交互式区域选择
#[allow(async_fn_in_trait)]
pub trait RegionSelector {
    /// 让用户依次点击左上角和右下角，返回比例坐标
    async fn select_ratio_region(&mut self) -> AppResult<RatioRegion>;
}

/// 等待界面稳定
pub async fn settle(millis: u64) {
    if millis > 0 {
        sleep(Duration::from_millis(millis)).await;
    }
}

/// 没有可用输入设备时的占位实现
///
/// 所有操作都失败，用于纯脚本模式的运行。
#[derive(Debug, Clone, Copy, Default)]
pub struct Unattended;

impl Unattended {
    fn unavailable(operation: &str) -> AppError {
        AppError::backend(operation, "没有连接任何输入设备")
    }
}

impl InputDriver for Unattended {
    async fn move_to(&mut self, _x: f64, _y: f64, _duration_sec: f64) -> AppResult<()> {
        Err(Self::unavailable("move_to"))
    }

    async fn mouse_down(&mut self) -> AppResult<()> {
        Err(Self::unavailable("mouse_down"))
    }

    async fn mouse_up(&mut self) -> AppResult<()> {
        Err(Self::unavailable("mouse_up"))
    }

    async fn click(&mut self) -> AppResult<()> {
        Err(Self::unavailable("click"))
    }

    async fn key_press(&mut self, _key: &str) -> AppResult<()> {
        Err(Self::unavailable("key_press"))
    }

    async fn hotkey(&mut self, _keys: &[&str]) -> AppResult<()> {
        Err(Self::unavailable("hotkey"))
    }

    async fn type_text(&mut self, _text: &str, _interval_sec: f64) -> AppResult<()> {
        Err(Self::unavailable("type_text"))
    }

    async fn extent(&mut self) -> AppResult<(f64, f64)> {
        Err(Self::unavailable("extent"))
    }
}

impl RegionSelector for Unattended {
    async fn select_ratio_region(&mut self) -> AppResult<RatioRegion> {
        Err(AppError::missing_key("text_frame_top_left_ratio"))
    }
}
