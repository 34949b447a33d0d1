//! 浏览器内的区域选择
//!
//! 在页面上盖一层透明遮罩，用户先点左上角再点右下角，
//! 返回相对于视口的比例坐标。

use serde::Deserialize;
use tracing::info;

use crate::error::AppResult;
use crate::infrastructure::input_driver::RegionSelector;
use crate::infrastructure::js_executor::JsExecutor;
use crate::models::geometry::{Point, RatioRegion};

const CAPTURE_SCRIPT: &str = r#"
new Promise((resolve) => {
    const overlay = document.createElement('div');
    overlay.style.cssText = 'position:fixed;inset:0;z-index:2147483647;cursor:crosshair;background:rgba(0,0,0,0.05)';
    const points = [];
    overlay.addEventListener('click', (e) => {
        points.push([e.clientX, e.clientY]);
        const dot = document.createElement('div');
        dot.style.cssText = `position:fixed;left:${e.clientX - 5}px;top:${e.clientY - 5}px;width:10px;height:10px;border-radius:5px;background:#0f0`;
        overlay.appendChild(dot);
        if (points.length >= 2) {
            overlay.remove();
            resolve({ points, width: window.innerWidth, height: window.innerHeight });
        }
    });
    document.body.appendChild(overlay);
})
"#;

#[derive(Debug, Deserialize)]
struct ClickCapture {
    points: Vec<(f64, f64)>,
    width: f64,
    height: f64,
}

/// 通过页面遮罩采集两次点击
pub struct BrowserRegionSelector<'a> {
    executor: &'a JsExecutor,
}

impl<'a> BrowserRegionSelector<'a> {
    pub fn new(executor: &'a JsExecutor) -> Self {
        Self { executor }
    }
}

impl RegionSelector for BrowserRegionSelector<'_> {
    async fn select_ratio_region(&mut self) -> AppResult<RatioRegion> {
        info!("请在浏览器中依次点击文本区域的左上角和右下角");
        let capture: ClickCapture = self.executor.eval_as(CAPTURE_SCRIPT).await?;
        let ratio = ratio_from_capture(&capture)?;
        info!(
            "区域比例: L={:.3}, T={:.3}, R={:.3}, B={:.3}",
            ratio.top_left.0, ratio.top_left.1, ratio.bottom_right.0, ratio.bottom_right.1
        );
        Ok(ratio)
    }
}

fn ratio_from_capture(capture: &ClickCapture) -> AppResult<RatioRegion> {
    let first = capture.points.first().copied().unwrap_or_default();
    let second = capture.points.get(1).copied().unwrap_or(first);
    RatioRegion::from_clicks(
        Point::from(first),
        Point::from(second),
        capture.width,
        capture.height,
    )
}
