//! 基于 CDP 的输入驱动
//!
//! 通过 `Input.dispatchMouseEvent` / `Input.dispatchKeyEvent` / `Input.insertText`
//! 向浏览器中的排版应用派发真实输入事件。

use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, InsertTextParams, MouseButton,
};
use tokio::time::sleep;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::infrastructure::input_driver::InputDriver;
use crate::infrastructure::js_executor::JsExecutor;

/// 一次 move_to 最多拆分的步数
const MAX_MOVE_STEPS: usize = 30;

/// CDP 输入驱动
pub struct CdpInputDriver {
    executor: JsExecutor,
    x: f64,
    y: f64,
    button_down: bool,
    modifiers: i64,
}

impl CdpInputDriver {
    pub fn new(executor: JsExecutor) -> Self {
        Self {
            executor,
            x: 0.0,
            y: 0.0,
            button_down: false,
            modifiers: 0,
        }
    }

    pub fn executor(&self) -> &JsExecutor {
        &self.executor
    }

    async fn dispatch_mouse(&self, kind: DispatchMouseEventType, click_count: i64) -> AppResult<()> {
        let mut params = DispatchMouseEventParams::new(kind, self.x, self.y);
        if self.button_down || click_count > 0 {
            params.button = Some(MouseButton::Left);
        }
        if click_count > 0 {
            params.click_count = Some(click_count);
        }
        params.modifiers = Some(self.modifiers);

        self.executor
            .page()
            .execute(params)
            .await
            .map_err(|e| AppError::backend("Input.dispatchMouseEvent", e.to_string()))?;
        Ok(())
    }

    async fn dispatch_key(&self, kind: DispatchKeyEventType, key: &str) -> AppResult<()> {
        let mut params = DispatchKeyEventParams::new(kind.clone());
        params.key = Some(key.to_string());
        params.modifiers = Some(self.modifiers);

        // 只有单字符且没有修饰键时才产生文本输入
        if kind == DispatchKeyEventType::KeyDown && key.chars().count() == 1 && self.modifiers & !MODIFIER_SHIFT == 0 {
            params.text = Some(key.to_string());
        }

        self.executor
            .page()
            .execute(params)
            .await
            .map_err(|e| AppError::backend("Input.dispatchKeyEvent", e.to_string()))?;
        Ok(())
    }
}

const MODIFIER_ALT: i64 = 1;
const MODIFIER_CTRL: i64 = 2;
const MODIFIER_META: i64 = 4;
const MODIFIER_SHIFT: i64 = 8;

/// 键名对应的修饰键位
fn modifier_bit(key: &str) -> i64 {
    match key.to_ascii_lowercase().as_str() {
        "alt" => MODIFIER_ALT,
        "ctrl" | "control" => MODIFIER_CTRL,
        "meta" | "cmd" | "command" => MODIFIER_META,
        "shift" => MODIFIER_SHIFT,
        _ => 0,
    }
}

/// 把 duration 拆成若干等分步
fn move_steps(duration_sec: f64) -> usize {
    if duration_sec <= 0.0 {
        return 1;
    }
    ((duration_sec * 60.0).ceil() as usize).clamp(1, MAX_MOVE_STEPS)
}

impl InputDriver for CdpInputDriver {
    async fn move_to(&mut self, x: f64, y: f64, duration_sec: f64) -> AppResult<()> {
        let steps = move_steps(duration_sec);
        let (start_x, start_y) = (self.x, self.y);
        let pause = Duration::from_secs_f64(duration_sec.max(0.0) / steps as f64);

        for step in 1..=steps {
            let t = step as f64 / steps as f64;
            self.x = start_x + (x - start_x) * t;
            self.y = start_y + (y - start_y) * t;
            self.dispatch_mouse(DispatchMouseEventType::MouseMoved, 0).await?;
            if step < steps {
                sleep(pause).await;
            }
        }
        Ok(())
    }

    async fn mouse_down(&mut self) -> AppResult<()> {
        self.button_down = true;
        self.dispatch_mouse(DispatchMouseEventType::MousePressed, 1).await
    }

    async fn mouse_up(&mut self) -> AppResult<()> {
        self.dispatch_mouse(DispatchMouseEventType::MouseReleased, 1).await?;
        self.button_down = false;
        Ok(())
    }

    async fn click(&mut self) -> AppResult<()> {
        self.mouse_down().await?;
        self.mouse_up().await
    }

    async fn key_press(&mut self, key: &str) -> AppResult<()> {
        self.dispatch_key(DispatchKeyEventType::KeyDown, key).await?;
        self.dispatch_key(DispatchKeyEventType::KeyUp, key).await
    }

    async fn hotkey(&mut self, keys: &[&str]) -> AppResult<()> {
        for key in keys {
            self.modifiers |= modifier_bit(key);
            self.dispatch_key(DispatchKeyEventType::KeyDown, key).await?;
        }
        for key in keys.iter().rev() {
            self.dispatch_key(DispatchKeyEventType::KeyUp, key).await?;
            self.modifiers &= !modifier_bit(key);
        }
        Ok(())
    }

    async fn type_text(&mut self, text: &str, interval_sec: f64) -> AppResult<()> {
        debug!("输入文本 {} 个字符", text.chars().count());
        let pause = Duration::from_secs_f64(interval_sec.max(0.0));

        for ch in text.chars() {
            if ch == '\n' {
                self.key_press("Enter").await?;
            } else {
                self.executor
                    .page()
                    .execute(InsertTextParams::new(ch.to_string()))
                    .await
                    .map_err(|e| AppError::backend("Input.insertText", e.to_string()))?;
            }
            if !pause.is_zero() {
                sleep(pause).await;
            }
        }
        Ok(())
    }

    async fn extent(&mut self) -> AppResult<(f64, f64)> {
        self.executor.viewport_size().await
    }
}
