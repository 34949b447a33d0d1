//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：写日志文件头、按需连接浏览器
//! 2. **资源管理**：唯一持有 Browser 和文档后端会话
//! 3. **运行**：组装输入驱动、区域选择器，交给 AssemblyOrchestrator
//! 4. **全局统计**：输出最终结果

use anyhow::Result;
use chromiumoxide::{Browser, Page};
use tracing::{info, warn};

use crate::browser::{connect_to_browser_and_page, BrowserRegionSelector, CdpInputDriver};
use crate::config::Config;
use crate::infrastructure::{JsExecutor, MemoryBackend, Unattended};
use crate::orchestrator::assembly::{AssemblyOrchestrator, AssemblyReport};
use crate::utils::logging::{init_log_file, log_startup, print_final_stats};

/// 浏览器会话
struct BrowserSession {
    _browser: Browser,
    page: Page,
}

/// 应用主结构
pub struct App {
    config: Config,
    session: Option<BrowserSession>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        if let Some(log_file) = &config.output_log_file {
            init_log_file(log_file)?;
        }

        log_startup(
            &config
                .project_dir
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            config.template_file.as_deref().unwrap_or_default(),
            config.split_page.unwrap_or_default(),
        );

        let session = match config.browser_debug_port {
            Some(port) => {
                let (browser, page) =
                    connect_to_browser_and_page(port, config.browser_target_url.as_deref()).await?;
                Some(BrowserSession {
                    _browser: browser,
                    page,
                })
            }
            None => {
                info!("未配置浏览器端口，使用脚本方式创建文本框");
                None
            }
        };

        Ok(Self { config, session })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<AssemblyReport> {
        let mut backend = MemoryBackend::new();

        let report = match &self.session {
            Some(session) => {
                let mut driver = CdpInputDriver::new(JsExecutor::new(session.page.clone()));
                let selector_executor = JsExecutor::new(session.page.clone());
                let mut selector = BrowserRegionSelector::new(&selector_executor);

                AssemblyOrchestrator::new(
                    self.config.clone(),
                    &mut backend,
                    Some(&mut driver),
                    Some(&mut selector),
                )
                .run()
                .await?
            }
            None => {
                AssemblyOrchestrator::new(
                    self.config.clone(),
                    &mut backend,
                    None::<&mut Unattended>,
                    None::<&mut Unattended>,
                )
                .run()
                .await?
            }
        };

        if report.images_skipped > 0 {
            warn!("⚠️ 有 {} 张图片未能放置，请检查日志", report.images_skipped);
        }
        print_final_stats(
            report.images_placed,
            report.images_skipped,
            report.pages_used,
            &report.output_path.display().to_string(),
        );

        Ok(report)
    }
}
