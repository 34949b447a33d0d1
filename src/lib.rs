//! # Layout Assembler
//!
//! 把若干文件夹中的图片按网格排进模板文档，并为每批图片添加说明文字，
//! 最后与模板拆分出的前后两段重新合并。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（文档会话、浏览器页面），只暴露能力
//! - `DocumentBackend` - 文档后端接口，`MemoryBackend` 为进程内实现
//! - `InputDriver` / `RegionSelector` - 模拟输入与交互式区域选择
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，都是针对单个页面或单个文本框的能力
//! - `PageRangeSplitter` / `DocumentMerger` - 拆分与合并
//! - `LayoutSelector` - 按权重选择排版方式
//! - `build_cells` / `build_text_box` - 网格与文本框几何
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一批图片"的完整排版流程
//! - `BatchCtx` - 上下文封装（批次序号 + 文件夹）
//! - `BatchFlow` - 状态机（选排版 → 放图片 → 放说明文字）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/assembly` - 拆分 → 逐批排版 → 行距调整 → 合并
//! - `orchestrator/batch_processor` - 应用生命周期和资源管理
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{DocumentBackend, InputDriver, MemoryBackend, RegionSelector};
pub use models::{ImageBatch, LayoutArrangement, Region};
pub use orchestrator::{App, AssemblyOrchestrator, AssemblyReport};
pub use workflow::{BatchCtx, BatchFlow};
