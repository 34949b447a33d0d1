//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 管理浏览器资源（Browser、Page）和文档后端会话
//! - 输出全局统计信息
//!
//! ### `assembly` - 排版总调度
//! - 拆分模板、逐批排版、调整行距、合并输出
//! - 持有本次运行创建的所有文本框
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (应用生命周期)
//!     ↓
//! assembly (拆分 → Vec<ImageBatch> → 合并)
//!     ↓
//! workflow::BatchFlow (处理单个批次)
//!     ↓
//! services (能力层：拆分合并 / 排版选择 / 网格 / 文本框)
//!     ↓
//! infrastructure (基础设施：DocumentBackend / InputDriver)
//! ```

pub mod assembly;
pub mod batch_processor;

pub use assembly::{AssemblyOrchestrator, AssemblyReport};
pub use batch_processor::App;
