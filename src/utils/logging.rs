//! 日志工具模块
//!
//! 提供日志初始化、日志文件头和运行过程中的横幅输出

use std::fs;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::AppResult;

/// 初始化 tracing 订阅者
///
/// 设置了 `RUST_LOG` 时以它为准，否则 verbose 为 debug，默认 info。
/// 重复调用不会报错（测试中可能多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件，写入运行时间头
pub fn init_log_file(log_file_path: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\n排版日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(project_dir: &str, template: &str, split_page: i64) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 图片排版模式");
    info!("📁 项目目录: {}", project_dir);
    info!("📄 模板: {} (拆分页 {})", template, split_page);
    info!("{}", "=".repeat(60));
}

/// 记录批次加载信息
pub fn log_batches_loaded(batches: usize, images: usize) {
    info!("✓ 找到 {} 个批次，共 {} 张图片\n", batches, images);
}

/// 记录批次开始信息
pub fn log_batch_start(batch_num: usize, total_batches: usize, folder: &str, images: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批: {}", batch_num, total_batches, folder);
    info!("🖼️ 本批图片: {} 张", images);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_num: usize, placed: usize, total: usize, pages: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 批完成: 放置 {}/{}，使用 {} 页", batch_num, placed, total, pages);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(placed: usize, skipped: usize, pages: usize, output_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已放置: {}/{}", placed, placed + skipped);
    info!("❌ 跳过: {}", skipped);
    info!("📄 使用页数: {}", pages);
    info!("{}", "=".repeat(60));
    info!("\n输出已保存至: {}", output_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
