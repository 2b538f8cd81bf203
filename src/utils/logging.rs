//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::RollRange;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。
/// 日志输出到 stderr；指定 `log_file` 时同时追加写入该文件
pub fn init(verbose: bool, log_file: Option<&str>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    // 重复初始化（例如测试中）时忽略错误
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let _ = builder
                .with_ansi(false)
                .with_writer(std::io::stderr.and(Mutex::new(file)))
                .try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
    Ok(())
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n成绩单批量下载日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 成绩单批量下载模式");
    info!("📁 暂存目录: {}", config.downloads_dir.display());
    info!("📁 合并目录: {}", config.merged_dir.display());
    info!("⏱️ 成绩等待超时: {}ms", config.result_timeout_ms);
    info!("{}", "=".repeat(60));
}

/// 记录本次运行的学号范围
pub fn log_run_start(range: &RollRange, target_url: &str) {
    info!("\n{}", "=".repeat(60));
    info!(
        "📦 学号范围: {}{:04} - {}{:04}",
        range.prefix(),
        range.start_num(),
        range.prefix(),
        range.end_num()
    );
    info!("📄 共 {} 个学号", range.len());
    info!("🌐 查询地址: {}", target_url);
    info!("{}", "=".repeat(60));
}

/// 单次运行统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub merged_pages: usize,
    pub elapsed: Duration,
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStats, merged_path: Option<&str>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", stats.downloaded, stats.total);
    info!("❌ 失败: {}", stats.failed);
    info!("📑 合并页数: {}", stats.merged_pages);
    info!("⏱️ 耗时: {:.1}s", stats.elapsed.as_secs_f64());
    match merged_path {
        Some(path) => info!("合并文件: {}", path),
        None => info!("没有可合并的 PDF"),
    }
    info!("{}", "=".repeat(60));
}
