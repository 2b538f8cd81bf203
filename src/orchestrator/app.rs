//! 单次批量任务 - 编排层
//!
//! ## 职责
//!
//! 1. **参数校验**：请求不合法时直接返回，不产生任何副作用
//! 2. **目录管理**：清理上次遗留的暂存内容，为本次运行创建独立暂存目录
//! 3. **资源管理**：启动浏览器会话，交给 batch_fetcher 使用并关闭
//! 4. **合并输出**：调用 PdfMerger 生成合并文件
//! 5. **全局统计**：汇总成功 / 失败数量
//!
//! 同一个 App 上的多次运行通过互斥锁串行执行。

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use serde_json::Value as JsonValue;
use tempfile::TempDir;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{ChromeLauncher, SessionLauncher};
use crate::models::{GenerateRequest, GenerateResponse};
use crate::orchestrator::batch_fetcher::{fetch_range, FetchReport};
use crate::services::{DocumentDownloader, HttpDownloader, PdfMerger};
use crate::utils::logging::{log_run_start, log_startup, print_final_stats, RunStats};
use crate::workflow::RollFlow;

/// 暂存子目录前缀
const RUN_DIR_PREFIX: &str = "run-";

/// 应用主结构
pub struct App<L, D> {
    config: Config,
    launcher: L,
    flow: RollFlow<D>,
    run_lock: Mutex<()>,
}

impl App<ChromeLauncher, HttpDownloader> {
    /// 使用真实浏览器和 HTTP 下载器初始化应用
    pub fn initialize(config: Config) -> anyhow::Result<Self> {
        let downloader = HttpDownloader::new(Duration::from_secs(config.download_timeout_secs))
            .context("无法创建 HTTP 客户端")?;
        let launcher = ChromeLauncher::new(&config);
        log_startup(&config);
        Ok(Self::new(config, launcher, downloader))
    }
}

impl<L, D> App<L, D>
where
    L: SessionLauncher,
    D: DocumentDownloader,
{
    pub fn new(config: Config, launcher: L, downloader: D) -> Self {
        let flow = RollFlow::from_config(&config, downloader);
        Self {
            config,
            launcher,
            flow,
            run_lock: Mutex::new(()),
        }
    }

    /// 处理请求并返回 (状态码, JSON 响应体)
    pub async fn handle(&self, request: &GenerateRequest) -> (u16, JsonValue) {
        match self.generate(request).await {
            Ok(response) => (
                200,
                serde_json::to_value(&response).unwrap_or(JsonValue::Null),
            ),
            Err(e) => {
                if e.status_code() >= 500 {
                    error!("❌ 服务器错误: {}", e);
                } else {
                    warn!("⚠️ 请求参数错误: {}", e);
                }
                (
                    e.status_code(),
                    serde_json::to_value(e.to_body()).unwrap_or(JsonValue::Null),
                )
            }
        }
    }

    /// 执行一次完整的抓取 + 合并
    pub async fn generate(&self, request: &GenerateRequest) -> AppResult<GenerateResponse> {
        let validated = request.validate()?;

        let _guard = self.run_lock.lock().await;
        let started = Instant::now();
        log_run_start(&validated.range, &validated.website_url);

        let staging = self.prepare_dirs()?;

        let fetch = if validated.range.is_empty() {
            warn!("⚠️ 起始学号大于结束学号，没有需要处理的学号");
            FetchReport::default()
        } else {
            // 启动失败时启动器负责关闭已部分打开的会话
            let mut session = self.launcher.launch().await?;
            fetch_range(
                &mut session,
                &self.flow,
                &validated.range,
                &validated.website_url,
                staging.path(),
            )
            .await
        };

        let staging_path = staging.path().to_path_buf();
        let merged_path = self.config.merged_path();
        let merge = tokio::task::spawn_blocking(move || {
            PdfMerger::merge_dir(&staging_path, &merged_path)
        })
        .await??;

        if let Err(e) = staging.close() {
            warn!("⚠️ 清理暂存目录失败: {}", e);
        }

        let mut not_found = fetch.not_found;
        let skipped = merge.skipped_rolls();
        if !skipped.is_empty() {
            warn!("⚠️ {} 个 PDF 无法解析，计入未找到: {:?}", skipped.len(), skipped);
            not_found.extend(skipped);
            not_found.sort();
        }

        let stats = RunStats {
            total: validated.range.len(),
            downloaded: fetch.downloaded.len(),
            failed: not_found.len(),
            merged_pages: merge.total_pages,
            elapsed: started.elapsed(),
        };
        let merged_display = self.config.merged_path().display().to_string();
        print_final_stats(&stats, merge.written.then_some(merged_display.as_str()));

        Ok(GenerateResponse {
            download_url: merge.written.then(|| self.config.download_url()),
            not_found,
        })
    }

    /// 准备目录：清空暂存根目录与旧的合并文件，创建本次运行的暂存目录
    fn prepare_dirs(&self) -> AppResult<TempDir> {
        clean_folder(&self.config.downloads_dir)?;
        std::fs::create_dir_all(&self.config.merged_dir)
            .map_err(|e| AppError::io(&self.config.merged_dir, e))?;

        let merged_path = self.config.merged_path();
        if merged_path.exists() {
            std::fs::remove_file(&merged_path).map_err(|e| AppError::io(&merged_path, e))?;
        }

        let staging = tempfile::Builder::new()
            .prefix(RUN_DIR_PREFIX)
            .tempdir_in(&self.config.downloads_dir)
            .map_err(|e| AppError::io(&self.config.downloads_dir, e))?;
        info!("📁 本次暂存目录: {}", staging.path().display());
        Ok(staging)
    }
}

/// 清空目录（不存在则创建）
fn clean_folder(folder: &Path) -> AppResult<()> {
    if !folder.exists() {
        std::fs::create_dir_all(folder).map_err(|e| AppError::io(folder, e))?;
        return Ok(());
    }

    for entry in std::fs::read_dir(folder).map_err(|e| AppError::io(folder, e))? {
        let path = entry.map_err(|e| AppError::io(folder, e))?.path();
        let removed = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };
        removed.map_err(|e| AppError::io(&path, e))?;
    }
    Ok(())
}
