//! # Result Batch
//!
//! 按学号范围批量查询成绩单 PDF 并合并为一个文件
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有浏览器会话，只暴露页面操作能力
//! - `LookupPage` - 导航 / 等待 / 输入 / 点击 / 执行脚本 / 读属性
//! - `ChromeSession` - 基于 chromiumoxide 的实现
//!
//! ### ② 业务能力层（Services）
//! - `LookupTrigger` - 触发查询（点击或 postback）
//! - `HttpDownloader` - 下载 PDF
//! - `PdfMerger` - 合并 PDF
//!
//! ### ③ 流程层（Workflow）
//! - `RollFlow` - 定义"一个学号"的完整处理流程
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_fetcher` - 顺序遍历学号范围
//! - `orchestrator/app` - 一次请求的完整生命周期

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
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromeLauncher, ChromeSession, LookupPage, SessionLauncher};
pub use models::{GenerateRequest, GenerateResponse, RollRange};
pub use orchestrator::{fetch_range, App, FetchReport};
pub use services::{DocumentDownloader, HttpDownloader, LookupTrigger, MergeReport, PdfMerger};
pub use workflow::{LookupSelectors, RollCtx, RollFlow};
