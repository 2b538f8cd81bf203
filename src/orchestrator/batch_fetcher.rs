//! 批量学号抓取 - 编排层
//!
//! 顺序遍历学号范围，复用同一个页面；单个学号失败只记录，不中断批处理。
//! 循环结束后无论成功与否都关闭会话。

use std::path::Path;

use tracing::{error, info, warn};

use crate::infrastructure::LookupPage;
use crate::models::RollRange;
use crate::services::DocumentDownloader;
use crate::workflow::{RollCtx, RollFlow};

/// 抓取结果，每个学号恰好出现在其中一个列表里
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FetchReport {
    /// 已下载到暂存目录的学号
    pub downloaded: Vec<String>,
    /// 未能获取 PDF 的学号（按处理顺序）
    pub not_found: Vec<String>,
}

impl FetchReport {
    pub fn total(&self) -> usize {
        self.downloaded.len() + self.not_found.len()
    }
}

/// 抓取范围内所有学号的 PDF 到 `staging_dir`
pub async fn fetch_range<P, D>(
    page: &mut P,
    flow: &RollFlow<D>,
    range: &RollRange,
    target_url: &str,
    staging_dir: &Path,
) -> FetchReport
where
    P: LookupPage,
    D: DocumentDownloader,
{
    let total = range.len();
    let mut report = FetchReport::default();

    for (idx, roll) in range.iter().enumerate() {
        let ctx = RollCtx::new(roll, idx + 1, total);
        info!("\n{} ➡️ 开始处理", ctx);

        match flow.run(&*page, target_url, &ctx, staging_dir).await {
            Ok(_) => report.downloaded.push(ctx.roll),
            Err(e) => {
                error!("{} ❌ 获取失败: {}", ctx, e);
                report.not_found.push(ctx.roll);
            }
        }
    }

    if let Err(e) = page.close().await {
        warn!("⚠️ 关闭浏览器会话失败: {}", e);
    }

    report
}
