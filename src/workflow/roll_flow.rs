//! 单个学号处理流程 - 流程层
//!
//! 流程顺序：
//! 1. 打开查询页面
//! 2. 清空学号输入框并输入学号
//! 3. 触发查询（点击 / postback）
//! 4. 等待成绩元素出现
//! 5. 读取 PDF 链接并下载到暂存目录

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppResult, LookupError};
use crate::infrastructure::LookupPage;
use crate::services::{DocumentDownloader, LookupTrigger};
use crate::workflow::roll_ctx::RollCtx;

/// 查询页面上用到的选择器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSelectors {
    pub roll_input: String,
    pub result: String,
    pub document_link: String,
}

impl LookupSelectors {
    pub fn from_config(config: &Config) -> Self {
        Self {
            roll_input: config.roll_input_selector.clone(),
            result: config.result_selector.clone(),
            document_link: config.document_link_selector.clone(),
        }
    }
}

/// 单个学号处理流程
///
/// - 不持有页面，页面由调用方传入并在学号之间复用
/// - 只做一次尝试，失败原因原样返回给调用方
pub struct RollFlow<D> {
    selectors: LookupSelectors,
    trigger: LookupTrigger,
    input_timeout: Duration,
    result_timeout: Duration,
    downloader: D,
}

impl<D: DocumentDownloader> RollFlow<D> {
    pub fn new(
        selectors: LookupSelectors,
        trigger: LookupTrigger,
        input_timeout: Duration,
        result_timeout: Duration,
        downloader: D,
    ) -> Self {
        Self {
            selectors,
            trigger,
            input_timeout,
            result_timeout,
            downloader,
        }
    }

    pub fn from_config(config: &Config, downloader: D) -> Self {
        Self::new(
            LookupSelectors::from_config(config),
            config.lookup_trigger(),
            Duration::from_millis(config.input_timeout_ms),
            Duration::from_millis(config.result_timeout_ms),
            downloader,
        )
    }

    /// 查询并下载一个学号的 PDF，返回写入的文件路径
    pub async fn run<P>(
        &self,
        page: &P,
        target_url: &str,
        ctx: &RollCtx,
        staging_dir: &Path,
    ) -> AppResult<PathBuf>
    where
        P: LookupPage + ?Sized,
    {
        page.navigate(target_url).await?;

        page.wait_for_element(&self.selectors.roll_input, self.input_timeout)
            .await?;
        page.set_field_value(&self.selectors.roll_input, &ctx.roll)
            .await?;

        self.trigger.fire(page).await?;

        info!("{} ⏳ 等待查询结果...", ctx);
        page.wait_for_element(&self.selectors.result, self.result_timeout)
            .await?;
        info!("{} ✓ 找到成绩", ctx);

        let href = page
            .read_link(&self.selectors.document_link)
            .await?
            .filter(|h| !h.trim().is_empty())
            .ok_or(LookupError::DocumentLinkMissing)?;
        let pdf_url = resolve_link(target_url, &href)?;
        debug!("{} PDF 地址: {}", ctx, pdf_url);

        let dest = staging_dir.join(ctx.file_name());
        let size = self.downloader.download(&pdf_url, &dest).await?;
        info!("{} 📄 已下载: {} ({} 字节)", ctx, ctx.file_name(), size);

        Ok(dest)
    }
}

/// 把链接解析为绝对地址
///
/// 页面返回的链接通常已是绝对地址，原样保留；
/// 仍为相对地址时才以查询页面为基准
fn resolve_link(base: &str, href: &str) -> Result<String, LookupError> {
    let base = reqwest::Url::parse(base).map_err(|e| LookupError::Navigation {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    base.join(href.trim())
        .map(|u| u.to_string())
        .map_err(|_| LookupError::DocumentLinkMissing)
}
