//! PDF 下载服务 - 业务能力层
//!
//! 只负责"把一个 URL 下载成一个文件"，不关心学号和流程

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::DownloadError;

/// 下载文档的能力
///
/// 生产环境使用 [`HttpDownloader`]，测试中用假实现替换
#[async_trait]
pub trait DocumentDownloader: Send + Sync {
    /// 下载 `url` 并写入 `dest`，返回写入的字节数
    ///
    /// 失败时 `dest` 不会留下不完整的文件
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, DownloadError>;
}

/// 基于 reqwest 的下载器
#[derive(Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new(timeout: Duration) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DownloadError::Request {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentDownloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        debug!("下载: {} -> {}", url, dest.display());

        let request_failed = |e: reqwest::Error| DownloadError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(request_failed)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(request_failed)?;
        write_atomically(dest, &bytes).await?;

        Ok(bytes.len() as u64)
    }
}

/// 先写入临时文件再重命名，避免留下半个 PDF
pub async fn write_atomically(dest: &Path, bytes: &[u8]) -> Result<(), DownloadError> {
    let partial = partial_path(dest);
    let write_failed = |source: std::io::Error| DownloadError::Write {
        path: dest.display().to_string(),
        source,
    };

    if let Err(e) = fs::write(&partial, bytes).await {
        let _ = fs::remove_file(&partial).await;
        return Err(write_failed(e));
    }
    fs::rename(&partial, dest).await.map_err(write_failed)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
