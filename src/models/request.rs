//! 请求与响应结构

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::roll::RollRange;

/// 生成合并 PDF 的请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(rename = "startRoll", default)]
    pub start_roll: Option<String>,
    #[serde(rename = "endRoll", default)]
    pub end_roll: Option<String>,
    #[serde(rename = "websiteURL", default)]
    pub website_url: Option<String>,
}

/// 校验通过的请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub range: RollRange,
    pub website_url: String,
}

/// 成功响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateResponse {
    /// 合并文件的相对下载地址；没有可合并的 PDF 时为 null
    #[serde(rename = "downloadURL")]
    pub download_url: Option<String>,
    /// 未能获取 PDF 的学号（按处理顺序）
    #[serde(rename = "notFound")]
    pub not_found: Vec<String>,
}

impl GenerateRequest {
    pub fn new(
        start_roll: impl Into<String>,
        end_roll: impl Into<String>,
        website_url: impl Into<String>,
    ) -> Self {
        Self {
            start_roll: Some(start_roll.into()),
            end_roll: Some(end_roll.into()),
            website_url: Some(website_url.into()),
        }
    }

    /// 校验请求字段，不产生任何副作用
    pub fn validate(&self) -> Result<ValidatedRequest, ValidationError> {
        let (start, end, url) = match (
            non_empty(&self.start_roll),
            non_empty(&self.end_roll),
            non_empty(&self.website_url),
        ) {
            (Some(s), Some(e), Some(u)) => (s, e, u),
            _ => return Err(ValidationError::MissingFields),
        };

        let range = RollRange::parse(start, end)?;

        let parsed = reqwest::Url::parse(url).map_err(|_| ValidationError::InvalidUrl {
            url: url.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidUrl {
                url: url.to_string(),
            });
        }

        Ok(ValidatedRequest {
            range,
            website_url: url.to_string(),
        })
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
