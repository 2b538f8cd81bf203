//! 页面操作能力抽象
//!
//! 查询流程只依赖这里的 trait，测试时可以用假页面替换真实浏览器

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::{BrowserError, LookupError};

/// 一个可脚本驱动的浏览器页面
///
/// 职责：
/// - 只暴露导航、等待、输入、点击、执行脚本、读链接
/// - 不认识学号，不处理业务流程
#[async_trait]
pub trait LookupPage: Send + Sync {
    /// 导航到 URL 并等待页面静默
    async fn navigate(&self, url: &str) -> Result<(), LookupError>;

    /// 等待元素出现，超时返回 [`LookupError::Timeout`]
    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<(), LookupError>;

    /// 清空输入框并输入文本
    async fn set_field_value(&self, selector: &str, value: &str) -> Result<(), LookupError>;

    async fn click(&self, selector: &str) -> Result<(), LookupError>;

    /// 执行 JS 表达式并返回 JSON 结果
    async fn evaluate_script(&self, script: &str) -> Result<JsonValue, LookupError>;

    /// 读取链接元素的 `href` 属性值（DOM property，不是原始 attribute）
    ///
    /// 返回值已由页面按当前文档地址和 `<base href>` 解析为绝对地址；
    /// 元素不存在或没有链接时返回 None
    async fn read_link(&self, selector: &str) -> Result<Option<String>, LookupError>;

    /// 关闭会话，调用后页面不可再用
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// 浏览器会话启动器
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    type Page: LookupPage;

    /// 启动一个新会话；失败时必须先关闭已部分打开的资源
    async fn launch(&self) -> Result<Self::Page, BrowserError>;
}
