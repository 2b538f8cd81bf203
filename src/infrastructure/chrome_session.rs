//! 基于 chromiumoxide 的真实浏览器会话

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error, info, warn};

use crate::browser::launch_headless_browser;
use crate::config::Config;
use crate::error::{BrowserError, LookupError};
use crate::infrastructure::lookup_page::{LookupPage, SessionLauncher};

/// 元素轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 读取文档加载状态和已发起的资源请求数
const NETWORK_SNAPSHOT_SCRIPT: &str = r#"
    ({
        ready: document.readyState === 'complete',
        resources: performance.getEntriesByType('resource').length
    })
"#;

/// 某一时刻的页面网络状态
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
struct NetworkSnapshot {
    ready: bool,
    resources: u64,
}

impl NetworkSnapshot {
    /// 文档已加载完成，且两次采样之间没有新的资源请求
    fn settled_since(&self, previous: &NetworkSnapshot) -> bool {
        self.ready && previous.ready && self.resources == previous.resources
    }
}

/// 浏览器会话
///
/// 唯一持有 Browser 和 Page 的结构，整次运行复用同一个页面
pub struct ChromeSession {
    browser: Option<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
    settle: Duration,
    network_idle_timeout: Duration,
}

impl ChromeSession {
    async fn find(&self, selector: &str) -> Result<chromiumoxide::Element, LookupError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|e| LookupError::ElementNotFound {
                selector: selector.to_string(),
                reason: e.to_string(),
            })
    }

    async fn network_snapshot(&self) -> Result<NetworkSnapshot, LookupError> {
        let value = self.evaluate_script(NETWORK_SNAPSHOT_SCRIPT).await?;
        serde_json::from_value(value).map_err(|e| LookupError::Script(e.to_string()))
    }

    /// 等待网络静默：每隔 settle 采样一次，连续两次没有新的资源请求即视为静默
    ///
    /// 超过 network_idle_timeout 仍未静默时只记录警告，后续由元素等待兜底
    async fn wait_for_network_quiet(&self) -> Result<(), LookupError> {
        let started = Instant::now();
        let quiet = timeout(self.network_idle_timeout, async {
            let mut previous = self.network_snapshot().await?;
            loop {
                sleep(self.settle).await;
                let current = self.network_snapshot().await?;
                if current.settled_since(&previous) {
                    return Ok::<_, LookupError>(());
                }
                previous = current;
            }
        })
        .await;

        match quiet {
            Ok(result) => {
                result?;
                debug!("网络静默 ({}ms)", started.elapsed().as_millis());
            }
            Err(_) => warn!(
                "等待网络静默超时 ({}ms)，继续执行",
                self.network_idle_timeout.as_millis()
            ),
        }
        Ok(())
    }
}

/// 把字符串转成 JS 字面量
fn js_string(value: &str) -> Result<String, LookupError> {
    serde_json::to_string(value).map_err(|e| LookupError::Script(e.to_string()))
}

#[async_trait]
impl LookupPage for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<(), LookupError> {
        debug!("导航到: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| LookupError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        // goto 只等到 load 事件，异步请求可能仍在进行
        self.wait_for_network_quiet().await
    }

    async fn wait_for_element(&self, selector: &str, wait: Duration) -> Result<(), LookupError> {
        let started = Instant::now();
        let found = timeout(wait, async {
            while self.page.find_element(selector).await.is_err() {
                sleep(POLL_INTERVAL).await;
            }
        })
        .await;

        match found {
            Ok(()) => {
                debug!("元素 {} 出现 ({}ms)", selector, started.elapsed().as_millis());
                Ok(())
            }
            Err(_) => Err(LookupError::Timeout {
                selector: selector.to_string(),
                timeout_ms: wait.as_millis() as u64,
            }),
        }
    }

    async fn set_field_value(&self, selector: &str, value: &str) -> Result<(), LookupError> {
        let clear = format!(
            "(() => {{ const el = document.querySelector({}); if (!el) return false; el.value = ''; return true; }})()",
            js_string(selector)?
        );
        if self.evaluate_script(&clear).await? != JsonValue::Bool(true) {
            return Err(LookupError::ElementNotFound {
                selector: selector.to_string(),
                reason: "清空输入框时未找到元素".to_string(),
            });
        }

        let element = self.find(selector).await?;
        element
            .click()
            .await
            .map_err(|e| LookupError::Script(e.to_string()))?
            .type_str(value)
            .await
            .map_err(|e| LookupError::Script(e.to_string()))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), LookupError> {
        self.find(selector)
            .await?
            .click()
            .await
            .map_err(|e| LookupError::Script(e.to_string()))?;
        Ok(())
    }

    async fn evaluate_script(&self, script: &str) -> Result<JsonValue, LookupError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| LookupError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(JsonValue::Null))
    }

    async fn read_link(&self, selector: &str) -> Result<Option<String>, LookupError> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); return el && el.href ? String(el.href) : null; }})()",
            js_string(selector)?
        );
        Ok(self
            .evaluate_script(&script)
            .await?
            .as_str()
            .map(str::to_string))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };
        info!("🔒 关闭浏览器会话");
        let result = browser.close().await;
        if let Err(e) = browser.wait().await {
            warn!("等待浏览器进程退出失败: {}", e);
        }
        self.handler_task.abort();
        result
            .map(|_| ())
            .map_err(|e| BrowserError::CloseFailed(e.to_string()))
    }
}

/// 启动 Chrome 会话
pub struct ChromeLauncher {
    config: Config,
}

impl ChromeLauncher {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    type Page = ChromeSession;

    async fn launch(&self) -> Result<ChromeSession, BrowserError> {
        let (mut browser, handler_task) = launch_headless_browser(&self.config).await?;

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                error!("创建页面失败: {}", e);
                // 浏览器已启动，必须关闭后再返回错误
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(BrowserError::PageCreationFailed(e.to_string()));
            }
        };
        debug!("页面创建成功");

        Ok(ChromeSession {
            browser: Some(browser),
            page,
            handler_task,
            settle: Duration::from_millis(self.config.navigation_settle_ms),
            network_idle_timeout: Duration::from_millis(self.config.network_idle_timeout_ms),
        })
    }
}
