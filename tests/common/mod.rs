//! 集成测试共用的假页面、假下载器和 PDF 生成工具

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lopdf::{dictionary, Document, Object, Stream};
use result_batch::error::{BrowserError, DownloadError, LookupError};
use result_batch::{Config, DocumentDownloader, LookupPage, SessionLauncher};
use serde_json::Value as JsonValue;

pub const RESULT_SELECTOR: &str = "#lblName";
pub const PAGES_PER_DOCUMENT: u32 = 2;

/// 假站点上某个学号的查询结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Found,
    Timeout,
    NoLink,
    BrokenDownload,
    CorruptPdf,
}

/// 会话级共享的调用记录
#[derive(Debug, Default)]
pub struct Calls {
    pub launches: AtomicUsize,
    pub closes: AtomicUsize,
    pub events: Mutex<Vec<String>>,
}

impl Calls {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }
}

/// 按学号返回预设结果的假查询页面
///
/// 提交查询后页面跳转到 `result_page`（未设置时停留在查询页面），
/// PDF 链接是相对地址，按当前页面地址解析，和浏览器读取 `a.href` 的行为一致
pub struct FakePortal {
    outcomes: Arc<HashMap<String, Outcome>>,
    result_page: Option<String>,
    typed: Mutex<String>,
    current_url: Mutex<String>,
    calls: Arc<Calls>,
}

impl FakePortal {
    pub fn new(
        outcomes: HashMap<String, Outcome>,
        result_page: Option<String>,
        calls: Arc<Calls>,
    ) -> Self {
        Self {
            outcomes: Arc::new(outcomes),
            result_page,
            typed: Mutex::new(String::new()),
            current_url: Mutex::new("about:blank".to_string()),
            calls,
        }
    }

    fn submit(&self) {
        if let Some(result_page) = &self.result_page {
            *self.current_url.lock().unwrap() = result_page.clone();
        }
    }

    fn current(&self) -> (String, Outcome) {
        let roll = self.typed.lock().unwrap().clone();
        let outcome = self.outcomes.get(&roll).copied().unwrap_or(Outcome::Found);
        (roll, outcome)
    }
}

#[async_trait]
impl LookupPage for FakePortal {
    async fn navigate(&self, url: &str) -> Result<(), LookupError> {
        self.calls.record(format!("navigate {}", url));
        self.typed.lock().unwrap().clear();
        *self.current_url.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<(), LookupError> {
        if selector == RESULT_SELECTOR && self.current().1 == Outcome::Timeout {
            return Err(LookupError::Timeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn set_field_value(&self, _selector: &str, value: &str) -> Result<(), LookupError> {
        *self.typed.lock().unwrap() = value.to_string();
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), LookupError> {
        self.calls.record(format!("click {}", selector));
        self.submit();
        Ok(())
    }

    async fn evaluate_script(&self, script: &str) -> Result<JsonValue, LookupError> {
        if script.contains("__doPostBack(") {
            self.calls.record("postback");
            self.submit();
            return Ok(JsonValue::Bool(true));
        }
        Ok(JsonValue::Null)
    }

    async fn read_link(&self, _selector: &str) -> Result<Option<String>, LookupError> {
        let (roll, outcome) = self.current();
        let href = match outcome {
            Outcome::NoLink => return Ok(None),
            Outcome::BrokenDownload => format!("broken/{}.pdf", roll),
            Outcome::CorruptPdf => format!("corrupt/{}.pdf", roll),
            _ => format!("files/{}.pdf", roll),
        };
        let base = reqwest::Url::parse(&self.current_url.lock().unwrap()).unwrap();
        Ok(Some(base.join(&href).unwrap().to_string()))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.calls.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 创建 [`FakePortal`] 的启动器
pub struct FakeLauncher {
    pub outcomes: HashMap<String, Outcome>,
    pub result_page: Option<String>,
    pub calls: Arc<Calls>,
    pub fail: bool,
}

impl FakeLauncher {
    pub fn new(outcomes: &[(&str, Outcome)]) -> Self {
        Self {
            outcomes: outcomes
                .iter()
                .map(|(roll, outcome)| (roll.to_string(), *outcome))
                .collect(),
            result_page: None,
            calls: Arc::new(Calls::default()),
            fail: false,
        }
    }

    /// 提交查询后跳转到另一个地址的站点
    pub fn with_result_page(mut self, url: &str) -> Self {
        self.result_page = Some(url.to_string());
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    type Page = FakePortal;

    async fn launch(&self) -> Result<FakePortal, BrowserError> {
        self.calls.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BrowserError::LaunchFailed("chrome not found".to_string()));
        }
        Ok(FakePortal::new(
            self.outcomes.clone(),
            self.result_page.clone(),
            self.calls.clone(),
        ))
    }
}

/// 根据 URL 生成 PDF 的假下载器
#[derive(Clone, Default)]
pub struct FakeDownloader {
    pub urls: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl DocumentDownloader for FakeDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        self.urls.lock().unwrap().push(url.to_string());
        if url.contains("/broken/") {
            return Err(DownloadError::BadStatus {
                url: url.to_string(),
                status: 404,
            });
        }
        if url.contains("/corrupt/") {
            std::fs::write(dest, b"<html>Result not available</html>").unwrap();
            return Ok(34);
        }
        let label = dest.file_stem().unwrap().to_string_lossy().to_string();
        create_test_pdf(dest, &label, PAGES_PER_DOCUMENT);
        Ok(std::fs::metadata(dest).unwrap().len())
    }
}

/// 指向临时目录的测试配置
pub fn test_config(root: &Path) -> Config {
    Config {
        downloads_dir: root.join("downloads"),
        merged_dir: root.join("merged"),
        result_timeout_ms: 50,
        input_timeout_ms: 50,
        ..Config::default()
    }
}

/// 生成测试 PDF，每页字典带有 `Label` 标记（"<label>-<页序号>"）
pub fn create_test_pdf(path: &Path, label: &str, pages: u32) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let resources_id = doc.add_object(dictionary! {});

    let mut kids = Vec::new();
    for n in 0..pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
            "Label" => Object::string_literal(format!("{}-{}", label, n)),
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// 按页顺序取出每页的 `Label` 标记
pub fn page_labels(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| {
            let label = doc.get_dictionary(id).unwrap().get(b"Label").unwrap();
            String::from_utf8_lossy(label.as_str().unwrap()).to_string()
        })
        .collect()
}
