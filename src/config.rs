use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::services::lookup::LookupTrigger;

/// 指定 TOML 配置文件路径的环境变量
pub const CONFIG_FILE_ENV: &str = "RESULT_BATCH_CONFIG";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 下载暂存根目录（每次运行在其下创建独立子目录）
    pub downloads_dir: PathBuf,
    /// 合并结果目录
    pub merged_dir: PathBuf,
    /// 合并结果文件名
    pub merged_file_name: String,
    /// 合并结果对外暴露的路径前缀
    pub public_prefix: String,
    /// 学号输入框选择器
    pub roll_input_selector: String,
    /// 查询按钮选择器
    pub submit_selector: String,
    /// 成绩确认元素选择器
    pub result_selector: String,
    /// PDF 链接选择器
    pub document_link_selector: String,
    /// 触发查询的方式
    pub trigger: TriggerKind,
    /// postback 事件目标（仅 trigger = postback 时使用）
    pub postback_target: String,
    /// postback 事件参数
    pub postback_argument: String,
    /// 等待学号输入框的超时时间（毫秒）
    pub input_timeout_ms: u64,
    /// 等待成绩元素的超时时间（毫秒）
    pub result_timeout_ms: u64,
    /// 网络静默判定的采样间隔（毫秒）：相邻两次采样间没有新的资源请求即视为静默
    pub navigation_settle_ms: u64,
    /// 等待网络静默的最长时间（毫秒）
    pub network_idle_timeout_ms: u64,
    /// PDF 下载超时（秒）
    pub download_timeout_secs: u64,
    /// 是否使用无头模式
    pub headless: bool,
    /// 浏览器可执行文件路径（为空时自动查找）
    pub chrome_executable: Option<PathBuf>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

/// 触发查询方式
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Click,
    Postback,
}

impl std::str::FromStr for TriggerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "click" => Ok(TriggerKind::Click),
            "postback" => Ok(TriggerKind::Postback),
            other => Err(format!("未知的触发方式: {}", other)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            downloads_dir: PathBuf::from("downloads"),
            merged_dir: PathBuf::from("merged"),
            merged_file_name: "Final_Merged.pdf".to_string(),
            public_prefix: "/merged".to_string(),
            roll_input_selector: "#txtRollNo".to_string(),
            submit_selector: "#btnGetResult".to_string(),
            result_selector: "#lblName".to_string(),
            document_link_selector: r#"a[href$=".pdf"]"#.to_string(),
            trigger: TriggerKind::Click,
            postback_target: "btnGetResult".to_string(),
            postback_argument: String::new(),
            input_timeout_ms: 30000,
            result_timeout_ms: 4000,
            navigation_settle_ms: 500,
            network_idle_timeout_ms: 10000,
            download_timeout_secs: 30,
            headless: true,
            chrome_executable: None,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（可选）→ 环境变量
    pub fn load() -> Result<Self> {
        let base = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_toml_file(Path::new(&path))?,
            _ => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 只从环境变量读取配置
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件读取配置，缺失字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn with_env_overrides(self) -> Self {
        Self {
            downloads_dir: env_parse("DOWNLOADS_DIR").unwrap_or(self.downloads_dir),
            merged_dir: env_parse("MERGED_DIR").unwrap_or(self.merged_dir),
            merged_file_name: env_string("MERGED_FILE_NAME").unwrap_or(self.merged_file_name),
            public_prefix: env_string("PUBLIC_PREFIX").unwrap_or(self.public_prefix),
            roll_input_selector: env_string("ROLL_INPUT_SELECTOR").unwrap_or(self.roll_input_selector),
            submit_selector: env_string("SUBMIT_SELECTOR").unwrap_or(self.submit_selector),
            result_selector: env_string("RESULT_SELECTOR").unwrap_or(self.result_selector),
            document_link_selector: env_string("DOCUMENT_LINK_SELECTOR").unwrap_or(self.document_link_selector),
            trigger: env_parse("LOOKUP_TRIGGER").unwrap_or(self.trigger),
            postback_target: env_string("POSTBACK_TARGET").unwrap_or(self.postback_target),
            postback_argument: env_string("POSTBACK_ARGUMENT").unwrap_or(self.postback_argument),
            input_timeout_ms: env_parse("INPUT_TIMEOUT_MS").unwrap_or(self.input_timeout_ms),
            result_timeout_ms: env_parse("RESULT_TIMEOUT_MS").unwrap_or(self.result_timeout_ms),
            navigation_settle_ms: env_parse("NAVIGATION_SETTLE_MS").unwrap_or(self.navigation_settle_ms),
            network_idle_timeout_ms: env_parse("NETWORK_IDLE_TIMEOUT_MS")
                .unwrap_or(self.network_idle_timeout_ms),
            download_timeout_secs: env_parse("DOWNLOAD_TIMEOUT_SECS").unwrap_or(self.download_timeout_secs),
            headless: env_parse("HEADLESS").unwrap_or(self.headless),
            chrome_executable: env_parse("CHROME_EXECUTABLE").or(self.chrome_executable),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            output_log_file: env_string("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
        }
    }

    /// 根据配置构造查询触发策略
    pub fn lookup_trigger(&self) -> LookupTrigger {
        match self.trigger {
            TriggerKind::Click => LookupTrigger::Click {
                selector: self.submit_selector.clone(),
            },
            TriggerKind::Postback => LookupTrigger::Postback {
                event_target: self.postback_target.clone(),
                event_argument: self.postback_argument.clone(),
            },
        }
    }

    /// 合并结果在磁盘上的路径
    pub fn merged_path(&self) -> PathBuf {
        self.merged_dir.join(&self.merged_file_name)
    }

    /// 合并结果的下载地址
    pub fn download_url(&self) -> String {
        format!(
            "{}/{}",
            self.public_prefix.trim_end_matches('/'),
            self.merged_file_name
        )
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.parse().ok())
}
