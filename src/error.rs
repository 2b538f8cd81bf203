use serde::Serialize;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 请求参数错误
    #[error("{0}")]
    Validation(#[from] ValidationError),
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 单个学号查询失败
    #[error("查询失败: {0}")]
    Lookup(#[from] LookupError),
    /// PDF 下载失败
    #[error("下载失败: {0}")]
    Download(#[from] DownloadError),
    /// PDF 合并失败
    #[error("合并失败: {0}")]
    Merge(#[from] MergeError),
    /// 文件操作错误
    #[error("文件错误 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 后台任务异常退出
    #[error("后台任务失败: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// 请求参数错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required fields: startRoll, endRoll, websiteURL")]
    MissingFields,
    #[error("Roll number '{roll}' must end with 4 digits")]
    MalformedRoll { roll: String },
    #[error("startRoll '{start}' and endRoll '{end}' must have the same length")]
    LengthMismatch { start: String, end: String },
    #[error("websiteURL '{url}' is not an absolute http(s) URL")]
    InvalidUrl { url: String },
}

/// 浏览器会话错误（整次运行失败）
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("浏览器配置失败: {0}")]
    Configuration(String),
    #[error("启动浏览器失败: {0}")]
    LaunchFailed(String),
    #[error("创建页面失败: {0}")]
    PageCreationFailed(String),
    #[error("关闭浏览器失败: {0}")]
    CloseFailed(String),
}

/// 单个学号的查询错误（只记录到 notFound，不中断批处理）
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("导航到 {url} 失败: {reason}")]
    Navigation { url: String, reason: String },
    #[error("等待元素 {selector} 超时 ({timeout_ms}ms)")]
    Timeout { selector: String, timeout_ms: u64 },
    #[error("未找到元素 {selector}: {reason}")]
    ElementNotFound { selector: String, reason: String },
    #[error("执行脚本失败: {0}")]
    Script(String),
    #[error("未找到 PDF 链接")]
    DocumentLinkMissing,
}

/// PDF 下载错误
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("请求 {url} 失败: {reason}")]
    Request { url: String, reason: String },
    #[error("{url} 返回状态码 {status}")]
    BadStatus { url: String, status: u16 },
    #[error("写入 {path} 失败: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// PDF 合并错误
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("读取暂存目录 {path} 失败: {source}")]
    ListFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("页面树结构错误: {0}")]
    Structure(#[from] lopdf::Error),
    #[error("写入合并文件 {path} 失败: {reason}")]
    WriteFailed { path: String, reason: String },
}

/// 对外返回的错误体
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    /// 创建文件操作错误
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// 对应的 HTTP 状态码：参数错误为 400，其余一律 500
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 400,
            _ => 500,
        }
    }

    /// 转换为对外错误体，内部错误不暴露细节
    pub fn to_body(&self) -> ErrorBody {
        match self {
            AppError::Validation(e) => ErrorBody {
                error: e.to_string(),
            },
            _ => ErrorBody {
                error: "Internal server error".to_string(),
            },
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
