use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use result_batch::utils::logging;
use result_batch::{App, Config, GenerateRequest};

/// 按学号范围批量下载成绩单 PDF 并合并
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// 起始学号（末 4 位为数字）
    #[arg(long, env = "START_ROLL")]
    start_roll: Option<String>,

    /// 结束学号（末 4 位为数字）
    #[arg(long, env = "END_ROLL")]
    end_roll: Option<String>,

    /// 成绩查询页面地址
    #[arg(long, env = "WEBSITE_URL")]
    website_url: Option<String>,

    /// 从 JSON 文件读取请求（{"startRoll", "endRoll", "websiteURL"}）
    #[arg(long, conflicts_with_all = ["start_roll", "end_roll", "website_url"])]
    request: Option<PathBuf>,
}

impl Cli {
    fn into_request(self) -> Result<GenerateRequest> {
        match self.request {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("无法读取请求文件: {}", path.display()))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("无法解析请求文件: {}", path.display()))
            }
            None => Ok(GenerateRequest {
                start_roll: self.start_roll,
                end_roll: self.end_roll,
                website_url: self.website_url,
            }),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init_log_file(&config.output_log_file)?;
    logging::init(config.verbose_logging, Some(&config.output_log_file))?;

    let request = cli.into_request()?;

    // 初始化并运行应用
    let app = App::initialize(config)?;
    let (status, body) = app.handle(&request).await;

    println!("{}", serde_json::to_string_pretty(&body)?);

    Ok(if status == 200 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
