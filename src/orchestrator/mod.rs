//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! app (一次请求：校验 → 暂存目录 → 会话 → 合并)
//!     ↓
//! batch_fetcher (遍历 RollRange，复用同一个页面)
//!     ↓
//! workflow::RollFlow (处理单个学号)
//!     ↓
//! services (能力层：trigger / download / merge)
//!     ↓
//! infrastructure (基础设施：LookupPage / ChromeSession)
//! ```
//!
//! 只有编排层持有浏览器会话；单个学号的失败在 batch_fetcher 内被吸收，
//! 只有参数错误和会话级错误会向上传播。

pub mod app;
pub mod batch_fetcher;

pub use app::App;
pub use batch_fetcher::{fetch_range, FetchReport};
