//! 基础设施层
//!
//! 持有稀缺资源（浏览器会话），只向上暴露页面操作能力

pub mod chrome_session;
pub mod lookup_page;

pub use chrome_session::{ChromeLauncher, ChromeSession};
pub use lookup_page::{LookupPage, SessionLauncher};
