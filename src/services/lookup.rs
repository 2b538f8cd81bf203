//! 查询触发策略 - 业务能力层
//!
//! 不同版本的成绩查询站点提交表单的方式不同：有的直接点击按钮，
//! 有的（ASP.NET WebForms）需要通过 `__doPostBack` 触发服务端事件

use tracing::debug;

use crate::error::LookupError;
use crate::infrastructure::LookupPage;

/// 触发查询的方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupTrigger {
    /// 点击查询按钮
    Click { selector: String },
    /// 以脚本方式触发服务端 postback 事件
    Postback {
        event_target: String,
        event_argument: String,
    },
}

impl LookupTrigger {
    /// 在页面上触发一次查询
    pub async fn fire<P>(&self, page: &P) -> Result<(), LookupError>
    where
        P: LookupPage + ?Sized,
    {
        match self {
            LookupTrigger::Click { selector } => {
                debug!("点击查询按钮: {}", selector);
                page.click(selector).await
            }
            LookupTrigger::Postback {
                event_target,
                event_argument,
            } => {
                debug!("触发 postback: {}", event_target);
                let script = postback_script(event_target, event_argument)?;
                let fired = page.evaluate_script(&script).await?;
                if fired.as_bool() == Some(true) {
                    Ok(())
                } else {
                    Err(LookupError::Script(
                        "页面上不存在 __doPostBack".to_string(),
                    ))
                }
            }
        }
    }
}

fn postback_script(event_target: &str, event_argument: &str) -> Result<String, LookupError> {
    let target = serde_json::to_string(event_target).map_err(|e| LookupError::Script(e.to_string()))?;
    let argument =
        serde_json::to_string(event_argument).map_err(|e| LookupError::Script(e.to_string()))?;
    Ok(format!(
        r#"
        (() => {{
            if (typeof __doPostBack !== 'function') {{
                return false;
            }}
            __doPostBack({}, {});
            return true;
        }})()
        "#,
        target, argument
    ))
}
