//! 错误恢复引擎
//!
//! 根据 OrderError 类型返回 RecoveryAction，供对话驱动决定是重试、询问用户还是终止。

use std::time::Duration;

use crate::core::{OrderError, RecoveryAction};

#[derive(Debug, Default)]
pub struct RecoveryEngine;

impl RecoveryEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, err: &OrderError) -> RecoveryAction {
        match err {
            OrderError::Generation(e) => RecoveryAction::RetryWithPrompt(format!(
                "模型服务暂时不可用（{e}），请稍后重新输入。"
            )),
            OrderError::Timeout(limit) => RecoveryAction::RetryWithPrompt(format!(
                "模型 {} 内未响应，请重新输入。",
                describe_limit(*limit)
            )),
            OrderError::ToolTimeout(_) => RecoveryAction::AskUser(
                "订单服务响应超时，输入 \"确认\" 重试，或 \"取消\" 放弃订单。".to_string(),
            ),
            OrderError::ToolExecutionFailed(msg) | OrderError::InvalidToolOutput(msg) => {
                RecoveryAction::AskUser(format!(
                    "订单服务执行失败: {msg}。输入 \"确认\" 重试，或 \"取消\" 放弃订单。"
                ))
            }
            OrderError::Finished => RecoveryAction::Abort("本次订单对话已结束。".to_string()),
        }
    }
}

/// 整秒显示为“N 秒”，否则显示毫秒
fn describe_limit(limit: Duration) -> String {
    if limit.subsec_millis() == 0 && limit.as_secs() > 0 {
        format!("{} 秒", limit.as_secs())
    } else {
        format!("{} 毫秒", limit.as_millis())
    }
}
