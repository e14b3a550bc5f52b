//! 订单流程错误类型与恢复动作
//!
//! 与 RecoveryEngine 配合：根据 OrderError 决定 RetryWithPrompt / AskUser / Abort。
//! JSON 解析失败不在这里：抽取器内部用兜底字段就地恢复。

use std::time::Duration;

use thiserror::Error;

use crate::llm::LlmError;

/// 订单流程中可能出现的错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// 文本生成不可用（传输 / 鉴权 / 空响应）
    #[error("Generation failed: {0}")]
    Generation(#[from] LlmError),

    /// 文本生成超时
    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    /// 工具返回的内容无法解码
    #[error("Invalid tool output: {0}")]
    InvalidToolOutput(String),

    /// 对话已到终态（已下单或已取消）
    #[error("Conversation already finished")]
    Finished,
}

/// 恢复引擎根据错误类型给出的建议动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// 状态不变，提示用户重新输入
    RetryWithPrompt(String),
    /// 需要用户决策
    AskUser(String),
    /// 终止当前对话
    Abort(String),
}
