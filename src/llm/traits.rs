//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / DashScope / DeepSeek / Mock）实现 LlmClient::complete：
//! 输入有序的角色消息，返回一段文本补全。

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::Message;

/// 文本生成失败：传输、鉴权或返回内容异常
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// 端点返回错误（鉴权失败、限流、模型不存在等）
    #[error("LLM API error: {0}")]
    Api(String),

    /// 请求构造失败
    #[error("LLM request error: {0}")]
    Request(String),

    /// 响应中没有任何文本
    #[error("LLM returned empty response")]
    EmptyResponse,
}

/// LLM 客户端 trait：非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// 模型名（用于日志）
    fn model_name(&self) -> &str {
        "unknown"
    }

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
