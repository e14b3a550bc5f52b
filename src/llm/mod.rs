//! LLM 层：客户端抽象与实现（OpenAI 兼容 / DashScope / DeepSeek / Mock）

pub mod factory;
pub mod mock;
pub mod openai;
pub mod providers;
pub mod traits;

pub use factory::{create_llm_from_config, select_provider, Provider};
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use providers::{
    create_dashscope_client, create_deepseek_client, DASHSCOPE_BASE_URL, DASHSCOPE_DEFAULT_MODEL,
    DEEPSEEK_BASE_URL, DEEPSEEK_CHAT,
};
pub use traits::{LlmClient, LlmError};
