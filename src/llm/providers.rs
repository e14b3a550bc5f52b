//! OpenAI 兼容端点预设：DashScope（阿里云百炼）与 DeepSeek
//!
//! - DashScope: `DASHSCOPE_API_KEY`，`DASHSCOPE_BASE_URL` 可覆盖默认兼容模式地址
//! - DeepSeek: `DEEPSEEK_API_KEY`，`DEEPSEEK_MODEL` 可覆盖模型名

use crate::llm::OpenAiClient;

pub const DASHSCOPE_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DASHSCOPE_DEFAULT_MODEL: &str = "Qwen/Qwen3-30B-A3B-Instruct-2507";

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";

/// 创建 DashScope 客户端；base_url 优先级：参数 > DASHSCOPE_BASE_URL > 默认地址
pub fn create_dashscope_client(model: Option<&str>, base_url: Option<&str>) -> OpenAiClient {
    let api_key = std::env::var("DASHSCOPE_API_KEY").ok();
    let base_url = base_url
        .map(String::from)
        .or_else(|| std::env::var("DASHSCOPE_BASE_URL").ok())
        .unwrap_or_else(|| DASHSCOPE_BASE_URL.to_string());
    let model = model.unwrap_or(DASHSCOPE_DEFAULT_MODEL);

    OpenAiClient::new(Some(base_url.as_str()), model, api_key.as_deref())
}

/// 创建 DeepSeek 客户端
pub fn create_deepseek_client(model: Option<&str>) -> OpenAiClient {
    let api_key = std::env::var("DEEPSEEK_API_KEY")
        .ok()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok());

    let model = model
        .map(String::from)
        .or_else(|| std::env::var("DEEPSEEK_MODEL").ok())
        .unwrap_or_else(|| DEEPSEEK_CHAT.to_string());

    OpenAiClient::new(Some(DEEPSEEK_BASE_URL), &model, api_key.as_deref())
}
