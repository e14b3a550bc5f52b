//! 按配置选择 LLM 后端
//!
//! 优先使用 llm.provider 指定的后端；其 API Key 未设置时依次尝试 DashScope、DeepSeek、OpenAI，
//! 都没有 Key 时退回 Mock。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::{
    create_dashscope_client, create_deepseek_client, LlmClient, MockLlmClient, OpenAiClient,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    DashScope,
    DeepSeek,
    OpenAi,
    Mock,
}

impl Provider {
    /// 指定后端不可用时的尝试顺序
    const FALLBACK_ORDER: [Provider; 3] =
        [Provider::DashScope, Provider::DeepSeek, Provider::OpenAi];

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "dashscope" => Some(Provider::DashScope),
            "deepseek" => Some(Provider::DeepSeek),
            "openai" => Some(Provider::OpenAi),
            "mock" => Some(Provider::Mock),
            _ => None,
        }
    }

    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            Provider::DashScope => Some("DASHSCOPE_API_KEY"),
            Provider::DeepSeek => Some("DEEPSEEK_API_KEY"),
            Provider::OpenAi => Some("OPENAI_API_KEY"),
            Provider::Mock => None,
        }
    }
}

fn has_env(key: &str) -> bool {
    std::env::var(key).map(|v| !v.is_empty()).unwrap_or(false)
}

/// 选出第一个有 API Key 的后端；显式配置 mock 时总是 Mock
pub fn select_provider(configured: &str, has_key: impl Fn(&str) -> bool) -> Provider {
    let preferred = Provider::parse(configured);
    if preferred == Some(Provider::Mock) {
        return Provider::Mock;
    }
    preferred
        .into_iter()
        .chain(Provider::FALLBACK_ORDER)
        .find(|p| p.api_key_env().is_some_and(&has_key))
        .unwrap_or(Provider::Mock)
}

/// 依据 llm.provider 与环境中的 API Key 创建客户端
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let configured = cfg.llm.provider.as_str();
    let selected = select_provider(configured, has_env);
    let preferred = Provider::parse(configured);
    if preferred != Some(selected) {
        tracing::warn!(
            configured = %configured,
            selected = ?selected,
            "Configured provider unavailable (unknown or no API key), falling back"
        );
    }

    // model / base_url 只对配置里指定的后端生效
    let (model, base_url) = if preferred == Some(selected) {
        (cfg.llm.model.as_deref(), cfg.llm.base_url.as_deref())
    } else {
        (None, None)
    };
    let temperature = cfg.llm.temperature;

    match selected {
        Provider::DashScope => {
            let client = create_dashscope_client(model, base_url).with_temperature(temperature);
            tracing::info!("Using DashScope LLM ({})", client.model_name());
            Arc::new(client)
        }
        Provider::DeepSeek => {
            let client = create_deepseek_client(model).with_temperature(temperature);
            tracing::info!("Using DeepSeek LLM ({})", client.model_name());
            Arc::new(client)
        }
        Provider::OpenAi => {
            let client = OpenAiClient::new(base_url, model.unwrap_or("gpt-4o-mini"), None)
                .with_temperature(temperature);
            tracing::info!("Using OpenAI LLM ({})", client.model_name());
            Arc::new(client)
        }
        Provider::Mock => {
            tracing::info!("Using Mock LLM");
            Arc::new(MockLlmClient::new())
        }
    }
}
