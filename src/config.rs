//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `ORDER_AGENT__*` 覆盖（双下划线表示嵌套，如 `ORDER_AGENT__LLM__PROVIDER=mock`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::tools::order_book::{DEFAULT_COUNTER_START, DEFAULT_ID_PREFIX};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub order: OrderSection,
    pub tools: ToolsSection,
    pub rerank: RerankSection,
}

/// [app] 段：对话轮数上限、修改步骤的上下文窗口、退出关键词
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 确认环节最多处理的用户输入次数
    pub max_turns: usize,
    /// 修改步骤带给 LLM 的最近消息条数
    pub modify_window: usize,
    /// 单次对话保留的最多消息条数
    pub max_history: usize,
    pub quit_keywords: Vec<String>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            max_turns: 10,
            modify_window: 2,
            max_history: 40,
            quit_keywords: vec!["退出".into(), "exit".into(), "quit".into()],
        }
    }
}

/// [llm] 段：后端选择、模型、采样温度与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：dashscope / deepseek / openai / mock
    pub provider: String,
    /// 未设置时使用后端默认模型
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "dashscope".to_string(),
            model: None,
            base_url: None,
            temperature: 0.3,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    /// 单次生成超时（秒）
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

/// [order] 段：订单编号前缀与计数器起点
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrderSection {
    pub id_prefix: String,
    pub counter_start: u64,
}

impl Default for OrderSection {
    fn default() -> Self {
        Self {
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            counter_start: DEFAULT_COUNTER_START,
        }
    }
}

/// [tools] 段：单次工具调用超时（秒）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    pub tool_timeout_secs: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: 30,
        }
    }
}

/// [rerank] 段：DashScope 重排序模型
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RerankSection {
    pub model: String,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RerankSection {
    fn default() -> Self {
        Self {
            model: "gte-rerank".to_string(),
            base_url: None,
            timeout_secs: 30,
        }
    }
}

/// 从 config 目录加载配置，环境变量 ORDER_AGENT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 ORDER_AGENT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("ORDER_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.app.max_turns, 10);
        assert_eq!(cfg.app.modify_window, 2);
        assert_eq!(cfg.llm.provider, "dashscope");
        assert_eq!(cfg.order.id_prefix, "SO202512");
        assert_eq!(cfg.order.counter_start, 1000);
        assert_eq!(cfg.rerank.model, "gte-rerank");
    }

    #[test]
    fn test_load_explicit_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[app]\nmax_turns = 3\n\n[llm]\nprovider = \"mock\"\ntemperature = 0.0\n\n[order]\nid_prefix = \"SO202601\""
        )
        .unwrap();

        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.app.max_turns, 3);
        assert_eq!(cfg.app.modify_window, 2);
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.order.id_prefix, "SO202601");
        assert_eq!(cfg.order.counter_start, 1000);
    }
}
