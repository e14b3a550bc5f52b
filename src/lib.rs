//! 订单助手 - 从自然语言中提取订单字段，确认后创建销售单
//!
//! 模块划分：
//! - **cli**: 命令行对话驱动（逐行读入、打印回复、退出与轮数上限）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型与恢复动作
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DashScope / DeepSeek / Mock）
//! - **memory**: 对话消息历史
//! - **observability**: 日志初始化
//! - **order**: 字段抽取、确认消息、用户操作识别、订单状态机
//! - **rerank**: DashScope 文本重排序
//! - **tools**: 订单簿与订单工具（创建 / 查询 / 产品 / 颜色）及执行器

pub mod cli;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod order;
pub mod rerank;
pub mod tools;

pub use order::{OrderWorkflow, Step};
