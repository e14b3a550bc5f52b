//! 订单助手入口：初始化日志与配置，组装 LLM、订单工具与状态机，运行命令行对话。

use std::sync::Arc;

use anyhow::Context;
use order_agent::{
    cli::{Driver, Outcome},
    config::{load_config, AppConfig},
    llm::create_llm_from_config,
    observability,
    order::OrderWorkflow,
    tools::{order_tools, OrderBook, ToolExecutor},
};
use tokio::io::BufReader;

const BANNER: &str = "==================================================
订单助手
==================================================

示例输入:
- 客户张三要10条红色A001款
- 客户李四要5条A002款
- 查询 SO202512001001 / 产品 A001 / 颜色 A001 红色

输入 '退出' 结束对话
==================================================
";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let llm = create_llm_from_config(&cfg);
    let book = Arc::new(OrderBook::new(
        cfg.order.id_prefix.clone(),
        cfg.order.counter_start,
    ));
    let tools = Arc::new(ToolExecutor::new(order_tools(book), cfg.tools.tool_timeout_secs));
    let workflow = OrderWorkflow::from_config(&cfg, llm, tools);
    let driver = Driver::new(workflow, &cfg);

    // 首个命令行参数作为订单文本
    let initial = {
        let args: Vec<String> = std::env::args().skip(1).collect();
        (!args.is_empty()).then(|| args.join(" "))
    };

    print!("{BANNER}");
    let outcome = driver
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), initial)
        .await
        .context("Conversation failed")?;

    if let Outcome::Created(order_id) = &outcome {
        tracing::info!(order_id = %order_id, "done");
    }
    Ok(())
}
