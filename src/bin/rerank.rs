//! 重排序演示：用 DashScope text-rerank 对示例段落按查询相关性排序
//!
//! 用法：order-rerank [查询]（需要 DASHSCOPE_API_KEY；失败时输出原顺序、得分为 0）

use anyhow::Context;
use order_agent::{
    config::{load_config, AppConfig},
    observability,
    rerank::{DashScopeReranker, Reranker},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });
    let reranker =
        DashScopeReranker::from_config(&cfg.rerank).context("Failed to build HTTP client")?;

    let query = {
        let args: Vec<String> = std::env::args().skip(1).collect();
        if args.is_empty() {
            "什么是人工智能？".to_string()
        } else {
            args.join(" ")
        }
    };
    let passages: Vec<String> = [
        "人工智能是计算机科学的一个分支，它企图了解智能的实质，并生产出一种新的能以人类智能相似的方式做出反应的智能机器。",
        "苹果是一种水果，富含维生素和纤维，有助于健康。",
        "机器学习是人工智能的一个重要子领域，它使计算机能够从数据中学习并做出预测或决策。",
        "今天天气很好，适合户外活动。",
        "深度学习是机器学习的一个分支，它模仿人脑神经网络的工作方式。",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    println!("查询: {query}\n\n原始文档:");
    for (i, passage) in passages.iter().enumerate() {
        println!("{}. {}", i + 1, passage);
    }

    let ranked = reranker.rank(&query, &passages).await;

    println!("\n重排序后的结果:");
    for (i, r) in ranked.iter().enumerate() {
        println!("{}. [得分: {:.4}] {}", i + 1, r.score, r.passage);
    }
    Ok(())
}
