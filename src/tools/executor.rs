//! 工具执行器
//!
//! 持有 ToolRegistry 与全局超时，execute(tool_name, args) 在超时内调用 registry.execute，
//! 超时或失败时转为 OrderError（ToolTimeout / ToolExecutionFailed）。
//! 每次调用输出一行 JSON 审计日志，附带本次涉及的订单上下文（订单编号、款号、颜色、条数、客户）。

use std::time::{Duration, Instant};

use serde_json::{json, Map, Value};
use tokio::time::timeout;

use crate::core::OrderError;
use crate::tools::ToolRegistry;

/// 工具执行器：对每次调用施加超时，并将结果映射为 OrderError
pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 执行指定工具；超时返回 ToolTimeout，工具返回 Err 则转为 ToolExecutionFailed
    pub async fn execute(&self, tool_name: &str, args: Value) -> Result<String, OrderError> {
        let start = Instant::now();
        let result = timeout(self.timeout, self.registry.execute(tool_name, args.clone())).await;

        let (outcome, output) = match &result {
            Ok(Ok(content)) => ("ok", Some(content.as_str())),
            Ok(Err(_)) => ("error", None),
            Err(_) => ("timeout", None),
        };
        let audit = json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": output.is_some(),
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "order": order_context(&args, output),
        });
        tracing::info!(audit = %audit, "tool");

        match result {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(e)) => Err(OrderError::ToolExecutionFailed(e)),
            Err(_) => Err(OrderError::ToolTimeout(tool_name.to_string())),
        }
    }
}

const ORDER_KEYS: [&str; 5] = ["order_id", "product_code", "color", "quantity", "customer"];

/// 审计用订单上下文：工具输出里的值（如新生成的订单编号）优先，其次取调用参数
fn order_context(args: &Value, output: Option<&str>) -> Map<String, Value> {
    let produced: Option<Value> = output.and_then(|o| serde_json::from_str(o).ok());
    let mut context = Map::new();
    for key in ORDER_KEYS {
        let value = produced
            .as_ref()
            .and_then(|p| p.get(key))
            .or_else(|| args.get(key))
            .filter(|v| !v.is_null());
        if let Some(v) = value {
            context.insert(key.to_string(), v.clone());
        }
    }
    context
}
