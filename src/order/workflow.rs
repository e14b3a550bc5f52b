//! 订单流程状态机
//!
//! extract → confirm_fields → { confirm → create（终态）, modify → confirm_fields, cancel → 终态 }
//!
//! `advance(&state, input)` 是唯一的转移入口：不修改传入的状态，返回新状态与要展示给用户的回复。
//! 出错时调用方保留旧状态即可重试。

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::AppConfig;
use crate::core::OrderError;
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::order::extractor::FieldExtractor;
use crate::order::intent::UserAction;
use crate::order::presenter::{
    render_confirmation, render_order_created, ConfirmationKind, CANCELLED_MESSAGE,
    UNKNOWN_ACTION_PROMPT,
};
use crate::order::state::{OrderPhase, OrderState};
use crate::tools::{
    ColorInfo, ColorInfoTool, CreateOrderResult, CreateSalesOrderTool, OrderStatus,
    ProductInfo, ProductInfoTool, ToolExecutor, TrackSalesOrderTool,
};

/// 一次转移的结果
#[derive(Debug, Clone)]
pub struct Step {
    pub state: OrderState,
    pub reply: String,
    /// 确认节点识别出的用户操作；抽取步骤为 None
    pub action: Option<UserAction>,
}

pub struct OrderWorkflow {
    extractor: FieldExtractor,
    tools: Arc<ToolExecutor>,
    modify_window: usize,
    max_history: usize,
}

impl OrderWorkflow {
    pub fn new(extractor: FieldExtractor, tools: Arc<ToolExecutor>) -> Self {
        Self {
            extractor,
            tools,
            modify_window: 2,
            max_history: 40,
        }
    }

    pub fn from_config(cfg: &AppConfig, llm: Arc<dyn LlmClient>, tools: Arc<ToolExecutor>) -> Self {
        let extractor =
            FieldExtractor::new(llm, Duration::from_secs(cfg.llm.timeouts.request));
        Self::new(extractor, tools)
            .with_modify_window(cfg.app.modify_window)
            .with_max_history(cfg.app.max_history)
    }

    pub fn with_modify_window(mut self, n: usize) -> Self {
        self.modify_window = n.max(1);
        self
    }

    pub fn with_max_history(mut self, n: usize) -> Self {
        self.max_history = n;
        self
    }

    /// 新对话的初始状态
    pub fn initial_state(&self) -> OrderState {
        OrderState::new(self.max_history)
    }

    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.extractor.token_usage()
    }

    /// 从订单文本开始一次新对话（抽取 + 展示确认消息）
    pub async fn start(&self, query: &str) -> Result<Step, OrderError> {
        self.advance(&self.initial_state(), query).await
    }

    /// 状态转移
    pub async fn advance(&self, state: &OrderState, input: &str) -> Result<Step, OrderError> {
        tracing::debug!(phase = state.phase.name(), "advance");
        match &state.phase {
            OrderPhase::Extracting => self.extract_fields(state, input).await,
            OrderPhase::AwaitingConfirmation => {
                let action = UserAction::classify(input);
                tracing::info!(action = action.as_str(), "user action");
                let mut step = match action {
                    UserAction::Confirm => self.process_confirm(state, input).await?,
                    UserAction::Modify => self.process_modify(state, input).await?,
                    UserAction::Cancel => process_cancel(state, input),
                    UserAction::Unknown => Step {
                        state: state.clone(),
                        reply: UNKNOWN_ACTION_PROMPT.to_string(),
                        action: None,
                    },
                };
                step.action = Some(action);
                Ok(step)
            }
            OrderPhase::Created(_) | OrderPhase::Cancelled => Err(OrderError::Finished),
        }
    }

    async fn extract_fields(&self, state: &OrderState, input: &str) -> Result<Step, OrderError> {
        let state = state.clone().with_message(Message::user(input));
        let extraction = self.extractor.extract(state.history.messages()).await?;
        tracing::info!(missing = ?extraction.missing, "fields extracted");
        Ok(confirm_fields(
            state.with_extraction(extraction),
            ConfirmationKind::Extracted,
        ))
    }

    async fn process_confirm(&self, state: &OrderState, input: &str) -> Result<Step, OrderError> {
        let fields = state.fields();
        let args = json!({
            "product_code": fields.product_code.clone().unwrap_or_default(),
            "color": fields.color.clone().unwrap_or_default(),
            "quantity": fields.quantity.unwrap_or(0),
            "customer": fields.customer.clone().unwrap_or_default(),
        });
        let raw = self.tools.execute(CreateSalesOrderTool::NAME, args).await?;
        let result: CreateOrderResult = decode(&raw)?;
        if !result.success {
            return Err(OrderError::ToolExecutionFailed(result.message));
        }

        let reply = render_order_created(&result.order);
        let state = state
            .clone()
            .with_message(Message::user(input))
            .with_message(Message::assistant(reply.clone()))
            .with_phase(OrderPhase::Created(result.order));
        Ok(Step {
            state,
            reply,
            action: None,
        })
    }

    async fn process_modify(&self, state: &OrderState, input: &str) -> Result<Step, OrderError> {
        let state = state.clone().with_message(Message::user(input));
        let window = state.history.recent(self.modify_window);
        let extraction = self
            .extractor
            .modify(input, window, &state.extraction)
            .await?;
        tracing::info!(missing = ?extraction.missing, "fields modified");
        Ok(confirm_fields(
            state.with_extraction(extraction),
            ConfirmationKind::Updated,
        ))
    }

    /// 查询订单状态
    pub async fn track_order(&self, order_id: &str) -> Result<String, OrderError> {
        let raw = self
            .tools
            .execute(TrackSalesOrderTool::NAME, json!({ "order_id": order_id }))
            .await?;
        let status: OrderStatus = decode(&raw)?;
        Ok(format!(
            "订单编号: {}\n状态: {}",
            status.order_id, status.status
        ))
    }

    /// 查询产品信息
    pub async fn product_info(&self, product_code: &str) -> Result<String, OrderError> {
        let raw = self
            .tools
            .execute(ProductInfoTool::NAME, json!({ "product_code": product_code }))
            .await?;
        let info: ProductInfo = decode(&raw)?;
        let colors = if info.available_colors.is_empty() {
            "无".to_string()
        } else {
            info.available_colors.join(", ")
        };
        Ok(format!(
            "款号: {}\n名称: {}\n价格: {:.2}\n可选颜色: {}\n库存: {}",
            info.product_code, info.product_name, info.price, colors, info.stock
        ))
    }

    /// 查询产品颜色信息
    pub async fn color_info(&self, product_code: &str, color: &str) -> Result<String, OrderError> {
        let raw = self
            .tools
            .execute(
                ColorInfoTool::NAME,
                json!({ "product_code": product_code, "color": color }),
            )
            .await?;
        let info: ColorInfo = decode(&raw)?;
        Ok(format!(
            "款号: {}\n颜色: {} ({})\n库存: {}\n可订: {}",
            info.product_code,
            info.color,
            info.color_code,
            info.stock,
            if info.available { "是" } else { "否" }
        ))
    }
}

/// 展示当前字段并进入等待确认
fn confirm_fields(state: OrderState, kind: ConfirmationKind) -> Step {
    let reply = render_confirmation(kind, state.fields(), state.missing());
    let state = state
        .with_message(Message::assistant(reply.clone()))
        .with_phase(OrderPhase::AwaitingConfirmation);
    Step {
        state,
        reply,
        action: None,
    }
}

fn process_cancel(state: &OrderState, input: &str) -> Step {
    let state = state
        .clone()
        .with_message(Message::user(input))
        .with_message(Message::assistant(CANCELLED_MESSAGE))
        .with_phase(OrderPhase::Cancelled);
    Step {
        state,
        reply: CANCELLED_MESSAGE.to_string(),
        action: None,
    }
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, OrderError> {
    serde_json::from_str(raw).map_err(|e| OrderError::InvalidToolOutput(e.to_string()))
}
