//! 命令行对话驱动集成测试

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use order_agent::cli::{Driver, Outcome, GARBLED_INPUT_MESSAGE, TURNS_EXHAUSTED_MESSAGE};
use order_agent::config::AppConfig;
use order_agent::llm::{LlmClient, LlmError, MockLlmClient};
use order_agent::memory::Message;
use order_agent::order::{FieldExtractor, OrderWorkflow};
use order_agent::tools::{order_tools, OrderBook, ToolExecutor};

fn driver_with(llm: Arc<dyn LlmClient>, limit: Duration, cfg: &AppConfig) -> Driver {
    let tools = Arc::new(ToolExecutor::new(
        order_tools(Arc::new(OrderBook::default())),
        5,
    ));
    let workflow = OrderWorkflow::new(FieldExtractor::new(llm, limit), tools);
    Driver::new(workflow, cfg)
}

fn driver(llm: MockLlmClient, cfg: &AppConfig) -> Driver {
    driver_with(Arc::new(llm), Duration::from_secs(5), cfg)
}

async fn run_bytes(driver: &Driver, input: &[u8], initial: Option<&str>) -> (Outcome, String) {
    let mut out = Vec::new();
    let outcome = driver
        .run(input, &mut out, initial.map(String::from))
        .await
        .unwrap();
    (outcome, String::from_utf8(out).unwrap())
}

async fn run(driver: &Driver, input: &str, initial: Option<&str>) -> (Outcome, String) {
    run_bytes(driver, input.as_bytes(), initial).await
}

/// 第 stall_on 次调用卡住不返回，其余调用交给规则 Mock
struct StallOnce {
    inner: MockLlmClient,
    calls: AtomicUsize,
    stall_on: usize,
}

#[async_trait]
impl LlmClient for StallOnce {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.stall_on {
            tokio::time::sleep(Duration::from_secs(3)).await;
        }
        self.inner.complete(messages).await
    }
}

#[tokio::test]
async fn test_order_created_from_stdin() {
    let cfg = AppConfig::default();
    let d = driver(MockLlmClient::new(), &cfg);
    let (outcome, out) = run(&d, "客户张三要10条红色A001款\n确认\n", None).await;

    assert_eq!(outcome, Outcome::Created("SO202512001001".to_string()));
    assert!(out.contains("Agent: 我已提取到以下订单信息：\n款号: A001"));
    assert!(out.contains("Agent: 订单创建成功！\n订单编号: SO202512001001"));
}

#[tokio::test]
async fn test_initial_query_and_cancel() {
    let cfg = AppConfig::default();
    let d = driver(MockLlmClient::new(), &cfg);
    let (outcome, out) = run(&d, "取消\n", Some("客户李四要5条A002款")).await;

    assert_eq!(outcome, Outcome::Cancelled);
    assert!(out.contains("缺失字段: 颜色"));
    assert!(out.contains("Agent: 订单已取消。"));
}

#[tokio::test]
async fn test_unknown_reprompts_and_quit() {
    let cfg = AppConfig::default();
    let d = driver(MockLlmClient::new(), &cfg);
    let (outcome, out) = run(&d, "客户张三要10条红色A001款\n好的\nEXIT\n", None).await;

    assert_eq!(outcome, Outcome::Quit);
    assert!(out.contains("Agent: 请输入 '确认'、'修改' 或 '取消'"));
    assert!(!out.contains("订单创建成功"));
}

#[tokio::test]
async fn test_turn_limit() {
    let mut cfg = AppConfig::default();
    cfg.app.max_turns = 2;
    let d = driver(MockLlmClient::new(), &cfg);
    let (outcome, out) = run(&d, "客户张三要10条红色A001款\n嗯\n嗯\n确认\n", None).await;

    assert_eq!(outcome, Outcome::TurnsExhausted);
    assert!(out.contains(TURNS_EXHAUSTED_MESSAGE));
    assert!(!out.contains("订单创建成功"));
}

#[tokio::test]
async fn test_generation_failure_prompts_retry() {
    let cfg = AppConfig::default();
    let llm = MockLlmClient::scripted(vec![Err(LlmError::Api("connection reset".to_string()))]);
    let d = driver(llm, &cfg);
    let (outcome, out) = run(&d, "客户张三要10条红色A001款\n客户张三要10条红色A001款\n确认\n", None).await;

    assert!(out.contains("模型服务暂时不可用"));
    assert_eq!(outcome, Outcome::Created("SO202512001001".to_string()));
}

#[tokio::test]
async fn test_lookup_commands_before_order() {
    let cfg = AppConfig::default();
    let d = driver(MockLlmClient::new(), &cfg);
    let (outcome, out) = run(&d, "产品 A002\n颜色 A002 灰色\n查询 SO202512001001\n退出\n", None).await;

    assert_eq!(outcome, Outcome::Quit);
    assert!(out.contains("名称: 休闲款卫衣"));
    assert!(out.contains("颜色: 灰色 (#808080)"));
    assert!(out.contains("状态: 已确认"));
}

#[tokio::test]
async fn test_input_closed() {
    let cfg = AppConfig::default();
    let d = driver(MockLlmClient::new(), &cfg);
    let (outcome, _) = run(&d, "客户张三要10条红色A001款\n", None).await;
    assert_eq!(outcome, Outcome::InputClosed);
}

#[tokio::test]
async fn test_invalid_utf8_line_reprompts_and_keeps_order() {
    let cfg = AppConfig::default();
    let d = driver(MockLlmClient::new(), &cfg);
    let mut input = "客户张三要10条红色A001款\n".as_bytes().to_vec();
    input.extend_from_slice(&[0xff, 0xfe, b'\n']);
    input.extend_from_slice("确认\n".as_bytes());
    let (outcome, out) = run_bytes(&d, &input, None).await;

    assert!(out.contains(&format!("Agent: {GARBLED_INPUT_MESSAGE}")));
    assert_eq!(outcome, Outcome::Created("SO202512001001".to_string()));
}

#[tokio::test]
async fn test_invalid_utf8_at_order_prompt_is_skipped() {
    let cfg = AppConfig::default();
    let d = driver(MockLlmClient::new(), &cfg);
    let mut input = vec![0xc3, b'\n'];
    input.extend_from_slice("客户张三要10条红色A001款\n取消\n".as_bytes());
    let (outcome, out) = run_bytes(&d, &input, None).await;

    assert!(out.contains(GARBLED_INPUT_MESSAGE));
    assert_eq!(outcome, Outcome::Cancelled);
}

#[tokio::test]
async fn test_generation_timeout_keeps_state_and_next_line_succeeds() {
    let cfg = AppConfig::default();
    let llm = Arc::new(StallOnce {
        inner: MockLlmClient::new(),
        calls: AtomicUsize::new(0),
        stall_on: 1,
    });
    let d = driver_with(llm, Duration::from_millis(200), &cfg);
    let (outcome, out) = run(
        &d,
        "客户张三要10条红色A001款\n修改条数为20\n修改条数为20\n确认\n",
        None,
    )
    .await;

    assert!(out.contains("Agent: 模型 200 毫秒内未响应，请重新输入。"));
    assert!(out.contains("Agent: 我已更新订单信息：\n款号: A001\n颜色: 红色\n条数: 20"));
    assert_eq!(outcome, Outcome::Created("SO202512001001".to_string()));
    assert!(out.contains("订单编号: SO202512001001\n款号: A001\n颜色: 红色\n条数: 20"));
}
