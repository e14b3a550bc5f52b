//! 字段抽取：调用 LLM 从订单文本（或修改意图）中提取 OrderFields
//!
//! 解析流程：剥离第一个 ``` 代码块 → 按 ExtractionPayload 强类型解码 → 用字段值重算缺失列表。
//! 解码失败（语法错误或字段形状不符）时：
//! - 首次抽取：清空字段，四个字段全部缺失
//! - 修改：保留修改前的字段与缺失列表

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::error::Category;
use thiserror::Error;
use tokio::time::timeout;

use crate::core::OrderError;
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::order::fields::{OrderField, OrderFields};

/// LLM 返回内容无法解析为抽取结果
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// 不是合法 JSON
    #[error("invalid JSON: {0}")]
    Json(String),

    /// 是 JSON，但字段形状不符
    #[error("unexpected payload shape: {0}")]
    Shape(String),
}

/// LLM 约定返回的 JSON 结构
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExtractionPayload {
    extracted_fields: OrderFields,
    missing_fields: Vec<String>,
}

/// 仅用于生成 Schema 注入 system prompt
#[allow(dead_code)]
#[derive(JsonSchema)]
struct ExtractionFormat {
    /// 已识别的字段；无法识别的字段填 null
    extracted_fields: ExtractedFieldsFormat,
    /// 缺失字段的中文名，如 ["颜色", "客户"]
    missing_fields: Vec<String>,
}

#[allow(dead_code)]
#[derive(JsonSchema)]
struct ExtractedFieldsFormat {
    /// 款号，如 A001
    product_code: Option<String>,
    /// 颜色，如 红色
    color: Option<String>,
    /// 条数，整数
    quantity: Option<u32>,
    /// 客户名称
    customer: Option<String>,
}

/// 返回抽取结果的 JSON Schema 字符串，可拼入 system prompt
pub fn extraction_schema_json() -> String {
    let schema = schema_for!(ExtractionFormat);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// 一次抽取 / 修改的结果；missing 总是与 fields 一致
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub fields: OrderFields,
    pub missing: Vec<OrderField>,
}

impl Extraction {
    pub fn new(fields: OrderFields) -> Self {
        let missing = fields.missing_fields();
        Self { fields, missing }
    }

    /// 首次抽取失败时的兜底：无字段，四个字段全部缺失
    pub fn empty() -> Self {
        Self::new(OrderFields::default())
    }

    /// 以字段值为准重算缺失列表；与 LLM 自报的列表不一致时记录告警
    fn reconcile(fields: OrderFields, reported: &[String]) -> Self {
        let extraction = Self::new(fields);
        let reported_set: BTreeSet<&'static str> = reported
            .iter()
            .filter_map(|name| match OrderField::from_name(name) {
                Some(f) => Some(f.key()),
                None => {
                    tracing::warn!(field = %name, "LLM reported unknown missing field");
                    None
                }
            })
            .collect();
        let derived_set: BTreeSet<&'static str> =
            extraction.missing.iter().map(|f| f.key()).collect();
        if reported_set != derived_set {
            tracing::warn!(
                reported = ?reported,
                derived = ?extraction.missing,
                "missing_fields disagrees with extracted values, using derived list"
            );
        }
        extraction
    }
}

/// 取第一个代码块内的内容（优先 ```json，其次裸 ```）；没有代码块时原样返回
pub fn strip_code_block(raw: &str) -> &str {
    for fence in ["```json", "```"] {
        if let Some(start) = raw.find(fence) {
            let rest = &raw[start + fence.len()..];
            return match rest.find("```") {
                Some(end) => rest[..end].trim(),
                None => rest.trim(),
            };
        }
    }
    raw.trim()
}

/// 解析 LLM 输出为 Extraction
pub fn parse_extraction(raw: &str) -> Result<Extraction, ParseError> {
    let body = strip_code_block(raw);
    let payload: ExtractionPayload = serde_json::from_str(body).map_err(|e| match e.classify() {
        Category::Data => ParseError::Shape(e.to_string()),
        _ => ParseError::Json(e.to_string()),
    })?;
    Ok(Extraction::reconcile(
        payload.extracted_fields,
        &payload.missing_fields,
    ))
}

const EXTRACT_SYSTEM_PROMPT: &str = "你是一个订单助手，负责从用户的订单文本中提取订单字段。
需要提取的字段包括：
- 款号 (product_code): 产品唯一标识，如 A001, A002
- 颜色 (color): 产品颜色，如 红色, 蓝色
- 条数 (quantity): 订购数量，整数
- 客户 (customer): 客户名称

请仔细分析用户输入，提取所有可识别的字段。
如果某个字段无法从文本中识别，请将其标记为缺失。
返回格式为JSON，包含 extracted_fields 和 missing_fields 两个字段。
只返回JSON，不要包含其他文字说明。";

fn extract_prompt() -> String {
    format!(
        "{EXTRACT_SYSTEM_PROMPT}\n\nJSON Schema:\n{}",
        extraction_schema_json()
    )
}

fn modify_prompt(user_input: &str) -> String {
    format!(
        "你是一个订单助手，用户想要修改订单字段。
用户输入: {user_input}

请分析用户的修改意图，提取更新后的订单字段。
返回格式为JSON，包含 extracted_fields 和 missing_fields 两个字段。"
    )
}

/// 字段抽取器：持有 LLM 与单次调用超时
pub struct FieldExtractor {
    llm: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl FieldExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// 底层 LLM 的累计 token 用量 (prompt, completion, total)
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    /// 拼 system + 上下文调用 LLM；超时返回 OrderError::Timeout
    async fn generate(&self, system: String, context: &[Message]) -> Result<String, OrderError> {
        let mut messages = Vec::with_capacity(context.len() + 1);
        messages.push(Message::system(system));
        messages.extend_from_slice(context);

        tracing::debug!(model = self.llm.model_name(), messages = messages.len(), "generate");
        match timeout(self.timeout, self.llm.complete(&messages)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(OrderError::Generation(e)),
            Err(_) => Err(OrderError::Timeout(self.timeout)),
        }
    }

    /// 从对话历史中抽取订单字段；解析失败时返回 Extraction::empty()
    pub async fn extract(&self, history: &[Message]) -> Result<Extraction, OrderError> {
        let raw = self.generate(extract_prompt(), history).await?;
        Ok(parse_extraction(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "extraction parse failed, clearing fields");
            Extraction::empty()
        }))
    }

    /// 按用户修改意图重新抽取；window 为最近几条消息，解析失败时保留 previous
    pub async fn modify(
        &self,
        user_input: &str,
        window: &[Message],
        previous: &Extraction,
    ) -> Result<Extraction, OrderError> {
        let raw = self.generate(modify_prompt(user_input), window).await?;
        Ok(parse_extraction(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "modification parse failed, keeping previous fields");
            previous.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockLlmClient};

    const FULL: &str = r#"{"extracted_fields": {"product_code": "A001", "color": "红色", "quantity": 10, "customer": "张三"}, "missing_fields": []}"#;

    #[test]
    fn test_strip_json_fence() {
        let raw = format!("好的，结果如下：\n```json\n{FULL}\n```\n以上。");
        assert_eq!(strip_code_block(&raw), FULL);
    }

    #[test]
    fn test_strip_bare_fence_and_unterminated() {
        assert_eq!(strip_code_block("```\n{}\n```"), "{}");
        assert_eq!(strip_code_block("```json\n{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_code_block("  {}  "), "{}");
    }

    #[test]
    fn test_parse_full_payload() {
        let extraction = parse_extraction(&format!("```json\n{FULL}\n```")).unwrap();
        assert_eq!(extraction.fields.product_code.as_deref(), Some("A001"));
        assert_eq!(extraction.fields.color.as_deref(), Some("红色"));
        assert_eq!(extraction.fields.quantity, Some(10));
        assert_eq!(extraction.fields.customer.as_deref(), Some("张三"));
        assert!(extraction.missing.is_empty());
    }

    #[test]
    fn test_parse_partial_payload() {
        let raw = r#"{"extracted_fields": {"product_code": "A002", "quantity": 5, "customer": "李四", "color": null}, "missing_fields": ["颜色"]}"#;
        let extraction = parse_extraction(raw).unwrap();
        assert_eq!(extraction.missing, vec![OrderField::Color]);
    }

    #[test]
    fn test_missing_list_is_derived_from_values() {
        // LLM 自报的缺失列表与字段值不一致时以字段值为准
        let raw = r#"{"extracted_fields": {"product_code": "A001"}, "missing_fields": ["客户"]}"#;
        let extraction = parse_extraction(raw).unwrap();
        assert_eq!(
            extraction.missing,
            vec![OrderField::Color, OrderField::Quantity, OrderField::Customer]
        );
    }

    #[test]
    fn test_parse_errors_are_classified() {
        assert!(matches!(parse_extraction("抱歉，我无法理解"), Err(ParseError::Json(_))));
        assert!(matches!(
            parse_extraction(r#"{"extracted_fields": {"quantity": "十条左右"}}"#),
            Err(ParseError::Shape(_))
        ));
        assert!(matches!(parse_extraction("[1, 2]"), Err(ParseError::Shape(_))));
    }

    #[test]
    fn test_schema_mentions_payload_keys() {
        let schema = extraction_schema_json();
        assert!(schema.contains("extracted_fields"));
        assert!(schema.contains("missing_fields"));
        assert!(schema.contains("product_code"));
    }

    #[tokio::test]
    async fn test_extract_falls_back_to_empty() {
        let llm = Arc::new(MockLlmClient::scripted(vec![Ok("not json".to_string())]));
        let extractor = FieldExtractor::new(llm, Duration::from_secs(5));
        let extraction = extractor
            .extract(&[Message::user("随便说点什么")])
            .await
            .unwrap();
        assert_eq!(extraction, Extraction::empty());
        assert_eq!(extraction.missing, OrderField::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_modify_falls_back_to_previous() {
        let llm = Arc::new(MockLlmClient::scripted(vec![Ok("```json\n{oops\n```".to_string())]));
        let extractor = FieldExtractor::new(llm, Duration::from_secs(5));
        let previous = parse_extraction(FULL).unwrap();
        let extraction = extractor
            .modify("修改颜色为蓝色", &[Message::user("修改颜色为蓝色")], &previous)
            .await
            .unwrap();
        assert_eq!(extraction, previous);
    }

    #[tokio::test]
    async fn test_generation_error_propagates() {
        let llm = Arc::new(MockLlmClient::scripted(vec![Err(LlmError::Api(
            "401 Unauthorized".to_string(),
        ))]));
        let extractor = FieldExtractor::new(llm, Duration::from_secs(5));
        let err = extractor.extract(&[Message::user("x")]).await.unwrap_err();
        assert!(matches!(err, OrderError::Generation(LlmError::Api(_))));
    }

    struct StalledLlm;

    #[async_trait::async_trait]
    impl LlmClient for StalledLlm {
        async fn complete(&self, _messages: &[Message]) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok(FULL.to_string())
        }
    }

    #[tokio::test]
    async fn test_slow_generation_times_out_without_fallback() {
        let limit = Duration::from_millis(200);
        let extractor = FieldExtractor::new(Arc::new(StalledLlm), limit);

        let err = extractor.extract(&[Message::user("x")]).await.unwrap_err();
        assert_eq!(err, OrderError::Timeout(limit));

        // 超时不走解析兜底
        let previous = parse_extraction(FULL).unwrap();
        let err = extractor
            .modify("修改条数为20", &[Message::user("修改条数为20")], &previous)
            .await
            .unwrap_err();
        assert_eq!(err, OrderError::Timeout(limit));
    }

    #[tokio::test]
    async fn test_modify_sends_instruction_and_window() {
        let llm = Arc::new(MockLlmClient::scripted(vec![Ok(FULL.to_string())]));
        let extractor = FieldExtractor::new(llm.clone(), Duration::from_secs(5));
        let window = [
            Message::assistant("我已提取到以下订单信息："),
            Message::user("修改条数为20"),
        ];
        extractor
            .modify("修改条数为20", &window, &Extraction::empty())
            .await
            .unwrap();

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 3);
        assert!(calls[0][0].content.contains("用户输入: 修改条数为20"));
        assert_eq!(calls[0][1..], window);
    }
}
