//! Mock LLM 客户端（用于测试与离线演示，无需 API）
//!
//! - 预置回复：按顺序弹出 `scripted` 传入的结果，可模拟任意 LLM 输出或错误
//! - 预置回复用尽后走规则抽取：从历史中的确认消息读出已有字段，再用最后一条 user 消息覆盖，
//!   以 ```json 代码块返回 extracted_fields / missing_fields

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use regex::Regex;

use crate::llm::{LlmClient, LlmError, TokenUsage};
use crate::memory::{Message, Role};
use crate::order::{OrderField, OrderFields};

pub struct MockLlmClient {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<Vec<Vec<Message>>>,
    /// 按字符数近似的 token 用量
    usage: TokenUsage,
    product: Regex,
    quantity: Regex,
    color: Regex,
    customer: Regex,
    confirmed_line: Regex,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::scripted(Vec::new())
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 依次返回给定结果；用尽后回到规则抽取
    pub fn scripted(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
            usage: TokenUsage::new(),
            product: Regex::new(r"[A-Za-z]\d{3,}").expect("valid regex"),
            quantity: Regex::new(r"(\d+)\s*条|条数(?:改为|改成|为|是)?[:：\s]*(\d+)")
                .expect("valid regex"),
            color: Regex::new(r"[红蓝黑白灰绿黄紫粉棕橙]色").expect("valid regex"),
            customer: Regex::new(r"客户(?:改为|改成|换成|为|是)?[:：\s]*(\p{Han}{1,4}?)(?:要|订|购|买|，|,|\s|$)")
                .expect("valid regex"),
            confirmed_line: Regex::new(r"(?m)^(款号|颜色|条数|客户): (.+)$").expect("valid regex"),
        }
    }

    /// 每次 complete 收到的完整消息列表
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn apply_text(&self, fields: &mut OrderFields, text: &str) {
        if let Some(m) = self.product.find(text) {
            fields.product_code = Some(m.as_str().to_uppercase());
        }
        if let Some(c) = self.quantity.captures(text) {
            fields.quantity = c
                .get(1)
                .or_else(|| c.get(2))
                .and_then(|m| m.as_str().parse().ok());
        }
        if let Some(m) = self.color.find(text) {
            fields.color = Some(m.as_str().to_string());
        }
        if let Some(c) = self.customer.captures(text) {
            fields.customer = Some(c[1].to_string());
        }
    }

    /// 从此前的确认消息中读回字段
    fn apply_confirmation(&self, fields: &mut OrderFields, text: &str) {
        for c in self.confirmed_line.captures_iter(text) {
            let value = c[2].trim();
            if value == crate::order::MISSING_MARKER {
                continue;
            }
            match OrderField::from_name(&c[1]) {
                Some(OrderField::ProductCode) => fields.product_code = Some(value.to_string()),
                Some(OrderField::Color) => fields.color = Some(value.to_string()),
                Some(OrderField::Quantity) => fields.quantity = value.parse().ok(),
                Some(OrderField::Customer) => fields.customer = Some(value.to_string()),
                None => {}
            }
        }
    }

    fn rule_based_reply(&self, messages: &[Message]) -> String {
        let mut fields = OrderFields::default();
        for m in messages {
            match m.role {
                Role::Assistant => self.apply_confirmation(&mut fields, &m.content),
                Role::User => self.apply_text(&mut fields, &m.content),
                Role::System => {}
            }
        }
        let missing: Vec<&str> = fields
            .missing_fields()
            .into_iter()
            .map(|f| f.display_name())
            .collect();
        let payload = serde_json::json!({
            "extracted_fields": fields,
            "missing_fields": missing,
        });
        format!("```json\n{payload}\n```")
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn model_name(&self) -> &str {
        "mock"
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.get()
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        let reply = match scripted {
            Some(reply) => reply?,
            None => self.rule_based_reply(messages),
        };
        let prompt: usize = messages.iter().map(|m| m.content.chars().count()).sum();
        self.usage.add(prompt as u64, reply.chars().count() as u64);
        Ok(reply)
    }
}
