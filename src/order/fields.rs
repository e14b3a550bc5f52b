//! 订单字段：款号 / 颜色 / 条数 / 客户
//!
//! OrderFields 的反序列化同时承担形状校验：空串、null、"[缺失]" 视为缺失；
//! 条数只接受非负整数或纯数字字符串，其余形状一律报错，由抽取器走兜底逻辑。

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 缺失字段在消息中的占位符
pub const MISSING_MARKER: &str = "[缺失]";

/// 四个已知字段，顺序即展示顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    ProductCode,
    Color,
    Quantity,
    Customer,
}

impl OrderField {
    pub const ALL: [OrderField; 4] = [
        OrderField::ProductCode,
        OrderField::Color,
        OrderField::Quantity,
        OrderField::Customer,
    ];

    /// JSON 键名
    pub fn key(self) -> &'static str {
        match self {
            OrderField::ProductCode => "product_code",
            OrderField::Color => "color",
            OrderField::Quantity => "quantity",
            OrderField::Customer => "customer",
        }
    }

    /// 中文显示名
    pub fn display_name(self) -> &'static str {
        match self {
            OrderField::ProductCode => "款号",
            OrderField::Color => "颜色",
            OrderField::Quantity => "条数",
            OrderField::Customer => "客户",
        }
    }

    /// 按键名或显示名查找（LLM 两种写法都会出现）
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.key().eq_ignore_ascii_case(name) || f.display_name() == name)
    }
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// 订单字段值；None 表示缺失
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderFields {
    #[serde(deserialize_with = "de_text")]
    pub product_code: Option<String>,
    #[serde(deserialize_with = "de_text")]
    pub color: Option<String>,
    #[serde(deserialize_with = "de_quantity")]
    pub quantity: Option<u32>,
    #[serde(deserialize_with = "de_text")]
    pub customer: Option<String>,
}

impl OrderFields {
    /// 字段的展示值；缺失时为 None
    pub fn value_text(&self, field: OrderField) -> Option<String> {
        match field {
            OrderField::ProductCode => self.product_code.clone(),
            OrderField::Color => self.color.clone(),
            OrderField::Quantity => self.quantity.map(|q| q.to_string()),
            OrderField::Customer => self.customer.clone(),
        }
    }

    /// 展示值，缺失时为占位符
    pub fn display_value(&self, field: OrderField) -> String {
        self.value_text(field)
            .unwrap_or_else(|| MISSING_MARKER.to_string())
    }

    pub fn is_missing(&self, field: OrderField) -> bool {
        self.value_text(field).is_none()
    }

    /// 由当前值推导的缺失字段列表（固定顺序）
    pub fn missing_fields(&self) -> Vec<OrderField> {
        OrderField::ALL
            .into_iter()
            .filter(|f| self.is_missing(*f))
            .collect()
    }
}

/// 缺失字段的显示名，逗号分隔
pub fn join_display_names(fields: &[OrderField]) -> String {
    fields
        .iter()
        .map(|f| f.display_name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_blank(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s == MISSING_MARKER || s == "缺失"
}

fn de_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if is_blank(&s) => Ok(None),
        Value::String(s) => Ok(Some(s.trim().to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!(
            "expected string or null, got {other}"
        ))),
    }
}

fn de_quantity<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => match n.as_u64() {
            Some(v) => u32::try_from(v)
                .map(Some)
                .map_err(|_| de::Error::custom(format!("quantity out of range: {n}"))),
            None => Err(de::Error::custom(format!(
                "quantity is not a non-negative integer: {n}"
            ))),
        },
        Value::String(s) if is_blank(&s) => Ok(None),
        Value::String(s) => {
            let digits = s.trim().trim_end_matches('条').trim();
            digits
                .parse::<u32>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("quantity is not a number: {s}")))
        }
        other => Err(de::Error::custom(format!(
            "expected integer quantity, got {other}"
        ))),
    }
}
