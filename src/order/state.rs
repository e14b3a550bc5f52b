//! 订单对话状态
//!
//! OrderState 不可变地在步骤间传递：每个步骤读取旧状态，返回新状态。

use crate::memory::{ConversationMemory, Message};
use crate::order::extractor::Extraction;
use crate::order::fields::{OrderField, OrderFields};
use crate::tools::OrderRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderPhase {
    /// 等待订单文本
    Extracting,
    /// 已展示字段，等待 确认 / 修改 / 取消
    AwaitingConfirmation,
    /// 终态：订单已创建
    Created(OrderRecord),
    /// 终态：订单已取消
    Cancelled,
}

impl OrderPhase {
    pub fn name(&self) -> &'static str {
        match self {
            OrderPhase::Extracting => "extracting",
            OrderPhase::AwaitingConfirmation => "awaiting_confirmation",
            OrderPhase::Created(_) => "created",
            OrderPhase::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderState {
    pub history: ConversationMemory,
    pub extraction: Extraction,
    pub phase: OrderPhase,
}

impl OrderState {
    pub fn new(max_history: usize) -> Self {
        Self {
            history: ConversationMemory::new(max_history),
            extraction: Extraction::empty(),
            phase: OrderPhase::Extracting,
        }
    }

    pub fn fields(&self) -> &OrderFields {
        &self.extraction.fields
    }

    pub fn missing(&self) -> &[OrderField] {
        &self.extraction.missing
    }

    pub(crate) fn with_message(mut self, msg: Message) -> Self {
        self.history.push(msg);
        self
    }

    pub(crate) fn with_extraction(self, extraction: Extraction) -> Self {
        Self { extraction, ..self }
    }

    pub(crate) fn with_phase(self, phase: OrderPhase) -> Self {
        Self { phase, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_consume_and_leave_clones_untouched() {
        let base = OrderState::new(4).with_message(Message::user("客户张三要10条红色A001款"));
        let next = base
            .clone()
            .with_message(Message::assistant("我已提取到以下订单信息："))
            .with_phase(OrderPhase::AwaitingConfirmation);

        assert_eq!(base.history.len(), 1);
        assert_eq!(base.phase, OrderPhase::Extracting);
        assert_eq!(next.history.len(), 2);
        assert_eq!(next.phase.name(), "awaiting_confirmation");
    }

    #[test]
    fn test_history_is_bounded() {
        let state = (0..6).fold(OrderState::new(4), |s, i| {
            s.with_message(Message::user(format!("m{i}")))
        });
        assert_eq!(state.history.len(), 4);
        assert_eq!(state.history.messages()[0].content, "m2");
    }
}
