//! 记忆层：单次订单对话的消息历史

pub mod conversation;

pub use conversation::{ConversationMemory, Message, Role};
