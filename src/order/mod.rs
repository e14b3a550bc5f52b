//! 订单助手：字段抽取、确认消息、用户操作识别与状态机

pub mod extractor;
pub mod fields;
pub mod intent;
pub mod presenter;
pub mod state;
pub mod workflow;

pub use extractor::{parse_extraction, strip_code_block, Extraction, FieldExtractor, ParseError};
pub use fields::{OrderField, OrderFields, MISSING_MARKER};
pub use intent::UserAction;
pub use presenter::{render_confirmation, render_order_created, ConfirmationKind};
pub use state::{OrderPhase, OrderState};
pub use workflow::{OrderWorkflow, Step};
