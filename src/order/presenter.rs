//! 确认消息渲染（纯函数，无外部调用）

use crate::order::fields::{join_display_names, OrderField, OrderFields};
use crate::tools::OrderRecord;

/// 确认消息末尾的操作提示
pub const ACTION_HINT: &str = "输入 \"确认\" 继续，\"修改\" 修改字段，\"取消\" 取消订单";

/// 无法识别用户操作时的提示
pub const UNKNOWN_ACTION_PROMPT: &str = "请输入 '确认'、'修改' 或 '取消'";

pub const CANCELLED_MESSAGE: &str = "订单已取消。";

/// 确认消息的来源：首次抽取或修改后
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationKind {
    Extracted,
    Updated,
}

impl ConfirmationKind {
    fn header(self) -> &'static str {
        match self {
            ConfirmationKind::Extracted => "我已提取到以下订单信息：",
            ConfirmationKind::Updated => "我已更新订单信息：",
        }
    }
}

/// 列出四个字段（固定顺序），有缺失时追加缺失字段行，最后是确认提示
pub fn render_confirmation(
    kind: ConfirmationKind,
    fields: &OrderFields,
    missing: &[OrderField],
) -> String {
    let mut out = String::new();
    out.push_str(kind.header());
    out.push('\n');
    for field in OrderField::ALL {
        out.push_str(&format!(
            "{}: {}\n",
            field.display_name(),
            fields.display_value(field)
        ));
    }
    if !missing.is_empty() {
        out.push_str(&format!("\n缺失字段: {}\n", join_display_names(missing)));
    }
    out.push_str("\n请确认以上信息是否正确？\n");
    out.push_str(ACTION_HINT);
    out
}

/// 订单创建成功消息
pub fn render_order_created(record: &OrderRecord) -> String {
    format!(
        "订单创建成功！\n订单编号: {}\n款号: {}\n颜色: {}\n条数: {}\n客户: {}",
        record.order_id, record.product_code, record.color, record.quantity, record.customer
    )
}
