//! 销售单工具：create_sales_order / track_sales_order

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::{OrderBook, OrderRecord, Tool};

#[derive(Debug, Deserialize)]
struct CreateSalesOrderArgs {
    product_code: String,
    color: String,
    quantity: u32,
    customer: String,
}

/// create_sales_order 的返回结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResult {
    pub success: bool,
    #[serde(flatten)]
    pub order: OrderRecord,
    pub message: String,
}

/// 创建销售单
pub struct CreateSalesOrderTool {
    book: Arc<OrderBook>,
}

impl CreateSalesOrderTool {
    pub const NAME: &'static str = "create_sales_order";

    pub fn new(book: Arc<OrderBook>) -> Self {
        Self { book }
    }
}

#[async_trait]
impl Tool for CreateSalesOrderTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "创建销售单。Args: {\"product_code\": \"款号\", \"color\": \"颜色\", \"quantity\": 条数, \"customer\": \"客户名称\"}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let args: CreateSalesOrderArgs =
            serde_json::from_value(args).map_err(|e| format!("invalid arguments: {e}"))?;
        let order = self
            .book
            .create(&args.product_code, &args.color, args.quantity, &args.customer);
        let result = CreateOrderResult {
            success: true,
            order,
            message: "订单创建成功".to_string(),
        };
        serde_json::to_string(&result).map_err(|e| e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct TrackSalesOrderArgs {
    order_id: String,
}

/// track_sales_order 的返回结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatus {
    pub order_id: String,
    pub status: String,
    pub message: String,
}

/// 查询销售单状态
pub struct TrackSalesOrderTool;

impl TrackSalesOrderTool {
    pub const NAME: &'static str = "track_sales_order";
}

#[async_trait]
impl Tool for TrackSalesOrderTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "查询销售单状态。Args: {\"order_id\": \"订单编号\"}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let args: TrackSalesOrderArgs =
            serde_json::from_value(args).map_err(|e| format!("invalid arguments: {e}"))?;
        let status = OrderStatus {
            order_id: args.order_id,
            status: "已确认".to_string(),
            message: "订单状态查询成功".to_string(),
        };
        serde_json::to_string(&status).map_err(|e| e.to_string())
    }
}
