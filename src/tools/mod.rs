//! 工具箱：订单簿与四个订单工具，注册表与带超时的执行器

pub mod catalog;
pub mod executor;
pub mod order_book;
pub mod registry;
pub mod sales_order;

use std::sync::Arc;

pub use catalog::{ColorInfo, ColorInfoTool, ProductInfo, ProductInfoTool};
pub use executor::ToolExecutor;
pub use order_book::{OrderBook, OrderRecord};
pub use registry::{Tool, ToolRegistry};
pub use sales_order::{CreateOrderResult, CreateSalesOrderTool, OrderStatus, TrackSalesOrderTool};

/// 注册订单相关的全部工具
pub fn order_tools(book: Arc<OrderBook>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(CreateSalesOrderTool::new(book));
    registry.register(TrackSalesOrderTool);
    registry.register(ProductInfoTool);
    registry.register(ColorInfoTool);
    registry
}
