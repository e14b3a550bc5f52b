//! 订单簿：生成订单编号并创建订单记录
//!
//! 编号 = 前缀 + 6 位计数器；计数器为进程内原子量，多个对话并发确认也不会重号。
//! 计数器不落盘，进程重启后从 counter_start 重新开始。

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

pub const DEFAULT_ID_PREFIX: &str = "SO202512";
pub const DEFAULT_COUNTER_START: u64 = 1000;

/// 已创建的订单（创建后不可变）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub product_code: String,
    pub color: String,
    pub quantity: u32,
    pub customer: String,
    /// RFC 3339 创建时间
    pub created_at: String,
}

#[derive(Debug)]
pub struct OrderBook {
    prefix: String,
    counter: AtomicU64,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new(DEFAULT_ID_PREFIX, DEFAULT_COUNTER_START)
    }
}

impl OrderBook {
    pub fn new(prefix: impl Into<String>, counter_start: u64) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(counter_start),
        }
    }

    /// 先自增再取值：counter_start = 1000 时第一个编号为 SO202512001001
    pub fn next_order_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}{:06}", self.prefix, n)
    }

    pub fn create(
        &self,
        product_code: &str,
        color: &str,
        quantity: u32,
        customer: &str,
    ) -> OrderRecord {
        let record = OrderRecord {
            order_id: self.next_order_id(),
            product_code: product_code.to_string(),
            color: color.to_string(),
            quantity,
            customer: customer.to_string(),
            created_at: chrono::Local::now().to_rfc3339(),
        };
        tracing::info!(order_id = %record.order_id, customer = %record.customer, "order created");
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_first_id_format() {
        let book = OrderBook::default();
        assert_eq!(book.next_order_id(), "SO202512001001");
        assert_eq!(book.next_order_id(), "SO202512001002");
    }

    #[test]
    fn test_sequential_ids_are_distinct() {
        let book = OrderBook::new("SO", 0);
        let ids: HashSet<String> = (0..500)
            .map(|_| book.create("A001", "红色", 1, "张三").order_id)
            .collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_concurrent_ids_are_distinct() {
        let book = Arc::new(OrderBook::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let book = book.clone();
                std::thread::spawn(move || (0..100).map(|_| book.next_order_id()).collect::<Vec<_>>())
            })
            .collect();
        let ids: HashSet<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(ids.len(), 800);
    }
}
