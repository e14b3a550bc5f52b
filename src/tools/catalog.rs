//! 产品目录工具：get_product_info / get_color_info（内置演示数据）

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::Tool;

struct CatalogEntry {
    code: &'static str,
    name: &'static str,
    price: f64,
    colors: &'static [&'static str],
    stock: u32,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        code: "A001",
        name: "经典款T恤",
        price: 99.00,
        colors: &["红色", "蓝色", "黑色", "白色"],
        stock: 500,
    },
    CatalogEntry {
        code: "A002",
        name: "休闲款卫衣",
        price: 159.00,
        colors: &["红色", "蓝色", "灰色"],
        stock: 300,
    },
    CatalogEntry {
        code: "A003",
        name: "运动款外套",
        price: 299.00,
        colors: &["黑色", "白色", "绿色"],
        stock: 200,
    },
];

const COLOR_CODES: &[(&str, &str)] = &[
    ("红色", "#FF0000"),
    ("蓝色", "#0000FF"),
    ("黑色", "#000000"),
    ("白色", "#FFFFFF"),
    ("灰色", "#808080"),
    ("绿色", "#008000"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductInfo {
    pub product_code: String,
    pub product_name: String,
    pub price: f64,
    pub available_colors: Vec<String>,
    pub stock: u32,
}

/// 按款号查目录；未知款号返回「未知产品」占位
pub fn lookup_product(product_code: &str) -> ProductInfo {
    match CATALOG.iter().find(|e| e.code == product_code) {
        Some(e) => ProductInfo {
            product_code: product_code.to_string(),
            product_name: e.name.to_string(),
            price: e.price,
            available_colors: e.colors.iter().map(|c| c.to_string()).collect(),
            stock: e.stock,
        },
        None => ProductInfo {
            product_code: product_code.to_string(),
            product_name: "未知产品".to_string(),
            price: 0.0,
            available_colors: Vec::new(),
            stock: 0,
        },
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorInfo {
    pub product_code: String,
    pub color: String,
    pub color_code: String,
    pub stock: u32,
    pub available: bool,
}

pub fn lookup_color(product_code: &str, color: &str) -> ColorInfo {
    let color_code = COLOR_CODES
        .iter()
        .find(|(name, _)| *name == color)
        .map(|(_, code)| *code)
        .unwrap_or("#000000");
    ColorInfo {
        product_code: product_code.to_string(),
        color: color.to_string(),
        color_code: color_code.to_string(),
        stock: 100,
        available: true,
    }
}

#[derive(Debug, Deserialize)]
struct ProductArgs {
    product_code: String,
}

#[derive(Debug, Deserialize)]
struct ColorArgs {
    product_code: String,
    color: String,
}

/// 根据款号获取产品信息
pub struct ProductInfoTool;

impl ProductInfoTool {
    pub const NAME: &'static str = "get_product_info";
}

#[async_trait]
impl Tool for ProductInfoTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "根据款号获取产品信息。Args: {\"product_code\": \"款号\"}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let args: ProductArgs =
            serde_json::from_value(args).map_err(|e| format!("invalid arguments: {e}"))?;
        serde_json::to_string(&lookup_product(&args.product_code)).map_err(|e| e.to_string())
    }
}

/// 获取产品颜色信息
pub struct ColorInfoTool;

impl ColorInfoTool {
    pub const NAME: &'static str = "get_color_info";
}

#[async_trait]
impl Tool for ColorInfoTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "获取产品颜色信息。Args: {\"product_code\": \"款号\", \"color\": \"颜色\"}"
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let args: ColorArgs =
            serde_json::from_value(args).map_err(|e| format!("invalid arguments: {e}"))?;
        serde_json::to_string(&lookup_color(&args.product_code, &args.color))
            .map_err(|e| e.to_string())
    }
}
