//! 文本重排序：调用 DashScope text-rerank 服务，按与查询的相关性对段落排序
//!
//! 失败时不报错：返回原顺序、得分全为 0.0 的结果，调用方可照常使用。

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::RerankSection;

pub const DASHSCOPE_RERANK_URL: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/rerank/text-rerank/text-rerank";

/// 带得分的段落
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPassage {
    pub passage: String,
    pub score: f64,
}

#[async_trait]
pub trait Reranker: Send + Sync {
    /// 按相关性降序返回段落与得分
    async fn rank(&self, query: &str, passages: &[String]) -> Vec<RankedPassage>;
}

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    input: RerankInput<'a>,
    parameters: RerankParameters,
}

#[derive(Debug, Serialize)]
struct RerankInput<'a> {
    query: &'a str,
    documents: &'a [String],
}

#[derive(Debug, Serialize)]
struct RerankParameters {
    return_documents: bool,
    top_n: usize,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    output: RerankOutput,
}

#[derive(Debug, Deserialize)]
struct RerankOutput {
    #[serde(default)]
    results: Vec<RerankResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RerankResult {
    pub index: usize,
    pub relevance_score: f64,
}

/// 按服务返回的 (index, score) 组装结果：丢弃越界 index，按得分降序（同分保持返回顺序）
pub fn ranked_from_results(passages: &[String], results: &[RerankResult]) -> Vec<RankedPassage> {
    let mut ranked: Vec<RankedPassage> = results
        .iter()
        .filter_map(|r| {
            passages.get(r.index).map(|p| RankedPassage {
                passage: p.clone(),
                score: r.relevance_score,
            })
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

fn unranked(passages: &[String]) -> Vec<RankedPassage> {
    passages
        .iter()
        .map(|p| RankedPassage {
            passage: p.clone(),
            score: 0.0,
        })
        .collect()
}

/// DashScope 重排序客户端
pub struct DashScopeReranker {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl DashScopeReranker {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        endpoint: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.unwrap_or(DASHSCOPE_RERANK_URL).to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// 从 [rerank] 配置与 DASHSCOPE_API_KEY 创建
    pub fn from_config(cfg: &RerankSection) -> Result<Self, reqwest::Error> {
        let api_key = std::env::var("DASHSCOPE_API_KEY").unwrap_or_default();
        Self::new(
            api_key,
            cfg.model.clone(),
            cfg.base_url.as_deref(),
            Duration::from_secs(cfg.timeout_secs),
        )
    }

    async fn request(&self, query: &str, passages: &[String]) -> Result<Vec<RerankResult>, String> {
        let body = RerankRequest {
            model: &self.model,
            input: RerankInput {
                query,
                documents: passages,
            },
            parameters: RerankParameters {
                return_documents: false,
                top_n: passages.len(),
            },
        };
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {status}: {text}"));
        }
        let parsed: RerankResponse = response.json().await.map_err(|e| e.to_string())?;
        Ok(parsed.output.results)
    }
}

#[async_trait]
impl Reranker for DashScopeReranker {
    async fn rank(&self, query: &str, passages: &[String]) -> Vec<RankedPassage> {
        if passages.is_empty() {
            return Vec::new();
        }
        match self.request(query, passages).await {
            Ok(results) => ranked_from_results(passages, &results),
            Err(e) => {
                tracing::warn!(error = %e, model = %self.model, "rerank failed, returning unranked passages");
                unranked(passages)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passages() -> Vec<String> {
        vec![
            "人工智能是计算机科学的一个分支。".to_string(),
            "苹果是一种水果。".to_string(),
            "机器学习是人工智能的一个重要子领域。".to_string(),
        ]
    }

    fn result(index: usize, relevance_score: f64) -> RerankResult {
        RerankResult {
            index,
            relevance_score,
        }
    }

    #[test]
    fn test_results_sorted_descending() {
        let ranked = ranked_from_results(
            &passages(),
            &[result(1, 0.05), result(2, 0.71), result(0, 0.93)],
        );
        let scores: Vec<f64> = ranked.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![0.93, 0.71, 0.05]);
        assert_eq!(ranked[0].passage, passages()[0]);
    }

    #[test]
    fn test_out_of_range_index_dropped() {
        let ranked = ranked_from_results(&passages(), &[result(7, 0.99), result(2, 0.5)]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].passage, passages()[2]);
    }

    #[test]
    fn test_response_decoding() {
        let raw = r#"{"output": {"results": [{"index": 0, "relevance_score": 0.8}]}, "usage": {"total_tokens": 42}, "request_id": "abc"}"#;
        let parsed: RerankResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.output.results.len(), 1);
        assert_eq!(parsed.output.results[0].index, 0);
    }

    #[tokio::test]
    async fn test_empty_passages_skip_request() {
        let reranker =
            DashScopeReranker::new("sk-test", "gte-rerank", Some("http://127.0.0.1:9"), Duration::from_secs(2))
                .unwrap();
        assert!(reranker.rank("什么是人工智能？", &[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_failure_returns_zero_scores_in_order() {
        let reranker =
            DashScopeReranker::new("sk-test", "gte-rerank", Some("http://127.0.0.1:9"), Duration::from_secs(2))
                .unwrap();
        let ranked = reranker.rank("什么是人工智能？", &passages()).await;
        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|r| r.score == 0.0));
        assert_eq!(ranked[1].passage, passages()[1]);
    }
}
