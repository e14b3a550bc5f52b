//! 命令行对话驱动
//!
//! 每轮读一行输入交给 OrderWorkflow，打印最新的助手回复。
//! 开场阶段支持查询指令：`查询 <订单编号>` / `track <id>`、`产品 <款号>`、`颜色 <款号> <颜色>`。
//! 生成失败或超时时保留原状态并提示用户重试；到达终态、输入退出关键词或超过轮数上限时结束。
//! 含非 UTF-8 字节的行不会中断对话，只提示用户重新输入。

use std::borrow::Cow;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::Instrument;

use crate::config::AppConfig;
use crate::core::{OrderError, RecoveryAction, RecoveryEngine};
use crate::order::{OrderPhase, OrderWorkflow};

pub const ORDER_PROMPT: &str = "请输入订单信息: ";
pub const USER_PROMPT: &str = "用户: ";
pub const TURNS_EXHAUSTED_MESSAGE: &str = "对话轮数已达上限，本次订单未完成。";
pub const GARBLED_INPUT_MESSAGE: &str = "输入包含无法识别的字符，请重新输入。";

/// 一次对话的结局
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(String),
    Cancelled,
    Quit,
    TurnsExhausted,
    InputClosed,
    Aborted,
}

/// 读到的一行输入
enum Input {
    Line(String),
    Garbled,
    Closed,
}

/// 读一行，去掉行尾换行；非 UTF-8 的行返回 Input::Garbled
async fn read_input<R: AsyncBufRead + Unpin>(
    input: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<Input> {
    buf.clear();
    if input.read_until(b'\n', buf).await? == 0 {
        return Ok(Input::Closed);
    }
    match String::from_utf8_lossy(&buf[..]) {
        Cow::Borrowed(line) => Ok(Input::Line(
            line.trim_end_matches(['\n', '\r']).to_string(),
        )),
        Cow::Owned(lossy) => {
            tracing::warn!(line = %lossy.trim_end(), "input is not valid UTF-8");
            Ok(Input::Garbled)
        }
    }
}

/// 开场阶段的查询指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Track(String),
    Product(String),
    Color(String, String),
}

impl Lookup {
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let command = parts.next()?.to_lowercase();
        let args: Vec<&str> = parts.collect();
        match (command.as_str(), args.as_slice()) {
            ("查询" | "track", [id]) => Some(Lookup::Track(id.to_string())),
            ("产品" | "product", [code]) => Some(Lookup::Product(code.to_string())),
            ("颜色" | "color", [code, color]) => {
                Some(Lookup::Color(code.to_string(), color.to_string()))
            }
            _ => None,
        }
    }
}

pub struct Driver {
    workflow: OrderWorkflow,
    recovery: RecoveryEngine,
    max_turns: usize,
    quit_keywords: Vec<String>,
}

impl Driver {
    pub fn new(workflow: OrderWorkflow, cfg: &AppConfig) -> Self {
        Self {
            workflow,
            recovery: RecoveryEngine::new(),
            max_turns: cfg.app.max_turns,
            quit_keywords: cfg
                .app
                .quit_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
        }
    }

    fn is_quit(&self, line: &str) -> bool {
        let lower = line.trim().to_lowercase();
        self.quit_keywords.iter().any(|k| *k == lower)
    }

    /// 运行一次订单对话；initial 为命令行传入的首条订单文本
    pub async fn run<R, W>(
        &self,
        input: R,
        output: W,
        initial: Option<String>,
    ) -> anyhow::Result<Outcome>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let session_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("order_session", session = %session_id);
        let outcome = self.session(input, output, initial).instrument(span).await?;
        let (prompt_tokens, completion_tokens, total_tokens) = self.workflow.token_usage();
        tracing::info!(
            session = %session_id,
            outcome = ?outcome,
            prompt_tokens,
            completion_tokens,
            total_tokens,
            "session finished"
        );
        Ok(outcome)
    }

    async fn session<R, W>(
        &self,
        mut input: R,
        mut output: W,
        initial: Option<String>,
    ) -> anyhow::Result<Outcome>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        let mut pending = initial.filter(|s| !s.trim().is_empty());

        // 开场：拿到订单文本并完成首次抽取
        let mut step = loop {
            let query = match pending.take() {
                Some(q) => q,
                None => {
                    output.write_all(ORDER_PROMPT.as_bytes()).await?;
                    output.flush().await?;
                    match read_input(&mut input, &mut buf).await? {
                        Input::Line(line) => line,
                        Input::Garbled => {
                            say(&mut output, GARBLED_INPUT_MESSAGE).await?;
                            continue;
                        }
                        Input::Closed => return Ok(Outcome::InputClosed),
                    }
                }
            };
            let query = query.trim().to_string();
            if query.is_empty() {
                continue;
            }
            if self.is_quit(&query) {
                return Ok(Outcome::Quit);
            }
            if let Some(lookup) = Lookup::parse(&query) {
                let result = match lookup {
                    Lookup::Track(id) => self.workflow.track_order(&id).await,
                    Lookup::Product(code) => self.workflow.product_info(&code).await,
                    Lookup::Color(code, color) => self.workflow.color_info(&code, &color).await,
                };
                match result {
                    Ok(text) => say(&mut output, &text).await?,
                    Err(e) => {
                        if let Some(outcome) = self.recover(&mut output, &e).await? {
                            return Ok(outcome);
                        }
                    }
                }
                continue;
            }

            output.write_all(format!("用户: {query}\n\n").as_bytes()).await?;
            match self.workflow.start(&query).await {
                Ok(step) => break step,
                Err(e) => {
                    if let Some(outcome) = self.recover(&mut output, &e).await? {
                        return Ok(outcome);
                    }
                }
            }
        };
        say(&mut output, &step.reply).await?;

        for _ in 0..self.max_turns {
            output.write_all(USER_PROMPT.as_bytes()).await?;
            output.flush().await?;
            let line = match read_input(&mut input, &mut buf).await? {
                Input::Line(line) => line,
                Input::Garbled => {
                    say(&mut output, GARBLED_INPUT_MESSAGE).await?;
                    continue;
                }
                Input::Closed => return Ok(Outcome::InputClosed),
            };
            if self.is_quit(&line) {
                return Ok(Outcome::Quit);
            }

            match self.workflow.advance(&step.state, line.trim()).await {
                Ok(next) => {
                    say(&mut output, &next.reply).await?;
                    step = next;
                }
                Err(e) => {
                    if let Some(outcome) = self.recover(&mut output, &e).await? {
                        return Ok(outcome);
                    }
                    continue;
                }
            }

            match &step.state.phase {
                OrderPhase::Created(order) => return Ok(Outcome::Created(order.order_id.clone())),
                OrderPhase::Cancelled => return Ok(Outcome::Cancelled),
                _ => {}
            }
        }

        say(&mut output, TURNS_EXHAUSTED_MESSAGE).await?;
        Ok(Outcome::TurnsExhausted)
    }

    /// 打印恢复提示；需要终止时返回 Some(Outcome::Aborted)
    async fn recover<W: AsyncWrite + Unpin>(
        &self,
        output: &mut W,
        err: &OrderError,
    ) -> anyhow::Result<Option<Outcome>> {
        tracing::warn!(error = %err, "step failed");
        match self.recovery.handle(err) {
            RecoveryAction::RetryWithPrompt(msg) | RecoveryAction::AskUser(msg) => {
                say(output, &msg).await?;
                Ok(None)
            }
            RecoveryAction::Abort(msg) => {
                say(output, &msg).await?;
                Ok(Some(Outcome::Aborted))
            }
        }
    }
}

async fn say<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> std::io::Result<()> {
    output
        .write_all(format!("Agent: {text}\n\n").as_bytes())
        .await?;
    output.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lookup() {
        assert_eq!(
            Lookup::parse("查询 SO202512001001"),
            Some(Lookup::Track("SO202512001001".into()))
        );
        assert_eq!(Lookup::parse("TRACK abc"), Some(Lookup::Track("abc".into())));
        assert_eq!(Lookup::parse("产品 A001"), Some(Lookup::Product("A001".into())));
        assert_eq!(
            Lookup::parse("颜色 A001 红色"),
            Some(Lookup::Color("A001".into(), "红色".into()))
        );
    }

    #[tokio::test]
    async fn test_read_input_flags_invalid_utf8() {
        let mut input: &[u8] = b"\xff\xfe\r\n\xe7\xa1\xae\xe8\xae\xa4\r\n";
        let mut buf = Vec::new();
        assert!(matches!(read_input(&mut input, &mut buf).await.unwrap(), Input::Garbled));
        assert!(matches!(
            read_input(&mut input, &mut buf).await.unwrap(),
            Input::Line(line) if line == "确认"
        ));
        assert!(matches!(read_input(&mut input, &mut buf).await.unwrap(), Input::Closed));
    }

    #[test]
    fn test_order_text_is_not_a_lookup() {
        assert_eq!(Lookup::parse("客户张三要10条红色A001款"), None);
        assert_eq!(Lookup::parse("查询"), None);
        assert_eq!(Lookup::parse("颜色 A001"), None);
    }
}
