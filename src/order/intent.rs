//! 确认节点的用户操作识别
//!
//! 小写后按子串匹配中英文关键词，依次检查 确认 / 修改 / 取消，先命中者胜。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    Confirm,
    Modify,
    Cancel,
    Unknown,
}

const RULES: [(UserAction, [&str; 2]); 3] = [
    (UserAction::Confirm, ["确认", "confirm"]),
    (UserAction::Modify, ["修改", "modify"]),
    (UserAction::Cancel, ["取消", "cancel"]),
];

impl UserAction {
    pub fn classify(input: &str) -> Self {
        let lower = input.to_lowercase();
        RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(action, _)| *action)
            .unwrap_or(UserAction::Unknown)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserAction::Confirm => "confirm",
            UserAction::Modify => "modify",
            UserAction::Cancel => "cancel",
            UserAction::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_any_case() {
        assert_eq!(UserAction::classify("确认"), UserAction::Confirm);
        assert_eq!(UserAction::classify("CONFIRM"), UserAction::Confirm);
        assert_eq!(UserAction::classify("Confirm please"), UserAction::Confirm);
        assert_eq!(UserAction::classify("修改颜色为蓝色"), UserAction::Modify);
        assert_eq!(UserAction::classify("Modify"), UserAction::Modify);
        assert_eq!(UserAction::classify("取消"), UserAction::Cancel);
        assert_eq!(UserAction::classify("cAnCeL"), UserAction::Cancel);
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(UserAction::classify("确认修改"), UserAction::Confirm);
        assert_eq!(UserAction::classify("不要取消，修改一下"), UserAction::Modify);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(UserAction::classify("好的"), UserAction::Unknown);
        assert_eq!(UserAction::classify(""), UserAction::Unknown);
    }
}
