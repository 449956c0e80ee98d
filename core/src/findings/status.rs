use serde::{Deserialize, Serialize};
use std::fmt;

/// 检查结果状态，只有这四个值参与统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Fail,
    Warn,
    Pass,
    Skip,
}

impl Status {
    /// 汇总栏的固定展示顺序
    pub const ALL: [Status; 4] = [Status::Fail, Status::Warn, Status::Pass, Status::Skip];

    /// 大写后精确匹配四个标准值
    pub fn parse(raw: &str) -> Option<Status> {
        match raw.to_uppercase().as_str() {
            "FAIL" => Some(Status::Fail),
            "WARN" => Some(Status::Warn),
            "PASS" => Some(Status::Pass),
            "SKIP" => Some(Status::Skip),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Fail => "FAIL",
            Status::Warn => "WARN",
            Status::Pass => "PASS",
            Status::Skip => "SKIP",
        }
    }

    pub fn badge_class(&self) -> &'static str {
        match self {
            Status::Fail => "fail",
            Status::Warn => "warn",
            Status::Pass => "pass",
            Status::Skip => "skip",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 徽章样式：未知状态回退为 skip（注意这和统计排除是两回事）
pub fn badge_class(raw: Option<&str>) -> &'static str {
    raw.and_then(Status::parse)
        .unwrap_or(Status::Skip)
        .badge_class()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Status::parse("fail"), Some(Status::Fail));
        assert_eq!(Status::parse("Warn"), Some(Status::Warn));
        assert_eq!(Status::parse("PASS"), Some(Status::Pass));
        assert_eq!(Status::parse("sKiP"), Some(Status::Skip));
    }

    #[test]
    fn parse_rejects_unknown_and_padded_values() {
        assert_eq!(Status::parse("INFO"), None);
        assert_eq!(Status::parse(""), None);
        assert_eq!(Status::parse(" FAIL"), None);
    }

    #[test]
    fn badge_falls_back_to_skip() {
        assert_eq!(badge_class(Some("fail")), "fail");
        assert_eq!(badge_class(Some("INFO")), "skip");
        assert_eq!(badge_class(None), "skip");
    }
}
