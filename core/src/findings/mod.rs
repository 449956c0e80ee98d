// Findings module - 扫描服务返回的数据模型
// 本层只读取，不修改

pub mod status;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use status::{badge_class, Status};

/// control_id 缺失或为空时使用的分组键
pub const UNKNOWN_CONTROL: &str = "UNKNOWN";

/// 单条检查结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(default)]
    pub control_id: Option<String>,
    #[serde(default)]
    pub rule_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub start_line: Option<u64>,
    #[serde(default)]
    pub end_line: Option<u64>,
    #[serde(default)]
    pub explain: Option<Explain>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

/// 面向初级工程师的解释信息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explain {
    #[serde(default)]
    pub why: Option<String>,
    #[serde(default)]
    pub detect: Option<String>,
    #[serde(default)]
    pub fix: Option<String>,
    #[serde(default)]
    pub verify: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl Finding {
    /// 分组键，缺失或为空时为 [`UNKNOWN_CONTROL`]
    pub fn group_key(&self) -> &str {
        match self.control_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => UNKNOWN_CONTROL,
        }
    }

    /// 四种标准状态之外返回 None
    pub fn canonical_status(&self) -> Option<Status> {
        self.status.as_deref().and_then(Status::parse)
    }

    /// 展示用的大写状态，保留未知值原文
    pub fn display_status(&self) -> String {
        self.status.as_deref().unwrap_or_default().to_uppercase()
    }
}

impl Explain {
    /// 按展示顺序返回 (标签, 值)
    pub fn entries(&self) -> [(&'static str, Option<&str>); 5] {
        [
            ("Why", self.why.as_deref()),
            ("Detect", self.detect.as_deref()),
            ("Fix", self.fix.as_deref()),
            ("Verify", self.verify.as_deref()),
            ("Difficulty", self.difficulty.as_deref()),
        ]
    }
}

/// 扫描服务成功响应，其余字段忽略
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindingsResponse {
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl FindingsResponse {
    pub fn new(findings: Vec<Finding>) -> Self {
        Self {
            findings,
            level: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

/// 扫描服务失败响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
