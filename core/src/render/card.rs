use serde::Serialize;

use super::escape::Html;
use crate::findings::{badge_class, Finding};

/// 行号触发器的键：卡片下标 + 行号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SnippetTrigger {
    pub card: usize,
    pub line: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    /// 没有位置信息，展示 n/a，无触发器
    Unknown,
    Line { start: u64, end: Option<u64> },
}

/// 单张卡片的视图模型，字段保存原文，转义在 [`RenderedCard::to_html`] 中完成
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedCard {
    pub index: usize,
    pub control_id: String,
    pub rule_id: Option<String>,
    pub status: String,
    pub badge: &'static str,
    pub severity: String,
    pub message: String,
    pub file_path: String,
    pub location: Location,
    /// `None` 表示结果没有 explain 字段
    pub explain: Option<Vec<(&'static str, String)>>,
    pub context: Vec<(String, String)>,
}

impl RenderedCard {
    /// 构建单条结果的视图模型，`fallback_name` 为结果缺少文件路径时使用的文档名
    pub fn from_finding(finding: &Finding, index: usize, fallback_name: &str) -> Self {
        let status = finding.display_status();
        let location = match finding.start_line {
            Some(start) => Location::Line {
                start,
                end: finding.end_line.filter(|end| *end > start),
            },
            None => Location::Unknown,
        };

        let explain = finding.explain.as_ref().map(|explain| {
            explain
                .entries()
                .into_iter()
                .map(|(label, value)| (label, value.unwrap_or_default().to_string()))
                .collect()
        });

        let context = finding
            .metadata
            .as_ref()
            .map(|meta| {
                meta.iter()
                    .map(|(key, value)| {
                        let value = match value {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (key.clone(), value)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            index,
            control_id: finding.group_key().to_string(),
            rule_id: finding.rule_id.clone().filter(|r| !r.is_empty()),
            badge: badge_class(finding.status.as_deref()),
            status,
            severity: finding.severity.clone().unwrap_or_default(),
            message: finding.message.clone().unwrap_or_default(),
            file_path: finding
                .file_path
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| fallback_name.to_string()),
            location,
            explain,
            context,
        }
    }

    pub fn trigger(&self) -> Option<SnippetTrigger> {
        match self.location {
            Location::Line { start, .. } => Some(SnippetTrigger {
                card: self.index,
                line: start,
            }),
            Location::Unknown => None,
        }
    }

    pub fn to_html(&self) -> Html {
        let mut out = Html::trusted(format!(
            r#"<div class="finding" data-card="{}"><div class="findingTop"><div><p class="findingTitle">"#,
            self.index
        ));
        out.push_text(&self.control_id);
        if let Some(rule) = &self.rule_id {
            out.push_trusted(r#" <span class="muted">("#);
            out.push_text(rule);
            out.push_trusted(")</span>");
        }
        out.push_trusted(r#"</p><div class="findingMeta"><div><b>"#);
        out.push_text(&self.status);
        out.push_trusted("</b> · Severity: <b>");
        out.push_text(&self.severity);
        out.push_trusted("</b></div><div>File: <code>");
        out.push_text(&self.file_path);
        out.push_trusted("</code> · Line: ");
        out.push(&self.location_html());
        out.push_trusted("</div><div>");
        out.push_text(&self.message);
        out.push_trusted(&format!(
            r#"</div></div></div><span class="badge {}">"#,
            self.badge
        ));
        out.push_text(&self.status);
        out.push_trusted("</span></div>");

        if self.trigger().is_some() {
            out.push(&empty_panel(self.index));
        }

        out.push(&self.details_html());
        out.push_trusted("</div>");
        out
    }

    fn location_html(&self) -> Html {
        match self.location {
            Location::Unknown => Html::trusted("<code>n/a</code>"),
            Location::Line { start, end } => {
                let label = match end {
                    Some(end) => format!("{start}–{end}"),
                    None => start.to_string(),
                };
                Html::trusted(format!(
                    r#"<button type="button" class="lineLink" data-action="toggle-snippet" data-card="{}" data-line="{}"><code>{}</code></button>"#,
                    self.index, start, label
                ))
            }
        }
    }

    fn details_html(&self) -> Html {
        if self.explain.is_none() && self.context.is_empty() {
            return Html::new();
        }

        let mut out = Html::trusted(r#"<details class="details"><summary class="muted">Explain</summary>"#);
        for (label, value) in self.explain.iter().flatten() {
            out.push(&kv_row(label, value));
        }
        if !self.context.is_empty() {
            out.push_trusted(r#"<div class="kvHead muted">Context</div>"#);
            for (key, value) in &self.context {
                out.push(&kv_row(key, value));
            }
        }
        out.push_trusted("</details>");
        out
    }
}

fn kv_row(key: &str, value: &str) -> Html {
    let mut row = Html::trusted(r#"<div class="kv"><div class="k">"#);
    row.push_text(key);
    row.push_trusted(r#"</div><div class="v">"#);
    row.push_text(value);
    row.push_trusted("</div></div>");
    row
}

/// 片段面板的初始状态：隐藏且为空
pub fn empty_panel(card: usize) -> Html {
    Html::trusted(format!(
        r#"<pre class="snippet" data-snippet="{card}" hidden></pre>"#
    ))
}
