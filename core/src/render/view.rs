use serde::Serialize;
use std::collections::BTreeMap;

use super::card::{empty_panel, RenderedCard, SnippetTrigger};
use super::escape::Html;
use super::group::{group_findings, ControlGroup};
use super::snippet::extract_snippet;
use super::tally::StatusTally;
use crate::findings::FindingsResponse;
use crate::session::DocumentContext;

const NO_RESULTS_YET: &str =
    r#"<p class="muted">No scan results yet. Upload a workflow and click <b>Scan</b>.</p>"#;
const NO_FINDINGS: &str = r#"<p class="muted">No findings returned. Try removing filters or scan a workflow that violates a control.</p>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    Empty,
    Populated,
}

/// 一次完整渲染的产物
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedResults {
    pub state: ViewState,
    pub summary: Html,
    pub results: Html,
    pub cards: Vec<RenderedCard>,
}

/// 渲染一次扫描结果，不触碰会话状态
pub fn render_results(resp: &FindingsResponse, document: &DocumentContext) -> RenderedResults {
    let findings = &resp.findings;
    let summary = StatusTally::from_findings(findings).to_pills();

    if findings.is_empty() {
        return RenderedResults {
            state: ViewState::Empty,
            summary,
            results: Html::trusted(NO_FINDINGS),
            cards: Vec::new(),
        };
    }

    let cards: Vec<RenderedCard> = findings
        .iter()
        .enumerate()
        .map(|(idx, f)| RenderedCard::from_finding(f, idx, document.name()))
        .collect();

    let groups = group_findings(findings);
    let results = Html::join(groups.iter().map(|g| group_html(g, &cards)), "");

    RenderedResults {
        state: ViewState::Populated,
        summary,
        results,
        cards,
    }
}

fn group_html(group: &ControlGroup<'_>, cards: &[RenderedCard]) -> Html {
    let noun = if group.findings.len() == 1 { "finding" } else { "findings" };
    let mut out = Html::trusted(r#"<details class="group" data-control=""#);
    out.push_text(group.control_id);
    out.push_trusted(if group.default_expanded { "\" open>" } else { "\">" });
    out.push_trusted(r#"<summary class="groupHead"><span class="groupId">"#);
    out.push_text(group.control_id);
    out.push_trusted(&format!(
        r#"</span> <span class="muted">({} {})</span> "#,
        group.findings.len(),
        noun
    ));
    out.push(&group.tally.to_chips());
    out.push_trusted(r#"</summary><div class="groupBody">"#);
    for (idx, _) in &group.findings {
        out.push(&cards[*idx].to_html());
    }
    out.push_trusted("</div></details>");
    out
}

/// 委托到结果容器上的 UI 事件，来自元素的 data-* 属性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    ToggleSnippet(SnippetTrigger),
}

impl UiEvent {
    /// 解析 data-action / data-card / data-line，未知动作返回 None
    pub fn from_attributes(action: &str, card: Option<&str>, line: Option<&str>) -> Option<Self> {
        match action {
            "toggle-snippet" => {
                let card = card?.trim().parse().ok()?;
                let line = line?.trim().parse().ok()?;
                Some(UiEvent::ToggleSnippet(SnippetTrigger { card, line }))
            }
            _ => None,
        }
    }
}

/// 片段面板的新内容，前端整体替换 `data-snippet` 元素
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelUpdate {
    pub card: usize,
    pub line: u64,
    pub visible: bool,
    pub html: Html,
}

/// 结果区域状态机：展示含结果的响应前一直是 Empty
#[derive(Debug, Clone)]
pub struct ResultsView {
    radius: usize,
    state: ViewState,
    summary: Html,
    results: Html,
    /// 每个触发器独立的显示状态，初始为隐藏
    toggles: BTreeMap<SnippetTrigger, bool>,
}

impl ResultsView {
    pub fn new(radius: usize) -> Self {
        Self {
            radius,
            state: ViewState::Empty,
            summary: Html::new(),
            results: Html::trusted(NO_RESULTS_YET),
            toggles: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn summary_html(&self) -> &Html {
        &self.summary
    }

    pub fn results_html(&self) -> &Html {
        &self.results
    }

    /// 结果容器的 class
    pub fn container_class(&self) -> &'static str {
        match self.state {
            ViewState::Empty => "empty",
            ViewState::Populated => "",
        }
    }

    pub fn show(&mut self, resp: &FindingsResponse, document: &DocumentContext) {
        let rendered = render_results(resp, document);
        self.toggles = rendered
            .cards
            .iter()
            .filter_map(RenderedCard::trigger)
            .map(|t| (t, false))
            .collect();
        self.state = rendered.state;
        self.summary = rendered.summary;
        self.results = rendered.results;
    }

    pub fn clear(&mut self) {
        self.state = ViewState::Empty;
        self.summary = Html::new();
        self.results = Html::trusted(NO_RESULTS_YET);
        self.toggles.clear();
    }

    pub fn dispatch(&mut self, event: UiEvent, document: &DocumentContext) -> Option<PanelUpdate> {
        match event {
            UiEvent::ToggleSnippet(trigger) => self.toggle_snippet(trigger, document),
        }
    }

    /// 切换片段面板；没有原文或触发器不属于当前结果时返回 None
    pub fn toggle_snippet(
        &mut self,
        trigger: SnippetTrigger,
        document: &DocumentContext,
    ) -> Option<PanelUpdate> {
        if document.is_empty() {
            tracing::debug!("Snippet toggle ignored, no document loaded");
            return None;
        }
        let visible = self.toggles.get_mut(&trigger)?;
        *visible = !*visible;

        let html = if *visible {
            let mut panel = Html::trusted(format!(
                r#"<pre class="snippet" data-snippet="{}">"#,
                trigger.card
            ));
            panel.push(&extract_snippet(document.text(), trigger.line, self.radius));
            panel.push_trusted("</pre>");
            panel
        } else {
            empty_panel(trigger.card)
        };

        Some(PanelUpdate {
            card: trigger.card,
            line: trigger.line,
            visible: *visible,
            html,
        })
    }

    /// 结果 HTML 中的面板都是隐藏的，重新下发前把切换状态归位
    pub fn collapse_snippets(&mut self) {
        for visible in self.toggles.values_mut() {
            *visible = false;
        }
    }

    pub fn is_visible(&self, trigger: SnippetTrigger) -> bool {
        self.toggles.get(&trigger).copied().unwrap_or(false)
    }
}
