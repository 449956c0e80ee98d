// Render module - 检查结果的渲染层
// escape -> snippet -> card -> group / tally -> view

pub mod card;
pub mod escape;
pub mod group;
pub mod snippet;
pub mod tally;
pub mod view;

pub use card::{Location, RenderedCard, SnippetTrigger};
pub use escape::{escape_html, escape_opt, Html};
pub use group::{group_findings, ControlGroup};
pub use snippet::{extract_snippet, snippet_lines, SnippetLine, DEFAULT_RADIUS};
pub use tally::StatusTally;
pub use view::{render_results, PanelUpdate, RenderedResults, ResultsView, UiEvent, ViewState};
