// pipeaudit Core Library
// 检查结果渲染层：数据模型、分组统计、卡片与片段渲染、会话状态、扫描服务客户端

pub mod client;
pub mod config;
pub mod findings;
pub mod render;
pub mod session;
pub mod submit;

// 重新导出常用类型
pub use client::{HttpScanClient, ScanError, ScanRequest, ScanService};
pub use config::{ConfigError, Settings};
pub use findings::{Explain, Finding, FindingsResponse, Status};
pub use render::{
    extract_snippet, group_findings, render_results, ControlGroup, Html, RenderedCard,
    ResultsView, StatusTally, UiEvent, ViewState,
};
pub use session::{DocumentContext, ScanOutcome, Session};
pub use submit::{Level, ScanInput, ScanParams, SubmitError};
