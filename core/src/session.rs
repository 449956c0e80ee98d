// Session module - 每个浏览器会话持有的状态
// 当前加载的工作流原文、渲染结果、状态栏、提交保护

use serde::Serialize;

use crate::client::{ScanError, ScanRequest};
use crate::findings::FindingsResponse;
use crate::render::view::ResultsView;
use crate::submit::{
    ScanInput, ScanParams, SubmitError, SubmitGuard, Ticket, DEFAULT_MAX_UPLOAD_BYTES,
};

/// 当前加载的工作流文档，不持久化
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentContext {
    name: String,
    text: String,
}

impl DocumentContext {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// 替换当前文档
    pub fn load(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.name = name.into();
        self.text = text.into();
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.text.clear();
    }

    /// 没有原文时片段切换是空操作
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// 状态栏文本，`None` 为隐藏
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusLine(Option<String>);

impl StatusLine {
    pub fn set(&mut self, message: impl Into<String>) {
        self.0 = Some(message.into());
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn message(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// 已发出、等待扫描服务返回的请求
#[derive(Debug, Clone)]
pub struct PendingScan {
    pub ticket: Ticket,
    pub request: ScanRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed { findings: usize },
    Failed,
    /// 更新的提交或 clear 之后才返回，结果丢弃
    Stale,
}

pub struct Session {
    pub document: DocumentContext,
    pub view: ResultsView,
    pub status: StatusLine,
    guard: SubmitGuard,
    max_upload_bytes: usize,
}

impl Session {
    pub fn new(snippet_radius: usize) -> Self {
        Self {
            document: DocumentContext::default(),
            view: ResultsView::new(snippet_radius),
            status: StatusLine::default(),
            guard: SubmitGuard::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_upload_limit(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn in_flight(&self) -> bool {
        self.guard.in_flight()
    }

    /// 校验提交并标记进行中；失败只更新状态栏，不发请求
    pub fn begin_scan(
        &mut self,
        input: ScanInput,
        params: ScanParams,
    ) -> Result<PendingScan, SubmitError> {
        self.status.clear();

        let result = self.prepare(input, params);
        match &result {
            Ok(pending) => {
                tracing::debug!("Issued scan ticket {}", pending.ticket.0);
                self.status.set("Scanning...");
            }
            Err(e) => self.reject(e),
        }
        result
    }

    fn prepare(&mut self, input: ScanInput, params: ScanParams) -> Result<PendingScan, SubmitError> {
        if self.guard.in_flight() {
            return Err(SubmitError::InFlight);
        }

        let document = input.into_document(self.max_upload_bytes)?;
        let request = ScanRequest {
            level: params.level.to_string(),
            file_path: document.name.clone(),
            workflow: document.text.clone(),
            only_status: params.only_status.map(|s| s.to_string()),
        };
        self.document.load(document.name, document.text);

        let ticket = self.guard.acquire();
        Ok(PendingScan { ticket, request })
    }

    /// 参数解析失败等提交前错误，只更新状态栏
    pub fn reject(&mut self, err: &SubmitError) {
        tracing::warn!("Submission rejected: {}", err);
        self.status.set(err.to_string());
    }

    /// 结束一次提交；过期序号不做任何改动
    pub fn finish_scan(
        &mut self,
        ticket: Ticket,
        result: Result<FindingsResponse, ScanError>,
    ) -> ScanOutcome {
        if !self.guard.is_current(ticket) {
            tracing::debug!("Discarding stale scan response for ticket {}", ticket.0);
            return ScanOutcome::Stale;
        }
        self.guard.release();

        match result {
            Ok(resp) => {
                let count = resp.findings.len();
                self.status
                    .set(format!("Scan complete. Returned {} findings.", count));
                self.view.show(&resp, &self.document);
                tracing::info!("Rendered {} findings for {}", count, self.document.name());
                ScanOutcome::Completed { findings: count }
            }
            Err(e) => {
                tracing::error!("Scan failed: {}", e);
                self.status.set(format!("Scan failed: {}", e.user_message()));
                ScanOutcome::Failed
            }
        }
    }

    /// 展示没有原文的扫描结果，片段切换为空操作
    pub fn show_detached(&mut self, resp: &FindingsResponse) {
        self.guard.invalidate();
        self.document.clear();
        self.view.show(resp, &self.document);
        self.status
            .set(format!("Loaded {} findings.", resp.findings.len()));
    }

    /// 回到空状态并丢弃文档；进行中的请求返回后会被丢弃
    pub fn clear(&mut self) {
        self.guard.invalidate();
        self.document.clear();
        self.view.clear();
        self.status.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::Finding;
    use crate::render::view::ViewState;
    use crate::submit::Level;

    fn paste(text: &str) -> ScanInput {
        ScanInput::Paste {
            name: None,
            text: text.to_string(),
        }
    }

    fn params() -> ScanParams {
        ScanParams {
            level: Level::L1,
            only_status: None,
        }
    }

    fn response(n: usize) -> FindingsResponse {
        let findings = (0..n)
            .map(|i| Finding {
                control_id: Some(format!("L1-0{}", i % 3)),
                status: Some("FAIL".to_string()),
                start_line: Some(1),
                ..Default::default()
            })
            .collect();
        FindingsResponse::new(findings)
    }

    #[test]
    fn document_context_lifecycle() {
        let mut doc = DocumentContext::default();
        assert!(doc.is_empty());

        doc.load("a.yml", "on: push");
        assert_eq!(doc.name(), "a.yml");
        assert!(!doc.is_empty());

        doc.load("b.yml", "on: pull_request");
        assert_eq!(doc.text(), "on: pull_request");

        doc.clear();
        assert!(doc.is_empty());
        assert_eq!(doc.name(), "");
    }

    #[test]
    fn successful_scan_populates_view_and_status() {
        let mut session = Session::new(4);
        let pending = session.begin_scan(paste("on: push\n"), params()).unwrap();
        assert!(session.in_flight());
        assert_eq!(session.status.message(), Some("Scanning..."));
        assert_eq!(pending.request.file_path, "workflow.yml");
        assert_eq!(session.document.name(), "workflow.yml");

        let outcome = session.finish_scan(pending.ticket, Ok(response(2)));
        assert_eq!(outcome, ScanOutcome::Completed { findings: 2 });
        assert!(!session.in_flight());
        assert_eq!(session.view.state(), ViewState::Populated);
        assert_eq!(session.status.message(), Some("Scan complete. Returned 2 findings."));
    }

    #[test]
    fn second_submission_is_rejected_while_in_flight() {
        let mut session = Session::new(4);
        let first = session.begin_scan(paste("a: 1"), params()).unwrap();

        let err = session.begin_scan(paste("b: 2"), params()).unwrap_err();
        assert!(matches!(err, SubmitError::InFlight));
        assert_eq!(session.document.text(), "a: 1");

        session.finish_scan(first.ticket, Ok(response(1)));
        assert!(session.begin_scan(paste("b: 2"), params()).is_ok());
    }

    #[test]
    fn failure_releases_guard_and_reports_message() {
        let mut session = Session::new(4);
        let pending = session.begin_scan(paste("a: 1"), params()).unwrap();
        let err = ScanError::Service {
            status: 400,
            error: Some("invalid_level".to_string()),
            message: Some("level must be one of L1, L2, L3".to_string()),
        };

        assert_eq!(session.finish_scan(pending.ticket, Err(err)), ScanOutcome::Failed);
        assert!(!session.in_flight());
        assert_eq!(
            session.status.message(),
            Some("Scan failed: level must be one of L1, L2, L3")
        );
        assert_eq!(session.view.state(), ViewState::Empty);
    }

    #[test]
    fn validation_error_never_marks_in_flight() {
        let mut session = Session::new(4);
        let err = session.begin_scan(ScanInput::Nothing, params()).unwrap_err();
        assert!(matches!(err, SubmitError::NoInput));
        assert!(!session.in_flight());
        assert_eq!(session.status.message(), Some(err.to_string().as_str()));
    }

    #[test]
    fn clear_while_in_flight_discards_late_response() {
        let mut session = Session::new(4);
        let pending = session.begin_scan(paste("a: 1"), params()).unwrap();
        session.clear();

        let outcome = session.finish_scan(pending.ticket, Ok(response(3)));
        assert_eq!(outcome, ScanOutcome::Stale);
        assert_eq!(session.view.state(), ViewState::Empty);
        assert!(session.document.is_empty());
        assert!(!session.in_flight());
    }

    #[test]
    fn late_response_does_not_release_newer_submission() {
        let mut session = Session::new(4);
        let old = session.begin_scan(paste("a: 1"), params()).unwrap();
        session.clear();
        let new = session.begin_scan(paste("b: 2"), params()).unwrap();

        assert_eq!(session.finish_scan(old.ticket, Ok(response(3))), ScanOutcome::Stale);
        assert!(session.in_flight());
        assert_eq!(session.status.message(), Some("Scanning..."));

        let outcome = session.finish_scan(new.ticket, Ok(response(1)));
        assert_eq!(outcome, ScanOutcome::Completed { findings: 1 });
        assert_eq!(session.document.text(), "b: 2");
    }

    #[test]
    fn upload_limit_is_enforced() {
        let mut session = Session::new(4).with_upload_limit(4);
        let err = session.begin_scan(paste("on: push"), params()).unwrap_err();
        assert_eq!(err, SubmitError::TooLarge { limit: 4 });
        assert!(session.document.is_empty());
    }

    #[test]
    fn detached_results_have_no_document() {
        let mut session = Session::new(4);
        let pending = session.begin_scan(paste("a: 1"), params()).unwrap();
        session.finish_scan(pending.ticket, Ok(response(1)));

        session.show_detached(&response(2));
        assert!(session.document.is_empty());
        assert_eq!(session.view.state(), ViewState::Populated);
        assert_eq!(session.status.message(), Some("Loaded 2 findings."));
    }
}
