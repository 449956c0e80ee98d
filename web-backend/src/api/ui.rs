use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use pipeaudit_core::render::PanelUpdate;
use pipeaudit_core::{FindingsResponse, ScanParams, Session, SubmitError, UiEvent, ViewState};
use serde::{Deserialize, Serialize};

use super::form::read_scan_form;
use crate::state::{AppState, SessionKey};

/// 结果区域的渲染片段，前端直接替换
#[derive(Serialize)]
pub struct Fragments {
    pub status: Option<String>,
    pub state: ViewState,
    pub container_class: &'static str,
    pub summary_html: String,
    pub results_html: String,
    pub in_flight: bool,
}

impl Fragments {
    pub fn from_session(session: &Session) -> Self {
        Self {
            status: session.status.message().map(str::to_string),
            state: session.view.state(),
            container_class: session.view.container_class(),
            summary_html: session.view.summary_html().to_string(),
            results_html: session.view.results_html().to_string(),
            in_flight: session.in_flight(),
        }
    }
}

/// 事件委托：前端把被点击元素的 data-* 属性原样发过来
#[derive(Deserialize)]
pub struct ToggleRequest {
    pub action: String,
    #[serde(default)]
    pub card: Option<String>,
    #[serde(default)]
    pub line: Option<String>,
}

#[derive(Serialize)]
pub struct ToggleResponse {
    /// `None` 表示空操作
    pub update: Option<PanelUpdate>,
}

pub fn configure_ui_routes(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/scan", web::post().to(scan))
        .route("/render", web::post().to(render))
        .route("/toggle", web::post().to(toggle))
        .route("/clear", web::post().to(clear))
        .route("/state", web::get().to(current_state));
}

fn respond<T: Serialize>(key: &SessionKey, body: &T) -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    if key.fresh {
        builder.cookie(key.cookie());
    }
    builder.json(body)
}

/// 上传文件或粘贴文本并扫描
pub async fn scan(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: Multipart,
) -> impl Responder {
    let key = SessionKey::from_request(&req);
    let limit = state.settings.max_upload_bytes;

    let form = match read_scan_form(payload, limit).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!("Rejected scan form: {}", e);
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid_form",
                "message": e.to_string()
            }));
        }
    };

    // 锁只在同步阶段持有，等待扫描服务期间释放
    let pending = {
        let mut sessions = state.sessions.lock().await;
        let session = sessions.get_or_insert_with(&key.id, || state.new_session());

        if form.oversize {
            session.reject(&SubmitError::TooLarge { limit });
            return respond(&key, &Fragments::from_session(session));
        }

        let params = match ScanParams::parse(
            form.level.as_deref(),
            form.only_status.as_deref(),
            state.settings.default_level,
        ) {
            Ok(params) => params,
            Err(e) => {
                session.reject(&e);
                return respond(&key, &Fragments::from_session(session));
            }
        };

        match session.begin_scan(form.into_input(), params) {
            Ok(pending) => pending,
            Err(_) => return respond(&key, &Fragments::from_session(session)),
        }
    };

    // 客户端断开时 handler 会被丢弃，扫描和结算放进独立任务保证一定执行
    let settle = {
        let state = state.clone();
        let id = key.id.clone();
        actix_web::rt::spawn(async move {
            let result = state.scanner.scan(&pending.request).await;

            let mut sessions = state.sessions.lock().await;
            let fragments = match sessions.get_mut(&id) {
                Some(session) => {
                    let outcome = session.finish_scan(pending.ticket, result);
                    tracing::debug!(
                        "Scan for session {} via {} settled: {:?}",
                        id,
                        state.scanner.name(),
                        outcome
                    );
                    Fragments::from_session(session)
                }
                None => {
                    tracing::debug!("Session {} was evicted before its scan settled", id);
                    Fragments::from_session(&state.new_session())
                }
            };
            fragments
        })
    };

    match settle.await {
        Ok(fragments) => respond(&key, &fragments),
        Err(e) => {
            tracing::error!("Scan task for session {} failed: {}", key.id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "scan_task_failed",
                "message": e.to_string()
            }))
        }
    }
}

/// 直接渲染一份已保存的扫描结果（没有原文，片段切换不可用）
pub async fn render(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<FindingsResponse>,
) -> impl Responder {
    let key = SessionKey::from_request(&req);

    let mut sessions = state.sessions.lock().await;
    let session = sessions.get_or_insert_with(&key.id, || state.new_session());
    session.show_detached(&body);

    respond(&key, &Fragments::from_session(session))
}

pub async fn toggle(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ToggleRequest>,
) -> impl Responder {
    let key = SessionKey::from_request(&req);

    let event = UiEvent::from_attributes(&body.action, body.card.as_deref(), body.line.as_deref());
    let Some(event) = event else {
        return respond(&key, &ToggleResponse { update: None });
    };

    let mut sessions = state.sessions.lock().await;
    let update = match sessions.get_mut(&key.id) {
        Some(session) => session.view.dispatch(event, &session.document),
        None => None,
    };

    respond(&key, &ToggleResponse { update })
}

/// 没有会话时直接返回空状态，不新建
pub async fn clear(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let key = SessionKey::from_request(&req);

    let mut sessions = state.sessions.lock().await;
    let fragments = match sessions.get_mut(&key.id) {
        Some(session) => {
            session.clear();
            Fragments::from_session(session)
        }
        None => Fragments::from_session(&state.new_session()),
    };
    respond(&key, &fragments)
}

/// 下发的结果 HTML 中面板都是隐藏的，切换状态随之归位
pub async fn current_state(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let key = SessionKey::from_request(&req);

    let mut sessions = state.sessions.lock().await;
    let fragments = match sessions.get_mut(&key.id) {
        Some(session) => {
            session.view.collapse_snippets();
            Fragments::from_session(session)
        }
        None => Fragments::from_session(&state.new_session()),
    };
    respond(&key, &fragments)
}
