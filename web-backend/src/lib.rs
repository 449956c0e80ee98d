use actix_web::{web, HttpRequest, HttpResponse, Responder};

pub mod api;
pub mod page;
pub mod state;

use api::create_ui_router;
use state::{AppState, SessionKey};

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "time": chrono::Local::now().to_rfc3339()
    }))
}

/// 页面刷新即丢弃会话里的文档和结果
async fn index(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let key = SessionKey::from_request(&req);
    if !key.fresh {
        let mut sessions = state.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&key.id) {
            session.clear();
        }
    }

    let mut builder = HttpResponse::Ok();
    if key.fresh {
        builder.cookie(key.cookie());
    }
    builder
        .content_type("text/html; charset=utf-8")
        .body(page::index(&state.settings))
}

/// 服务和测试共用的路由注册
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_ui_router())
        // 健康检查
        .route("/health", web::get().to(health_check))
        .route("/", web::get().to(index));
}
