use actix_cors::Cors;
use actix_files::Files;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use pipeaudit_core::Settings;
use pipeaudit_web::state::AppState;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pipeaudit_web=debug,pipeaudit_core=info,actix_web=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let settings = Settings::load()?;
    let bind_address = settings.bind.clone();
    let static_dir = settings.static_dir.clone();
    // JSON 结果体可能比原始工作流大很多
    let json_limit = settings.max_upload_bytes.saturating_mul(8);

    // 初始化状态
    let state = AppState::new(settings)?;

    // 启动服务器
    tracing::info!("pipeaudit web server listening on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::JsonConfig::default().limit(json_limit))
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .configure(pipeaudit_web::configure)
            // 静态文件服务
            .service(Files::new("/static", static_dir.clone()))
    })
    .bind(bind_address)?
    .run()
    .await?;

    Ok(())
}
