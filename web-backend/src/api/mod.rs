use actix_web::{web, Scope};

pub mod form;
pub mod ui;

pub fn create_ui_router() -> Scope {
    web::scope("/ui").configure(ui::configure_ui_routes)
}
