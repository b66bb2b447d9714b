use actix_web::web;

use crate::handlers::{home::home, system::health_check};

mod auth;
mod basic_info;
mod categories;
mod dashboard;
mod experiences;
mod json_error;
mod logs;
mod projects;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home).service(health_check);

    cfg.service(
        web::scope("/api/admin")
            .configure(auth::config_routes)
            .configure(projects::config_routes)
            .configure(categories::config_routes)
            .configure(experiences::config_routes)
            .configure(basic_info::config_routes)
            .configure(dashboard::config_routes)
            .configure(logs::config_routes),
    );

    cfg.configure(json_error::config_routes);
}
