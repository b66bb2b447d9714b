use actix_web::web;

use crate::handlers::dashboard;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/dashboard").service(dashboard::dashboard_stats));
}
