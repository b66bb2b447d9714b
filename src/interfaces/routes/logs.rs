use actix_web::web;

use crate::handlers::logs;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/logs")
            .route(web::get().to(logs::list_logs))
            .route(web::post().to(logs::create_log))
            .route(web::delete().to(logs::purge_logs)),
    );
}
