use actix_web::web;

use crate::handlers::basic_info;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/basic-info")
            .service(
                web::resource("")
                    .route(web::get().to(basic_info::get_basic_info))
                    .route(web::put().to(basic_info::save_basic_info)),
            )
            .service(
                web::resource("/profile-picture")
                    .route(web::post().to(basic_info::upload_profile_picture))
                    .route(web::delete().to(basic_info::delete_profile_picture)),
            ),
    );
}
