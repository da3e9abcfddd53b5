//! HTTP handlers and route configuration.

pub mod account;
pub mod blog;
mod health;

use actix_web::http::header::{self, ContentType};
use actix_web::{HttpRequest, HttpResponse, web};

use crate::config::SiteSettings;
use crate::middleware::error::{AppError, AppResult};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health_check))
        .route("/", web::get().to(blog::index))
        .route("/blog/", web::get().to(blog::post_list))
        .route("/feed/", web::get().to(blog::feed))
        .route("/search/", web::get().to(blog::post_search))
        .route("/posts/tag/{tag_slug}/", web::get().to(blog::post_list_by_tag))
        .service(
            web::scope("/account")
                .service(
                    web::resource("/register/")
                        .route(web::get().to(account::register_form))
                        .route(web::post().to(account::register)),
                )
                .service(
                    web::resource("/login/")
                        .route(web::get().to(account::login_form))
                        .route(web::post().to(account::login)),
                )
                .service(
                    web::resource("/logout/")
                        .route(web::post().to(account::logout))
                        .default_service(web::to(method_not_allowed)),
                )
                .route("/confirm_logout/", web::get().to(account::confirm_logout)),
        )
        .service(
            web::resource("/comment/{comment_id}/delete/")
                .route(web::get().to(blog::delete_comment_confirm))
                .route(web::post().to(blog::delete_comment)),
        )
        .service(
            web::resource("/{post_id}/share/")
                .route(web::get().to(blog::post_share_form))
                .route(web::post().to(blog::post_share)),
        )
        .service(
            web::resource("/{post_id}/comment/")
                .route(web::post().to(blog::post_comment))
                .default_service(web::to(method_not_allowed)),
        )
        .route(
            "/{year}/{month}/{day}/{slug}/",
            web::get().to(blog::post_detail),
        )
        .default_service(web::to(not_found));
}

async fn method_not_allowed() -> AppResult<HttpResponse> {
    Err(AppError::MethodNotAllowed)
}

async fn not_found() -> AppResult<HttpResponse> {
    Err(AppError::NotFound("The requested page does not exist.".to_string()))
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::html()).body(body)
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Absolute site root: the configured `SITE_URL`, or the scheme and host
/// the request came in on.
fn site_root(req: &HttpRequest, site: &SiteSettings) -> String {
    match &site.site_url {
        Some(url) => url.clone(),
        None => {
            let info = req.connection_info();
            format!("{}://{}", info.scheme(), info.host())
        }
    }
}
