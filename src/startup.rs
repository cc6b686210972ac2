use actix_web::dev::Server;
use actix_web::{guard, middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::configuration::Settings;
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{create_user, health_check, login, polka_webhook, refresh, reset, revoke, update_user};
use crate::session::SessionService;
use crate::store::SessionStore;

pub fn run(
    listener: TcpListener,
    store: Arc<dyn SessionStore>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let sessions = SessionService::new(store, settings.jwt.clone(), settings.password.clone());
    let sessions_data = web::Data::new(sessions.clone());
    let polka_data = web::Data::new(settings.polka.clone());
    let platform_data = web::Data::new(settings.application.platform);

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(sessions_data.clone())
            .app_data(polka_data.clone())
            .app_data(platform_data.clone())

            .route("/api/healthz", web::get().to(health_check))

            // Sessions
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))

            // Users; changing credentials requires an access token
            .service(
                web::resource("/api/users")
                    .guard(guard::Put())
                    .route(web::put().to(update_user))
                    .wrap(JwtMiddleware::new(sessions.clone())),
            )
            .route("/api/users", web::post().to(create_user))

            .route("/api/polka/webhooks", web::post().to(polka_webhook))
            .route("/admin/reset", web::post().to(reset))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
