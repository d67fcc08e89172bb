use actix_web::web;

pub mod health;
pub mod users;

/// Register every route. `main.rs` and the HTTP tests share this so the
/// tested surface is the served surface.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Greeting: /
    cfg.route("/", web::get().to(health::root));

    // Health check routes: /health, /health/ready
    cfg.service(web::scope("/health").configure(health::configure_routes));

    // User routes: /users/**
    cfg.service(web::scope("/users").configure(users::configure_routes));
}
