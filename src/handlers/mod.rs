mod auth;
mod dashboard;
mod relay;

pub use auth::{serve_login_page, serve_register_page, handle_login, handle_register, handle_logout};
pub use dashboard::serve_dashboard;
pub use relay::resource_routes;
