pub mod auth;
pub mod route;

pub use auth::{AuthCommands, AuthLoginArgs};
pub use route::{RouteCheckArgs, RouteCommands, RouteMenuArgs};
