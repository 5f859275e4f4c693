pub mod auth;
pub mod cipher;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod texts;

pub use auth::{AppState, AppStateInner};
pub use error::{ApiError, NotFoundError};
pub use routes::router;
