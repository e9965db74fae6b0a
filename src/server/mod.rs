//! HTTP server layer for Meme Host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │      /memes        /private/auth        /private/memes          │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │    auth     │  │        routes           │  │
//! │  │ (requests)  │  │  (bearer)   │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{auth_middleware, AuthError, AuthenticatedUser, TokenAuth};
pub use handlers::{
    delete_handler, health_handler, login_handler, private_memes_handler, public_memes_handler,
    update_handler, upload_handler, AppState, ErrorResponse, HealthResponse, LoginForm,
    MemeIdParams, MemeQueryParams, TokenResponse,
};
pub use routes::{create_router, RouterConfig};
