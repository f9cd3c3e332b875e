//! Store Server — e-commerce storefront and admin back-office
//!
//! # Architecture overview
//!
//! - **Database** (`db`): embedded SurrealDB storage, models and repositories
//! - **Orders core** (`orders`): transactional order placement, stock
//!   reconciliation and the status state machine
//! - **Auth** (`auth`): JWT + Argon2 with a persistent revoked-session store
//! - **HTTP API** (`api`): RESTful routes per resource
//!
//! # Module structure
//!
//! ```text
//! store-server/src/
//! ├── core/          # configuration, state, server
//! ├── auth/          # JWT auth, revocation, role gates
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # database layer (models + repositories)
//! ├── orders/        # order placement and reconciliation
//! └── utils/         # logging, time, slugs, validation
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod orders;
pub mod utils;

// Re-export common types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState, setup_environment};
pub use orders::{OrderService, OrderStatus, PaymentStatus};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Security logging macro - structured events for auth decisions
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
   _____ __
  / ___// /_____  ________
  \__ \/ __/ __ \/ ___/ _ \
 ___/ / /_/ /_/ / /  /  __/
/____/\__/\____/_/   \___/
    "#
    );
}
