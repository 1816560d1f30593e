//! Business logic services for the loyalty API.
//!
//! # Services
//!
//! - `auth` - Password accounts, session tokens and the `auth-token` cookie
//! - `login_limiter` - Per-IP lockout after repeated failed logins
//! - `settings_cache` - Cached snapshot of `system_settings`
//! - `loyalty_sync` - Background calls to the external loyalty platform

pub mod auth;
pub mod login_limiter;
pub mod loyalty_sync;
pub mod settings_cache;

pub use auth::{AuthError, AuthService, JwtKeys};
pub use login_limiter::LoginLimiter;
pub use loyalty_sync::LoyaltySync;
pub use settings_cache::SettingsCache;
