//! Domain models for the loyalty API.
//!
//! Row types derive `sqlx::FromRow`; response types serialize as camelCase.

pub mod booking;
pub mod catalog;
pub mod dashboard;
pub mod history;
pub mod order;
pub mod reward;
pub mod session;
pub mod setting;
pub mod store;
pub mod user;

pub use session::CurrentUser;
pub use user::{MemberProfile, User};
