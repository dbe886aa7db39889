mod sqlite_user_store;
mod user_manager;
mod user_models;
mod user_store;

pub use sqlite_user_store::SqliteUserStore;
pub use user_manager::{LibraryError, LikeToggle, UserManager};
pub use user_models::{AuthToken, AuthTokenValue, UserRole};
pub use user_store::UserStore;
