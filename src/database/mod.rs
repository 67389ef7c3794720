use async_trait::async_trait;

pub mod errors;
pub mod services;
pub mod types;

pub use errors::DatabaseError;
pub use services::DatabaseService;
pub use types::User;

/// Persistence for registered users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates the users table when it does not exist yet.
    async fn ensure_schema(&self) -> Result<(), DatabaseError>;

    /// Inserts the user, or overwrites phone and location of the existing row.
    async fn upsert_user(&self, user: &User) -> Result<(), DatabaseError>;

    async fn get_user(&self, tg_id: i64) -> Result<Option<User>, DatabaseError>;
}
