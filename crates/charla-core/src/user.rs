//! UserRepository trait definition.
//!
//! The user store is owned by an external collaborator (account management);
//! this core reads the plan tier and counter and performs the atomic quota
//! increment. Uses native async fn in traits (RPITIT, Rust 2024 edition).

use charla_types::error::RepositoryError;
use charla_types::user::User;
use uuid::Uuid;

/// Repository trait for user lookup and quota counter updates.
///
/// Implementations live in charla-infra (e.g., `SqliteUserRepository`).
pub trait UserRepository: Send + Sync {
    /// Get a user by their unique ID.
    fn find_by_id(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Atomically increment the user's message counter by one.
    ///
    /// Must be a single-statement update at the store, not a read-then-write
    /// pair, so concurrent exchanges for the same user never lose updates.
    fn increment_message_count(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Persist the user's mutable fields (name, email, plan).
    ///
    /// The message counter is excluded: it changes only through
    /// `increment_message_count` here and the external reset job.
    fn save(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
