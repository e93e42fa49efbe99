//! crates/life_lessons_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or
//! cryptographic libraries.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Account, Category, Comment, CommentChanges, Lesson, LessonChanges, NewAccount, NewCategory,
    NewComment, NewLesson, ProfileChanges, SessionClaims,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all store operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    AlreadyExists(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Reasons a session token can be refused by the token service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token is signed with an unsupported algorithm")]
    UnsupportedAlgorithm,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// The adaptive hash primitive failed (bad cost parameters, unparsable digest).
#[derive(Debug, Clone, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct HashingError(pub String);

//=========================================================================================
// Store Ports (Traits)
//=========================================================================================

/// Persistence of accounts and their credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_account_by_email(&self, email: &str) -> PortResult<Account>;

    async fn find_account_by_id(&self, account_id: Uuid) -> PortResult<Account>;

    /// Fails with `PortError::AlreadyExists` when the email is taken.
    async fn create_account(&self, account: NewAccount) -> PortResult<Account>;

    async fn set_last_token(&self, account_id: Uuid, token: &str) -> PortResult<()>;

    async fn update_profile(&self, account_id: Uuid, changes: ProfileChanges) -> PortResult<()>;

    async fn delete_account(&self, account_id: Uuid) -> PortResult<()>;

    async fn list_accounts(&self) -> PortResult<Vec<Account>>;
}

/// Persistence of lessons, comments and categories.
///
/// Every mutation is expected to be atomic per document; nothing here spans
/// more than one record.
#[async_trait]
pub trait ContentStore: Send + Sync {
    // --- Lessons ---
    async fn create_lesson(&self, lesson: NewLesson) -> PortResult<Lesson>;

    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson>;

    async fn list_lessons(&self) -> PortResult<Vec<Lesson>>;

    async fn list_lessons_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Lesson>>;

    async fn update_lesson(&self, lesson_id: Uuid, changes: LessonChanges) -> PortResult<()>;

    async fn delete_lesson(&self, lesson_id: Uuid) -> PortResult<()>;

    /// Removes every lesson owned by the account, returning how many went.
    async fn delete_lessons_by_owner(&self, owner_id: Uuid) -> PortResult<u64>;

    /// Adds the account to the lesson's likes; a repeated like is a no-op.
    async fn add_like(&self, lesson_id: Uuid, account_id: Uuid) -> PortResult<()>;

    async fn remove_like(&self, lesson_id: Uuid, account_id: Uuid) -> PortResult<()>;

    async fn push_comment_ref(&self, lesson_id: Uuid, comment_id: Uuid) -> PortResult<()>;

    async fn pull_comment_ref(&self, lesson_id: Uuid, comment_id: Uuid) -> PortResult<()>;

    // --- Comments ---
    async fn create_comment(&self, comment: NewComment) -> PortResult<Comment>;

    async fn get_comment(&self, comment_id: Uuid) -> PortResult<Comment>;

    async fn update_comment(&self, comment_id: Uuid, changes: CommentChanges) -> PortResult<()>;

    async fn delete_comment(&self, comment_id: Uuid) -> PortResult<()>;

    /// Every comment the account wrote, on any lesson.
    async fn list_comments_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Comment>>;

    // --- Categories ---
    async fn create_category(&self, category: NewCategory) -> PortResult<Category>;

    async fn get_category(&self, category_id: Uuid) -> PortResult<Category>;

    async fn list_categories(&self) -> PortResult<Vec<Category>>;

    async fn update_category(&self, category: Category) -> PortResult<()>;

    async fn delete_category(&self, category_id: Uuid) -> PortResult<()>;
}

//=========================================================================================
// Credential Primitive Ports (Traits)
//=========================================================================================

/// A one-way adaptive password hash.
pub trait PasswordHashingService: Send + Sync {
    /// Hashes the original plaintext. Never call this on an existing digest.
    fn hash(&self, plaintext: &str) -> Result<String, HashingError>;

    /// Returns `Ok(false)` on a plain mismatch; errors are reserved for digests
    /// the primitive cannot interpret.
    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, HashingError>;
}

/// Issues and verifies signed, expiring session tokens.
///
/// The service is stateless: persisting the issued token as the account's
/// latest token is the caller's job.
pub trait TokenService: Send + Sync {
    fn issue(
        &self,
        account_id: Uuid,
        email: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<String, TokenError>;

    fn verify(&self, token: &str) -> Result<SessionClaims, TokenError>;
}
