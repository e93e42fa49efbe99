//! crates/life_lessons_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

//=========================================================================================
// Accounts
//=========================================================================================

/// A registered user together with its credential record.
///
/// `password_hash` and `last_issued_token` are sensitive and never leave the
/// service; the web layer maps accounts onto a public profile before responding.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub photo: Option<String>,
    pub is_admin: bool,
    /// The only token currently accepted for this account.
    pub last_issued_token: Option<String>,
    pub joined_on: DateTime<Utc>,
}

/// Everything needed to persist a brand new account.
///
/// The account is created already carrying its first session token, so the
/// sign-up never leaves a window in which the account exists without one.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub photo: Option<String>,
    pub is_admin: bool,
    pub last_issued_token: String,
}

/// Self-service profile changes.
#[derive(Debug, Clone)]
pub struct ProfileChanges {
    pub username: String,
    pub photo: Option<String>,
    /// Set when the password was changed; the new hash and the token minted
    /// for it are written together.
    pub rotated: Option<RotatedCredentials>,
}

#[derive(Debug, Clone)]
pub struct RotatedCredentials {
    pub password_hash: String,
    pub token: String,
}

//=========================================================================================
// Session Tokens
//=========================================================================================

/// The typed claims carried by a verified session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Content
//=========================================================================================

/// A "personal life lesson" post.
#[derive(Debug, Clone)]
pub struct Lesson {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// The owner's username as of the last write to the lesson.
    pub username: String,
    pub category_id: Uuid,
    pub title: String,
    pub learning: String,
    pub related_story: String,
    pub created_on: DateTime<Utc>,
    /// Accounts that liked the lesson. Kept free of duplicates by the stores.
    pub likes: Vec<Uuid>,
    /// Comment ids in insertion order.
    pub comments: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewLesson {
    pub owner_id: Uuid,
    pub username: String,
    pub category_id: Uuid,
    pub title: String,
    pub learning: String,
    pub related_story: String,
}

/// The editable part of a lesson. Ownership never changes after creation.
#[derive(Debug, Clone)]
pub struct LessonChanges {
    pub username: String,
    pub category_id: Uuid,
    pub title: String,
    pub learning: String,
    pub related_story: String,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub username: String,
    pub lesson_id: Uuid,
    pub text: String,
    pub commented_on: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub owner_id: Uuid,
    pub username: String,
    pub lesson_id: Uuid,
    pub text: String,
}

/// A comment edit. The username is refreshed along with the text.
#[derive(Debug, Clone)]
pub struct CommentChanges {
    pub username: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: Uuid,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub title: String,
    pub description: String,
}

/// The kinds of content that carry an owner and can be ownership-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Lesson,
    Comment,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Lesson => f.write_str("lesson"),
            ResourceKind::Comment => f.write_str("comment"),
        }
    }
}
