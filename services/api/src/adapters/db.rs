//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `CredentialStore` and `ContentStore` ports from the `core` crate. It
//! handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use life_lessons_core::domain::{
    Account, Category, Comment, CommentChanges, Lesson, LessonChanges, NewAccount, NewCategory,
    NewComment, NewLesson, ProfileChanges,
};
use life_lessons_core::ports::{ContentStore, CredentialStore, PortError, PortResult};
use sqlx::postgres::PgQueryResult;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements both store ports.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, username, email, password_hash, photo, is_admin, last_issued_token, joined_on";
const LESSON_COLUMNS: &str = "id, owner_id, username, category_id, title, learning, \
     related_story, created_on, likes, comment_ids";
const COMMENT_COLUMNS: &str = "id, owner_id, username, lesson_id, text, commented_on";

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(what: &str, id: Uuid) -> impl FnOnce(sqlx::Error) -> PortError + '_ {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} {} not found", what, id)),
        _ => PortError::Unexpected(e.to_string()),
    }
}

/// Single-row updates report a missing row as `NotFound`.
fn expect_one_row(result: PgQueryResult, what: &str, id: Uuid) -> PortResult<()> {
    if result.rows_affected() == 0 {
        return Err(PortError::NotFound(format!("{} {} not found", what, id)));
    }
    Ok(())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct AccountRecord {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    photo: Option<String>,
    is_admin: bool,
    last_issued_token: Option<String>,
    joined_on: DateTime<Utc>,
}
impl AccountRecord {
    fn to_domain(self) -> Account {
        Account {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            photo: self.photo,
            is_admin: self.is_admin,
            last_issued_token: self.last_issued_token,
            joined_on: self.joined_on,
        }
    }
}

#[derive(FromRow)]
struct LessonRecord {
    id: Uuid,
    owner_id: Uuid,
    username: String,
    category_id: Uuid,
    title: String,
    learning: String,
    related_story: String,
    created_on: DateTime<Utc>,
    likes: Vec<Uuid>,
    comment_ids: Vec<Uuid>,
}
impl LessonRecord {
    fn to_domain(self) -> Lesson {
        Lesson {
            id: self.id,
            owner_id: self.owner_id,
            username: self.username,
            category_id: self.category_id,
            title: self.title,
            learning: self.learning,
            related_story: self.related_story,
            created_on: self.created_on,
            likes: self.likes,
            comments: self.comment_ids,
        }
    }
}

#[derive(FromRow)]
struct CommentRecord {
    id: Uuid,
    owner_id: Uuid,
    username: String,
    lesson_id: Uuid,
    text: String,
    commented_on: DateTime<Utc>,
}
impl CommentRecord {
    fn to_domain(self) -> Comment {
        Comment {
            id: self.id,
            owner_id: self.owner_id,
            username: self.username,
            lesson_id: self.lesson_id,
            text: self.text,
            commented_on: self.commented_on,
        }
    }
}

#[derive(FromRow)]
struct CategoryRecord {
    id: Uuid,
    title: String,
    description: String,
}
impl CategoryRecord {
    fn to_domain(self) -> Category {
        Category {
            id: self.id,
            title: self.title,
            description: self.description,
        }
    }
}

//=========================================================================================
// `CredentialStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_account_by_email(&self, email: &str) -> PortResult<Account> {
        let record = sqlx::query_as::<_, AccountRecord>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Account with email {} not found", email))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn find_account_by_id(&self, account_id: Uuid) -> PortResult<Account> {
        let record = sqlx::query_as::<_, AccountRecord>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected("Account", account_id))?;
        Ok(record.to_domain())
    }

    async fn create_account(&self, account: NewAccount) -> PortResult<Account> {
        let record = sqlx::query_as::<_, AccountRecord>(&format!(
            "INSERT INTO accounts (id, username, email, password_hash, photo, is_admin, last_issued_token) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.photo)
        .bind(account.is_admin)
        .bind(&account.last_issued_token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            // The unique index on `email` settles concurrent sign-ups.
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                PortError::AlreadyExists(account.email.clone())
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;
        Ok(record.to_domain())
    }

    async fn set_last_token(&self, account_id: Uuid, token: &str) -> PortResult<()> {
        let result = sqlx::query("UPDATE accounts SET last_issued_token = $1 WHERE id = $2")
            .bind(token)
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        expect_one_row(result, "Account", account_id)
    }

    async fn update_profile(&self, account_id: Uuid, changes: ProfileChanges) -> PortResult<()> {
        let result = match changes.rotated {
            Some(rotated) => sqlx::query(
                "UPDATE accounts SET username = $1, photo = $2, password_hash = $3, last_issued_token = $4 \
                 WHERE id = $5",
            )
            .bind(&changes.username)
            .bind(&changes.photo)
            .bind(&rotated.password_hash)
            .bind(&rotated.token)
            .bind(account_id)
            .execute(&self.pool)
            .await,
            None => sqlx::query("UPDATE accounts SET username = $1, photo = $2 WHERE id = $3")
                .bind(&changes.username)
                .bind(&changes.photo)
                .bind(account_id)
                .execute(&self.pool)
                .await,
        }
        .map_err(unexpected)?;
        expect_one_row(result, "Account", account_id)
    }

    async fn delete_account(&self, account_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        expect_one_row(result, "Account", account_id)
    }

    async fn list_accounts(&self) -> PortResult<Vec<Account>> {
        let records = sqlx::query_as::<_, AccountRecord>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY joined_on ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}

//=========================================================================================
// `ContentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContentStore for PgStore {
    async fn create_lesson(&self, lesson: NewLesson) -> PortResult<Lesson> {
        let record = sqlx::query_as::<_, LessonRecord>(&format!(
            "INSERT INTO lessons (id, owner_id, username, category_id, title, learning, related_story) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {LESSON_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(lesson.owner_id)
        .bind(&lesson.username)
        .bind(lesson.category_id)
        .bind(&lesson.title)
        .bind(&lesson.learning)
        .bind(&lesson.related_story)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson> {
        let record = sqlx::query_as::<_, LessonRecord>(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE id = $1"
        ))
        .bind(lesson_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected("Lesson", lesson_id))?;
        Ok(record.to_domain())
    }

    async fn list_lessons(&self) -> PortResult<Vec<Lesson>> {
        let records = sqlx::query_as::<_, LessonRecord>(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons ORDER BY created_on ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_lessons_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Lesson>> {
        let records = sqlx::query_as::<_, LessonRecord>(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons WHERE owner_id = $1 ORDER BY created_on ASC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_lesson(&self, lesson_id: Uuid, changes: LessonChanges) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE lessons SET username = $1, category_id = $2, title = $3, learning = $4, \
             related_story = $5 WHERE id = $6",
        )
        .bind(&changes.username)
        .bind(changes.category_id)
        .bind(&changes.title)
        .bind(&changes.learning)
        .bind(&changes.related_story)
        .bind(lesson_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        expect_one_row(result, "Lesson", lesson_id)
    }

    async fn delete_lesson(&self, lesson_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(lesson_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        expect_one_row(result, "Lesson", lesson_id)
    }

    async fn delete_lessons_by_owner(&self, owner_id: Uuid) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM lessons WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected())
    }

    async fn add_like(&self, lesson_id: Uuid, account_id: Uuid) -> PortResult<()> {
        // Re-liking matches the row but leaves the array untouched.
        let result = sqlx::query(
            "UPDATE lessons SET likes = CASE WHEN $2 = ANY(likes) THEN likes ELSE array_append(likes, $2) END \
             WHERE id = $1",
        )
        .bind(lesson_id)
        .bind(account_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        expect_one_row(result, "Lesson", lesson_id)
    }

    async fn remove_like(&self, lesson_id: Uuid, account_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("UPDATE lessons SET likes = array_remove(likes, $2) WHERE id = $1")
            .bind(lesson_id)
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        expect_one_row(result, "Lesson", lesson_id)
    }

    async fn push_comment_ref(&self, lesson_id: Uuid, comment_id: Uuid) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE lessons SET comment_ids = array_append(comment_ids, $2) WHERE id = $1",
        )
        .bind(lesson_id)
        .bind(comment_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        expect_one_row(result, "Lesson", lesson_id)
    }

    async fn pull_comment_ref(&self, lesson_id: Uuid, comment_id: Uuid) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE lessons SET comment_ids = array_remove(comment_ids, $2) WHERE id = $1",
        )
        .bind(lesson_id)
        .bind(comment_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        expect_one_row(result, "Lesson", lesson_id)
    }

    async fn create_comment(&self, comment: NewComment) -> PortResult<Comment> {
        let record = sqlx::query_as::<_, CommentRecord>(&format!(
            "INSERT INTO comments (id, owner_id, username, lesson_id, text) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(comment.owner_id)
        .bind(&comment.username)
        .bind(comment.lesson_id)
        .bind(&comment.text)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_comment(&self, comment_id: Uuid) -> PortResult<Comment> {
        let record = sqlx::query_as::<_, CommentRecord>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(comment_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected("Comment", comment_id))?;
        Ok(record.to_domain())
    }

    async fn update_comment(&self, comment_id: Uuid, changes: CommentChanges) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE comments SET username = $1, text = $2, commented_on = NOW() WHERE id = $3",
        )
        .bind(&changes.username)
        .bind(&changes.text)
        .bind(comment_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        expect_one_row(result, "Comment", comment_id)
    }

    async fn delete_comment(&self, comment_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        expect_one_row(result, "Comment", comment_id)
    }

    async fn list_comments_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Comment>> {
        let records = sqlx::query_as::<_, CommentRecord>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE owner_id = $1 ORDER BY commented_on ASC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_category(&self, category: NewCategory) -> PortResult<Category> {
        let record = sqlx::query_as::<_, CategoryRecord>(
            "INSERT INTO categories (id, title, description) VALUES ($1, $2, $3) \
             RETURNING id, title, description",
        )
        .bind(Uuid::new_v4())
        .bind(&category.title)
        .bind(&category.description)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_category(&self, category_id: Uuid) -> PortResult<Category> {
        let record = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, title, description FROM categories WHERE id = $1",
        )
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected("Category", category_id))?;
        Ok(record.to_domain())
    }

    async fn list_categories(&self) -> PortResult<Vec<Category>> {
        let records = sqlx::query_as::<_, CategoryRecord>(
            "SELECT id, title, description FROM categories ORDER BY title ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_category(&self, category: Category) -> PortResult<()> {
        let result =
            sqlx::query("UPDATE categories SET title = $1, description = $2 WHERE id = $3")
                .bind(&category.title)
                .bind(&category.description)
                .bind(category.id)
                .execute(&self.pool)
                .await
                .map_err(unexpected)?;
        expect_one_row(result, "Category", category.id)
    }

    async fn delete_category(&self, category_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        expect_one_row(result, "Category", category_id)
    }
}
