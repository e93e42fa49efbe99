//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `CredentialStore` and `ContentStore`
//! ports. Used when no database is configured and by the test-suite.

use async_trait::async_trait;
use chrono::Utc;
use life_lessons_core::domain::{
    Account, Category, Comment, CommentChanges, Lesson, LessonChanges, NewAccount, NewCategory,
    NewComment, NewLesson, ProfileChanges,
};
use life_lessons_core::ports::{ContentStore, CredentialStore, PortError, PortResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    lessons: HashMap<Uuid, Lesson>,
    comments: HashMap<Uuid, Comment>,
    categories: HashMap<Uuid, Category>,
}

/// Every operation holds the lock for a single record update, mirroring the
/// per-document atomicity of a real store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(what: &str, id: Uuid) -> PortError {
    PortError::NotFound(format!("{} {} not found", what, id))
}

//=========================================================================================
// `CredentialStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_account_by_email(&self, email: &str) -> PortResult<Account> {
        let tables = self.tables.read().await;
        tables
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Account with email {} not found", email)))
    }

    async fn find_account_by_id(&self, account_id: Uuid) -> PortResult<Account> {
        let tables = self.tables.read().await;
        tables
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or_else(|| not_found("Account", account_id))
    }

    async fn create_account(&self, account: NewAccount) -> PortResult<Account> {
        let mut tables = self.tables.write().await;
        if tables.accounts.values().any(|a| a.email == account.email) {
            return Err(PortError::AlreadyExists(account.email));
        }

        let record = Account {
            id: account.id,
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            photo: account.photo,
            is_admin: account.is_admin,
            last_issued_token: Some(account.last_issued_token),
            joined_on: Utc::now(),
        };
        tables.accounts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn set_last_token(&self, account_id: Uuid, token: &str) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let account = tables
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| not_found("Account", account_id))?;
        account.last_issued_token = Some(token.to_string());
        Ok(())
    }

    async fn update_profile(&self, account_id: Uuid, changes: ProfileChanges) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let account = tables
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| not_found("Account", account_id))?;

        account.username = changes.username;
        account.photo = changes.photo;
        if let Some(rotated) = changes.rotated {
            account.password_hash = rotated.password_hash;
            account.last_issued_token = Some(rotated.token);
        }
        Ok(())
    }

    async fn delete_account(&self, account_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .accounts
            .remove(&account_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Account", account_id))
    }

    async fn list_accounts(&self) -> PortResult<Vec<Account>> {
        let tables = self.tables.read().await;
        let mut accounts: Vec<Account> = tables.accounts.values().cloned().collect();
        accounts.sort_by_key(|a| a.joined_on);
        Ok(accounts)
    }
}

//=========================================================================================
// `ContentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContentStore for MemoryStore {
    async fn create_lesson(&self, lesson: NewLesson) -> PortResult<Lesson> {
        let record = Lesson {
            id: Uuid::new_v4(),
            owner_id: lesson.owner_id,
            username: lesson.username,
            category_id: lesson.category_id,
            title: lesson.title,
            learning: lesson.learning,
            related_story: lesson.related_story,
            created_on: Utc::now(),
            likes: Vec::new(),
            comments: Vec::new(),
        };
        self.tables
            .write()
            .await
            .lessons
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_lesson(&self, lesson_id: Uuid) -> PortResult<Lesson> {
        let tables = self.tables.read().await;
        tables
            .lessons
            .get(&lesson_id)
            .cloned()
            .ok_or_else(|| not_found("Lesson", lesson_id))
    }

    async fn list_lessons(&self) -> PortResult<Vec<Lesson>> {
        let tables = self.tables.read().await;
        let mut lessons: Vec<Lesson> = tables.lessons.values().cloned().collect();
        lessons.sort_by_key(|l| l.created_on);
        Ok(lessons)
    }

    async fn list_lessons_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Lesson>> {
        let tables = self.tables.read().await;
        let mut lessons: Vec<Lesson> = tables
            .lessons
            .values()
            .filter(|l| l.owner_id == owner_id)
            .cloned()
            .collect();
        lessons.sort_by_key(|l| l.created_on);
        Ok(lessons)
    }

    async fn update_lesson(&self, lesson_id: Uuid, changes: LessonChanges) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let lesson = tables
            .lessons
            .get_mut(&lesson_id)
            .ok_or_else(|| not_found("Lesson", lesson_id))?;
        lesson.username = changes.username;
        lesson.category_id = changes.category_id;
        lesson.title = changes.title;
        lesson.learning = changes.learning;
        lesson.related_story = changes.related_story;
        Ok(())
    }

    async fn delete_lesson(&self, lesson_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .lessons
            .remove(&lesson_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Lesson", lesson_id))
    }

    async fn delete_lessons_by_owner(&self, owner_id: Uuid) -> PortResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.lessons.len();
        tables.lessons.retain(|_, lesson| lesson.owner_id != owner_id);
        Ok((before - tables.lessons.len()) as u64)
    }

    async fn add_like(&self, lesson_id: Uuid, account_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let lesson = tables
            .lessons
            .get_mut(&lesson_id)
            .ok_or_else(|| not_found("Lesson", lesson_id))?;
        if !lesson.likes.contains(&account_id) {
            lesson.likes.push(account_id);
        }
        Ok(())
    }

    async fn remove_like(&self, lesson_id: Uuid, account_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let lesson = tables
            .lessons
            .get_mut(&lesson_id)
            .ok_or_else(|| not_found("Lesson", lesson_id))?;
        lesson.likes.retain(|id| *id != account_id);
        Ok(())
    }

    async fn push_comment_ref(&self, lesson_id: Uuid, comment_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let lesson = tables
            .lessons
            .get_mut(&lesson_id)
            .ok_or_else(|| not_found("Lesson", lesson_id))?;
        lesson.comments.push(comment_id);
        Ok(())
    }

    async fn pull_comment_ref(&self, lesson_id: Uuid, comment_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let lesson = tables
            .lessons
            .get_mut(&lesson_id)
            .ok_or_else(|| not_found("Lesson", lesson_id))?;
        lesson.comments.retain(|id| *id != comment_id);
        Ok(())
    }

    async fn create_comment(&self, comment: NewComment) -> PortResult<Comment> {
        let record = Comment {
            id: Uuid::new_v4(),
            owner_id: comment.owner_id,
            username: comment.username,
            lesson_id: comment.lesson_id,
            text: comment.text,
            commented_on: Utc::now(),
        };
        self.tables
            .write()
            .await
            .comments
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_comment(&self, comment_id: Uuid) -> PortResult<Comment> {
        let tables = self.tables.read().await;
        tables
            .comments
            .get(&comment_id)
            .cloned()
            .ok_or_else(|| not_found("Comment", comment_id))
    }

    async fn update_comment(&self, comment_id: Uuid, changes: CommentChanges) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let comment = tables
            .comments
            .get_mut(&comment_id)
            .ok_or_else(|| not_found("Comment", comment_id))?;
        comment.username = changes.username;
        comment.text = changes.text;
        comment.commented_on = Utc::now();
        Ok(())
    }

    async fn delete_comment(&self, comment_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .comments
            .remove(&comment_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Comment", comment_id))
    }

    async fn list_comments_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Comment>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.commented_on);
        Ok(comments)
    }

    async fn create_category(&self, category: NewCategory) -> PortResult<Category> {
        let record = Category {
            id: Uuid::new_v4(),
            title: category.title,
            description: category.description,
        };
        self.tables
            .write()
            .await
            .categories
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_category(&self, category_id: Uuid) -> PortResult<Category> {
        let tables = self.tables.read().await;
        tables
            .categories
            .get(&category_id)
            .cloned()
            .ok_or_else(|| not_found("Category", category_id))
    }

    async fn list_categories(&self) -> PortResult<Vec<Category>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }

    async fn update_category(&self, category: Category) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let record = tables
            .categories
            .get_mut(&category.id)
            .ok_or_else(|| not_found("Category", category.id))?;
        *record = category;
        Ok(())
    }

    async fn delete_category(&self, category_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .categories
            .remove(&category_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Category", category_id))
    }
}
