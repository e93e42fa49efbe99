//! crates/life_lessons_core/src/content.rs
//!
//! Lesson, comment and category operations layered on the `ContentStore`.
//!
//! Mutations of lessons and comments pass the ownership guard first. Composite
//! mutations (a lesson with its comments, a comment with its back-reference)
//! run their parts concurrently and join on both, without rollback.

use futures::future::{join, join_all};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthError;
use crate::domain::{
    Category, Comment, CommentChanges, Lesson, LessonChanges, NewCategory, NewComment, NewLesson,
    ResourceKind,
};
use crate::fanout::{fan_out, BatchReport};
use crate::guard::OwnershipGuard;
use crate::ports::{ContentStore, CredentialStore, PortError, PortResult};

//=========================================================================================
// Errors
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("category {0} does not exist")]
    UnknownCategory(String),
    /// Covers both "not the owner" and "no such resource"; callers are not
    /// told which.
    #[error("not authorized to modify this {0}")]
    NotAuthorized(ResourceKind),
    #[error("content store failure: {0}")]
    Store(PortError),
}

impl From<PortError> for ContentError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound(what) => ContentError::NotFound(what),
            other => ContentError::Store(other),
        }
    }
}

pub type ContentResult<T> = Result<T, ContentError>;

/// The client-editable fields of a lesson, ids still in raw form.
#[derive(Debug, Clone)]
pub struct LessonDraft {
    pub category_id: String,
    pub title: String,
    pub learning: String,
    pub related_story: String,
}

//=========================================================================================
// ContentService
//=========================================================================================

/// What `delete_owned_content` removed.
#[derive(Debug)]
pub struct OwnedContentReport {
    pub lessons: u64,
    /// Comments under the removed lessons, whoever wrote them.
    pub lesson_comments: BatchReport<Uuid>,
    /// The owner's comments on other accounts' lessons, back-references included.
    pub own_comments: BatchReport<Comment>,
}

impl OwnedContentReport {
    pub fn comments_removed(&self) -> usize {
        self.lesson_comments.succeeded().count() + self.own_comments.succeeded().count()
    }
}

#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn ContentStore>,
    accounts: Arc<dyn CredentialStore>,
    guard: OwnershipGuard,
}

impl ContentService {
    /// `accounts` is only read, to stamp authors' usernames onto their content.
    pub fn new(store: Arc<dyn ContentStore>, accounts: Arc<dyn CredentialStore>) -> Self {
        let guard = OwnershipGuard::new(store.clone());
        Self {
            store,
            accounts,
            guard,
        }
    }

    pub fn guard(&self) -> &OwnershipGuard {
        &self.guard
    }

    // --- Lessons ---

    pub async fn list_lessons(&self) -> ContentResult<Vec<Lesson>> {
        Ok(self.store.list_lessons().await?)
    }

    pub async fn get_lesson(&self, lesson_id: &str) -> ContentResult<Lesson> {
        let id = parse_id(lesson_id)?;
        Ok(self.store.get_lesson(id).await?)
    }

    pub async fn create_lesson(&self, owner_id: Uuid, draft: LessonDraft) -> ContentResult<Lesson> {
        let category_id = self.existing_category(&draft.category_id).await?;
        let username = self.author_name(owner_id).await?;
        let lesson = self
            .store
            .create_lesson(NewLesson {
                owner_id,
                username,
                category_id,
                title: draft.title,
                learning: draft.learning,
                related_story: draft.related_story,
            })
            .await?;
        info!(lesson_id = %lesson.id, owner_id = %owner_id, "Lesson created");
        Ok(lesson)
    }

    pub async fn update_lesson(
        &self,
        account_id: Uuid,
        lesson_id: &str,
        draft: LessonDraft,
    ) -> ContentResult<()> {
        let id = self.authorize(account_id, lesson_id, ResourceKind::Lesson).await?;
        let category_id = self.existing_category(&draft.category_id).await?;
        let username = self.author_name(account_id).await?;
        self.store
            .update_lesson(
                id,
                LessonChanges {
                    username,
                    category_id,
                    title: draft.title,
                    learning: draft.learning,
                    related_story: draft.related_story,
                },
            )
            .await?;
        Ok(())
    }

    /// Deletes the lesson and, concurrently, each of its comments.
    ///
    /// The lesson deletion decides success; the comment deletions come back
    /// as a per-comment report.
    pub async fn delete_lesson(
        &self,
        account_id: Uuid,
        lesson_id: &str,
    ) -> ContentResult<BatchReport<Uuid>> {
        let id = self.authorize(account_id, lesson_id, ResourceKind::Lesson).await?;
        let lesson = self.store.get_lesson(id).await?;

        let (comments, deleted) = join(
            fan_out(lesson.comments, |comment_id| self.store.delete_comment(comment_id)),
            self.store.delete_lesson(id),
        )
        .await;
        deleted?;

        if comments.is_partial_failure() {
            warn!(
                lesson_id = %id,
                failed = comments.failed().count(),
                "Some comments of a deleted lesson remain"
            );
        }
        info!(lesson_id = %id, "Lesson deleted");
        Ok(comments)
    }

    pub async fn like_lessons(
        &self,
        account_id: Uuid,
        lesson_ids: Vec<String>,
    ) -> BatchReport<String> {
        let report = fan_out(lesson_ids, |raw_id| async move {
            let id = parse_port_id(&raw_id)?;
            self.store.add_like(id, account_id).await
        })
        .await;
        log_partial("like", &report);
        report
    }

    pub async fn dislike_lessons(
        &self,
        account_id: Uuid,
        lesson_ids: Vec<String>,
    ) -> BatchReport<String> {
        let report = fan_out(lesson_ids, |raw_id| async move {
            let id = parse_port_id(&raw_id)?;
            self.store.remove_like(id, account_id).await
        })
        .await;
        log_partial("dislike", &report);
        report
    }

    // --- Comments ---

    /// Fetches the comments that exist among `comment_ids`, in the given
    /// order. Malformed and unknown ids are skipped.
    pub async fn get_comments(&self, comment_ids: Vec<String>) -> Vec<Comment> {
        let lookups = comment_ids
            .iter()
            .filter_map(|raw| Uuid::parse_str(raw).ok())
            .map(|id| self.store.get_comment(id));

        join_all(lookups)
            .await
            .into_iter()
            .filter_map(Result::ok)
            .collect()
    }

    /// Stores the comment and appends its id to the parent lesson.
    pub async fn create_comment(
        &self,
        owner_id: Uuid,
        lesson_id: &str,
        text: String,
    ) -> ContentResult<Comment> {
        let lesson_id = Uuid::parse_str(lesson_id)
            .map_err(|_| ContentError::NotFound(format!("lesson {lesson_id}")))?;
        self.store.get_lesson(lesson_id).await?;
        let username = self.author_name(owner_id).await?;

        let comment = self
            .store
            .create_comment(NewComment {
                owner_id,
                username,
                lesson_id,
                text,
            })
            .await?;

        if let Err(e) = self.store.push_comment_ref(lesson_id, comment.id).await {
            warn!(comment_id = %comment.id, "Could not attach comment to its lesson: {}", e);
            if let Err(cleanup) = self.store.delete_comment(comment.id).await {
                warn!(comment_id = %comment.id, "Orphaned comment left behind: {}", cleanup);
            }
            return Err(e.into());
        }

        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        account_id: Uuid,
        comment_id: &str,
        text: &str,
    ) -> ContentResult<()> {
        let id = self.authorize(account_id, comment_id, ResourceKind::Comment).await?;
        let username = self.author_name(account_id).await?;
        self.store
            .update_comment(
                id,
                CommentChanges {
                    username,
                    text: text.to_string(),
                },
            )
            .await?;
        Ok(())
    }

    pub async fn delete_comment(&self, account_id: Uuid, comment_id: &str) -> ContentResult<()> {
        let id = self.authorize(account_id, comment_id, ResourceKind::Comment).await?;
        let comment = self.store.get_comment(id).await?;
        self.remove_comment(&comment).await?;
        info!(comment_id = %id, "Comment deleted");
        Ok(())
    }

    /// Deletes many comments at once, each with its back-reference.
    pub async fn delete_comments(&self, comment_ids: Vec<String>) -> BatchReport<String> {
        let report = fan_out(comment_ids, |raw_id| async move {
            let id = parse_port_id(&raw_id)?;
            let comment = self.store.get_comment(id).await?;
            self.remove_comment(&comment).await
        })
        .await;
        log_partial("comment deletion", &report);
        report
    }

    // --- Categories ---

    pub async fn list_categories(&self) -> ContentResult<Vec<Category>> {
        Ok(self.store.list_categories().await?)
    }

    pub async fn get_category(&self, category_id: &str) -> ContentResult<Category> {
        let id = parse_id(category_id)?;
        Ok(self.store.get_category(id).await?)
    }

    pub async fn create_category(&self, category: NewCategory) -> ContentResult<Category> {
        Ok(self.store.create_category(category).await?)
    }

    pub async fn update_category(
        &self,
        category_id: &str,
        title: String,
        description: String,
    ) -> ContentResult<()> {
        let id = parse_id(category_id)?;
        self.store
            .update_category(Category {
                id,
                title,
                description,
            })
            .await?;
        Ok(())
    }

    /// Lessons keep pointing at a deleted category; nothing cascades.
    pub async fn delete_category(&self, category_id: &str) -> ContentResult<()> {
        let id = parse_id(category_id)?;
        self.store.delete_category(id).await?;
        Ok(())
    }

    // --- Accounts ---

    /// Removes everything the account leaves behind: its lessons together
    /// with every comment under them, and its own comments on other lessons
    /// together with their back-references.
    ///
    /// Both halves run concurrently and both are awaited. Only the lesson
    /// deletion decides success; comment removals come back as reports.
    pub async fn delete_owned_content(&self, owner_id: Uuid) -> ContentResult<OwnedContentReport> {
        let (lessons, comments) = join(
            self.store.list_lessons_by_owner(owner_id),
            self.store.list_comments_by_owner(owner_id),
        )
        .await;
        let (lessons, comments) = (lessons?, comments?);

        let under_lessons: Vec<Uuid> = lessons.into_iter().flat_map(|l| l.comments).collect();
        let cascaded: HashSet<Uuid> = under_lessons.iter().copied().collect();
        let elsewhere: Vec<Comment> = comments
            .into_iter()
            .filter(|c| !cascaded.contains(&c.id))
            .collect();

        let ((lesson_comments, deleted), own_comments) = join(
            join(
                fan_out(under_lessons, |comment_id| self.store.delete_comment(comment_id)),
                self.store.delete_lessons_by_owner(owner_id),
            ),
            fan_out(elsewhere, |comment| async move { self.remove_comment(&comment).await }),
        )
        .await;

        let report = OwnedContentReport {
            lessons: deleted?,
            lesson_comments,
            own_comments,
        };
        if report.lesson_comments.is_partial_failure() || report.own_comments.is_partial_failure() {
            warn!(owner_id = %owner_id, "Some comments of a removed account remain");
        }
        info!(
            owner_id = %owner_id,
            lessons = report.lessons,
            comments = report.comments_removed(),
            "Owned content deleted"
        );
        Ok(report)
    }

    //=====================================================================================
    // Internals
    //=====================================================================================

    /// Passes only for the owner; an unknown resource is refused the same way
    /// as somebody else's.
    async fn authorize(
        &self,
        account_id: Uuid,
        resource_id: &str,
        kind: ResourceKind,
    ) -> ContentResult<Uuid> {
        let owned = self
            .guard
            .check_ownership(account_id, resource_id, kind)
            .await
            .map_err(|e| match e {
                AuthError::NotFound(_) => ContentError::NotAuthorized(kind),
                AuthError::Store(e) => ContentError::Store(e),
                other => ContentError::Store(PortError::Unexpected(other.to_string())),
            })?;

        if !owned {
            warn!(account_id = %account_id, resource_id, %kind, "Ownership check failed");
            return Err(ContentError::NotAuthorized(kind));
        }

        Uuid::parse_str(resource_id).map_err(|_| ContentError::NotAuthorized(kind))
    }

    async fn author_name(&self, account_id: Uuid) -> ContentResult<String> {
        Ok(self.accounts.find_account_by_id(account_id).await?.username)
    }

    async fn existing_category(&self, raw_id: &str) -> ContentResult<Uuid> {
        let id =
            Uuid::parse_str(raw_id).map_err(|_| ContentError::UnknownCategory(raw_id.to_string()))?;
        match self.store.get_category(id).await {
            Ok(_) => Ok(id),
            Err(PortError::NotFound(_)) => Err(ContentError::UnknownCategory(raw_id.to_string())),
            Err(e) => Err(ContentError::Store(e)),
        }
    }

    /// Drops the lesson's reference and the comment record concurrently.
    /// A lesson that is already gone is not an error.
    async fn remove_comment(&self, comment: &Comment) -> PortResult<()> {
        let (pulled, deleted) = join(
            self.store.pull_comment_ref(comment.lesson_id, comment.id),
            self.store.delete_comment(comment.id),
        )
        .await;

        deleted?;
        match pulled {
            Ok(()) | Err(PortError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn parse_id(raw: &str) -> ContentResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ContentError::InvalidId(raw.to_string()))
}

fn parse_port_id(raw: &str) -> PortResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| PortError::NotFound(raw.to_string()))
}

fn log_partial(operation: &str, report: &BatchReport<String>) {
    if report.is_partial_failure() {
        warn!(
            operation,
            failed = report.failed().count(),
            total = report.len(),
            "Batch finished with failures"
        );
    }
}
