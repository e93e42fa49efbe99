mod common;

use common::test_app;
use life_lessons_core::ports::ContentStore;
use life_lessons_core::{
    AuthError, ContentError, LessonDraft, PortError, ProfileUpdate, ResourceKind,
};
use uuid::Uuid;

fn draft(category_id: &str, title: &str) -> LessonDraft {
    LessonDraft {
        category_id: category_id.to_string(),
        title: title.to_string(),
        learning: "Sleep on it".to_string(),
        related_story: "The time I did not".to_string(),
    }
}

#[tokio::test]
async fn ownership_is_false_for_others_and_not_found_for_absent_ids() {
    let app = test_app();
    let owner = app.sign_up("ann", "ann@x.com", "pw").await;
    let other = app.sign_up("bob", "bob@x.com", "pw").await;
    let category = app.category("life").await;
    let content = &app.state.content;

    let lesson = content
        .create_lesson(owner.account_id, draft(&category, "patience"))
        .await
        .unwrap();
    let lesson_id = lesson.id.to_string();
    let guard = content.guard();

    assert!(guard
        .check_ownership(owner.account_id, &lesson_id, ResourceKind::Lesson)
        .await
        .unwrap());
    assert!(!guard
        .check_ownership(other.account_id, &lesson_id, ResourceKind::Lesson)
        .await
        .unwrap());
    assert!(matches!(
        guard
            .check_ownership(owner.account_id, &Uuid::new_v4().to_string(), ResourceKind::Lesson)
            .await,
        Err(AuthError::NotFound(_))
    ));
    assert!(matches!(
        guard
            .check_ownership(owner.account_id, "not-an-id", ResourceKind::Comment)
            .await,
        Err(AuthError::NotFound(_))
    ));
}

#[tokio::test]
async fn non_owner_and_absent_lesson_are_refused_alike() {
    let app = test_app();
    let owner = app.sign_up("ann", "ann@x.com", "pw").await;
    let other = app.sign_up("bob", "bob@x.com", "pw").await;
    let category = app.category("life").await;
    let content = &app.state.content;

    let lesson = content
        .create_lesson(owner.account_id, draft(&category, "patience"))
        .await
        .unwrap();

    let by_other = content
        .update_lesson(other.account_id, &lesson.id.to_string(), draft(&category, "mine now"))
        .await;
    let absent = content
        .update_lesson(owner.account_id, &Uuid::new_v4().to_string(), draft(&category, "x"))
        .await;

    assert!(matches!(by_other, Err(ContentError::NotAuthorized(ResourceKind::Lesson))));
    assert!(matches!(absent, Err(ContentError::NotAuthorized(ResourceKind::Lesson))));
    assert_eq!(content.get_lesson(&lesson.id.to_string()).await.unwrap().title, "patience");
}

#[tokio::test]
async fn lessons_require_an_existing_category() {
    let app = test_app();
    let owner = app.sign_up("ann", "ann@x.com", "pw").await;

    let missing = app
        .state
        .content
        .create_lesson(owner.account_id, draft(&Uuid::new_v4().to_string(), "t"))
        .await;
    let malformed = app
        .state
        .content
        .create_lesson(owner.account_id, draft("general", "t"))
        .await;

    assert!(matches!(missing, Err(ContentError::UnknownCategory(_))));
    assert!(matches!(malformed, Err(ContentError::UnknownCategory(_))));
}

#[tokio::test]
async fn deleting_a_lesson_removes_its_comments() {
    let app = test_app();
    let owner = app.sign_up("ann", "ann@x.com", "pw").await;
    let commenter = app.sign_up("bob", "bob@x.com", "pw").await;
    let category = app.category("life").await;
    let content = &app.state.content;

    let lesson = content
        .create_lesson(owner.account_id, draft(&category, "patience"))
        .await
        .unwrap();
    let lesson_id = lesson.id.to_string();
    let c1 = content
        .create_comment(commenter.account_id, &lesson_id, "so true".to_string())
        .await
        .unwrap();
    let c2 = content
        .create_comment(owner.account_id, &lesson_id, "thanks".to_string())
        .await
        .unwrap();
    assert_eq!(app.store.get_lesson(lesson.id).await.unwrap().comments, vec![c1.id, c2.id]);

    let report = content.delete_lesson(owner.account_id, &lesson_id).await.unwrap();
    assert_eq!(report.len(), 2);
    assert!(!report.is_partial_failure());

    assert!(matches!(app.store.get_lesson(lesson.id).await, Err(PortError::NotFound(_))));
    assert!(matches!(app.store.get_comment(c1.id).await, Err(PortError::NotFound(_))));
    assert!(matches!(app.store.get_comment(c2.id).await, Err(PortError::NotFound(_))));
}

#[tokio::test]
async fn comments_track_their_lesson() {
    let app = test_app();
    let owner = app.sign_up("ann", "ann@x.com", "pw").await;
    let other = app.sign_up("bob", "bob@x.com", "pw").await;
    let category = app.category("life").await;
    let content = &app.state.content;

    let lesson = content
        .create_lesson(owner.account_id, draft(&category, "patience"))
        .await
        .unwrap();
    let comment = content
        .create_comment(other.account_id, &lesson.id.to_string(), "hm".to_string())
        .await
        .unwrap();
    let comment_id = comment.id.to_string();

    // Only the comment's author may edit or delete it, not the lesson owner.
    assert!(matches!(
        content.update_comment(owner.account_id, &comment_id, "edited").await,
        Err(ContentError::NotAuthorized(ResourceKind::Comment))
    ));
    content
        .update_comment(other.account_id, &comment_id, "edited")
        .await
        .unwrap();
    assert_eq!(app.store.get_comment(comment.id).await.unwrap().text, "edited");

    content.delete_comment(other.account_id, &comment_id).await.unwrap();
    assert!(app.store.get_lesson(lesson.id).await.unwrap().comments.is_empty());
    assert!(matches!(app.store.get_comment(comment.id).await, Err(PortError::NotFound(_))));
}

#[tokio::test]
async fn commenting_on_a_missing_lesson_creates_nothing() {
    let app = test_app();
    let user = app.sign_up("ann", "ann@x.com", "pw").await;

    let result = app
        .state
        .content
        .create_comment(user.account_id, &Uuid::new_v4().to_string(), "hello".to_string())
        .await;

    assert!(matches!(result, Err(ContentError::NotFound(_))));
    assert!(app.store.list_comments_by_owner(user.account_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn likes_are_a_set_and_batches_report_each_item() {
    let app = test_app();
    let owner = app.sign_up("ann", "ann@x.com", "pw").await;
    let fan = app.sign_up("bob", "bob@x.com", "pw").await;
    let category = app.category("life").await;
    let content = &app.state.content;

    let a = content.create_lesson(owner.account_id, draft(&category, "a")).await.unwrap();
    let b = content.create_lesson(owner.account_id, draft(&category, "b")).await.unwrap();
    let ids = vec![a.id.to_string(), b.id.to_string(), a.id.to_string(), "bogus".to_string()];

    let report = content.like_lessons(fan.account_id, ids).await;
    assert_eq!(report.len(), 4);
    assert!(report.is_partial_failure());
    let failed: Vec<&String> = report.failed().map(|(id, _)| id).collect();
    assert_eq!(failed, vec!["bogus"]);
    assert_eq!(app.store.get_lesson(a.id).await.unwrap().likes, vec![fan.account_id]);
    assert_eq!(app.store.get_lesson(b.id).await.unwrap().likes, vec![fan.account_id]);

    let report = content
        .dislike_lessons(fan.account_id, vec![a.id.to_string()])
        .await;
    assert!(!report.is_partial_failure());
    assert!(app.store.get_lesson(a.id).await.unwrap().likes.is_empty());
    assert_eq!(app.store.get_lesson(b.id).await.unwrap().likes, vec![fan.account_id]);
}

#[tokio::test]
async fn batch_comment_delete_reports_partial_failure() {
    let app = test_app();
    let owner = app.sign_up("ann", "ann@x.com", "pw").await;
    let category = app.category("life").await;
    let content = &app.state.content;

    let lesson = content
        .create_lesson(owner.account_id, draft(&category, "a"))
        .await
        .unwrap();
    let comment = content
        .create_comment(owner.account_id, &lesson.id.to_string(), "x".to_string())
        .await
        .unwrap();
    let missing = Uuid::new_v4().to_string();

    let report = content
        .delete_comments(vec![comment.id.to_string(), missing.clone()])
        .await;

    let succeeded: Vec<&String> = report.succeeded().collect();
    let failed: Vec<&String> = report.failed().map(|(id, _)| id).collect();
    assert_eq!(succeeded, vec![&comment.id.to_string()]);
    assert_eq!(failed, vec![&missing]);
    assert!(app.store.get_lesson(lesson.id).await.unwrap().comments.is_empty());
}

#[tokio::test]
async fn get_comments_skips_unknown_and_malformed_ids() {
    let app = test_app();
    let owner = app.sign_up("ann", "ann@x.com", "pw").await;
    let category = app.category("life").await;
    let content = &app.state.content;

    let lesson = content
        .create_lesson(owner.account_id, draft(&category, "a"))
        .await
        .unwrap();
    let lesson_id = lesson.id.to_string();
    let first = content
        .create_comment(owner.account_id, &lesson_id, "1".to_string())
        .await
        .unwrap();
    let second = content
        .create_comment(owner.account_id, &lesson_id, "2".to_string())
        .await
        .unwrap();

    let comments = content
        .get_comments(vec![
            second.id.to_string(),
            "nope".to_string(),
            Uuid::new_v4().to_string(),
            first.id.to_string(),
        ])
        .await;

    let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["2", "1"]);
}

#[tokio::test]
async fn owned_content_goes_with_the_owner() {
    let app = test_app();
    let ann = app.sign_up("ann", "ann@x.com", "pw").await;
    let bob = app.sign_up("bob", "bob@x.com", "pw").await;
    let category = app.category("life").await;
    let content = &app.state.content;

    let ann_lesson = content.create_lesson(ann.account_id, draft(&category, "a")).await.unwrap();
    let bob_lesson = content.create_lesson(bob.account_id, draft(&category, "b")).await.unwrap();
    let kept = content
        .create_comment(bob.account_id, &bob_lesson.id.to_string(), "mine".to_string())
        .await
        .unwrap();
    let ann_on_bob = content
        .create_comment(ann.account_id, &bob_lesson.id.to_string(), "nice".to_string())
        .await
        .unwrap();
    let bob_on_ann = content
        .create_comment(bob.account_id, &ann_lesson.id.to_string(), "cool".to_string())
        .await
        .unwrap();

    let removed = content.delete_owned_content(ann.account_id).await.unwrap();
    assert_eq!(removed.lessons, 1);
    assert_eq!(removed.comments_removed(), 2);
    assert!(!removed.lesson_comments.is_partial_failure());
    assert!(!removed.own_comments.is_partial_failure());

    let remaining = content.list_lessons().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, bob_lesson.id);
    assert_eq!(remaining[0].comments, vec![kept.id]);

    // Comments under the removed lesson go with it, whoever wrote them.
    assert!(matches!(app.store.get_comment(bob_on_ann.id).await, Err(PortError::NotFound(_))));
    assert!(matches!(app.store.get_comment(ann_on_bob.id).await, Err(PortError::NotFound(_))));
    assert!(app.store.get_comment(kept.id).await.is_ok());
}

#[tokio::test]
async fn own_comment_under_own_lesson_is_removed_once() {
    let app = test_app();
    let ann = app.sign_up("ann", "ann@x.com", "pw").await;
    let category = app.category("life").await;
    let content = &app.state.content;

    let lesson = content.create_lesson(ann.account_id, draft(&category, "a")).await.unwrap();
    let comment = content
        .create_comment(ann.account_id, &lesson.id.to_string(), "note to self".to_string())
        .await
        .unwrap();

    let removed = content.delete_owned_content(ann.account_id).await.unwrap();
    assert_eq!(removed.lesson_comments.succeeded().collect::<Vec<_>>(), vec![&comment.id]);
    assert!(removed.own_comments.is_empty());
    assert!(matches!(app.store.get_comment(comment.id).await, Err(PortError::NotFound(_))));
}

#[tokio::test]
async fn authors_usernames_follow_their_content() {
    let app = test_app();
    let ann = app.sign_up("ann", "ann@x.com", "pw").await;
    let bob = app.sign_up("bob", "bob@x.com", "pw").await;
    let category = app.category("life").await;
    let content = &app.state.content;

    let lesson = content.create_lesson(ann.account_id, draft(&category, "a")).await.unwrap();
    let lesson_id = lesson.id.to_string();
    assert_eq!(lesson.username, "ann");

    let comment = content
        .create_comment(bob.account_id, &lesson_id, "hi".to_string())
        .await
        .unwrap();
    assert_eq!(comment.username, "bob");

    app.state
        .authenticator
        .update_profile(
            ann.account_id,
            ProfileUpdate {
                username: "annie".to_string(),
                photo: None,
                new_password: None,
            },
        )
        .await
        .unwrap();
    app.state
        .authenticator
        .update_profile(
            bob.account_id,
            ProfileUpdate {
                username: "robert".to_string(),
                photo: None,
                new_password: None,
            },
        )
        .await
        .unwrap();

    // Stored names change only when the content is written again.
    assert_eq!(content.get_lesson(&lesson_id).await.unwrap().username, "ann");

    content
        .update_lesson(ann.account_id, &lesson_id, draft(&category, "a, revised"))
        .await
        .unwrap();
    content
        .update_comment(bob.account_id, &comment.id.to_string(), "hello")
        .await
        .unwrap();

    assert_eq!(content.get_lesson(&lesson_id).await.unwrap().username, "annie");
    let comments = content.get_comments(vec![comment.id.to_string()]).await;
    assert_eq!(comments[0].username, "robert");
    assert_eq!(comments[0].text, "hello");
}

#[tokio::test]
async fn category_reads_distinguish_bad_ids_from_missing_ones() {
    let app = test_app();
    let content = &app.state.content;
    let id = app.category("life").await;

    assert_eq!(content.get_category(&id).await.unwrap().title, "life");
    assert!(matches!(content.get_category("x").await, Err(ContentError::InvalidId(_))));
    assert!(matches!(
        content.get_category(&Uuid::new_v4().to_string()).await,
        Err(ContentError::NotFound(_))
    ));

    content
        .update_category(&id, "living".to_string(), "renamed".to_string())
        .await
        .unwrap();
    assert_eq!(content.list_categories().await.unwrap()[0].title, "living");

    content.delete_category(&id).await.unwrap();
    assert!(matches!(content.delete_category(&id).await, Err(ContentError::NotFound(_))));
}
