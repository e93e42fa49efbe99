pub mod auth;
pub mod content;
pub mod domain;
pub mod fanout;
pub mod guard;
pub mod ports;

pub use auth::{
    bearer_token, AuthError, AuthResult, AuthenticatedAccount, Authenticator, IssuedSession,
    ProfileUpdate, SignUp,
};
pub use content::{ContentError, ContentResult, ContentService, LessonDraft, OwnedContentReport};
pub use domain::{
    Account, Category, Comment, CommentChanges, Lesson, LessonChanges, NewAccount, NewCategory,
    NewComment, NewLesson, ProfileChanges, ResourceKind, RotatedCredentials, SessionClaims,
};
pub use fanout::{fan_out, BatchReport, ItemOutcome};
pub use guard::OwnershipGuard;
pub use ports::{
    ContentStore, CredentialStore, HashingError, PasswordHashingService, PortError, PortResult,
    TokenError, TokenService,
};
