//! crates/life_lessons_core/src/auth.rs
//!
//! The authentication flow: sign-up, the two sign-in paths, per-request token
//! revalidation and token rotation.
//!
//! A token is only accepted while it is the account's latest issued token.
//! Every successful sign-in mints a new one and overwrites that record, which
//! retroactively invalidates all earlier tokens of the account.

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{Account, NewAccount, ProfileChanges, RotatedCredentials, SessionClaims};
use crate::ports::{
    CredentialStore, HashingError, PasswordHashingService, PortError, TokenError, TokenService,
};

//=========================================================================================
// Errors
//=========================================================================================

/// Every way authentication or authorization can refuse a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no token")]
    NoToken,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("unknown account")]
    AccountNotFound,
    #[error("stale token")]
    StaleToken,
    #[error("credential mismatch")]
    CredentialMismatch,
    #[error("not admin")]
    NotAdmin,
    #[error("{0} not found")]
    NotFound(String),
    #[error("account already exists: {0}")]
    AlreadyExists(String),
    #[error(transparent)]
    Hashing(#[from] HashingError),
    #[error("credential store failure: {0}")]
    Store(PortError),
}

impl From<PortError> for AuthError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::AlreadyExists(what) => AuthError::AlreadyExists(what),
            other => AuthError::Store(other),
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

//=========================================================================================
// Inputs and Outcomes
//=========================================================================================

#[derive(Debug, Clone)]
pub struct SignUp {
    pub username: String,
    pub email: String,
    pub password: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub username: String,
    pub photo: Option<String>,
    pub new_password: Option<String>,
}

/// A freshly minted token, already stored as the account's latest.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub account_id: Uuid,
    pub token: String,
}

/// The identity a request carries after passing the authentication flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedAccount {
    pub account_id: Uuid,
    pub is_admin: bool,
}

/// Extracts the token from an `Authorization` header value.
///
/// An absent header, an empty one and the bare `"Bearer "` prefix all count as
/// no token at all; anything else that is not `Bearer <token>` is malformed.
pub fn bearer_token(header: Option<&str>) -> AuthResult<&str> {
    let value = match header {
        None | Some("") | Some("Bearer ") => return Err(AuthError::NoToken),
        Some(value) => value,
    };

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() && !token.contains(' ') => Ok(token),
        _ => Err(AuthError::Token(TokenError::Malformed)),
    }
}

//=========================================================================================
// Authenticator
//=========================================================================================

#[derive(Clone)]
pub struct Authenticator {
    accounts: Arc<dyn CredentialStore>,
    tokens: Arc<dyn TokenService>,
    hasher: Arc<dyn PasswordHashingService>,
    admin_emails: Arc<Vec<String>>,
}

impl Authenticator {
    pub fn new(
        accounts: Arc<dyn CredentialStore>,
        tokens: Arc<dyn TokenService>,
        hasher: Arc<dyn PasswordHashingService>,
        admin_emails: Vec<String>,
    ) -> Self {
        Self {
            accounts,
            tokens,
            hasher,
            admin_emails: Arc::new(admin_emails),
        }
    }

    /// Registers a new account and returns its first token.
    ///
    /// The email check is a fast path only; two racing sign-ups are settled by
    /// the store's uniqueness constraint, which surfaces as `AlreadyExists` too.
    pub async fn sign_up(&self, request: SignUp) -> AuthResult<IssuedSession> {
        match self.accounts.find_account_by_email(&request.email).await {
            Ok(_) => return Err(AuthError::AlreadyExists(request.email)),
            Err(PortError::NotFound(_)) => {}
            Err(e) => return Err(AuthError::Store(e)),
        }

        let password_hash = self.hasher.hash(&request.password)?;
        let is_admin = self.admin_emails.iter().any(|admin| admin == &request.email);

        let account_id = Uuid::new_v4();
        let token = self
            .tokens
            .issue(account_id, &request.email, &password_hash, is_admin)?;

        let account = self
            .accounts
            .create_account(NewAccount {
                id: account_id,
                username: request.username,
                email: request.email,
                password_hash,
                photo: request.photo,
                is_admin,
                last_issued_token: token.clone(),
            })
            .await?;

        info!(account_id = %account.id, is_admin, "Account created");
        Ok(IssuedSession {
            account_id: account.id,
            token,
        })
    }

    /// Signs in with email and plaintext password.
    ///
    /// A wrong password leaves the account's latest token untouched.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> AuthResult<IssuedSession> {
        let account = self.account_by_email(email).await?;

        if !self.hasher.verify(password, &account.password_hash)? {
            warn!(account_id = %account.id, "Password sign-in rejected");
            return Err(AuthError::CredentialMismatch);
        }

        self.rotate(&account).await
    }

    /// Silent re-authentication: validates the token and replaces it with a
    /// new one, so the token just presented becomes stale.
    pub async fn sign_in_with_token(&self, token: &str) -> AuthResult<IssuedSession> {
        let (_, account) = self.validate(token).await?;
        self.rotate(&account).await
    }

    /// Runs the full per-request flow without rotating the token.
    pub async fn authenticate(&self, token: &str) -> AuthResult<AuthenticatedAccount> {
        let (claims, account) = self.validate(token).await?;
        Ok(AuthenticatedAccount {
            account_id: account.id,
            is_admin: claims.is_admin && account.is_admin,
        })
    }

    /// Like `authenticate`, but both the signed claim and the stored flag
    /// must grant admin. The claim alone may predate a demotion.
    pub async fn authenticate_admin(&self, token: &str) -> AuthResult<AuthenticatedAccount> {
        let (claims, account) = self.validate(token).await?;
        if !(claims.is_admin && account.is_admin) {
            warn!(account_id = %account.id, "Admin access refused");
            return Err(AuthError::NotAdmin);
        }
        Ok(AuthenticatedAccount {
            account_id: account.id,
            is_admin: true,
        })
    }

    /// Applies a self-service profile update.
    ///
    /// Returns the new token when the password was changed; the old one is
    /// invalid from then on because both the hash and the latest token moved.
    pub async fn update_profile(
        &self,
        account_id: Uuid,
        update: ProfileUpdate,
    ) -> AuthResult<Option<String>> {
        let account = self.account_by_id(account_id).await?;

        let rotated = match update.new_password {
            Some(password) => {
                let password_hash = self.hasher.hash(&password)?;
                let token =
                    self.tokens
                        .issue(account.id, &account.email, &password_hash, account.is_admin)?;
                Some(RotatedCredentials {
                    password_hash,
                    token,
                })
            }
            None => None,
        };
        let new_token = rotated.as_ref().map(|r| r.token.clone());

        self.accounts
            .update_profile(
                account.id,
                ProfileChanges {
                    username: update.username,
                    photo: update.photo,
                    rotated,
                },
            )
            .await?;

        debug!(account_id = %account.id, rotated = new_token.is_some(), "Profile updated");
        Ok(new_token)
    }

    pub async fn list_accounts(&self) -> AuthResult<Vec<Account>> {
        Ok(self.accounts.list_accounts().await?)
    }

    pub async fn delete_account(&self, account_id: Uuid) -> AuthResult<()> {
        self.accounts
            .delete_account(account_id)
            .await
            .map_err(not_found_as_unknown_account)?;
        info!(account_id = %account_id, "Account deleted");
        Ok(())
    }

    //=====================================================================================
    // Internals
    //=====================================================================================

    /// Signature and expiry first, then the store-backed checks in order:
    /// account exists, token is the latest one, credentials still match.
    async fn validate(&self, token: &str) -> AuthResult<(SessionClaims, Account)> {
        let claims = self.tokens.verify(token).map_err(|e| {
            warn!("Token rejected: {}", e);
            AuthError::Token(e)
        })?;

        let account = self.account_by_email(&claims.email).await?;

        if account.last_issued_token.as_deref() != Some(token) {
            warn!(account_id = %account.id, "Stale token presented");
            return Err(AuthError::StaleToken);
        }

        if account.email != claims.email || account.password_hash != claims.password_hash {
            warn!(account_id = %account.id, "Token credentials no longer match");
            return Err(AuthError::CredentialMismatch);
        }

        Ok((claims, account))
    }

    async fn rotate(&self, account: &Account) -> AuthResult<IssuedSession> {
        let token = self.tokens.issue(
            account.id,
            &account.email,
            &account.password_hash,
            account.is_admin,
        )?;
        self.accounts
            .set_last_token(account.id, &token)
            .await
            .map_err(not_found_as_unknown_account)?;

        debug!(account_id = %account.id, "Issued new session token");
        Ok(IssuedSession {
            account_id: account.id,
            token,
        })
    }

    async fn account_by_email(&self, email: &str) -> AuthResult<Account> {
        self.accounts
            .find_account_by_email(email)
            .await
            .map_err(not_found_as_unknown_account)
    }

    async fn account_by_id(&self, account_id: Uuid) -> AuthResult<Account> {
        self.accounts
            .find_account_by_id(account_id)
            .await
            .map_err(not_found_as_unknown_account)
    }
}

fn not_found_as_unknown_account(error: PortError) -> AuthError {
    match error {
        PortError::NotFound(_) => AuthError::AccountNotFound,
        other => AuthError::from(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_empty_header_means_no_token() {
        assert!(matches!(bearer_token(None), Err(AuthError::NoToken)));
        assert!(matches!(bearer_token(Some("")), Err(AuthError::NoToken)));
        assert!(matches!(bearer_token(Some("Bearer ")), Err(AuthError::NoToken)));
    }

    #[test]
    fn extracts_token_after_bearer_prefix() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn other_shapes_are_malformed() {
        for header in ["abc.def.ghi", "Basic dXNlcjpwYXNz", "Bearer a b", "Bearer  x"] {
            assert!(
                matches!(
                    bearer_token(Some(header)),
                    Err(AuthError::Token(TokenError::Malformed))
                ),
                "{header} should be malformed"
            );
        }
    }
}
