use crate::auth::{AuthResponse, Identity, LoginRequest, RegisterRequest};
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{NewUser, UserProfile};
use crate::state::AppState;
use crate::validation::validate_registration;

/// Account operations: registration, login, logout and account removal.
///
/// Coordinates the credential store, the password hasher and the token service.
pub struct AccountService<'a> {
    state: &'a AppState,
}

impl<'a> AccountService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Validates the payload, stores the account and signs its first token.
    ///
    /// A taken email is reported before any other policy check, so it fails the
    /// same way whatever the name and password look like.
    ///
    /// # Errors
    /// * `DuplicateEmail` - the email (ignoring case) is already registered
    /// * `Validation` - name, email or password breaks policy
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        let email = normalize_email(&request.email);
        if self.state.credentials.find_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }
        validate_registration(&request)?;

        let password_hash = self.state.hasher.hash_blocking(request.password).await?;
        // the store re-checks uniqueness, covering concurrent registrations
        let user = self
            .state
            .credentials
            .create_user(NewUser {
                name: request.name.trim().to_string(),
                email,
                password_hash,
            })
            .await?;
        log::info!("Registered user {}", user.id);

        let issued = self.state.tokens.issue(user.id).await?;
        Ok(AuthResponse {
            user: user.profile(),
            token: issued.token,
        })
    }

    /// Checks credentials and signs a new token, adding a session alongside any
    /// existing ones.
    ///
    /// # Errors
    /// * `InvalidCredentials` - unknown email or wrong password, indistinguishably
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let user = self
            .state
            .credentials
            .find_by_email(&normalize_email(&request.email))
            .await?;

        // An unknown email still pays for one bcrypt verification.
        let digest = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| self.state.dummy_digest.clone());
        let matches = self
            .state
            .hasher
            .verify_blocking(request.password, digest)
            .await?;

        let user = match user {
            Some(user) if matches => user,
            _ => {
                log::info!("Failed login attempt");
                return Err(AppError::InvalidCredentials);
            }
        };

        let issued = self.state.tokens.issue(user.id).await?;
        Ok(AuthResponse {
            user: user.profile(),
            token: issued.token,
        })
    }

    pub fn profile(&self, identity: &Identity) -> UserProfile {
        identity.user.profile()
    }

    /// Revokes only the token that authenticated this request.
    pub async fn logout(&self, identity: &Identity) -> Result<(), AppError> {
        self.state
            .tokens
            .revoke(identity.user_id(), identity.token_id)
            .await?;
        Ok(())
    }

    /// Revokes every token the user holds.
    pub async fn logout_all(&self, identity: &Identity) -> Result<u64, AppError> {
        self.state.tokens.revoke_all(identity.user_id()).await
    }

    /// Deletes the account, all of its tasks and all of its issuances.
    pub async fn delete_account(&self, identity: &Identity) -> Result<(), AppError> {
        let user_id = identity.user_id();
        self.state.tokens.revoke_all(user_id).await?;
        let removed_tasks = self.state.tasks.delete_all_for_owner(user_id).await?;
        if !self.state.credentials.delete_user(user_id).await? {
            return Err(AppError::Unauthorized);
        }
        log::info!("Deleted user {} and {} task(s)", user_id, removed_tasks);
        Ok(())
    }
}
