use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::mask_email;
use crate::domain::{Role, User};
use crate::error::DomainError;
use crate::ports::{PasswordService, TokenService, UserRepository};

const MIN_PASSWORD_CHARS: usize = 8;
const USERNAME_CHARS: std::ops::RangeInclusive<usize> = 3..=32;

/// Registration input, still unvalidated.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A freshly issued access token and the account it belongs to.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
}

/// Registration, login and resolution of the acting account.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
        }
    }

    pub async fn register(&self, input: Registration) -> Result<AuthSession, DomainError> {
        let user = self.create_account(input, Role::User).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        self.issue(user)
    }

    /// Log in with either email or username.
    pub async fn login(
        &self,
        login: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthSession, DomainError> {
        let login = login.trim();
        let user = if login.contains('@') {
            self.users.find_by_email(&login.to_lowercase()).await?
        } else {
            self.users.find_by_username(login).await?
        };
        let user = user.ok_or(DomainError::Unauthorized)?;

        if !self.passwords.verify(password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Rejected login with wrong password");
            return Err(DomainError::Unauthorized);
        }

        if let Some(until) = user.active_block(now) {
            tracing::info!(user_id = %user.id, %until, "Blocked user attempted login");
            return Err(DomainError::Blocked { until });
        }

        self.issue(user)
    }

    /// Load the live account behind a token.
    pub async fn current_user(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<User, DomainError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::Unauthorized)?;

        match user.active_block(now) {
            Some(until) => Err(DomainError::Blocked { until }),
            None => Ok(user),
        }
    }

    /// Make sure the configured administrator exists and holds the admin role.
    ///
    /// An existing account matching the email, or else the username, is
    /// promoted instead of creating a new one.
    pub async fn ensure_admin(&self, input: Registration) -> Result<User, DomainError> {
        let email = input.email.trim().to_lowercase();
        let existing = match self.users.find_by_email(&email).await? {
            Some(user) => Some(user),
            None => self.users.find_by_username(input.username.trim()).await?,
        };
        match existing {
            Some(user) if user.is_admin() => Ok(user),
            Some(mut user) => {
                user.toggle_role(Utc::now());
                let user = self.users.update(user).await?;
                tracing::info!(user_id = %user.id, "Promoted configured account to admin");
                Ok(user)
            }
            None => {
                let user = self.create_account(input, Role::Admin).await?;
                tracing::info!(
                    user_id = %user.id,
                    email = %mask_email(&user.email),
                    "Created admin account"
                );
                Ok(user)
            }
        }
    }

    async fn create_account(&self, input: Registration, role: Role) -> Result<User, DomainError> {
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_lowercase();
        validate_registration(&username, &email, &input.password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Duplicate("Email already registered".to_string()));
        }
        if self.users.find_by_username(&username).await?.is_some() {
            return Err(DomainError::Duplicate("Username already taken".to_string()));
        }

        let password_hash = self.passwords.hash(&input.password)?;
        let mut user = User::new(username, email, password_hash);
        user.role = role;

        Ok(self.users.insert(user).await?)
    }

    fn issue(&self, user: User) -> Result<AuthSession, DomainError> {
        let token = self
            .tokens
            .generate_token(user.id, &user.username, user.token_roles())
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        Ok(AuthSession {
            token,
            expires_in: self.tokens.expiration_seconds(),
            user,
        })
    }
}

fn validate_registration(username: &str, email: &str, password: &str) -> Result<(), DomainError> {
    let mut problems = Vec::new();

    if !USERNAME_CHARS.contains(&username.chars().count())
        || !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        problems.push(format!(
            "Username must be {}-{} characters of letters, digits, '_' or '-'",
            USERNAME_CHARS.start(),
            USERNAME_CHARS.end()
        ));
    }

    let valid_email = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        });
    if !valid_email {
        problems.push("Invalid email address".to_string());
    }

    if password.chars().count() < MIN_PASSWORD_CHARS {
        problems.push(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        ));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(DomainError::Validation(problems.join("; ")))
    }
}
