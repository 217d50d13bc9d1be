//! Core business logic for the authentication system.
//!
//! This service handles user creation, password hashing, session token
//! issuance and validation, and the session cookie headers. It orchestrates
//! interactions between the auth handlers, the request extractors, and the
//! database queries.

use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use walletfolio_adapters::{AdapterError, DocumentStore};

use super::errors::AuthError;
use super::models::{Claims, Credentials, Identity, Role, User};
use crate::config::{AppConfig, PasswordCost};
use crate::database::{queries, USERS};
use crate::errors::AppError;

pub const COOKIE_NAME: &str = "payload-token";

/// Every path the session cookie may have been set under.
pub const COOKIE_PATHS: [&str; 3] = ["/", "/admin", "/api"];

const EPOCH_HTTP_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// A freshly issued session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies session tokens (HS256).
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    max_age: Duration,
}

impl TokenService {
    pub fn new(secret: &str, max_age: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            max_age,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn issue(&self, user: &User) -> Result<IssuedToken, AuthError> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let lifetime = self.max_age.as_secs();
        let out_of_range = || AuthError::LifetimeOutOfRange(lifetime);
        let iat = now.timestamp();
        let exp = i64::try_from(lifetime)
            .ok()
            .and_then(|secs| iat.checked_add(secs))
            .ok_or_else(out_of_range)?;
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            collection: USERS.to_string(),
            iat,
            exp,
        };
        let expires_at = Utc.timestamp_opt(exp, 0).single().ok_or_else(out_of_range)?;
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Checks the signature, then expiry against `now`. A token is expired
    /// from the second its `exp` is reached.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Unauthenticated);
        }
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .claims;

        if now.timestamp() >= claims.exp {
            return Err(AuthError::InvalidToken("token expired".into()));
        }
        if claims.collection != USERS {
            return Err(AuthError::InvalidToken("token is not a user session".into()));
        }
        Ok(claims)
    }
}

/// Argon2id password hashing.
#[derive(Debug, Clone)]
pub struct Passwords {
    params: Params,
}

impl Passwords {
    pub fn new(cost: PasswordCost) -> Result<Self, AuthError> {
        let params = Params::new(cost.memory_kib, cost.iterations, 1, None)
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswordHash(e.to_string()))
    }

    /// Parameters are read from the stored hash, so hashes made under an
    /// older cost still verify.
    pub fn verify(&self, password: &str, stored: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(stored).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        Ok(self
            .argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// `Set-Cookie` value carrying a session token.
pub fn session_cookie(issued: &IssuedToken, max_age: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{COOKIE_NAME}={}; Path=/; Max-Age={}; Expires={}; HttpOnly; SameSite=Lax",
        issued.token,
        max_age.as_secs(),
        issued.expires_at.format("%a, %d %b %Y %H:%M:%S GMT"),
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` values clearing the session cookie under every path.
pub fn clearing_cookies(secure: bool) -> Vec<String> {
    COOKIE_PATHS
        .iter()
        .map(|path| {
            let mut cookie = format!(
                "{COOKIE_NAME}=; Path={path}; Max-Age=0; Expires={EPOCH_HTTP_DATE}; HttpOnly; SameSite=Lax"
            );
            if secure {
                cookie.push_str("; Secure");
            }
            cookie
        })
        .collect()
}

/// Registration, login and token resolution against the user store.
#[derive(Clone)]
pub struct AuthService {
    tokens: TokenService,
    passwords: Passwords,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Result<Self, AuthError> {
        Ok(Self {
            tokens: TokenService::new(&config.secret, config.session_max_age),
            passwords: Passwords::new(config.password_cost)?,
        })
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Creates a `user`-role account and signs it in.
    pub async fn register(
        &self,
        store: &dyn DocumentStore,
        credentials: Credentials,
    ) -> Result<(User, IssuedToken), AppError> {
        let (email, password) = credentials
            .into_parts()
            .ok_or(AuthError::MissingCredentials)?;
        let user = self.create_user(store, &email, &password, Role::User).await?;
        let issued = self.tokens.issue(&user)?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok((user, issued))
    }

    pub async fn create_user(
        &self,
        store: &dyn DocumentStore,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let hash = self.passwords.hash(password)?;
        queries::insert_user(store, email, &hash, role)
            .await
            .map_err(|err| match err {
                AdapterError::Duplicate { ref field, .. } if field == "email" => {
                    AppError::from(AuthError::EmailTaken)
                }
                other => AppError::from(other),
            })
    }

    pub async fn login(
        &self,
        store: &dyn DocumentStore,
        credentials: Credentials,
    ) -> Result<(User, IssuedToken), AppError> {
        let (email, password) = credentials
            .into_parts()
            .ok_or(AuthError::MissingCredentials)?;
        let stored = queries::find_user_by_email(store, &email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !self.passwords.verify(&password, &stored.hash)? {
            tracing::debug!(user_id = %stored.id, "password mismatch");
            return Err(AuthError::InvalidCredentials.into());
        }
        let user = User::from(stored);
        let issued = self.tokens.issue(&user)?;
        tracing::info!(user_id = %user.id, "login successful");
        Ok((user, issued))
    }

    /// Verifies `token` and loads the user it names.
    ///
    /// The user is read on every call so role changes and deletions take
    /// effect on the next request.
    pub async fn resolve(&self, store: &dyn DocumentStore, token: &str) -> Result<(User, Claims), AppError> {
        let claims = self.tokens.verify(token)?;
        let user = queries::find_user_by_id(store, &claims.sub)
            .await?
            .ok_or_else(|| AuthError::InvalidToken("user no longer exists".into()))?;
        Ok((user, claims))
    }

    /// Identity of the holder of `token`.
    pub async fn identify(&self, store: &dyn DocumentStore, token: &str) -> Result<Identity, AppError> {
        let (user, _) = self.resolve(store, token).await?;
        Ok(Identity::from(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            role: Role::User,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn tokens() -> TokenService {
        TokenService::new("test-secret", Duration::from_secs(7200))
    }

    #[test]
    fn test_token_round_trip_carries_identity() {
        let svc = tokens();
        let now = Utc::now();
        let issued = svc.issue_at(&user("u1"), now).unwrap();
        let claims = svc.verify_at(&issued.token, now).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.exp - claims.iat, 7200);
        assert_eq!(issued.expires_at.timestamp(), claims.exp);
    }

    #[test]
    fn test_token_expiry_boundary() {
        let svc = tokens();
        let t = Utc::now();
        let issued = svc.issue_at(&user("u1"), t).unwrap();

        assert!(svc
            .verify_at(&issued.token, t + ChronoDuration::seconds(7199))
            .is_ok());
        assert!(matches!(
            svc.verify_at(&issued.token, t + ChronoDuration::seconds(7201)),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_unrepresentable_lifetime_is_refused() {
        let svc = TokenService::new("test-secret", Duration::from_secs(u64::MAX));
        assert!(matches!(
            svc.issue(&user("u1")),
            Err(AuthError::LifetimeOutOfRange(u64::MAX))
        ));

        let svc = TokenService::new("test-secret", Duration::from_secs(i64::MAX as u64));
        assert!(matches!(svc.issue(&user("u1")), Err(AuthError::LifetimeOutOfRange(_))));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_invalid() {
        let issued = TokenService::new("other", Duration::from_secs(60))
            .issue(&user("u1"))
            .unwrap();
        assert!(matches!(tokens().verify(&issued.token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_malformed_and_empty_tokens() {
        let svc = tokens();
        assert!(matches!(svc.verify("not.a.token"), Err(AuthError::InvalidToken(_))));
        assert!(matches!(svc.verify(""), Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn test_password_hash_and_verify() {
        let passwords = Passwords::new(PasswordCost {
            memory_kib: 1024,
            iterations: 1,
        })
        .unwrap();
        let hash = passwords.hash("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(passwords.verify("correct horse", &hash).unwrap());
        assert!(!passwords.verify("battery staple", &hash).unwrap());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let issued = IssuedToken {
            token: "abc".into(),
            expires_at: Utc.timestamp_opt(0, 0).unwrap(),
        };
        let cookie = session_cookie(&issued, Duration::from_secs(7200), false);
        assert_eq!(
            cookie,
            "payload-token=abc; Path=/; Max-Age=7200; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite=Lax"
        );
        assert!(session_cookie(&issued, Duration::from_secs(1), true).ends_with("; Secure"));
    }

    #[test]
    fn test_clearing_cookies_cover_every_path() {
        let cookies = clearing_cookies(false);
        assert_eq!(cookies.len(), 3);
        for (cookie, path) in cookies.iter().zip(COOKIE_PATHS) {
            assert!(cookie.starts_with("payload-token=; "));
            assert!(cookie.contains(&format!("Path={path};")));
            assert!(cookie.contains("Max-Age=0"));
        }
    }
}
