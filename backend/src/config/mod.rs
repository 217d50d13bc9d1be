//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the record store URL and its connection knobs, the server address, the
//! session signing secret, and password hashing cost.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use walletfolio_adapters::ConnectOptions;

use crate::errors::AppError;

pub const DEFAULT_STORE_URL: &str = "memory://crypto-portfolio";
pub const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 7200;

/// Runtime environment; production turns on `Secure` cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordCost {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for PasswordCost {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
        }
    }
}

/// Credentials for an admin account created at startup if missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// HMAC secret for session tokens.
    pub secret: String,
    pub environment: Environment,
    pub session_max_age: Duration,
    pub store: ConnectOptions,
    pub password_cost: PasswordCost,
    pub admin: Option<AdminBootstrap>,
}

impl AppConfig {
    /// Config with defaults and the given signing secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            secret: secret.into(),
            environment: Environment::Development,
            session_max_age: Duration::from_secs(DEFAULT_SESSION_MAX_AGE_SECS),
            store: ConnectOptions::new(DEFAULT_STORE_URL),
            password_cost: PasswordCost::default(),
            admin: None,
        }
    }

    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("PAYLOAD_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Config("PAYLOAD_SECRET environment variable is missing".into()))?;

        let mut config = Self::new(secret);
        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = parse(&lookup, "PORT")? {
            config.port = port;
        }
        if let Some(env) = lookup("APP_ENV") {
            config.environment = Environment::parse(&env);
        }
        if let Some(secs) = parse::<i64, _>(&lookup, "SESSION_MAX_AGE_SECS")? {
            let secs = u64::try_from(secs)
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| AppError::Config(format!("SESSION_MAX_AGE_SECS must be positive, got {secs}")))?;
            config.session_max_age = Duration::from_secs(secs);
        }

        if let Some(url) = lookup("STORE_URL") {
            config.store.url = url;
        }
        let store = &mut config.store;
        if let Some(ms) = parse::<u64, _>(&lookup, "STORE_CONNECT_TIMEOUT_MS")? {
            store.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse::<u64, _>(&lookup, "STORE_SOCKET_TIMEOUT_MS")? {
            store.socket_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse::<u64, _>(&lookup, "STORE_SERVER_SELECTION_TIMEOUT_MS")? {
            store.server_selection_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse::<u64, _>(&lookup, "STORE_MAX_IDLE_TIME_MS")? {
            store.max_idle_time = Duration::from_millis(ms);
        }
        if let Some(n) = parse(&lookup, "STORE_MAX_POOL_SIZE")? {
            store.max_pool_size = n;
        }
        if let Some(n) = parse(&lookup, "STORE_MIN_POOL_SIZE")? {
            store.min_pool_size = n;
        }
        if let Some(flag) = parse(&lookup, "STORE_RETRY_WRITES")? {
            store.retry_writes = flag;
        }
        if let Some(flag) = parse(&lookup, "STORE_RETRY_READS")? {
            store.retry_reads = flag;
        }
        if store.min_pool_size > store.max_pool_size {
            return Err(AppError::Config(format!(
                "STORE_MIN_POOL_SIZE ({}) exceeds STORE_MAX_POOL_SIZE ({})",
                store.min_pool_size, store.max_pool_size
            )));
        }

        if let Some(kib) = parse(&lookup, "PASSWORD_MEMORY_KIB")? {
            config.password_cost.memory_kib = kib;
        }
        if let Some(iterations) = parse(&lookup, "PASSWORD_ITERATIONS")? {
            config.password_cost.iterations = iterations;
        }

        config.admin = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminBootstrap { email, password })
            }
            _ => None,
        };

        Ok(config)
    }

    pub fn with_store_url(mut self, url: impl Into<String>) -> Self {
        self.store.url = url.into();
        self
    }

    pub fn with_session_max_age(mut self, max_age: Duration) -> Self {
        self.session_max_age = max_age;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_password_cost(mut self, memory_kib: u32, iterations: u32) -> Self {
        self.password_cost = PasswordCost {
            memory_kib,
            iterations,
        };
        self
    }

    pub fn with_admin(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.admin = Some(AdminBootstrap {
            email: email.into(),
            password: password.into(),
        });
        self
    }

    pub fn secure_cookies(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid listen address: {e}")))
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| AppError::Config(format!("{key}: {e}")))
        })
        .transpose()
}
