#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use account_service::dispatcher::TaskDispatcher;
use account_service::domain::account::errors::AccountError;
use account_service::domain::account::errors::MailerError;
use account_service::domain::account::models::EmailAddress;
use account_service::domain::account::models::NewUser;
use account_service::domain::account::models::Notification;
use account_service::domain::account::models::User;
use account_service::domain::account::models::UserId;
use account_service::domain::account::models::UserName;
use account_service::domain::account::ports::AccountServicePort;
use account_service::domain::account::ports::Clock;
use account_service::domain::account::ports::Mailer;
use account_service::domain::account::ports::TokenRepository;
use account_service::domain::account::ports::UserRepository;
use account_service::domain::account::service::AccountService;
use account_service::inbound::http::router::create_router;
use async_trait::async_trait;
use auth::Authenticator;
use auth::Token;
use auth::TokenHash;
use auth::TokenScope;
use chrono::DateTime;
use chrono::Duration;
use chrono::TimeZone;
use chrono::Utc;
use tokio::sync::RwLock;

pub type TestAccountService =
    AccountService<InMemoryUserRepository, InMemoryTokenRepository, RecordingMailer>;

/// Instant every test clock starts at.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
}

/// User store backed by a map, with the same uniqueness and version rules as Postgres.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<i64, User>>,
    next_id: AtomicI64,
}

impl InMemoryUserRepository {
    /// Insert a user with a fixed id, bypassing id assignment.
    pub async fn seed(&self, id: i64, email: &str, password_hash: String, activated: bool) -> User {
        let user = User {
            id: UserId(id),
            name: UserName::new(format!("user-{}", id)).unwrap(),
            email: EmailAddress::new(email.to_string()).unwrap(),
            password_hash,
            activated,
            version: 1,
            created_at: t0(),
        };
        self.users.write().await.insert(id, user.clone());
        self.next_id.fetch_max(id, Ordering::SeqCst);
        user
    }

    pub async fn get(&self, id: i64) -> Option<User> {
        self.users.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, AccountError> {
        let mut users = self.users.write().await;

        let taken = users
            .values()
            .any(|u| u.email.as_str().eq_ignore_ascii_case(user.email.as_str()));
        if taken {
            return Err(AccountError::EmailAlreadyExists);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = User {
            id: UserId(id),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            activated: user.activated,
            version: 1,
            created_at: Utc::now(),
        };
        users.insert(id, created.clone());
        Ok(created)
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, AccountError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.as_str().eq_ignore_ascii_case(email.as_str()))
            .cloned())
    }

    async fn update(&self, user: User) -> Result<User, AccountError> {
        let mut users = self.users.write().await;

        match users.get_mut(&user.id.0) {
            Some(stored) if stored.version == user.version => {
                let updated = User {
                    version: user.version + 1,
                    ..user
                };
                *stored = updated.clone();
                Ok(updated)
            }
            _ => Err(AccountError::EditConflict),
        }
    }
}

struct StoredToken {
    user_id: i64,
    expiry: DateTime<Utc>,
    scope: TokenScope,
}

/// Token store keyed by digest, joined against the user store on lookup.
pub struct InMemoryTokenRepository {
    tokens: RwLock<HashMap<TokenHash, StoredToken>>,
    users: Arc<InMemoryUserRepository>,
}

impl InMemoryTokenRepository {
    pub fn new(users: Arc<InMemoryUserRepository>) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            users,
        }
    }

    pub async fn count_for(&self, user_id: &UserId, scope: TokenScope) -> usize {
        self.tokens
            .read()
            .await
            .values()
            .filter(|t| t.user_id == user_id.0 && t.scope == scope)
            .count()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn insert(&self, token: &Token) -> Result<(), AccountError> {
        self.tokens.write().await.insert(
            token.hash,
            StoredToken {
                user_id: token.user_id,
                expiry: token.expiry,
                scope: token.scope,
            },
        );
        Ok(())
    }

    async fn find_user_for_token(
        &self,
        scope: TokenScope,
        hash: &TokenHash,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AccountError> {
        let user_id = {
            let tokens = self.tokens.read().await;
            match tokens.get(hash) {
                Some(stored) if stored.scope == scope && stored.expiry > now => stored.user_id,
                _ => return Ok(None),
            }
        };

        Ok(self.users.get(user_id).await)
    }

    async fn delete_all_for_scope(
        &self,
        scope: TokenScope,
        user_id: &UserId,
    ) -> Result<(), AccountError> {
        self.tokens
            .write()
            .await
            .retain(|_, t| !(t.scope == scope && t.user_id == user_id.0));
        Ok(())
    }
}

/// Mailer that keeps every notification it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(EmailAddress, Notification)>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<(EmailAddress, Notification)> {
        self.sent.lock().unwrap().clone()
    }

    /// Token carried by the most recent notification sent to `email`.
    pub fn last_token_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(recipient, _)| recipient.as_str().eq_ignore_ascii_case(email))
            .map(|(_, notification)| match notification {
                Notification::Welcome {
                    activation_token, ..
                } => activation_token.clone(),
                Notification::ActivationToken { activation_token } => activation_token.clone(),
                Notification::PasswordReset {
                    password_reset_token,
                } => password_reset_token.clone(),
            })
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(
        &self,
        recipient: &EmailAddress,
        notification: Notification,
    ) -> Result<(), MailerError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.clone(), notification));
        Ok(())
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap() = instant;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Service wired to in-memory adapters, without HTTP.
pub struct TestContext {
    pub users: Arc<InMemoryUserRepository>,
    pub tokens: Arc<InMemoryTokenRepository>,
    pub mailer: Arc<RecordingMailer>,
    pub clock: Arc<ManualClock>,
    pub dispatcher: TaskDispatcher,
    pub service: Arc<TestAccountService>,
}

impl TestContext {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::default());
        let tokens = Arc::new(InMemoryTokenRepository::new(Arc::clone(&users)));
        let mailer = Arc::new(RecordingMailer::default());
        let clock = Arc::new(ManualClock::new(t0()));
        let dispatcher = TaskDispatcher::new();

        let service = Arc::new(AccountService::new(
            Arc::clone(&users),
            Arc::clone(&tokens),
            Arc::clone(&mailer),
            Arc::new(Authenticator::default()),
            dispatcher.clone(),
            Arc::clone(&clock) as Arc<dyn Clock>,
        ));

        Self {
            users,
            tokens,
            mailer,
            clock,
            dispatcher,
            service,
        }
    }
}

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub ctx: TestContext,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        let ctx = TestContext::new();

        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let service: Arc<dyn AccountServicePort> = ctx.service.clone();
        let router = create_router(service, "test");

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            ctx,
            api_client: reqwest::Client::new(),
        }
    }

    /// Wait for queued notifications, then return the latest token mailed to `email`.
    pub async fn mailed_token(&self, email: &str) -> String {
        self.ctx.dispatcher.drain().await;
        self.ctx
            .mailer
            .last_token_for(email)
            .expect("No notification was sent")
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make PUT request
    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.put(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }
}
