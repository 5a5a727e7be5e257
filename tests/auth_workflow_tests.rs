//! Integration tests for the authentication workflow
//!
//! Covers silent session restore (including swallowed failures), passkey
//! registration and authentication, retry exhaustion, wallet connection
//! events, and the ENS claim sub-flow.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use green_goods_workflows::{
    AuthCoordinator, AuthState, AuthStepExecutor, PasskeySession, StepError, WorkflowConfig,
};

fn session() -> PasskeySession {
    PasskeySession {
        credential_id: "cred-9".to_string(),
        smart_account_address: "0xsmartaccount".to_string(),
        user_name: "ada".to_string(),
    }
}

#[derive(Clone, Copy)]
enum RestoreBehavior {
    Session,
    NoSession,
    Fails,
}

struct MockAuthExecutor {
    restore: RestoreBehavior,
    register_calls: AtomicUsize,
    authenticate_calls: AtomicUsize,
    claim_calls: AtomicUsize,
    /// Fail passkey steps this many times before succeeding
    passkey_failures: AtomicUsize,
    claim_fails: bool,
}

impl MockAuthExecutor {
    fn new(restore: RestoreBehavior) -> Self {
        Self {
            restore,
            register_calls: AtomicUsize::new(0),
            authenticate_calls: AtomicUsize::new(0),
            claim_calls: AtomicUsize::new(0),
            passkey_failures: AtomicUsize::new(0),
            claim_fails: false,
        }
    }

    fn failing_passkeys(mut self, failures: usize) -> Self {
        self.passkey_failures = AtomicUsize::new(failures);
        self
    }

    fn take_passkey_failure(&self) -> Option<StepError> {
        let remaining = self.passkey_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.passkey_failures.store(remaining - 1, Ordering::SeqCst);
            Some(StepError::message("WebAuthn ceremony aborted"))
        } else {
            None
        }
    }
}

#[async_trait::async_trait]
impl AuthStepExecutor for MockAuthExecutor {
    async fn restore_session(&self) -> Result<Option<PasskeySession>, StepError> {
        match self.restore {
            RestoreBehavior::Session => Ok(Some(session())),
            RestoreBehavior::NoSession => Ok(None),
            RestoreBehavior::Fails => Err(StepError::message("stale credential")),
        }
    }

    async fn register_passkey(&self, user_name: &str) -> Result<PasskeySession, StepError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.take_passkey_failure() {
            return Err(error);
        }
        Ok(PasskeySession {
            user_name: user_name.to_string(),
            ..session()
        })
    }

    async fn authenticate_passkey(&self, user_name: &str) -> Result<PasskeySession, StepError> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.take_passkey_failure() {
            return Err(error);
        }
        Ok(PasskeySession {
            user_name: user_name.to_string(),
            ..session()
        })
    }

    async fn claim_ens(&self, _name: &str) -> Result<(), StepError> {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);
        if self.claim_fails {
            return Err(StepError::message("name already registered"));
        }
        Ok(())
    }
}

fn coordinator(executor: MockAuthExecutor) -> (AuthCoordinator, Arc<MockAuthExecutor>) {
    let executor = Arc::new(executor);
    (
        AuthCoordinator::new(executor.clone(), WorkflowConfig::default()),
        executor,
    )
}

#[tokio::test]
async fn restored_session_authenticates_directly() {
    let (coordinator, _) = coordinator(MockAuthExecutor::new(RestoreBehavior::Session));

    coordinator.initialize().await.unwrap();

    assert_eq!(coordinator.state().await, AuthState::AuthenticatedPasskey);
    let context = coordinator.context().await;
    assert_eq!(context.credential_id.as_deref(), Some("cred-9"));
    assert_eq!(
        context.smart_account_address.as_deref(),
        Some("0xsmartaccount")
    );
    assert_eq!(context.user_name.as_deref(), Some("ada"));
}

#[tokio::test]
async fn restore_failure_is_swallowed() {
    let (coordinator, _) = coordinator(MockAuthExecutor::new(RestoreBehavior::Fails));

    coordinator.initialize().await.unwrap();

    assert_eq!(coordinator.state().await, AuthState::Unauthenticated);
    assert_eq!(coordinator.context().await.error, None);
}

#[tokio::test]
async fn passkey_registration_establishes_session() {
    let (coordinator, executor) = coordinator(MockAuthExecutor::new(RestoreBehavior::NoSession));
    coordinator.initialize().await.unwrap();

    coordinator
        .login_passkey_new("grace".to_string())
        .await
        .unwrap();

    assert_eq!(coordinator.state().await, AuthState::AuthenticatedPasskey);
    assert_eq!(
        coordinator.context().await.user_name.as_deref(),
        Some("grace")
    );
    assert_eq!(executor.register_calls.load(Ordering::SeqCst), 1);
    assert_eq!(executor.authenticate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_login_is_retryable_with_same_method() {
    let (coordinator, executor) = coordinator(
        MockAuthExecutor::new(RestoreBehavior::NoSession).failing_passkeys(1),
    );
    coordinator.initialize().await.unwrap();

    coordinator
        .login_passkey_existing("grace".to_string())
        .await
        .unwrap();

    assert_eq!(coordinator.state().await, AuthState::Error);
    let context = coordinator.context().await;
    assert_eq!(context.error.as_deref(), Some("WebAuthn ceremony aborted"));
    assert_eq!(context.retry_count, 1);

    coordinator.retry().await.unwrap();

    assert_eq!(coordinator.state().await, AuthState::AuthenticatedPasskey);
    assert_eq!(executor.authenticate_calls.load(Ordering::SeqCst), 2);
    assert_eq!(executor.register_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn exhausted_retries_route_back_to_sign_in() {
    let (coordinator, executor) = coordinator(
        MockAuthExecutor::new(RestoreBehavior::NoSession).failing_passkeys(usize::MAX),
    );
    coordinator.initialize().await.unwrap();

    coordinator
        .login_passkey_new("grace".to_string())
        .await
        .unwrap();
    for _ in 0..3 {
        coordinator.retry().await.unwrap();
        assert_eq!(coordinator.state().await, AuthState::Error);
    }
    assert_eq!(coordinator.context().await.retry_count, 4);
    assert_eq!(executor.register_calls.load(Ordering::SeqCst), 4);

    // The fourth retry is redirected instead of re-attempting
    coordinator.retry().await.unwrap();

    assert_eq!(coordinator.state().await, AuthState::Unauthenticated);
    assert_eq!(coordinator.context().await.error, None);
    assert_eq!(coordinator.context().await.retry_count, 0);
    assert_eq!(executor.register_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn error_state_allows_switching_to_wallet_login() {
    let (coordinator, _) = coordinator(
        MockAuthExecutor::new(RestoreBehavior::NoSession).failing_passkeys(1),
    );
    coordinator.initialize().await.unwrap();
    coordinator
        .login_passkey_new("grace".to_string())
        .await
        .unwrap();
    assert_eq!(coordinator.state().await, AuthState::Error);

    coordinator.login_wallet().await;
    assert_eq!(coordinator.state().await, AuthState::WalletConnecting);
    assert_eq!(coordinator.context().await.error, None);

    coordinator.wallet_connected("0xwallet".to_string()).await;
    assert_eq!(coordinator.state().await, AuthState::AuthenticatedWallet);

    coordinator.wallet_disconnected().await;
    assert_eq!(coordinator.state().await, AuthState::Unauthenticated);
    assert_eq!(coordinator.context().await.wallet_address, None);
}

#[tokio::test]
async fn closing_wallet_modal_returns_to_sign_in() {
    let (coordinator, _) = coordinator(MockAuthExecutor::new(RestoreBehavior::NoSession));
    coordinator.initialize().await.unwrap();

    coordinator.login_wallet().await;
    coordinator.modal_closed().await;

    assert_eq!(coordinator.state().await, AuthState::Unauthenticated);
}

#[tokio::test]
async fn ens_claim_failure_keeps_the_session() {
    let mut executor = MockAuthExecutor::new(RestoreBehavior::Session);
    executor.claim_fails = true;
    let (coordinator, executor) = coordinator(executor);
    coordinator.initialize().await.unwrap();

    coordinator.claim_ens("ada.greengoods.eth".to_string()).await.unwrap();

    assert_eq!(coordinator.state().await, AuthState::AuthenticatedPasskey);
    let context = coordinator.context().await;
    assert_eq!(context.error.as_deref(), Some("name already registered"));
    assert_eq!(context.credential_id.as_deref(), Some("cred-9"));
    assert_eq!(executor.claim_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sign_out_clears_the_session() {
    let (coordinator, _) = coordinator(MockAuthExecutor::new(RestoreBehavior::Session));
    coordinator.initialize().await.unwrap();

    coordinator.sign_out().await;

    assert_eq!(coordinator.state().await, AuthState::Unauthenticated);
    let context = coordinator.context().await;
    assert_eq!(context.credential_id, None);
    assert_eq!(context.user_name, None);

    let report = coordinator.status_report().await;
    assert!(!report.is_authenticated);
}
