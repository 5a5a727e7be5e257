use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::steps::PasskeySession;
use crate::workflows::TransitionRecord;

/// All states of the authentication workflow. The `authenticated.passkey` and
/// `authenticated.wallet` sub-states of the source design are distinct
/// variants here; `ClaimingEns` is a passkey-authenticated sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthState {
    Initializing,
    Unauthenticated,
    Registering,
    Authenticating,
    WalletConnecting,
    AuthenticatedPasskey,
    AuthenticatedWallet,
    ClaimingEns,
    Error,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(
            self,
            Self::AuthenticatedPasskey | Self::AuthenticatedWallet | Self::ClaimingEns
        )
    }

    /// The async step invoked while in this state, if any. `WalletConnecting`
    /// invokes nothing: it waits on external wallet events.
    pub fn invoked_step(&self) -> Option<AuthStep> {
        match self {
            Self::Initializing => Some(AuthStep::RestoreSession),
            Self::Registering => Some(AuthStep::RegisterPasskey),
            Self::Authenticating => Some(AuthStep::AuthenticatePasskey),
            Self::ClaimingEns => Some(AuthStep::ClaimEns),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthStep {
    RestoreSession,
    RegisterPasskey,
    AuthenticatePasskey,
    ClaimEns,
}

/// Which passkey method a retry should re-invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginMethod {
    PasskeyNew,
    PasskeyExisting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuthEvent {
    SessionRestored { session: Option<PasskeySession> },
    LoginPasskeyNew { user_name: String },
    LoginPasskeyExisting { user_name: String },
    LoginWallet,
    WalletConnected { address: String },
    WalletDisconnected,
    ModalClosed,
    SignOut,
    ClaimEns { name: String },
    PasskeyResolved { session: PasskeySession },
    EnsClaimed,
    StepFailed { message: String },
    Retry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_name: Option<String>,
    pub credential_id: Option<String>,
    pub smart_account_address: Option<String>,
    pub wallet_address: Option<String>,
    pub pending_ens_name: Option<String>,
    pub last_login_method: Option<LoginMethod>,
    pub error: Option<String>,
    pub retry_count: u8,
}

impl AuthContext {
    fn apply_session(&mut self, session: &PasskeySession) {
        self.credential_id = Some(session.credential_id.clone());
        self.smart_account_address = Some(session.smart_account_address.clone());
        self.user_name = Some(session.user_name.clone());
    }

    fn clear_session(&mut self) {
        self.user_name = None;
        self.credential_id = None;
        self.smart_account_address = None;
        self.wallet_address = None;
        self.pending_ens_name = None;
        self.error = None;
        self.retry_count = 0;
    }
}

/// Authentication state machine. Starts in `Initializing`, where the
/// coordinator runs the one-shot session restore.
#[derive(Debug)]
pub struct AuthWorkflowMachine {
    state: AuthState,
    context: AuthContext,
    max_retry_attempts: u8,
    state_history: Vec<TransitionRecord<AuthState, AuthEvent>>,
}

impl AuthWorkflowMachine {
    pub fn new(max_retry_attempts: u8) -> Self {
        Self {
            state: AuthState::Initializing,
            context: AuthContext::default(),
            max_retry_attempts,
            state_history: Vec::new(),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn context(&self) -> &AuthContext {
        &self.context
    }

    pub fn state_history(&self) -> &[TransitionRecord<AuthState, AuthEvent>] {
        &self.state_history
    }

    fn record_transition(&mut self, from: AuthState, to: AuthState, event: AuthEvent) {
        info!(
            from_state = ?from,
            to_state = ?to,
            event = ?event,
            "Auth workflow state transition"
        );
        self.state_history
            .push(TransitionRecord::new(from, to, event));
        self.state = to;
    }

    pub fn handle_event(&mut self, event: AuthEvent) {
        let from = self.state;

        match (from, &event) {
            (AuthState::Initializing, AuthEvent::SessionRestored { session }) => match session {
                Some(session) => {
                    self.context.apply_session(session);
                    self.record_transition(from, AuthState::AuthenticatedPasskey, event);
                }
                None => {
                    self.record_transition(from, AuthState::Unauthenticated, event);
                }
            },

            (
                AuthState::Unauthenticated | AuthState::Error,
                AuthEvent::LoginPasskeyNew { user_name },
            ) => {
                // Stored immediately, before the registration step resolves
                self.context.user_name = Some(user_name.clone());
                self.context.last_login_method = Some(LoginMethod::PasskeyNew);
                self.context.error = None;
                self.record_transition(from, AuthState::Registering, event);
            }

            (
                AuthState::Unauthenticated | AuthState::Error,
                AuthEvent::LoginPasskeyExisting { user_name },
            ) => {
                self.context.user_name = Some(user_name.clone());
                self.context.last_login_method = Some(LoginMethod::PasskeyExisting);
                self.context.error = None;
                self.record_transition(from, AuthState::Authenticating, event);
            }

            (AuthState::Unauthenticated | AuthState::Error, AuthEvent::LoginWallet) => {
                self.context.error = None;
                self.record_transition(from, AuthState::WalletConnecting, event);
            }

            (
                AuthState::Registering | AuthState::Authenticating,
                AuthEvent::PasskeyResolved { session },
            ) => {
                self.context.apply_session(session);
                self.record_transition(from, AuthState::AuthenticatedPasskey, event);
            }

            (
                AuthState::Registering | AuthState::Authenticating,
                AuthEvent::StepFailed { message },
            ) => {
                warn!(state = ?from, error = %message, "Passkey login step failed");
                self.context.error = Some(message.clone());
                self.context.retry_count += 1;
                self.record_transition(from, AuthState::Error, event);
            }

            (
                AuthState::WalletConnecting | AuthState::Unauthenticated,
                AuthEvent::WalletConnected { address },
            ) => {
                self.context.wallet_address = Some(address.clone());
                self.record_transition(from, AuthState::AuthenticatedWallet, event);
            }

            (AuthState::WalletConnecting, AuthEvent::ModalClosed) => {
                self.record_transition(from, AuthState::Unauthenticated, event);
            }

            (AuthState::AuthenticatedWallet, AuthEvent::WalletDisconnected) => {
                self.context.wallet_address = None;
                self.record_transition(from, AuthState::Unauthenticated, event);
            }

            (state, AuthEvent::SignOut) if state.is_authenticated() => {
                self.context.clear_session();
                self.record_transition(from, AuthState::Unauthenticated, event);
            }

            (AuthState::AuthenticatedPasskey, AuthEvent::ClaimEns { name }) => {
                self.context.pending_ens_name = Some(name.clone());
                self.record_transition(from, AuthState::ClaimingEns, event);
            }

            (AuthState::ClaimingEns, AuthEvent::EnsClaimed) => {
                self.context.pending_ens_name = None;
                self.record_transition(from, AuthState::AuthenticatedPasskey, event);
            }

            // A failed ENS claim stores the message but does not deauthenticate
            // and does not consume a login retry
            (AuthState::ClaimingEns, AuthEvent::StepFailed { message }) => {
                warn!(error = %message, "ENS claim failed");
                self.context.error = Some(message.clone());
                self.context.pending_ens_name = None;
                self.record_transition(from, AuthState::AuthenticatedPasskey, event);
            }

            (AuthState::Error, AuthEvent::Retry) => {
                if self.context.retry_count > self.max_retry_attempts {
                    warn!(
                        retry_count = %self.context.retry_count,
                        "Login retries exhausted, returning to sign-in selection"
                    );
                    self.context.error = None;
                    self.context.retry_count = 0;
                    self.record_transition(from, AuthState::Unauthenticated, event);
                    return;
                }
                self.context.error = None;
                let target = match self.context.last_login_method {
                    Some(LoginMethod::PasskeyNew) => AuthState::Registering,
                    Some(LoginMethod::PasskeyExisting) => AuthState::Authenticating,
                    None => AuthState::Unauthenticated,
                };
                self.record_transition(from, target, event);
            }

            _ => {
                debug!(state = ?from, event = ?event, "Ignoring event in current auth state");
            }
        }
    }
}
