use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::auth::AuthService;
use crate::error::Result;
use crate::http::SessionEvent;
use crate::models::{AuthResponse, ProfileUpdate, RegisterRequest, User, UserRole};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
}

/// Current user and authentication flag, shared with every view.
#[derive(Clone)]
pub struct AuthContext {
    auth: AuthService,
    state: Arc<watch::Sender<AuthState>>,
}

impl AuthContext {
    /// Hydrate from the credential store. No server round-trip.
    pub fn new(auth: AuthService) -> Self {
        let initial = AuthState {
            user: auth.current_user(),
            is_authenticated: auth.is_authenticated(),
        };
        let (state, _) = watch::channel(initial);
        Self {
            auth,
            state: Arc::new(state),
        }
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn user_role(&self) -> Option<UserRole> {
        self.state.borrow().user.as_ref().map(|u| u.role.clone())
    }

    pub fn is_admin(&self) -> bool {
        self.state.borrow().user.as_ref().is_some_and(User::is_admin)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let response = self.auth.login(email, password).await?;
        self.publish(Some(response.user.clone()));
        Ok(response)
    }

    pub async fn register(&self, data: &RegisterRequest) -> Result<AuthResponse> {
        let response = self.auth.register(data).await?;
        self.publish(Some(response.user.clone()));
        Ok(response)
    }

    pub async fn logout(&self) -> Result<()> {
        self.auth.logout().await?;
        self.publish(None);
        Ok(())
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        let user = self.auth.update_profile(update).await?;
        self.publish(Some(user.clone()));
        Ok(user)
    }

    /// Re-read the stored credentials into the published state.
    pub fn reload(&self) {
        self.state.send_replace(AuthState {
            user: self.auth.current_user(),
            is_authenticated: self.auth.is_authenticated(),
        });
    }

    fn publish(&self, user: Option<User>) {
        let is_authenticated = user.is_some() && self.auth.is_authenticated();
        self.state.send_replace(AuthState { user, is_authenticated });
    }

    /// Clear the published state whenever the session ends.
    ///
    /// The task stops once every [`crate::ApiClient`] clone is dropped.
    pub fn spawn_session_listener(&self) -> JoinHandle<()> {
        let mut events = self.auth.client().subscribe();
        let state = self.state.clone();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Expired) | Ok(SessionEvent::LoggedOut) => {
                        debug!("Session ended, clearing auth state");
                        state.send_replace(AuthState::default());
                    }
                    Ok(SessionEvent::LoggedIn) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Session listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
