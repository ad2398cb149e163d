use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tracing::{debug, warn};

use crate::credential::BearerToken;
use crate::redirect::{build_redirect_url, RedirectContext};
use crate::session::api::{AdminUser, SessionApi, SessionError, VerifyAdminResponse};

/// Admin surface state. Starts verifying and settles once, to authorized or to a
/// navigation away; it never rests at "verified, not authorized".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub is_verifying: bool,
    pub is_authorized: bool,
    pub user: Option<AdminUser>,
}

impl AdminSession {
    pub fn verifying() -> Self {
        Self {
            is_verifying: true,
            is_authorized: false,
            user: None,
        }
    }

    pub fn authorized(user: AdminUser) -> Self {
        Self {
            is_verifying: false,
            is_authorized: true,
            user: Some(user),
        }
    }

    /// Drops everything known about the user.
    pub fn clear(&mut self) {
        self.is_verifying = false;
        self.is_authorized = false;
        self.user = None;
    }
}

impl Default for AdminSession {
    fn default() -> Self {
        Self::verifying()
    }
}

/// Performs a full navigation away from the current surface.
pub trait Navigator: Send + Sync {
    fn navigate(&self, location: &str);
}

/// Handle that marks an [`AdminGate`] as torn down. Results that settle afterwards are ignored.
/// The router drops the handler future instead, so only embedders holding a gate use this.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Teardown(Arc<AtomicBool>);

impl Teardown {
    pub fn unmount(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Session Verification Client for the admin surface.
///
/// Issues one `verify-admin` call per gate. Anything other than a positive answer with a
/// user (denial, transport error, bad status, malformed body, timeout) navigates once to
/// sign-in with the current URL embedded. No retries, no optimistic rendering.
pub struct AdminGate<N: Navigator> {
    api: Arc<dyn SessionApi>,
    navigator: N,
    auth_origin: Url,
    timeout: Duration,
    session: AdminSession,
    mounted: Arc<AtomicBool>,
    started: bool,
}

impl<N: Navigator> AdminGate<N> {
    pub fn new(api: Arc<dyn SessionApi>, navigator: N, auth_origin: Url, timeout: Duration) -> Self {
        Self {
            api,
            navigator,
            auth_origin,
            timeout,
            session: AdminSession::verifying(),
            mounted: Arc::new(AtomicBool::new(true)),
            started: false,
        }
    }

    pub fn session(&self) -> &AdminSession {
        &self.session
    }

    #[allow(dead_code)]
    pub fn teardown(&self) -> Teardown {
        Teardown(Arc::clone(&self.mounted))
    }

    /// Runs the verification. Returns the admin user when the protected surface may render.
    pub async fn verify(
        &mut self,
        token: Option<&BearerToken>,
        current: &RedirectContext,
    ) -> Option<&AdminUser> {
        if self.started {
            return self.authorized_user();
        }
        self.started = true;

        let outcome = match tokio::time::timeout(self.timeout, self.api.verify_admin(token)).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::Timeout),
        };

        if !self.mounted.load(Ordering::SeqCst) {
            debug!("Admin gate torn down before verification settled");
            return None;
        }

        match outcome {
            Ok(VerifyAdminResponse {
                is_admin: true,
                user: Some(user),
            }) => {
                debug!(user_id = %user.id, "Admin access verified");
                self.session = AdminSession::authorized(user);
                self.authorized_user()
            }
            Ok(_) => {
                debug!("Visitor is not an administrator");
                self.leave(current);
                None
            }
            Err(e) => {
                warn!("Admin verification failed: {e}");
                self.leave(current);
                None
            }
        }
    }

    fn authorized_user(&self) -> Option<&AdminUser> {
        self.session
            .user
            .as_ref()
            .filter(|_| self.session.is_authorized)
    }

    fn leave(&self, current: &RedirectContext) {
        let target = build_redirect_url(&self.auth_origin, current);
        self.navigator.navigate(target.as_str());
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default, Clone)]
    pub(crate) struct RecordingNavigator(pub Arc<Mutex<Vec<String>>>);

    impl RecordingNavigator {
        pub(crate) fn visits(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, location: &str) {
            self.0.lock().unwrap().push(location.to_string());
        }
    }

    pub(crate) enum Reply {
        Admin,
        NotAdmin,
        AdminWithoutUser,
        Fails,
        Hangs,
    }

    pub(crate) struct StubApi {
        pub reply: Reply,
        pub logout_fails: bool,
        pub calls: Mutex<Vec<&'static str>>,
    }

    impl StubApi {
        pub(crate) fn new(reply: Reply) -> Self {
            Self {
                reply,
                logout_fails: false,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    pub(crate) fn ada() -> AdminUser {
        AdminUser {
            id: "u1".into(),
            email: "ada@example.com".into(),
            name: "Ada".into(),
            role: "admin".into(),
        }
    }

    #[async_trait]
    impl SessionApi for StubApi {
        async fn verify_admin(
            &self,
            _token: Option<&BearerToken>,
        ) -> Result<VerifyAdminResponse, SessionError> {
            self.calls.lock().unwrap().push("verify");
            match self.reply {
                Reply::Admin => Ok(VerifyAdminResponse {
                    is_admin: true,
                    user: Some(ada()),
                }),
                Reply::NotAdmin => Ok(VerifyAdminResponse {
                    is_admin: false,
                    user: Some(ada()),
                }),
                Reply::AdminWithoutUser => Ok(VerifyAdminResponse {
                    is_admin: true,
                    user: None,
                }),
                Reply::Fails => Err(SessionError::Status { status: 502 }),
                Reply::Hangs => std::future::pending().await,
            }
        }

        async fn logout(&self, _token: Option<&BearerToken>) -> Result<(), SessionError> {
            self.calls.lock().unwrap().push("logout");
            if self.logout_fails {
                Err(SessionError::Status { status: 500 })
            } else {
                Ok(())
            }
        }
    }

    fn gate(reply: Reply) -> (AdminGate<RecordingNavigator>, RecordingNavigator, Arc<StubApi>) {
        let api = Arc::new(StubApi::new(reply));
        let navigator = RecordingNavigator::default();
        let gate = AdminGate::new(
            api.clone(),
            navigator.clone(),
            Url::parse("https://auth.example.com").unwrap(),
            Duration::from_secs(10),
        );
        (gate, navigator, api)
    }

    fn current() -> RedirectContext {
        RedirectContext::new(
            "https://admin.example.com",
            "/users",
            vec![("page".into(), "2".into())],
        )
    }

    #[tokio::test]
    async fn test_admin_renders_children() {
        let (mut gate, navigator, _) = gate(Reply::Admin);
        assert_eq!(gate.session(), &AdminSession::verifying());

        let user = gate.verify(None, &current()).await.cloned();
        assert_eq!(user, Some(ada()));
        assert_eq!(gate.session(), &AdminSession::authorized(ada()));
        assert!(navigator.visits().is_empty());
    }

    #[tokio::test]
    async fn test_not_admin_navigates_exactly_once() {
        let (mut gate, navigator, api) = gate(Reply::NotAdmin);
        let token = BearerToken::new("abc");

        assert!(gate.verify(Some(&token), &current()).await.is_none());
        assert!(gate.verify(Some(&token), &current()).await.is_none());

        let visits = navigator.visits();
        assert_eq!(visits.len(), 1);
        let target = Url::parse(&visits[0]).unwrap();
        let redirect: Vec<_> = target.query_pairs().collect();
        assert_eq!(redirect[0].0, "redirect");
        assert_eq!(redirect[0].1, "https://admin.example.com/users?page=2");

        assert_eq!(api.calls.lock().unwrap().len(), 1, "no retry");
        assert!(gate.session().is_verifying);
        assert!(!gate.session().is_authorized);
    }

    #[tokio::test]
    async fn test_transport_failure_treated_as_unauthorized() {
        let (mut gate, navigator, _) = gate(Reply::Fails);
        assert!(gate.verify(None, &current()).await.is_none());
        assert_eq!(navigator.visits().len(), 1);
    }

    #[tokio::test]
    async fn test_admin_flag_without_user_is_malformed() {
        let (mut gate, navigator, _) = gate(Reply::AdminWithoutUser);
        assert!(gate.verify(None, &current()).await.is_none());
        assert_eq!(navigator.visits().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_verification_times_out_to_sign_in() {
        let (mut gate, navigator, _) = gate(Reply::Hangs);
        assert!(gate.verify(None, &current()).await.is_none());
        assert_eq!(navigator.visits().len(), 1);
    }

    #[tokio::test]
    async fn test_teardown_suppresses_navigation() {
        let (mut gate, navigator, _) = gate(Reply::NotAdmin);
        gate.teardown().unmount();
        assert!(gate.verify(None, &current()).await.is_none());
        assert!(navigator.visits().is_empty());
        assert_eq!(gate.session(), &AdminSession::verifying());
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_during_pending_verification() {
        let (mut gate, navigator, api) = gate(Reply::Hangs);
        let teardown = gate.teardown();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            teardown.unmount();
        });

        // Settles by timeout after the unmount; nothing may navigate.
        assert!(gate.verify(None, &current()).await.is_none());
        assert!(navigator.visits().is_empty());
        assert_eq!(api.calls.lock().unwrap().len(), 1);
        assert_eq!(gate.session(), &AdminSession::verifying());
    }

    #[test]
    fn test_clear_resets_session() {
        let mut session = AdminSession::authorized(ada());
        session.clear();
        assert!(!session.is_verifying);
        assert!(!session.is_authorized);
        assert!(session.user.is_none());
    }
}
