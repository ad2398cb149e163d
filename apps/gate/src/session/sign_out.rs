use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tracing::{info, warn};

use crate::credential::BearerToken;
use crate::session::api::SessionApi;
use crate::session::verify::{AdminSession, Navigator};

/// Clears the server session, then local state, then lands on the bare sign-in origin.
pub struct SignOutCoordinator<N: Navigator> {
    api: Arc<dyn SessionApi>,
    navigator: N,
    auth_origin: Url,
    grace: Duration,
}

impl<N: Navigator> SignOutCoordinator<N> {
    pub fn new(api: Arc<dyn SessionApi>, navigator: N, auth_origin: Url, grace: Duration) -> Self {
        Self {
            api,
            navigator,
            auth_origin,
            grace,
        }
    }

    /// Best effort: a failed logout call is logged and the rest still runs.
    pub async fn sign_out(&self, token: Option<&BearerToken>, session: &mut AdminSession) {
        if let Err(e) = self.api.logout(token).await {
            warn!("Logout call failed, continuing sign-out: {e}");
        }

        // Let the cookie-clearing response land before navigating.
        tokio::time::sleep(self.grace).await;

        session.clear();
        info!("Signed out");
        self.navigator.navigate(self.auth_origin.as_str());
    }
}
