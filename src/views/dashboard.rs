//! Landing dashboard and route guarding.
//!
//! [`Console`] ties the session, the auth gate and the dashboard together and
//! decides whether a route may be entered.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::MenuService;
use crate::auth::{Access, AuthGate, DenyReason, Route, Session};
use crate::views::{LoadingFlag, Notifier, Toast};
use crate::{AdminConfig, Result};

/// Landing screen: the menu entries the backend enables.
pub struct Dashboard {
    service: MenuService,
    menu: Vec<String>,
    loading: LoadingFlag,
    notifier: Arc<dyn Notifier>,
}

impl Dashboard {
    pub fn new(service: MenuService, notifier: Arc<dyn Notifier>) -> Self {
        Self { service, menu: Vec::new(), loading: LoadingFlag::default(), notifier }
    }

    pub fn menu(&self) -> &[String] { &self.menu }
    pub fn is_loading(&self) -> bool { self.loading.is_loading() }

    pub async fn load(&mut self) -> bool {
        let _loading = self.loading.begin();
        match self.service.menu().await {
            Ok(menu) => {
                self.menu = menu;
                true
            }
            Err(error) => {
                warn!(%error, "menu load failed");
                self.notifier.notify(Toast::error("Failed to load menu"));
                false
            }
        }
    }

    pub fn has_menu(&self, item: &str) -> bool {
        self.menu.iter().any(|m| m == item)
    }
}

/// Outcome of asking to enter a route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Allowed(Route),
    /// Send the user to the identity provider. `url` is `None` when the provider is not configured.
    Login { route: Route, reason: DenyReason, url: Option<String> },
}

/// Session plus route gate for the running console.
pub struct Console {
    session: Session,
    gate: AuthGate,
}

impl Console {
    pub fn new(session: Session, gate: AuthGate) -> Self { Self { session, gate } }

    pub fn from_config(config: &AdminConfig) -> Result<Self> {
        let session = Session::from_tokens(config.access_token.clone(), config.id_token.as_deref())?;
        Ok(Self::new(session, AuthGate::new(config.auth.clone())))
    }

    pub fn session(&self) -> &Session { &self.session }
    pub fn gate(&self) -> &AuthGate { &self.gate }

    pub fn navigate(&self, route: Route) -> Navigation {
        match self.gate.can_activate(&self.session, route) {
            Access::Granted => {
                info!(%route, user = self.session.display_name().as_deref().unwrap_or("-"), "route granted");
                Navigation::Allowed(route)
            }
            Access::Denied(reason) => {
                let url = match self.gate.login_url(route) {
                    Ok(url) => Some(url),
                    Err(error) => {
                        warn!(%error, "cannot build login url");
                        None
                    }
                };
                Navigation::Login { route, reason, url }
            }
        }
    }

    pub fn logout_url(&self) -> Result<String> { self.gate.logout_url() }
}
