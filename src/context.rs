//! Process-wide UI state: theme, sidebar and auth session.
//!
//! Each provider owns a `tokio::sync::watch` channel. State only changes
//! through the provider's setters; readers take a snapshot with `current()`
//! or follow changes through `subscribe()`. The bundle lives in
//! [`AppContext`], owned by the application root.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::business::format::Currency;
use crate::config::UiConfig;
use crate::db::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    /// Flip between light and dark. `System` resolves to `Dark`.
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light | Self::System => Self::Dark,
        }
    }
}

pub struct ThemeContext {
    tx: watch::Sender<Theme>,
}

impl ThemeContext {
    pub fn new(initial: Theme) -> Self {
        Self {
            tx: watch::Sender::new(initial),
        }
    }

    pub fn current(&self) -> Theme {
        *self.tx.borrow()
    }

    pub fn set(&self, theme: Theme) {
        self.tx.send_replace(theme);
    }

    pub fn toggle(&self) -> Theme {
        self.tx.send_modify(|theme| *theme = theme.toggled());
        self.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.tx.subscribe()
    }
}

/// `open` is the mobile drawer; `collapsed` is the desktop rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SidebarState {
    pub open: bool,
    pub collapsed: bool,
}

pub struct SidebarContext {
    tx: watch::Sender<SidebarState>,
}

impl SidebarContext {
    pub fn new(initial: SidebarState) -> Self {
        Self {
            tx: watch::Sender::new(initial),
        }
    }

    pub fn current(&self) -> SidebarState {
        *self.tx.borrow()
    }

    pub fn set_open(&self, open: bool) {
        self.tx.send_if_modified(|state| {
            let changed = state.open != open;
            state.open = open;
            changed
        });
    }

    pub fn set_collapsed(&self, collapsed: bool) {
        self.tx.send_if_modified(|state| {
            let changed = state.collapsed != collapsed;
            state.collapsed = collapsed;
            changed
        });
    }

    pub fn toggle_collapsed(&self) -> SidebarState {
        self.tx.send_modify(|state| state.collapsed = !state.collapsed);
        self.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<SidebarState> {
        self.tx.subscribe()
    }
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user_id: String,
    pub email: Option<String>,
    pub role: UserRole,
}

impl AuthSession {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

pub struct SessionContext {
    tx: watch::Sender<Option<AuthSession>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(None),
        }
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.tx.borrow().clone()
    }

    pub fn sign_in(&self, session: AuthSession) {
        tracing::info!(user_id = %session.user_id, role = session.role.as_str(), "session started");
        self.tx.send_replace(Some(session));
    }

    pub fn sign_out(&self) {
        if let Some(previous) = self.tx.send_replace(None) {
            tracing::info!(user_id = %previous.user_id, "session ended");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.tx.subscribe()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Every provider, owned together by the application root.
pub struct AppContext {
    pub theme: ThemeContext,
    pub sidebar: SidebarContext,
    pub session: SessionContext,
    pub currency: Currency,
}

impl AppContext {
    pub fn new(ui: &UiConfig) -> Self {
        Self {
            theme: ThemeContext::new(ui.theme),
            sidebar: SidebarContext::new(SidebarState {
                open: false,
                collapsed: ui.sidebar_collapsed,
            }),
            session: SessionContext::new(),
            currency: ui.currency,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn session(user_id: &str) -> AuthSession {
        AuthSession {
            user_id: user_id.to_string(),
            email: None,
            role: UserRole::User,
        }
    }

    #[test]
    fn theme_toggle_leaves_system_for_dark() {
        let ctx = ThemeContext::new(Theme::System);
        assert_eq!(ctx.toggle(), Theme::Dark);
        assert_eq!(ctx.toggle(), Theme::Light);
        ctx.set(Theme::System);
        assert_eq!(ctx.current(), Theme::System);
    }

    #[test]
    fn theme_parses_known_names_only() {
        assert_eq!(Theme::parse("Dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse("sepia"), None);
    }

    #[tokio::test]
    async fn subscribers_observe_theme_changes() {
        let ctx = ThemeContext::new(Theme::Light);
        let mut rx = ctx.subscribe();
        ctx.set(Theme::Dark);
        rx.changed().await.expect("sender alive");
        assert_eq!(*rx.borrow_and_update(), Theme::Dark);
    }

    #[test]
    fn sidebar_setters_touch_one_field() {
        let ctx = SidebarContext::new(SidebarState::default());
        ctx.set_open(true);
        ctx.set_collapsed(true);
        assert_eq!(
            ctx.current(),
            SidebarState {
                open: true,
                collapsed: true
            }
        );
        ctx.set_open(false);
        assert!(ctx.current().collapsed);
        assert!(!ctx.toggle_collapsed().collapsed);
    }

    #[test]
    fn unchanged_sidebar_value_does_not_notify() {
        let ctx = SidebarContext::new(SidebarState::default());
        let rx = ctx.subscribe();
        ctx.set_open(false);
        assert!(!rx.has_changed().expect("sender alive"));
    }

    #[test]
    fn session_sign_in_and_out() {
        let ctx = SessionContext::new();
        assert!(ctx.current().is_none());
        ctx.sign_in(session("u1"));
        assert_eq!(ctx.current().map(|s| s.user_id), Some("u1".to_string()));
        ctx.sign_out();
        assert!(ctx.current().is_none());
    }

    #[test]
    fn app_context_seeds_from_ui_config() {
        let ui = UiConfig {
            theme: Theme::Dark,
            sidebar_collapsed: true,
            currency: Currency::Eur,
        };
        let ctx = AppContext::new(&ui);
        assert_eq!(ctx.theme.current(), Theme::Dark);
        assert!(ctx.sidebar.current().collapsed);
        assert!(!ctx.sidebar.current().open);
        assert_eq!(ctx.currency, Currency::Eur);
        assert!(ctx.session.current().is_none());
    }
}
