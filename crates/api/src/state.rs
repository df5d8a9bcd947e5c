//! Application state
//!
//! Built once at boot and shared by every handler. Guard chains are made
//! from the same state so routes never reach for globals.

use std::sync::Arc;
use std::time::{Duration, Instant};

use wastedesk_auth::{AuthService, CredentialStore, Permission, PermissionStore, TokenService};

use crate::auth::{
    ActiveStaffGuard, BearerGuard, GuardChain, PermissionGuard, TokenSource,
};

/// Default minimum token level for bearer-guarded routes
pub const DEFAULT_MIN_LEVEL: u8 = 4;

/// Default time budget for resolving effective permissions
pub const DEFAULT_PERMISSION_TIMEOUT: Duration = Duration::from_millis(50);

/// Guard tuning
#[derive(Debug, Clone, Copy)]
pub struct GuardSettings {
    /// Minimum level for [`AppState::bearer`]
    pub min_level: u8,
    pub permission_timeout: Duration,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            min_level: DEFAULT_MIN_LEVEL,
            permission_timeout: DEFAULT_PERMISSION_TIMEOUT,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Login, password and staff lookups
    pub auth: Arc<AuthService>,
    pub settings: GuardSettings,
    /// Server start time for uptime calculation
    pub started_at: Instant,
}

impl AppState {
    pub fn new(auth: AuthService, settings: GuardSettings) -> Self {
        Self {
            auth: Arc::new(auth),
            settings,
            started_at: Instant::now(),
        }
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        self.auth.tokens()
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        self.auth.credentials()
    }

    pub fn permissions(&self) -> &Arc<dyn PermissionStore> {
        self.auth.permissions()
    }

    // Guard factories

    /// Bearer header at the configured minimum level
    pub fn bearer(&self) -> GuardChain {
        self.bearer_at_level(self.settings.min_level)
    }

    /// Bearer header at a route-specific minimum level
    pub fn bearer_at_level(&self, min_level: u8) -> GuardChain {
        GuardChain::new().then(BearerGuard::new(
            Arc::clone(self.tokens()),
            TokenSource::Header,
            min_level,
        ))
    }

    /// Valid token and an active account, at any level
    pub fn active_staff(&self) -> GuardChain {
        self.status_checked(TokenSource::Header)
    }

    /// Like [`Self::active_staff`], falling back to `?token=`
    pub fn active_staff_or_query(&self) -> GuardChain {
        self.status_checked(TokenSource::HeaderOrQuery)
    }

    /// Socket upgrade token plus an active account
    pub fn socket_staff(&self) -> GuardChain {
        self.status_checked(TokenSource::SocketProtocol)
    }

    fn status_checked(&self, source: TokenSource) -> GuardChain {
        GuardChain::new()
            .then(BearerGuard::any_level(Arc::clone(self.tokens()), source))
            .then(ActiveStaffGuard)
    }

    /// Stored permissions, every one required
    pub fn require_permissions(
        &self,
        required: impl IntoIterator<Item = Permission>,
    ) -> GuardChain {
        GuardChain::new().then(PermissionGuard::new(
            Arc::clone(self.tokens()),
            Arc::clone(self.permissions()),
            required,
            self.settings.permission_timeout,
        ))
    }
}
