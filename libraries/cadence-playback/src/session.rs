//! Application session
//!
//! Owns the one [`PlaybackController`] for the lifetime of the app together
//! with the signed-in user. The identity provider is external; this only
//! records its outcome and tears playback down on sign-out.

use crate::adapter::MediaAdapter;
use crate::controller::PlaybackController;
use crate::types::PlayerConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Role attached to a user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Listener,
    Artist,
    Admin,
}

/// Signed-in user as returned by the identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    #[default]
    SignedOut,
    SignedIn(UserProfile),
}

/// Session root: auth state plus the player
pub struct Session<A: MediaAdapter> {
    auth: AuthState,
    player: PlaybackController<A>,
}

impl<A: MediaAdapter> Session<A> {
    pub fn new(adapter: A, config: PlayerConfig) -> Self {
        Self {
            auth: AuthState::SignedOut,
            player: PlaybackController::new(adapter, config),
        }
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match &self.auth {
            AuthState::SignedIn(profile) => Some(profile),
            AuthState::SignedOut => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.user().is_some()
    }

    /// Whether the admin area is reachable
    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(|user| user.role == UserRole::Admin)
    }

    /// Record a successful sign-in
    ///
    /// Switching directly to another account resets playback first.
    pub fn sign_in(&mut self, profile: UserProfile) {
        if self.user().is_some_and(|user| user.id != profile.id) {
            self.player.reset();
        }
        info!(user = %profile.id, role = ?profile.role, "signed in");
        self.auth = AuthState::SignedIn(profile);
    }

    /// Sign out and return the player to an empty session
    pub fn sign_out(&mut self) {
        if let AuthState::SignedIn(profile) = std::mem::take(&mut self.auth) {
            info!(user = %profile.id, "signed out");
        }
        self.player.reset();
    }

    pub fn player(&self) -> &PlaybackController<A> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlaybackController<A> {
        &mut self.player
    }
}
