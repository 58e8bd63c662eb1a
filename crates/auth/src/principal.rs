use serde::{Deserialize, Serialize};

use renthub_core::UserId;

use crate::roles::ActorRole;

/// Identity of an authenticated actor as supplied by the session layer.
///
/// The domain performs no authentication of its own: whoever constructs a
/// `Principal` vouches for it. It only carries what the negotiation engine
/// needs: who is acting, and in which role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: ActorRole,
}

impl Principal {
    pub fn new(user_id: UserId, role: ActorRole) -> Self {
        Self { user_id, role }
    }

    pub fn tenant(user_id: UserId) -> Self {
        Self::new(user_id, ActorRole::Tenant)
    }

    pub fn administrator(user_id: UserId) -> Self {
        Self::new(user_id, ActorRole::Administrator)
    }

    pub fn is_administrator(&self) -> bool {
        self.role == ActorRole::Administrator
    }
}
