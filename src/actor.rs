use uuid::Uuid;

use crate::entities::user::UserRole;
use crate::utils::jwt::Claims;

/// Authenticated caller, resolved from token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Customer(Uuid),
    Provider(Uuid),
    Admin(Uuid),
}

impl Actor {
    pub fn new(id: Uuid, role: UserRole) -> Self {
        match role {
            UserRole::Customer => Actor::Customer(id),
            UserRole::Provider => Actor::Provider(id),
            UserRole::Admin => Actor::Admin(id),
        }
    }

    pub fn id(&self) -> Uuid {
        match *self {
            Actor::Customer(id) | Actor::Provider(id) | Actor::Admin(id) => id,
        }
    }

    pub fn role(&self) -> UserRole {
        match self {
            Actor::Customer(_) => UserRole::Customer,
            Actor::Provider(_) => UserRole::Provider,
            Actor::Admin(_) => UserRole::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin(_))
    }
}

impl From<&Claims> for Actor {
    fn from(claims: &Claims) -> Self {
        Actor::new(claims.sub, claims.role)
    }
}
