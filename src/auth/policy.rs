//! Customer visibility rules: admins see every customer, users see the
//! customers they created.

use uuid::Uuid;

use crate::database::models::{Actor, Customer};
use crate::error::ApiError;

/// The subset of customers an actor may read or modify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    OwnedBy(Uuid),
}

impl Scope {
    pub fn for_actor(actor: &Actor) -> Self {
        if actor.is_admin() {
            Scope::All
        } else {
            Scope::OwnedBy(actor.id)
        }
    }

    pub fn includes(&self, customer: &Customer) -> bool {
        match self {
            Scope::All => true,
            Scope::OwnedBy(owner) => customer.created_by == Some(*owner),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Visible,
    Forbidden,
}

pub fn access(actor: &Actor, customer: &Customer) -> Access {
    if Scope::for_actor(actor).includes(customer) {
        Access::Visible
    } else {
        Access::Forbidden
    }
}

/// `Ok` when the actor may act on the customer, 403 otherwise
pub fn authorize(actor: &Actor, customer: &Customer) -> Result<(), ApiError> {
    match access(actor, customer) {
        Access::Visible => Ok(()),
        Access::Forbidden => {
            tracing::warn!("Actor {} denied access to customer {}", actor.id, customer.id);
            Err(ApiError::forbidden("Unauthorized"))
        }
    }
}
