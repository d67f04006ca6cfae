use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of the authenticated owner, handed explicitly to every consultation
/// operation instead of being looked up from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerContext {
    pub user_id: Uuid,
}

impl OwnerContext {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}
