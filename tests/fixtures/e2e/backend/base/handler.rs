/// User API handler module.
use std::collections::HashMap;

/// A simple user struct.
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// Fetch a user by ID.
pub fn get_user(id: u64) -> Option<User> {
    // Placeholder
    Some(User {
        id,
        name: "Alice".into(),
        email: "alice@example.com".into(),
    })
}
