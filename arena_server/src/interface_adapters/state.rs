use crate::use_cases::Arena;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // Rooms and connections shared by the HTTP handlers and TCP sessions.
    pub arena: Arc<Arena>,
}
