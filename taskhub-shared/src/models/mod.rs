/// Database models
///
/// - `user`: accounts, session token list, avatar storage
/// - `task`: per-user tasks with ownership-scoped operations
pub mod task;
pub mod user;
