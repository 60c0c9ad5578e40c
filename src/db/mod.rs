pub mod dreams;
pub mod images;
pub mod oauth_accounts;
pub mod password_reset_tokens;
pub mod preferences;
pub mod refresh_tokens;
pub mod tags;
pub mod users;
