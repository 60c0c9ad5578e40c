pub mod cookies;
pub mod extractor;
pub mod jwt;
pub mod oauth;
pub mod password;
pub mod reset;
pub mod tokens;
