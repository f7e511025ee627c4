pub mod errors;
pub mod db;
pub mod profile;
pub mod user_credentials;
pub mod sweet;
pub mod purchase;
pub mod auth_token;
