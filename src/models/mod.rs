mod dream;
mod generated_image;
mod model_preference;
mod oauth_account;
mod password_reset_token;
mod refresh_token;
mod tag_appearance;
mod user;

pub use dream::Dream;
pub use generated_image::GeneratedImage;
pub use model_preference::ModelPreference;
pub use oauth_account::OAuthAccount;
pub use password_reset_token::PasswordResetToken;
pub use refresh_token::RefreshToken;
pub use tag_appearance::TagAppearance;
pub use user::User;
