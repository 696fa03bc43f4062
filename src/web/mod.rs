pub mod auth;
pub mod avatar;
pub mod landing;
pub mod profile;
pub mod router;
pub mod session;
pub mod state;
pub mod templates;

pub use state::AppState;
