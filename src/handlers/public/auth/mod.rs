// handlers/public/auth/mod.rs - account creation and token acquisition
pub mod login;    // POST /api/v1/auth/login
pub mod register; // POST /api/v1/auth/register

pub use login::login_post;
pub use register::register_post;
