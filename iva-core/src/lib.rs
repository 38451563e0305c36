pub mod config;
pub mod conversation;
pub mod session;
pub mod text;
pub mod types;
pub mod view;

// Keep the public surface small and intentional.
pub use config::*;
pub use conversation::*;
pub use session::*;
pub use types::*;
pub use view::*;
