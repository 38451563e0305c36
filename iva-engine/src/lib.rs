pub mod client;
pub mod error;
pub mod pipeline;
pub mod recorder;
pub mod session_store;
mod state;
pub mod traits;

pub use client::{EngineConfig, VoiceClient};
pub use session_store::Registered;
