pub mod backend;
pub mod config_store;
pub mod player;
pub mod runtime_client;

pub use backend::HttpBackend;
pub use config_store::ConfigStore;
pub use player::HttpAudioPlayer;
pub use runtime_client::{build_client_from_config, capture_device, list_microphones, playback_sink};
