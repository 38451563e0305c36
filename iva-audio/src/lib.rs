pub mod decode;
pub mod file_source;
pub mod playback;
pub mod resample;
pub mod wav;

#[cfg(feature = "audio-io")]
pub mod mic;

pub use decode::{DecodeError, DecodedAudio, decode_to_mono};
pub use file_source::FileCaptureDevice;
pub use playback::{PlaybackSink, UnavailableSink};

#[cfg(feature = "audio-io")]
pub use mic::CpalCaptureDevice;
#[cfg(feature = "audio-io")]
pub use playback::CpalSink;
