pub mod audio_io;
pub mod input;
pub mod transcription;
pub mod tts;

pub use audio_io::{AudioDevice, AudioIO};
pub use input::{Acquired, CaptureSettings, InputChain, InputSource};
pub use transcription::{SpeechRecognizer, WhisperRecognizer};
pub use tts::{BackendState, GoogleCloudTts, SpeechBackend, SynthesisChain, TranslateTts, VoiceParams};
