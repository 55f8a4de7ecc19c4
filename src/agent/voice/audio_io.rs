// MKAI Audio I/O Module
// Microphone Recording & Speaker Playback

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{info, warn};

use crate::error::MkaiError;

/// Capture and playback devices the session talks to.
#[async_trait]
pub trait AudioDevice: Send + Sync {
    /// Record `duration_secs` of mono audio at `sample_rate` into a WAV file.
    async fn record(&self, output_path: &Path, duration_secs: u32, sample_rate: u32) -> Result<(), MkaiError>;

    /// Play an audio file, returning once playback has finished.
    async fn play(&self, audio_path: &Path) -> Result<(), MkaiError>;
}

/// Default host input/output through cpal and rodio.
#[derive(Debug, Default)]
pub struct AudioIO;

impl AudioIO {
    pub fn new() -> Self {
        Self
    }

    fn capture_blocking(output_path: &Path, duration_secs: u32, sample_rate: u32) -> Result<usize> {
        use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

        let samples: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
        let samples_clone = samples.clone();

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .context("No input device available")?;

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut lock) = samples_clone.lock() {
                    lock.extend_from_slice(data);
                }
            },
            |err| warn!("[VOICE] Input stream error: {}", err),
            None,
        )?;

        stream.play()?;
        std::thread::sleep(Duration::from_secs(duration_secs as u64));
        drop(stream);

        let captured = samples
            .lock()
            .map_err(|_| anyhow::anyhow!("Capture buffer poisoned"))?
            .clone();

        write_wav(output_path, &captured, sample_rate)?;
        Ok(captured.len())
    }

    fn play_blocking(audio_path: &Path) -> Result<()> {
        use rodio::{Decoder, OutputStream, Sink};

        let (_stream, stream_handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&stream_handle)?;

        let file = File::open(audio_path).with_context(|| format!("Open {:?}", audio_path))?;
        let source = Decoder::new(std::io::BufReader::new(file))?;

        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}

#[async_trait]
impl AudioDevice for AudioIO {
    async fn record(&self, output_path: &Path, duration_secs: u32, sample_rate: u32) -> Result<(), MkaiError> {
        // Security check: Prevent directory traversal
        if output_path.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
            return Err(MkaiError::DeviceUnavailable(
                "Security Violation: Path traversal detected".to_string(),
            ));
        }

        info!("[VOICE] Recording {} seconds to {:?}...", duration_secs, output_path);

        let path = output_path.to_path_buf();
        let count = tokio::task::spawn_blocking(move || Self::capture_blocking(&path, duration_secs, sample_rate))
            .await
            .map_err(|e| MkaiError::DeviceUnavailable(e.to_string()))?
            .map_err(|e| MkaiError::DeviceUnavailable(format!("{:#}", e)))?;

        info!("[VOICE] Recording complete ({} samples).", count);
        Ok(())
    }

    async fn play(&self, audio_path: &Path) -> Result<(), MkaiError> {
        info!("[VOICE] Playing {:?}...", audio_path);
        let audio_path: PathBuf = audio_path.to_path_buf();

        // Offload blocking playback to thread
        tokio::task::spawn_blocking(move || Self::play_blocking(&audio_path))
            .await
            .map_err(|e| MkaiError::DeviceUnavailable(e.to_string()))?
            .map_err(|e| MkaiError::DeviceUnavailable(format!("{:#}", e)))
    }
}

/// Write mono f32 samples as 16-bit PCM.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in samples {
        let amplitude = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(amplitude)?;
    }
    writer.finalize()?;
    Ok(())
}
