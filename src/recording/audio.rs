//! Microphone capture and whistle encoding.
//!
//! Audio is captured from the configured input device at its native rate,
//! mixed down to mono, and kept in memory while the take runs. Finishing a
//! take writes a temporary PCM WAV and lets ffmpeg encode it over the
//! whistle file with the fixed capture settings.

use super::binaries::find_ffmpeg;
use super::device::{require_input_device, suppress_alsa_warnings};
use crate::flow::{ActiveCapture, CaptureService, CaptureSettings, WhistleError};
use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use hound::WavWriter;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Level meter reference: this dBFS reads as 100%.
const REFERENCE_LEVEL_DB: f32 = -20.0;

/// Opens captures on a cpal input device.
pub struct CpalCapture {
    /// Device name, index, or "default"
    device_name: String,
}

impl CpalCapture {
    pub fn new(device_name: String) -> Self {
        Self { device_name }
    }

    fn open(&self, path: &Path, settings: &CaptureSettings) -> Result<CpalTake> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();
            require_input_device(&host, &self.device_name)
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_name);

        let device_config = device.default_input_config()?;
        let sample_rate = device_config.sample_rate().0;
        let num_channels = device_config.channels() as usize;
        let sample_format = device_config.sample_format();

        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {:?}; encoding at {}Hz",
            sample_rate,
            num_channels,
            sample_format,
            settings.sample_rate
        );

        let samples = Arc::new(Mutex::new(Vec::new()));
        let failed = Arc::new(AtomicBool::new(false));

        let error_flag = Arc::clone(&failed);
        let on_error = move |err: cpal::StreamError| {
            tracing::error!("Audio stream error: {}", err);
            error_flag.store(true, Ordering::SeqCst);
        };

        let stream_config: cpal::StreamConfig = device_config.into();
        let stream = match sample_format {
            cpal::SampleFormat::I16 => {
                let samples_arc = Arc::clone(&samples);
                device.build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        append_mono(data, &samples_arc, num_channels);
                    },
                    on_error,
                    None,
                )?
            }
            cpal::SampleFormat::F32 => {
                let samples_arc = Arc::clone(&samples);
                device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let converted: Vec<i16> = data
                            .iter()
                            .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                            .collect();
                        append_mono(&converted, &samples_arc, num_channels);
                    },
                    on_error,
                    None,
                )?
            }
            other => return Err(anyhow!("Unsupported input sample format: {other:?}")),
        };

        stream.play()?;
        tracing::debug!("Audio stream started");

        Ok(CpalTake {
            stream: Some(stream),
            samples,
            sample_rate,
            failed,
            output_path: path.to_path_buf(),
            settings: *settings,
        })
    }
}

impl CaptureService for CpalCapture {
    type Handle = CpalTake;

    fn start(&mut self, path: &Path, settings: &CaptureSettings) -> Result<CpalTake, WhistleError> {
        self.open(path, settings).map_err(WhistleError::CaptureFailed)
    }
}

/// A take in progress. Dropping it stops the stream without writing anything.
pub struct CpalTake {
    /// Active audio input stream (kept alive during recording)
    stream: Option<cpal::Stream>,
    /// Recorded audio samples (i16 PCM mono)
    samples: Arc<Mutex<Vec<i16>>>,
    /// Device sample rate of `samples`
    sample_rate: u32,
    /// Set by the stream's error callback
    failed: Arc<AtomicBool>,
    output_path: PathBuf,
    settings: CaptureSettings,
}

impl CpalTake {
    fn encode(&self) -> Result<()> {
        let samples = self
            .samples
            .lock()
            .map_err(|_| anyhow!("Sample buffer poisoned"))?
            .clone();

        if samples.is_empty() {
            return Err(anyhow!("No audio was captured"));
        }

        let duration_secs = samples.len() as f32 / self.sample_rate as f32;
        tracing::info!(
            "Recording stopped: {:.2}s ({} samples at {}Hz)",
            duration_secs,
            samples.len(),
            self.sample_rate
        );

        let temp_wav = std::env::temp_dir().join(format!("whistle_{}.wav", std::process::id()));
        save_wav(&samples, self.sample_rate, &temp_wav)?;
        let result = encode_with_ffmpeg(&temp_wav, &self.output_path, &self.settings);

        if let Err(e) = std::fs::remove_file(&temp_wav) {
            tracing::debug!("Failed to remove temp file: {}", e);
        }
        result?;

        let file_size = std::fs::metadata(&self.output_path)?.len();
        tracing::info!(
            "Whistle saved: {} ({} bytes)",
            self.output_path.display(),
            file_size
        );
        Ok(())
    }
}

impl ActiveCapture for CpalTake {
    fn interrupted(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    fn level(&self) -> u8 {
        match self.samples.lock() {
            Ok(samples) => input_level(&samples, self.sample_rate, REFERENCE_LEVEL_DB),
            Err(_) => 0,
        }
    }

    fn finish(mut self) -> Result<(), WhistleError> {
        // Stop the audio stream before reading the buffer.
        self.stream = None;
        self.encode().map_err(WhistleError::CaptureFailed)
    }
}

/// Appends interleaved samples to the buffer, averaging channels down to mono.
fn append_mono(data: &[i16], samples_arc: &Arc<Mutex<Vec<i16>>>, num_channels: usize) {
    let Ok(mut samples) = samples_arc.lock() else {
        return;
    };

    match num_channels {
        0 | 1 => samples.extend_from_slice(data),
        _ => {
            for chunk in data.chunks_exact(num_channels) {
                let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                samples.push((sum / num_channels as i32) as i16);
            }
        }
    }
}

/// Level of the most recent 50 ms as a 0-100 percentage.
///
/// RMS is converted to dBFS and mapped linearly from `reference_db - 40`
/// (4%) to `reference_db` (100%).
fn input_level(samples: &[i16], sample_rate: u32, reference_db: f32) -> u8 {
    if samples.is_empty() {
        return 0;
    }

    let window = std::cmp::min(sample_rate as usize / 20, samples.len()).max(1);
    let recent = &samples[samples.len() - window..];

    let sum_of_squares: i64 = recent.iter().map(|&x| (x as i64).pow(2)).sum();
    let rms = ((sum_of_squares / recent.len() as i64) as f32).sqrt();

    let db_fs = if rms > 0.0 {
        20.0 * (rms / 32767.0).log10()
    } else {
        -160.0
    };

    let min_db = reference_db - 40.0;
    ((db_fs - min_db) / 40.0 * 100.0).clamp(4.0, 100.0) as u8
}

/// Writes mono 16-bit PCM samples as a WAV file.
fn save_wav(samples: &[i16], sample_rate: u32, path: &Path) -> Result<()> {
    let wav_spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, wav_spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    tracing::debug!("Temporary WAV created: {}", path.display());
    Ok(())
}

/// ffmpeg arguments encoding `input_wav` into `output_path` with `settings`.
fn ffmpeg_args(input_wav: &Path, output_path: &Path, settings: &CaptureSettings) -> Vec<String> {
    vec![
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        input_wav.display().to_string(),
        "-acodec".into(),
        settings.codec.into(),
        "-ar".into(),
        settings.sample_rate.to_string(),
        "-ac".into(),
        settings.channels.to_string(),
        "-b:a".into(),
        format!("{}k", settings.bitrate_kbps),
        // Overwrite the previous take in place.
        "-y".into(),
        output_path.display().to_string(),
    ]
}

fn encode_with_ffmpeg(input_wav: &Path, output_path: &Path, settings: &CaptureSettings) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let ffmpeg_path = find_ffmpeg()?;
    let output = Command::new(&ffmpeg_path)
        .args(ffmpeg_args(input_wav, output_path, settings))
        .output()?;

    if output.status.success() {
        tracing::debug!("Audio encoded with {}", settings.codec);
        Ok(())
    } else {
        let error_msg = String::from_utf8_lossy(&output.stderr);
        tracing::error!("ffmpeg encoding failed: {}", error_msg);
        Err(anyhow!("Audio encoding failed: {error_msg}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::session::WHISTLE_CAPTURE;

    #[test]
    fn test_stereo_is_averaged_to_mono() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        append_mono(&[100, 300, -50, 50, 7], &buffer, 2);
        assert_eq!(*buffer.lock().unwrap(), vec![200, 0]);
    }

    #[test]
    fn test_mono_is_kept_as_is() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        append_mono(&[1, 2, 3], &buffer, 1);
        assert_eq!(*buffer.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_input_level_bounds() {
        assert_eq!(input_level(&[], 12_000, REFERENCE_LEVEL_DB), 0);
        assert_eq!(input_level(&[0; 600], 12_000, REFERENCE_LEVEL_DB), 4);
        assert_eq!(input_level(&[i16::MAX; 600], 12_000, REFERENCE_LEVEL_DB), 100);
    }

    #[test]
    fn test_ffmpeg_args_use_fixed_settings() {
        let args = ffmpeg_args(
            Path::new("/tmp/in.wav"),
            Path::new("/tmp/whistle.m4a"),
            &WHISTLE_CAPTURE,
        );
        let joined = args.join(" ");
        assert!(joined.contains("-acodec aac"));
        assert!(joined.contains("-ar 12000"));
        assert!(joined.contains("-ac 1"));
        assert!(joined.contains("-b:a 64k"));
        assert!(joined.ends_with("-y /tmp/whistle.m4a"));
    }

    #[test]
    fn test_save_wav_writes_mono_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        save_wav(&[0, 1000, -1000], 12_000, &path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 12_000);
        assert_eq!(reader.len(), 3);
    }
}
