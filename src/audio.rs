//! Speech clips: raw PCM to WAV, and playback through a system player.

use std::fs;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use crate::error::{Error, Result};

/// Sample rate of the speech endpoint's PCM output.
pub const SAMPLE_RATE: u32 = 24_000;

const PLAYERS: &[&str] = &["paplay", "aplay", "afplay", "ffplay"];

/// Wraps 16-bit little-endian mono PCM in a minimal WAV container.
pub fn pcm16_mono_to_wav(pcm: &[u8], sample_rate: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(44 + pcm.len());
    let byte_rate = sample_rate * 2; // mono, 16-bit
    let block_align = 2u16;
    let data_len = pcm.len() as u32;
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // channels
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);
    out
}

/// A playable WAV held in memory.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioClip {
    wav: Vec<u8>,
}

impl AudioClip {
    pub fn from_base64_pcm(data: &str) -> Result<Self> {
        let pcm = STANDARD.decode(data.trim())?;
        Ok(AudioClip { wav: pcm16_mono_to_wav(&pcm, SAMPLE_RATE) })
    }

    pub fn wav_bytes(&self) -> &[u8] {
        &self.wav
    }
}

pub trait AudioSink {
    /// Starts playback immediately, replacing whatever is playing.
    fn play(&mut self, clip: &AudioClip) -> Result<()>;

    /// Releases whatever a finished clip still holds. Called once per frame.
    fn reap(&mut self) {}
}

/// Writes each clip to a temp file and hands it to the first player found on PATH.
pub struct SystemAudioPlayer {
    dir: PathBuf,
    current: Option<(Child, PathBuf)>,
}

impl SystemAudioPlayer {
    pub fn new() -> Self {
        Self::in_dir(std::env::temp_dir())
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        SystemAudioPlayer { dir: dir.into(), current: None }
    }

    fn stop(&mut self) {
        if let Some((mut child, path)) = self.current.take() {
            let _ = child.kill();
            let _ = child.wait();
            let _ = fs::remove_file(path);
        }
    }

    fn spawn_player(path: &PathBuf) -> Result<Child> {
        for &player in PLAYERS {
            let mut cmd = Command::new(player);
            if player == "ffplay" {
                cmd.args(["-nodisp", "-autoexit", "-loglevel", "error"]);
            }
            match cmd.arg(path).stdout(Stdio::null()).stderr(Stdio::null()).spawn() {
                Ok(child) => {
                    debug!(player, "Playing speech clip");
                    return Ok(child);
                }
                Err(e) => debug!(player, "Player unavailable: {}", e),
            }
        }
        Err(Error::Audio("no audio player found".to_string()))
    }
}

impl Default for SystemAudioPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for SystemAudioPlayer {
    fn reap(&mut self) {
        let finished = match self.current.as_mut() {
            Some((child, _)) => !matches!(child.try_wait(), Ok(None)),
            None => false,
        };
        if finished {
            if let Some((_, path)) = self.current.take() {
                let _ = fs::remove_file(path);
            }
        }
    }

    fn play(&mut self, clip: &AudioClip) -> Result<()> {
        self.stop();
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let path = self.dir.join(format!("trainer-pro-tts-{ts}.wav"));
        fs::write(&path, clip.wav_bytes())?;
        match Self::spawn_player(&path) {
            Ok(child) => {
                self.current = Some((child, path));
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&path);
                Err(e)
            }
        }
    }
}

impl Drop for SystemAudioPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
