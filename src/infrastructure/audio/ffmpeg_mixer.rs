use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;

use crate::application::ports::{AudioMixer, AudioMixerError, BlobStore, MixTrack};
use crate::domain::BlobUrl;

/// Mixer backed by the ffmpeg/ffprobe binaries. Blobs are materialized into
/// a per-operation temp directory; outputs are re-homed into the blob store
/// before the directory is dropped.
pub struct FfmpegMixer {
    blob_store: Arc<dyn BlobStore>,
    ffmpeg_bin: String,
    ffprobe_bin: String,
}

impl FfmpegMixer {
    pub fn new(blob_store: Arc<dyn BlobStore>) -> Self {
        Self {
            blob_store,
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
        }
    }

    pub fn with_binaries(mut self, ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        self.ffmpeg_bin = ffmpeg.into();
        self.ffprobe_bin = ffprobe.into();
        self
    }

    async fn materialize(
        &self,
        url: &BlobUrl,
        dir: &Path,
        name: &str,
    ) -> Result<PathBuf, AudioMixerError> {
        let bytes = self
            .blob_store
            .read(url)
            .await
            .map_err(|e| AudioMixerError::BlobAccess(e.to_string()))?;
        let path = dir.join(name);
        tokio::fs::write(&path, &bytes).await?;
        Ok(path)
    }

    async fn run(&self, command: &mut Command) -> Result<Output, AudioMixerError> {
        let output = command.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AudioMixerError::ProcessFailed(
                stderr.lines().last().unwrap_or("unknown error").to_string(),
            ));
        }
        Ok(output)
    }

    async fn probe_file(&self, path: &Path) -> Result<f64, AudioMixerError> {
        let output = Command::new(&self.ffprobe_bin)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AudioMixerError::ProbeFailed(
                stderr.lines().last().unwrap_or("unknown error").to_string(),
            ));
        }

        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse::<f64>()
            .map_err(|e| AudioMixerError::ProbeFailed(e.to_string()))
    }
}

/// Filter chain for one mix: volume on the primary, adelay plus volume on
/// each secondary, joined by amix bounded to the primary's length.
fn build_mix_filter(primary_volume: f64, tracks: &[MixTrack]) -> String {
    let mut filter = format!("[0:a]volume={}[a0]", primary_volume);

    for (i, track) in tracks.iter().enumerate() {
        let delay_ms = (track.start_offset_seconds * 1000.0).round().max(0.0) as u64;
        filter.push_str(&format!(
            ";[{input}:a]adelay={delay}:all=1,volume={volume}[a{input}]",
            input = i + 1,
            delay = delay_ms,
            volume = track.volume,
        ));
    }

    filter.push(';');
    for i in 0..=tracks.len() {
        filter.push_str(&format!("[a{}]", i));
    }
    filter.push_str(&format!(
        "amix=inputs={}:duration=first:normalize=0[out]",
        tracks.len() + 1
    ));
    filter
}

#[async_trait]
impl AudioMixer for FfmpegMixer {
    async fn duration(&self, url: &BlobUrl) -> Result<f64, AudioMixerError> {
        let dir = tempfile::tempdir()?;
        let path = self.materialize(url, dir.path(), "probe.mp3").await?;
        self.probe_file(&path).await
    }

    async fn concatenate(&self, parts: Vec<Bytes>) -> Result<BlobUrl, AudioMixerError> {
        let dir = tempfile::tempdir()?;

        let mut list = String::new();
        for (i, part) in parts.iter().enumerate() {
            let path = dir.path().join(format!("part_{}.mp3", i));
            tokio::fs::write(&path, part).await?;
            list.push_str(&format!("file '{}'\n", path.display()));
        }
        let list_path = dir.path().join("parts.txt");
        tokio::fs::write(&list_path, &list).await?;

        // Stream copy: parts come from the same encoder, no re-encode needed.
        let out_path = dir.path().join("joined.mp3");
        self.run(
            Command::new(&self.ffmpeg_bin)
                .args(["-y", "-f", "concat", "-safe", "0", "-i"])
                .arg(&list_path)
                .args(["-c", "copy"])
                .arg(&out_path),
        )
        .await?;

        let joined = tokio::fs::read(&out_path).await?;
        self.blob_store
            .save(Bytes::from(joined), "audio", "mp3")
            .await
            .map_err(|e| AudioMixerError::BlobAccess(e.to_string()))
    }

    async fn mix(
        &self,
        primary: &BlobUrl,
        primary_volume: f64,
        tracks: &[MixTrack],
    ) -> Result<(BlobUrl, f64), AudioMixerError> {
        let dir = tempfile::tempdir()?;
        let primary_path = self.materialize(primary, dir.path(), "primary.mp3").await?;

        let mut track_paths = Vec::new();
        for (i, track) in tracks.iter().enumerate() {
            let path = self
                .materialize(&track.url, dir.path(), &format!("track_{}.mp3", i))
                .await?;
            track_paths.push(path);
        }

        let out_path = dir.path().join("mixed.mp3");
        let mut command = Command::new(&self.ffmpeg_bin);
        command.arg("-y").arg("-i").arg(&primary_path);
        for path in &track_paths {
            command.arg("-i").arg(path);
        }
        command
            .args(["-filter_complex", &build_mix_filter(primary_volume, tracks)])
            .args(["-map", "[out]", "-codec:a", "libmp3lame", "-q:a", "2"])
            .arg(&out_path);

        self.run(&mut command).await?;

        let duration = self.probe_file(&out_path).await?;
        let mixed = tokio::fs::read(&out_path).await?;
        let url = self
            .blob_store
            .save(Bytes::from(mixed), "audio", "mp3")
            .await
            .map_err(|e| AudioMixerError::BlobAccess(e.to_string()))?;

        Ok((url, duration))
    }
}
