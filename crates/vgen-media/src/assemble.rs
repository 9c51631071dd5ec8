//! Multi-stage video assembly.
//!
//! Assembles approved scene media into the final video through staged
//! FFmpeg invocations: normalize each scene, join with transitions, mix
//! audio, apply the watermark, re-encode. Stages degrade independently:
//! a failed scene download becomes a filler clip, a failed transition
//! graph falls back to hard cuts, a failed audio mix retries with fewer
//! tracks and finally ships video-only, a failed watermark is skipped.
//! Only a missing FFmpeg binary or the loss of every video input aborts
//! the run.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{info, warn};

use vgen_models::{
    AssemblyConfig, AssemblyPhase, AssemblyProgress, AssemblyResult, AudioTrack, EncodingConfig,
    OutputFormat, SceneSegment, TransitionKind,
};

use crate::command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
use crate::download::{fetch_asset, is_image_source};
use crate::error::{MediaError, MediaResult};
use crate::filters::{
    audio_mix_chain, concat_chain, drawtext_filter, ken_burns_filter, scale_pad_filter,
    watermark_chain, xfade_chain,
};
use crate::probe::probe_video;

/// Progress channel handed to [`AssemblyEngine::assemble`].
pub type ProgressSender = mpsc::UnboundedSender<AssemblyProgress>;

/// Default per-invocation FFmpeg timeout.
const STAGE_TIMEOUT_SECS: u64 = 600;

/// Filler background color for scenes whose media could not be fetched.
const FILLER_COLOR: &str = "0x1a1a2e";

/// Staged FFmpeg assembly engine.
pub struct AssemblyEngine {
    work_dir: PathBuf,
    encoding: EncodingConfig,
    stage_timeout_secs: u64,
}

/// One scene's source media after the download stage.
enum SceneSource {
    Video(PathBuf),
    Image(PathBuf),
    /// Download failed; render a solid-color filler instead.
    Filler,
}

impl AssemblyEngine {
    pub fn new(work_dir: impl AsRef<Path>) -> Self {
        Self {
            work_dir: work_dir.as_ref().to_path_buf(),
            encoding: EncodingConfig::default(),
            stage_timeout_secs: STAGE_TIMEOUT_SECS,
        }
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_stage_timeout(mut self, secs: u64) -> Self {
        self.stage_timeout_secs = secs;
        self
    }

    fn runner(&self) -> FfmpegRunner {
        FfmpegRunner::new().with_timeout(self.stage_timeout_secs)
    }

    /// Run the full assembly pipeline.
    pub async fn assemble(
        &self,
        config: &AssemblyConfig,
        progress: Option<ProgressSender>,
    ) -> MediaResult<AssemblyResult> {
        // Stage 1: prepare. A missing binary or empty timeline is fatal.
        send(&progress, AssemblyProgress::new(AssemblyPhase::Preparing, 0, "Checking tools"));
        check_ffmpeg()?;
        if config.scenes.is_empty() {
            return Err(MediaError::NoScenes);
        }
        tokio::fs::create_dir_all(&self.work_dir).await?;

        // Stage 2: download.
        send(
            &progress,
            AssemblyProgress::new(AssemblyPhase::Downloading, 5, "Fetching scene media"),
        );
        let sources = self.download_scenes(&config.scenes).await;
        let audio_files = self.download_audio(&config.audio_tracks).await;
        let watermark_file = self.download_watermark(config).await;

        // Stage 3: normalize each scene to a uniform clip.
        let total = config.scenes.len() as u32;
        let mut clips = Vec::with_capacity(config.scenes.len());
        for (i, (scene, source)) in config.scenes.iter().zip(&sources).enumerate() {
            send(
                &progress,
                AssemblyProgress::new(
                    AssemblyPhase::Processing,
                    25 + (35 * i as u32 / total.max(1)) as u8,
                    format!("Processing scene {}", i + 1),
                )
                .with_scene(i as u32 + 1, total),
            );
            let clip = self.work_dir.join(format!("clip_{i:03}.mp4"));
            self.normalize_scene(scene, source, &config.output, &clip)
                .await?;
            clips.push(clip);
        }

        // Stage 4: join clips.
        send(
            &progress,
            AssemblyProgress::new(AssemblyPhase::Encoding, 60, "Joining scenes"),
        );
        let joined = self.join_clips(config, &clips).await?;

        // Stage 5: audio mix.
        send(
            &progress,
            AssemblyProgress::new(AssemblyPhase::Encoding, 80, "Mixing audio"),
        );
        let tracks: Vec<AudioTrack> = config
            .audio_tracks
            .iter()
            .zip(&audio_files)
            .filter_map(|(t, f)| f.as_ref().map(|_| t.clone()))
            .collect();
        let files: Vec<PathBuf> = audio_files.into_iter().flatten().collect();
        let mixed = self
            .mix_audio(&joined, &tracks, &files, config.total_scene_secs())
            .await;

        // Stage 6: watermark and final encode.
        send(
            &progress,
            AssemblyProgress::new(AssemblyPhase::Finalizing, 90, "Finalizing"),
        );
        let marked = match (&watermark_file, &config.watermark) {
            (Some(wm_file), Some(spec)) => {
                let dest = self.work_dir.join("watermarked.mp4");
                let graph = watermark_chain(
                    &config.output,
                    spec.position,
                    spec.opacity,
                    spec.width_pct,
                );
                let cmd = FfmpegCommand::new(&dest)
                    .input(&mixed)
                    .input(wm_file)
                    .filter_complex(graph)
                    .video_codec(&self.encoding.codec)
                    .preset(&self.encoding.preset)
                    .audio_codec("copy");
                match self.runner().run(&cmd).await {
                    Ok(()) => dest,
                    Err(e) => {
                        warn!("Watermark failed, continuing without: {}", e);
                        mixed
                    }
                }
            }
            _ => mixed,
        };

        let output_path = self.work_dir.join("final.mp4");
        self.final_encode(&marked, &output_path).await?;

        let info = probe_video(&output_path).await?;
        send(
            &progress,
            AssemblyProgress::new(AssemblyPhase::Finalizing, 100, "Done"),
        );
        info!(
            output = %output_path.display(),
            duration = info.duration,
            size = info.size,
            "Assembly complete"
        );
        Ok(AssemblyResult {
            output_path: output_path.to_string_lossy().to_string(),
            duration_secs: info.duration,
            file_size: info.size,
        })
    }

    /// Fetch scene media; failures degrade to filler clips.
    async fn download_scenes(&self, scenes: &[SceneSegment]) -> Vec<SceneSource> {
        let mut sources = Vec::with_capacity(scenes.len());
        for (i, scene) in scenes.iter().enumerate() {
            let is_image = is_image_source(&scene.media_url);
            let ext = if is_image { "img" } else { "mp4" };
            let dest = self.work_dir.join(format!("src_{i:03}.{ext}"));
            match fetch_asset(&scene.media_url, &dest).await {
                Ok(()) if is_image => sources.push(SceneSource::Image(dest)),
                Ok(()) => sources.push(SceneSource::Video(dest)),
                Err(e) => {
                    warn!(scene = i, "Scene media unavailable, using filler: {}", e);
                    sources.push(SceneSource::Filler);
                }
            }
        }
        sources
    }

    /// Fetch audio tracks; failures drop the track.
    async fn download_audio(&self, tracks: &[AudioTrack]) -> Vec<Option<PathBuf>> {
        let mut files = Vec::with_capacity(tracks.len());
        for (i, track) in tracks.iter().enumerate() {
            let dest = self.work_dir.join(format!("audio_{i:03}.bin"));
            match fetch_asset(&track.url, &dest).await {
                Ok(()) => files.push(Some(dest)),
                Err(e) => {
                    warn!(track = i, "Audio track unavailable, dropping: {}", e);
                    files.push(None);
                }
            }
        }
        files
    }

    /// Fetch the watermark image; failure drops the watermark.
    async fn download_watermark(&self, config: &AssemblyConfig) -> Option<PathBuf> {
        let spec = config.watermark.as_ref()?;
        let dest = self.work_dir.join("watermark.png");
        match fetch_asset(&spec.source, &dest).await {
            Ok(()) => Some(dest),
            Err(e) => {
                warn!("Watermark unavailable, dropping: {}", e);
                None
            }
        }
    }

    /// Normalize one scene into a uniform silent clip.
    async fn normalize_scene(
        &self,
        scene: &SceneSegment,
        source: &SceneSource,
        output: &OutputFormat,
        dest: &Path,
    ) -> MediaResult<()> {
        let cmd = match source {
            SceneSource::Video(path) => FfmpegCommand::new(dest)
                .input(path)
                .video_filter(video_scene_filter(scene, output))
                .duration(scene.duration_secs),
            SceneSource::Image(path) => FfmpegCommand::new(dest)
                .input_looped_image(path, scene.duration_secs)
                .video_filter(image_scene_filter(scene, output))
                .duration(scene.duration_secs),
            SceneSource::Filler => FfmpegCommand::new(dest)
                .input_lavfi(filler_source(scene, output))
                .video_filter(filler_filter(scene, output))
                .duration(scene.duration_secs),
        };
        let cmd = cmd
            .no_audio()
            .video_codec(&self.encoding.codec)
            .preset(&self.encoding.preset)
            .crf(self.encoding.crf);
        self.runner().run(&cmd).await
    }

    /// Join normalized clips with cross-fades, falling back to hard cuts.
    async fn join_clips(&self, config: &AssemblyConfig, clips: &[PathBuf]) -> MediaResult<PathBuf> {
        if clips.len() == 1 {
            return Ok(clips[0].clone());
        }

        let dest = self.work_dir.join("joined.mp4");

        if use_crossfade(config) {
            let durations: Vec<f64> = config.scenes.iter().map(|s| s.duration_secs).collect();
            let (graph, label) = xfade_chain(&durations, config.transition_secs);
            let mut cmd = FfmpegCommand::new(&dest);
            for clip in clips {
                cmd = cmd.input(clip);
            }
            let cmd = cmd
                .filter_complex(graph)
                .map(label)
                .video_codec(&self.encoding.codec)
                .preset(&self.encoding.preset)
                .crf(self.encoding.crf)
                .no_audio();
            match self.runner().run(&cmd).await {
                Ok(()) => return Ok(dest),
                Err(e) => {
                    warn!("Cross-fade join failed, falling back to cuts: {}", e);
                }
            }
        }

        let (graph, label) = concat_chain(clips.len());
        let mut cmd = FfmpegCommand::new(&dest);
        for clip in clips {
            cmd = cmd.input(clip);
        }
        let cmd = cmd
            .filter_complex(graph)
            .map(label)
            .video_codec(&self.encoding.codec)
            .preset(&self.encoding.preset)
            .crf(self.encoding.crf)
            .no_audio();
        self.runner().run(&cmd).await?;
        Ok(dest)
    }

    /// Mix audio onto the joined video. Degrades to the first track,
    /// then to video-only.
    async fn mix_audio(
        &self,
        video: &Path,
        tracks: &[AudioTrack],
        files: &[PathBuf],
        total_secs: f64,
    ) -> PathBuf {
        if tracks.is_empty() || files.is_empty() {
            return video.to_path_buf();
        }

        let dest = self.work_dir.join("mixed.mp4");
        match self
            .run_audio_mix(video, tracks, files, total_secs, &dest)
            .await
        {
            Ok(()) => return dest,
            Err(e) => warn!("Audio mix failed, retrying with first track: {}", e),
        }

        if tracks.len() > 1 {
            match self
                .run_audio_mix(video, &tracks[..1], &files[..1], total_secs, &dest)
                .await
            {
                Ok(()) => return dest,
                Err(e) => warn!("Single-track mix failed, shipping video-only: {}", e),
            }
        }

        video.to_path_buf()
    }

    async fn run_audio_mix(
        &self,
        video: &Path,
        tracks: &[AudioTrack],
        files: &[PathBuf],
        total_secs: f64,
        dest: &Path,
    ) -> MediaResult<()> {
        let (graph, label) = audio_mix_chain(tracks, total_secs);
        let mut cmd = FfmpegCommand::new(dest).input(video);
        for file in files {
            cmd = cmd.input(file);
        }
        let cmd = cmd
            .filter_complex(graph)
            .map("0:v")
            .map(label)
            .video_codec("copy")
            .audio_codec(&self.encoding.audio_codec)
            .audio_bitrate(&self.encoding.audio_bitrate)
            .output_args(["-shortest"]);
        self.runner().run(&cmd).await
    }

    /// Final re-encode for consistent delivery settings.
    async fn final_encode(&self, input: &Path, dest: &Path) -> MediaResult<()> {
        let cmd = FfmpegCommand::new(dest)
            .input(input)
            .video_codec(&self.encoding.codec)
            .preset(&self.encoding.preset)
            .crf(self.encoding.crf)
            .audio_codec(&self.encoding.audio_codec)
            .audio_bitrate(&self.encoding.audio_bitrate)
            .output_args(["-movflags", "+faststart"]);
        self.runner().run(&cmd).await
    }
}

fn send(progress: &Option<ProgressSender>, update: AssemblyProgress) {
    if let Some(tx) = progress {
        // A dropped receiver never aborts assembly.
        let _ = tx.send(update);
    }
}

/// Cross-fades apply only when every boundary asks for one.
fn use_crossfade(config: &AssemblyConfig) -> bool {
    config.transition_secs > 0.0
        && config
            .scenes
            .iter()
            .take(config.scenes.len().saturating_sub(1))
            .all(|s| s.transition == TransitionKind::Crossfade)
}

/// Filter chain for a video scene: geometry plus optional text.
fn video_scene_filter(scene: &SceneSegment, output: &OutputFormat) -> String {
    let mut filter = scale_pad_filter(output);
    if let Some(text) = &scene.overlay_text {
        filter.push(',');
        filter.push_str(&drawtext_filter(text, scene.text_position, output));
    }
    filter
}

/// Filter chain for a still image: motion effect or static fit.
fn image_scene_filter(scene: &SceneSegment, output: &OutputFormat) -> String {
    let mut filter = if scene.motion_effect {
        ken_burns_filter(output, scene.duration_secs)
    } else {
        scale_pad_filter(output)
    };
    if let Some(text) = &scene.overlay_text {
        filter.push(',');
        filter.push_str(&drawtext_filter(text, scene.text_position, output));
    }
    filter
}

fn filler_source(scene: &SceneSegment, output: &OutputFormat) -> String {
    format!(
        "color=c={}:s={}x{}:d={:.3}:r={}",
        FILLER_COLOR, output.width, output.height, scene.duration_secs, output.fps
    )
}

/// Filler clips still carry the scene's overlay text when present, so a
/// lost download keeps its message on screen.
fn filler_filter(scene: &SceneSegment, output: &OutputFormat) -> String {
    match &scene.overlay_text {
        Some(text) => format!(
            "format=yuv420p,{}",
            drawtext_filter(text, scene.text_position, output)
        ),
        None => "format=yuv420p".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgen_models::{TextPosition, WatermarkPosition, WatermarkSpec};

    fn scene(duration: f64, transition: TransitionKind) -> SceneSegment {
        SceneSegment {
            media_url: "https://cdn.example.com/a.mp4".into(),
            duration_secs: duration,
            transition,
            overlay_text: None,
            text_position: TextPosition::Center,
            motion_effect: true,
        }
    }

    fn config(scenes: Vec<SceneSegment>) -> AssemblyConfig {
        AssemblyConfig {
            scenes,
            audio_tracks: vec![],
            watermark: None,
            output: OutputFormat::default(),
            transition_secs: 0.5,
        }
    }

    #[test]
    fn test_crossfade_requires_unanimous_transitions() {
        let all_fade = config(vec![
            scene(4.0, TransitionKind::Crossfade),
            scene(5.0, TransitionKind::Crossfade),
            scene(4.0, TransitionKind::Cut),
        ]);
        // The last scene's transition leads nowhere and is ignored.
        assert!(use_crossfade(&all_fade));

        let mixed = config(vec![
            scene(4.0, TransitionKind::Cut),
            scene(5.0, TransitionKind::Crossfade),
            scene(4.0, TransitionKind::Crossfade),
        ]);
        assert!(!use_crossfade(&mixed));

        let mut zero = config(vec![
            scene(4.0, TransitionKind::Crossfade),
            scene(5.0, TransitionKind::Crossfade),
        ]);
        zero.transition_secs = 0.0;
        assert!(!use_crossfade(&zero));
    }

    #[test]
    fn test_video_scene_filter_appends_text() {
        let mut s = scene(4.0, TransitionKind::Crossfade);
        let fmt = OutputFormat::default();
        assert!(!video_scene_filter(&s, &fmt).contains("drawtext"));

        s.overlay_text = Some("Shop now".into());
        s.text_position = TextPosition::Bottom;
        let filter = video_scene_filter(&s, &fmt);
        assert!(filter.starts_with("scale=1080:1920"));
        assert!(filter.contains("drawtext=text='Shop now'"));
    }

    #[test]
    fn test_image_scene_filter_motion_toggle() {
        let fmt = OutputFormat::default();
        let mut s = scene(4.0, TransitionKind::Crossfade);
        assert!(image_scene_filter(&s, &fmt).contains("zoompan"));

        s.motion_effect = false;
        assert!(!image_scene_filter(&s, &fmt).contains("zoompan"));
    }

    #[test]
    fn test_filler_keeps_overlay_text() {
        let fmt = OutputFormat::default();
        let mut s = scene(3.0, TransitionKind::Cut);
        s.overlay_text = Some("Limited offer".into());
        assert!(filler_filter(&s, &fmt).contains("drawtext"));
        assert!(filler_source(&s, &fmt).contains("s=1080x1920"));
        assert!(filler_source(&s, &fmt).contains("d=3.000"));
    }

    #[tokio::test]
    async fn test_empty_timeline_is_rejected() {
        // Runs before any FFmpeg check on hosts that have it installed.
        let dir = tempfile::tempdir().unwrap();
        let engine = AssemblyEngine::new(dir.path());
        let err = engine.assemble(&config(vec![]), None).await;
        assert!(matches!(
            err,
            Err(MediaError::NoScenes) | Err(MediaError::FfmpegNotFound)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_scene_media_degrades_to_filler() {
        let dir = tempfile::tempdir().unwrap();
        let engine = AssemblyEngine::new(dir.path());

        let video = dir.path().join("real.mp4");
        let image = dir.path().join("real.png");
        tokio::fs::write(&video, b"stub").await.unwrap();
        tokio::fs::write(&image, b"stub").await.unwrap();

        let mut scenes = vec![
            scene(3.0, TransitionKind::Cut),
            scene(3.0, TransitionKind::Cut),
            scene(3.0, TransitionKind::Cut),
        ];
        scenes[0].media_url = video.to_string_lossy().to_string();
        scenes[1].media_url = image.to_string_lossy().to_string();
        scenes[2].media_url = "/nonexistent/scene.mp4".into();

        let sources = engine.download_scenes(&scenes).await;
        assert!(matches!(sources[0], SceneSource::Video(_)));
        assert!(matches!(sources[1], SceneSource::Image(_)));
        assert!(matches!(sources[2], SceneSource::Filler));
    }

    // Needs ffmpeg and ffprobe on PATH; run with `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn test_assembly_survives_lost_scene_with_filler() {
        let dir = tempfile::tempdir().unwrap();
        let engine = AssemblyEngine::new(dir.path());

        let mut lost = scene(2.0, TransitionKind::Cut);
        lost.media_url = "/nonexistent/scene.mp4".into();
        let mut cfg = config(vec![lost]);
        cfg.transition_secs = 0.0;

        let result = engine.assemble(&cfg, None).await.unwrap();
        assert!((result.duration_secs - 2.0).abs() <= 0.2);
    }

    #[tokio::test]
    async fn test_watermark_download_failure_drops_watermark() {
        let dir = tempfile::tempdir().unwrap();
        let engine = AssemblyEngine::new(dir.path());
        let mut cfg = config(vec![scene(4.0, TransitionKind::Crossfade)]);
        cfg.watermark = Some(WatermarkSpec {
            source: "/nonexistent/logo.png".into(),
            position: WatermarkPosition::BottomRight,
            opacity: 0.7,
            width_pct: 15,
        });
        assert!(engine.download_watermark(&cfg).await.is_none());
    }
}
