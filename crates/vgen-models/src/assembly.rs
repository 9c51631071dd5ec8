//! Assembly configuration and progress types.
//!
//! An `AssemblyConfig` is transient: it is constructed per render request
//! from approved scene media and never persisted.

use serde::{Deserialize, Serialize};

/// Transition between consecutive scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Cross-fade into the next scene
    #[default]
    Crossfade,
    /// Hard cut, no blending
    Cut,
}

/// Vertical placement for burned-in scene text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextPosition {
    Top,
    #[default]
    Center,
    Bottom,
}

/// One timed segment of the final video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSegment {
    /// Media source URL (generated clip or still image)
    pub media_url: String,
    /// Segment duration in seconds
    pub duration_secs: f64,
    /// Transition into the next scene
    #[serde(default)]
    pub transition: TransitionKind,
    /// Optional burned-in text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_text: Option<String>,
    /// Vertical placement for the overlay text
    #[serde(default)]
    pub text_position: TextPosition,
    /// Apply a slow pan/zoom to still images
    #[serde(default = "default_true")]
    pub motion_effect: bool,
}

fn default_true() -> bool {
    true
}

/// Kind of audio track in the mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioTrackKind {
    Music,
    Voiceover,
}

/// One audio track in the final mix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioTrack {
    /// Source URL (may point at a video file; the audio stream is extracted)
    pub url: String,
    /// Track kind
    pub kind: AudioTrackKind,
    /// Volume 0-100
    #[serde(default = "default_volume")]
    pub volume: u8,
    /// Fade-in duration in seconds
    #[serde(default)]
    pub fade_in_secs: f64,
    /// Fade-out duration in seconds
    #[serde(default)]
    pub fade_out_secs: f64,
}

fn default_volume() -> u8 {
    100
}

impl AudioTrack {
    /// Volume as a linear gain factor.
    pub fn gain(&self) -> f64 {
        f64::from(self.volume.min(100)) / 100.0
    }
}

/// Watermark placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    Center,
    BottomLeft,
    #[default]
    BottomRight,
}

/// Watermark overlay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkSpec {
    /// Local path or remote URL of the watermark image
    pub source: String,
    /// Placement
    #[serde(default)]
    pub position: WatermarkPosition,
    /// Opacity 0.0-1.0
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    /// Width as a percentage of the output width (1-100)
    #[serde(default = "default_width_pct")]
    pub width_pct: u8,
}

fn default_opacity() -> f32 {
    0.7
}

fn default_width_pct() -> u8 {
    15
}

/// Output resolution and frame rate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutputFormat {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
        }
    }
}

/// Complete configuration for one assembly run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Ordered, approved scene segments
    pub scenes: Vec<SceneSegment>,
    /// Audio tracks to mix
    #[serde(default)]
    pub audio_tracks: Vec<AudioTrack>,
    /// Optional watermark
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<WatermarkSpec>,
    /// Output format
    #[serde(default)]
    pub output: OutputFormat,
    /// Cross-fade overlap in seconds
    #[serde(default = "default_transition_secs")]
    pub transition_secs: f64,
}

fn default_transition_secs() -> f64 {
    0.5
}

impl AssemblyConfig {
    /// Total duration of all scenes without transition overlap.
    pub fn total_scene_secs(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration_secs).sum()
    }
}

/// Pipeline phase for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyPhase {
    Preparing,
    Downloading,
    Processing,
    Encoding,
    Finalizing,
}

impl AssemblyPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssemblyPhase::Preparing => "preparing",
            AssemblyPhase::Downloading => "downloading",
            AssemblyPhase::Processing => "processing",
            AssemblyPhase::Encoding => "encoding",
            AssemblyPhase::Finalizing => "finalizing",
        }
    }
}

/// Progress update streamed to the caller during assembly. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyProgress {
    pub phase: AssemblyPhase,
    /// Overall percentage 0-100
    pub percent: u8,
    /// Human-readable status
    pub message: String,
    /// Current scene counter (1-based) when processing scenes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_scene: Option<u32>,
    /// Total scene count when processing scenes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_scenes: Option<u32>,
}

impl AssemblyProgress {
    pub fn new(phase: AssemblyPhase, percent: u8, message: impl Into<String>) -> Self {
        Self {
            phase,
            percent: percent.min(100),
            message: message.into(),
            current_scene: None,
            total_scenes: None,
        }
    }

    pub fn with_scene(mut self, current: u32, total: u32) -> Self {
        self.current_scene = Some(current);
        self.total_scenes = Some(total);
        self
    }
}

/// Result of a successful assembly run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyResult {
    /// Output file path
    pub output_path: String,
    /// Probed duration in seconds
    pub duration_secs: f64,
    /// Output file size in bytes
    pub file_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_gain_normalization() {
        let track = AudioTrack {
            url: "music.mp3".into(),
            kind: AudioTrackKind::Music,
            volume: 50,
            fade_in_secs: 0.0,
            fade_out_secs: 0.0,
        };
        assert!((track.gain() - 0.5).abs() < f64::EPSILON);

        let loud = AudioTrack { volume: 255, ..track };
        assert!((loud.gain() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_total_scene_duration() {
        let config = AssemblyConfig {
            scenes: vec![
                SceneSegment {
                    media_url: "a.mp4".into(),
                    duration_secs: 4.0,
                    transition: TransitionKind::Crossfade,
                    overlay_text: None,
                    text_position: TextPosition::Center,
                    motion_effect: true,
                },
                SceneSegment {
                    media_url: "b.mp4".into(),
                    duration_secs: 5.0,
                    transition: TransitionKind::Crossfade,
                    overlay_text: None,
                    text_position: TextPosition::Center,
                    motion_effect: true,
                },
            ],
            audio_tracks: vec![],
            watermark: None,
            output: OutputFormat::default(),
            transition_secs: 0.5,
        };
        assert!((config.total_scene_secs() - 9.0).abs() < f64::EPSILON);
    }
}
