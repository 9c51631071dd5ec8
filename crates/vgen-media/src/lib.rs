//! FFmpeg-based assembly of generated scene media into final videos.
//!
//! The entry point is [`AssemblyEngine`], which runs the staged
//! pipeline described by a `vgen_models::AssemblyConfig` and streams
//! `AssemblyProgress` updates over an optional channel.

pub mod assemble;
pub mod command;
pub mod download;
pub mod error;
pub mod filters;
pub mod probe;

pub use assemble::{AssemblyEngine, ProgressSender};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::{get_duration, probe_video, VideoInfo};
