//! FFmpeg filter builders for the assembly pipeline.

use vgen_models::{AudioTrack, OutputFormat, TextPosition, WatermarkPosition};

/// Margin in pixels for edge-anchored overlays.
const EDGE_MARGIN: u32 = 20;

/// Normalize any clip to the output geometry: fit, pad, frame rate,
/// pixel format.
pub fn scale_pad_filter(output: &OutputFormat) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,\
         fps={fps},format=yuv420p",
        w = output.width,
        h = output.height,
        fps = output.fps
    )
}

/// Slow push-in (Ken Burns) for still images.
///
/// The still is upscaled first so zoompan's integer sampling does not
/// jitter.
pub fn ken_burns_filter(output: &OutputFormat, duration_secs: f64) -> String {
    let frames = (duration_secs * f64::from(output.fps)).round().max(1.0) as u64;
    format!(
        "scale=8000:-1,\
         zoompan=z='min(zoom+0.0015,1.15)':d={frames}:\
         x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':\
         s={w}x{h}:fps={fps},format=yuv420p",
        w = output.width,
        h = output.height,
        fps = output.fps
    )
}

/// Escape text for use inside a drawtext filter.
pub fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
        .replace('%', "\\%")
}

/// Burn centered text into the frame at the requested position.
pub fn drawtext_filter(text: &str, position: TextPosition, output: &OutputFormat) -> String {
    let y = match position {
        TextPosition::Top => "h*0.08".to_string(),
        TextPosition::Center => "(h-text_h)/2".to_string(),
        TextPosition::Bottom => "h*0.88-text_h".to_string(),
    };
    format!(
        "drawtext=text='{}':fontsize=h/18:fontcolor=white:\
         borderw=3:bordercolor=black@0.6:x=(w-text_w)/2:y={}",
        escape_drawtext(text),
        y
    )
}

/// Cross-fade offsets for a sequence of clip durations.
///
/// Each xfade consumes `fade_secs` of overlap, so offsets accumulate
/// the running duration minus the overlap already spent.
pub fn xfade_offsets(durations: &[f64], fade_secs: f64) -> Vec<f64> {
    let mut offsets = Vec::new();
    let mut elapsed = 0.0;
    for (i, d) in durations.iter().enumerate() {
        if i + 1 == durations.len() {
            break;
        }
        elapsed += d - fade_secs;
        offsets.push(elapsed);
    }
    offsets
}

/// Build the chained xfade graph for `durations.len()` video inputs.
/// Returns the graph and the final output label.
pub fn xfade_chain(durations: &[f64], fade_secs: f64) -> (String, String) {
    debug_assert!(durations.len() >= 2);
    let offsets = xfade_offsets(durations, fade_secs);

    let mut graph = String::new();
    let mut prev_label = "[0:v]".to_string();
    for (i, offset) in offsets.iter().enumerate() {
        let out_label = format!("[x{}]", i + 1);
        graph.push_str(&format!(
            "{}[{}:v]xfade=transition=fade:duration={:.3}:offset={:.3}{};",
            prev_label,
            i + 1,
            fade_secs,
            offset,
            out_label
        ));
        prev_label = out_label;
    }
    graph.pop();
    (graph, prev_label)
}

/// Concat graph for hard cuts. Returns the graph and the output label.
pub fn concat_chain(input_count: usize) -> (String, String) {
    let inputs: String = (0..input_count).map(|i| format!("[{i}:v]")).collect();
    (
        format!("{inputs}concat=n={input_count}:v=1:a=0[vcat]"),
        "[vcat]".to_string(),
    )
}

/// Mix audio tracks into one stream.
///
/// The tracks are FFmpeg inputs `1..=tracks.len()` (input 0 is the
/// video). Each gets its gain and fades applied, then everything is
/// mixed with the first track governing the mix duration. Returns the
/// graph and the output label.
pub fn audio_mix_chain(tracks: &[AudioTrack], total_secs: f64) -> (String, String) {
    debug_assert!(!tracks.is_empty());

    let mut graph = String::new();
    let mut labels = String::new();
    for (i, track) in tracks.iter().enumerate() {
        let input = i + 1;
        let label = format!("[a{input}]");
        let mut chain = format!("volume={:.3}", track.gain());
        if track.fade_in_secs > 0.0 {
            chain.push_str(&format!(",afade=t=in:st=0:d={:.3}", track.fade_in_secs));
        }
        if track.fade_out_secs > 0.0 {
            let start = (total_secs - track.fade_out_secs).max(0.0);
            chain.push_str(&format!(
                ",afade=t=out:st={:.3}:d={:.3}",
                start, track.fade_out_secs
            ));
        }
        graph.push_str(&format!("[{input}:a]{chain}{label};"));
        labels.push_str(&label);
    }

    if tracks.len() == 1 {
        graph.pop();
        return (graph, "[a1]".to_string());
    }

    graph.push_str(&format!(
        "{labels}amix=inputs={}:duration=first:dropout_transition=2[amix]",
        tracks.len()
    ));
    (graph, "[amix]".to_string())
}

/// Overlay expression for a watermark position.
fn overlay_position(position: WatermarkPosition) -> (String, String) {
    let m = EDGE_MARGIN;
    match position {
        WatermarkPosition::TopLeft => (format!("{m}"), format!("{m}")),
        WatermarkPosition::TopRight => (format!("main_w-overlay_w-{m}"), format!("{m}")),
        WatermarkPosition::Center => (
            "(main_w-overlay_w)/2".to_string(),
            "(main_h-overlay_h)/2".to_string(),
        ),
        WatermarkPosition::BottomLeft => (format!("{m}"), format!("main_h-overlay_h-{m}")),
        WatermarkPosition::BottomRight => (
            format!("main_w-overlay_w-{m}"),
            format!("main_h-overlay_h-{m}"),
        ),
    }
}

/// Watermark graph: input 0 is the video, input 1 the watermark image.
pub fn watermark_chain(
    output: &OutputFormat,
    position: WatermarkPosition,
    opacity: f32,
    width_pct: u8,
) -> String {
    let width = u64::from(output.width) * u64::from(width_pct.clamp(1, 100)) / 100;
    let (x, y) = overlay_position(position);
    format!(
        "[1:v]scale={width}:-1,format=rgba,colorchannelmixer=aa={opacity:.2}[wm];\
         [0:v][wm]overlay={x}:{y}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use vgen_models::AudioTrackKind;

    #[test]
    fn test_xfade_offsets_accumulate_minus_overlap() {
        // Three clips of 4s, 5s, 4s with 0.5s fades: the first fade
        // starts at 3.5s, the second at 8.0s.
        let offsets = xfade_offsets(&[4.0, 5.0, 4.0], 0.5);
        assert_eq!(offsets.len(), 2);
        assert!((offsets[0] - 3.5).abs() < 1e-9);
        assert!((offsets[1] - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_xfade_chain_labels_and_final_output() {
        let (graph, out) = xfade_chain(&[4.0, 5.0, 4.0], 0.5);
        assert_eq!(out, "[x2]");
        assert!(graph.contains("[0:v][1:v]xfade"));
        assert!(graph.contains("offset=3.500"));
        assert!(graph.contains("[x1][2:v]xfade"));
        assert!(graph.contains("offset=8.000"));
    }

    #[test]
    fn test_concat_chain() {
        let (graph, out) = concat_chain(3);
        assert_eq!(graph, "[0:v][1:v][2:v]concat=n=3:v=1:a=0[vcat]");
        assert_eq!(out, "[vcat]");
    }

    #[test]
    fn test_drawtext_positions() {
        let fmt = OutputFormat::default();
        let top = drawtext_filter("Hello", TextPosition::Top, &fmt);
        let bottom = drawtext_filter("Hello", TextPosition::Bottom, &fmt);
        assert!(top.contains("y=h*0.08"));
        assert!(bottom.contains("text_h"));
    }

    #[test]
    fn test_drawtext_escaping() {
        let escaped = escape_drawtext("50% off: don't wait");
        assert!(escaped.contains("\\%"));
        assert!(escaped.contains("\\:"));
        assert!(escaped.contains("\\'"));
    }

    #[test]
    fn test_audio_mix_single_track_skips_amix() {
        let tracks = vec![AudioTrack {
            url: "music.mp3".into(),
            kind: AudioTrackKind::Music,
            volume: 80,
            fade_in_secs: 1.0,
            fade_out_secs: 2.0,
        }];
        let (graph, out) = audio_mix_chain(&tracks, 13.0);
        assert_eq!(out, "[a1]");
        assert!(graph.contains("volume=0.800"));
        assert!(graph.contains("afade=t=in:st=0:d=1.000"));
        assert!(graph.contains("afade=t=out:st=11.000:d=2.000"));
        assert!(!graph.contains("amix"));
    }

    #[test]
    fn test_audio_mix_multiple_tracks() {
        let music = AudioTrack {
            url: "music.mp3".into(),
            kind: AudioTrackKind::Music,
            volume: 30,
            fade_in_secs: 0.0,
            fade_out_secs: 0.0,
        };
        let voice = AudioTrack {
            url: "vo.mp3".into(),
            kind: AudioTrackKind::Voiceover,
            volume: 100,
            ..music.clone()
        };
        let (graph, out) = audio_mix_chain(&[music, voice], 13.0);
        assert_eq!(out, "[amix]");
        assert!(graph.contains("amix=inputs=2:duration=first"));
        assert!(graph.contains("[1:a]volume=0.300"));
        assert!(graph.contains("[2:a]volume=1.000"));
    }

    #[test]
    fn test_watermark_positions() {
        let fmt = OutputFormat::default();
        let br = watermark_chain(&fmt, WatermarkPosition::BottomRight, 0.7, 15);
        assert!(br.contains("overlay=main_w-overlay_w-20:main_h-overlay_h-20"));
        assert!(br.contains("scale=162:-1"));
        assert!(br.contains("aa=0.70"));

        let center = watermark_chain(&fmt, WatermarkPosition::Center, 1.0, 50);
        assert!(center.contains("overlay=(main_w-overlay_w)/2"));
    }

    #[test]
    fn test_scale_pad_matches_output_format() {
        let filter = scale_pad_filter(&OutputFormat::default());
        assert!(filter.contains("scale=1080:1920"));
        assert!(filter.contains("fps=30"));
        assert!(filter.contains("yuv420p"));
    }
}
