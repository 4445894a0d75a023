//! Reading-speed and pause statistics from energy-based voice activity.

use crate::config::EvaluationConfig;

/// Pause statistics derived from short-time RMS energy.
#[derive(Debug, Clone, PartialEq)]
pub struct PauseStats {
    pub pause_count: usize,
    /// Seconds of detected silence.
    pub total_pause_duration: f64,
    /// Seconds; 0 when no pauses were detected.
    pub average_pause_duration: f64,
}

/// Words per minute for `word_count` words over `samples.len()` samples.
/// Zero when the audio has zero duration.
pub fn reading_speed_wpm(word_count: usize, samples: &[f32], sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    let duration_minutes = samples.len() as f64 / sample_rate as f64 / 60.0;
    if duration_minutes > 0.0 {
        word_count as f64 / duration_minutes
    } else {
        0.0
    }
}

/// Detects pauses via short-time RMS energy over overlapping frames.
///
/// A frame is silent when its energy falls below `silence_energy_ratio` of
/// the mean energy across all frames; a pause begins at each rising edge of
/// the silent indicator. Total pause duration counts silent frames at hop
/// granularity.
pub fn analyze_pauses(samples: &[f32], sample_rate: u32, config: &EvaluationConfig) -> PauseStats {
    let frame_length = (config.frame_window_ms as usize * sample_rate as usize) / 1000;
    let hop_length = (config.frame_hop_ms as usize * sample_rate as usize) / 1000;

    if frame_length == 0 || hop_length == 0 || samples.len() < frame_length {
        return PauseStats {
            pause_count: 0,
            total_pause_duration: 0.0,
            average_pause_duration: 0.0,
        };
    }

    let rms: Vec<f32> = samples
        .windows(frame_length)
        .step_by(hop_length)
        .map(|frame| {
            let energy: f32 = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
            energy.sqrt()
        })
        .collect();

    let mean = rms.iter().sum::<f32>() / rms.len() as f32;
    let threshold = mean * config.silence_energy_ratio;
    let silent: Vec<bool> = rms.iter().map(|&e| e < threshold).collect();

    let pause_count = silent.windows(2).filter(|w| !w[0] && w[1]).count();
    let silent_frames = silent.iter().filter(|&&s| s).count();
    let hop_secs = hop_length as f64 / sample_rate as f64;
    let total_pause_duration = silent_frames as f64 * hop_secs;
    let average_pause_duration = if pause_count > 0 {
        total_pause_duration / pause_count as f64
    } else {
        0.0
    };

    PauseStats {
        pause_count,
        total_pause_duration,
        average_pause_duration,
    }
}
