use std::time::Duration;

/// Timing statistics of the enabled process path.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProcessStats {
    /// Wall-clock time of the last enabled `process` call, in milliseconds.
    pub last_latency_ms: f32,
    /// Time spent in the last call as a percentage of the audio it covered.
    pub last_cpu_percent: f32,
    /// Frames processed since creation or the last reset.
    pub total_frames: u64,
    /// Output frames zero-filled because the kernel had nothing ready.
    pub frames_dropped: u64,
}

impl ProcessStats {
    /// Records one call that processed `frames` frames at `sample_rate` in
    /// `elapsed` wall-clock time, `dropped` of which were zero-filled.
    pub fn record(&mut self, frames: usize, dropped: usize, sample_rate: u32, elapsed: Duration) {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        self.last_latency_ms = elapsed_ms as f32;
        self.last_cpu_percent = if frames > 0 && sample_rate > 0 {
            let audio_ms = frames as f64 * 1000.0 / sample_rate as f64;
            (elapsed_ms / audio_ms * 100.0) as f32
        } else {
            0.0
        };
        self.total_frames = self.total_frames.saturating_add(frames as u64);
        self.frames_dropped = self.frames_dropped.saturating_add(dropped as u64);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_record_derives_cpu_percent() {
        let mut stats = ProcessStats::default();
        // 480 frames at 48 kHz cover 10 ms of audio.
        stats.record(480, 0, 48000, Duration::from_millis(1));
        assert_relative_eq!(stats.last_latency_ms, 1.0, epsilon = 1e-4);
        assert_relative_eq!(stats.last_cpu_percent, 10.0, epsilon = 1e-3);
        assert_eq!(stats.total_frames, 480);

        stats.record(480, 0, 48000, Duration::from_micros(500));
        assert_eq!(stats.total_frames, 960);
        assert_relative_eq!(stats.last_cpu_percent, 5.0, epsilon = 1e-3);
    }

    #[test]
    fn test_dropped_frames_accumulate() {
        let mut stats = ProcessStats::default();
        stats.record(480, 480, 48000, Duration::ZERO);
        stats.record(480, 32, 48000, Duration::ZERO);
        stats.record(480, 0, 48000, Duration::ZERO);
        assert_eq!(stats.frames_dropped, 512);
        assert_eq!(stats.total_frames, 1440);
    }

    #[test]
    fn test_zero_frames_reports_no_load() {
        let mut stats = ProcessStats::default();
        stats.record(0, 0, 48000, Duration::from_millis(3));
        assert_eq!(stats.last_cpu_percent, 0.0);
        assert_eq!(stats.total_frames, 0);
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let mut stats = ProcessStats::default();
        stats.record(100, 40, 44100, Duration::from_millis(2));
        stats.reset();
        assert_eq!(stats, ProcessStats::default());
    }
}
