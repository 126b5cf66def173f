use std::fmt;

use serde::Serialize;

/// Export phases, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportPhase {
    Rendering,
    Encoding,
    Compressing,
    Complete,
}

impl fmt::Display for ExportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportPhase::Rendering => "rendering",
            ExportPhase::Encoding => "encoding",
            ExportPhase::Compressing => "compressing",
            ExportPhase::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Upper bound of the rendering share of the progress bar
pub const RENDER_SHARE: f64 = 35.0;
/// Encoding spans `[35, 60]`
pub const ENCODE_SHARE: f64 = 25.0;
pub const COMPRESS_START: u8 = 60;

/// One progress report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportProgress {
    pub phase: ExportPhase,

    /// Overall completion, 0-100
    pub percent: u8,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_frame: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_frames: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_size: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed_size: Option<u64>,
}

impl ExportProgress {
    fn new(phase: ExportPhase, percent: u8) -> Self {
        Self {
            phase,
            percent,
            current_frame: None,
            total_frames: None,
            original_size: None,
            compressed_size: None,
        }
    }
}

/// Maps phase-local progress onto the shared 0-100 scale
///
/// Reported percentages never decrease, whatever the caller feeds in.
pub struct ProgressTracker<F>
where
    F: FnMut(ExportProgress),
{
    sink: F,
    last_percent: u8,
}

impl<F> ProgressTracker<F>
where
    F: FnMut(ExportProgress),
{
    pub fn new(sink: F) -> Self {
        Self {
            sink,
            last_percent: 0,
        }
    }

    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }

    /// `frame` is the zero-based index of the frame just rendered
    pub fn rendering(&mut self, frame: u64, total_frames: u64) {
        let fraction = if total_frames == 0 {
            0.0
        } else {
            frame as f64 / total_frames as f64
        };
        let mut progress = self.report(ExportPhase::Rendering, (fraction * RENDER_SHARE).round());
        progress.current_frame = Some(frame + 1);
        progress.total_frames = Some(total_frames);
        (self.sink)(progress);
    }

    /// `fraction` is the encoder's own progress in `[0, 1]`
    pub fn encoding(&mut self, fraction: f32) {
        let fraction = f64::from(fraction.clamp(0.0, 1.0));
        let progress = self.report(ExportPhase::Encoding, RENDER_SHARE + (fraction * ENCODE_SHARE).round());
        (self.sink)(progress);
    }

    pub fn compressing(&mut self) {
        let progress = self.report(ExportPhase::Compressing, f64::from(COMPRESS_START));
        (self.sink)(progress);
    }

    pub fn complete(&mut self, original_size: u64, compressed_size: u64) {
        let mut progress = self.report(ExportPhase::Complete, 100.0);
        progress.original_size = Some(original_size);
        progress.compressed_size = Some(compressed_size);
        (self.sink)(progress);
    }

    fn report(&mut self, phase: ExportPhase, percent: f64) -> ExportProgress {
        let percent = (percent.clamp(0.0, 100.0) as u8).max(self.last_percent);
        self.last_percent = percent;
        ExportProgress::new(phase, percent)
    }
}

/// Human-readable byte count: `B`, `KB` (one decimal) or `MB` (two decimals)
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, rc::Rc};

    type Seen = Rc<RefCell<Vec<ExportProgress>>>;

    fn collect() -> (ProgressTracker<impl FnMut(ExportProgress)>, Seen) {
        let seen: Seen = Rc::new(RefCell::new(Vec::new()));
        let sink = {
            let seen = Rc::clone(&seen);
            move |p: ExportProgress| seen.borrow_mut().push(p)
        };
        (ProgressTracker::new(sink), seen)
    }

    #[test]
    fn test_phase_partition() {
        let (mut tracker, seen) = collect();

        tracker.rendering(0, 10);
        tracker.rendering(9, 10);
        tracker.encoding(0.0);
        tracker.encoding(1.0);
        tracker.compressing();
        tracker.complete(2048, 1024);

        let percents: Vec<u8> = seen.borrow().iter().map(|p| p.percent).collect();
        assert_eq!(percents, vec![0, 32, 35, 60, 60, 100]);

        let seen = seen.borrow();
        assert_eq!(seen[1].current_frame, Some(10));
        assert_eq!(seen[1].total_frames, Some(10));
        assert_eq!(seen[5].phase, ExportPhase::Complete);
        assert_eq!(seen[5].compressed_size, Some(1024));
    }

    #[test]
    fn test_percent_never_decreases() {
        let (mut tracker, seen) = collect();

        tracker.encoding(0.8);
        tracker.encoding(0.2);
        tracker.rendering(0, 5);

        let percents: Vec<u8> = seen.borrow().iter().map(|p| p.percent).collect();
        assert_eq!(percents, vec![55, 55, 55]);
        assert_eq!(tracker.last_percent(), 55);
    }

    #[test]
    fn test_zero_frames_does_not_divide_by_zero() {
        let (mut tracker, seen) = collect();
        tracker.rendering(0, 0);
        assert_eq!(seen.borrow()[0].percent, 0);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1024 * 1024), "1.00 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 + 512 * 1024), "5.50 MB");
    }

    #[test]
    fn test_phases_are_ordered() {
        assert!(ExportPhase::Rendering < ExportPhase::Encoding);
        assert!(ExportPhase::Compressing < ExportPhase::Complete);
        assert_eq!(ExportPhase::Compressing.to_string(), "compressing");
    }
}
