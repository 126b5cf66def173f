use crate::config::Config;

use super::{
    steps::{generate_steps, truncate_chars},
    AnimationStep, BACKGROUND_MS_PER_TICK, CURSOR_BLINK_MS, DELETE_SPEED_FACTOR,
};

/// What should be on screen at one instant
///
/// Produced fresh for every query, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameState {
    pub text: String,
    pub cursor_visible: bool,
    pub background_tick: u64,
}

/// Duration of one step in milliseconds
pub fn step_duration_ms(step: &AnimationStep, ms_per_char: f64) -> f64 {
    match step {
        AnimationStep::Type { text }
        | AnimationStep::Append { text }
        | AnimationStep::Prepend { text } => text.chars().count() as f64 * ms_per_char,
        AnimationStep::Delete { count } => *count as f64 * ms_per_char * DELETE_SPEED_FACTOR,
        AnimationStep::Pause { duration } => *duration as f64,
    }
}

/// Total duration of a step sequence in milliseconds
pub fn total_duration_ms(steps: &[AnimationStep], speed: u32) -> f64 {
    steps
        .iter()
        .map(|step| step_duration_ms(step, speed as f64))
        .sum()
}

/// Time-addressable view over a step sequence
///
/// There is exactly one interpolator: frame-indexed queries are converted to
/// milliseconds and answered by the same code path as time-indexed ones, so
/// preview and export can never disagree on content.
#[derive(Debug, Clone)]
pub struct Timeline {
    steps: Vec<AnimationStep>,
    ms_per_char: f64,
    total_ms: f64,
}

impl Timeline {
    /// Build a timeline for `steps` typed at `speed` milliseconds per character
    pub fn new(steps: Vec<AnimationStep>, speed: u32) -> Self {
        let total_ms = total_duration_ms(&steps, speed);
        Self {
            steps,
            ms_per_char: speed as f64,
            total_ms,
        }
    }

    /// Generate steps from a configuration and wrap them
    pub fn from_config(config: &Config) -> Self {
        Self::new(generate_steps(config), config.speed)
    }

    pub fn steps(&self) -> &[AnimationStep] {
        &self.steps
    }

    pub fn ms_per_char(&self) -> f64 {
        self.ms_per_char
    }

    pub fn total_ms(&self) -> f64 {
        self.total_ms
    }

    /// Number of frames needed to cover the whole timeline at `fps`
    pub fn frame_count(&self, fps: f64) -> u64 {
        if fps <= 0.0 {
            return 0;
        }
        (self.total_ms / 1000.0 * fps).ceil() as u64
    }

    /// Time-indexed query
    pub fn at_ms(&self, elapsed_ms: f64) -> FrameState {
        let position = self.clamp(elapsed_ms);
        FrameState {
            text: self.text_at(position),
            cursor_visible: self.settled_bucket(position, CURSOR_BLINK_MS) % 2 == 0,
            background_tick: self.settled_bucket(position, BACKGROUND_MS_PER_TICK),
        }
    }

    /// Frame-indexed query at a fixed frame rate
    ///
    /// The background tick is the literal frame index.
    pub fn at_frame(&self, frame: u64, fps: u32) -> FrameState {
        let fps = fps.max(1) as f64;
        let position = self.clamp(frame as f64 * 1000.0 / fps);
        FrameState {
            text: self.text_at(position),
            cursor_visible: self.settled_bucket(position, CURSOR_BLINK_MS) % 2 == 0,
            background_tick: frame,
        }
    }

    /// Cursor blink, independent of typing speed
    pub fn cursor_visible_at(position_ms: f64) -> bool {
        let position = if position_ms.is_finite() { position_ms.max(0.0) } else { 0.0 };
        (position / CURSOR_BLINK_MS).floor() as u64 % 2 == 0
    }

    /// Materialized text at `position_ms`
    pub fn text_at(&self, position_ms: f64) -> String {
        let position = self.clamp(position_ms);
        let mut text = String::new();
        let mut start = 0.0;

        for step in &self.steps {
            let duration = step_duration_ms(step, self.ms_per_char);

            if duration > 0.0 && position < start + duration {
                self.apply_partial(step, position - start, &mut text);
                return text;
            }

            step.apply(&mut text);
            start += duration;
        }

        text
    }

    fn apply_partial(&self, step: &AnimationStep, progress: f64, text: &mut String) {
        match step {
            AnimationStep::Type { text: typed } | AnimationStep::Append { text: typed } => {
                let revealed = Self::revealed(progress, self.ms_per_char, typed.chars().count());
                text.extend(typed.chars().take(revealed));
            }
            AnimationStep::Delete { count } => {
                let per_char = self.ms_per_char * DELETE_SPEED_FACTOR;
                let removed = Self::revealed(progress, per_char, *count);
                let keep = text.chars().count().saturating_sub(removed);
                truncate_chars(text, keep);
            }
            AnimationStep::Prepend { text: prefix } => {
                let total = prefix.chars().count();
                let revealed = Self::revealed(progress, self.ms_per_char, total);
                let visible: String = prefix.chars().skip(total - revealed).collect();
                text.insert_str(0, &visible);
            }
            AnimationStep::Pause { .. } => {}
        }
    }

    /// `floor(progress / unit) + 1`, clamped to `limit`
    fn revealed(progress: f64, unit: f64, limit: usize) -> usize {
        let count = (progress / unit).floor() as usize + 1;
        count.min(limit)
    }

    /// Index of the `unit`-wide bucket containing `position`
    ///
    /// The end of the timeline belongs to the last bucket before it, so the
    /// settled tail reports the same cursor phase and tick as its final instant.
    fn settled_bucket(&self, position: f64, unit: f64) -> u64 {
        if self.total_ms > 0.0 && position >= self.total_ms {
            return ((self.total_ms / unit).ceil() as u64).saturating_sub(1);
        }
        (position / unit).floor() as u64
    }

    fn clamp(&self, position_ms: f64) -> f64 {
        if position_ms.is_nan() {
            return 0.0;
        }
        position_ms.clamp(0.0, self.total_ms)
    }
}

/// Frame-indexed adapter over a bare step list
pub fn interpolate(steps: &[AnimationStep], frame: u64, speed: u32, fps: u32) -> FrameState {
    Timeline::new(steps.to_vec(), speed).at_frame(frame, fps)
}

/// Time-indexed adapter over a bare step list
pub fn interpolate_at_time(steps: &[AnimationStep], elapsed_ms: f64, speed: u32) -> FrameState {
    Timeline::new(steps.to_vec(), speed).at_ms(elapsed_ms)
}
