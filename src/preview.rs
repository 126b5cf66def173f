//! Real-time preview loop
//!
//! A tokio task polls a monotonic clock and renders a frame whenever at
//! least `1000 / PREVIEW_FPS` ms have passed, so playback speed does not
//! depend on how often the task gets scheduled. Each loop owns its own
//! [`BackgroundState`]; a stopped loop never touches it again.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use image::RgbaImage;
use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    animation::{FrameState, Timeline},
    backgrounds::BackgroundState,
    config::Config,
    render::{FontBook, FrameCompositor},
};

/// Fixed preview frame rate
pub const PREVIEW_FPS: u32 = 15;

/// How often the loop checks the clock
pub const POLL_INTERVAL: Duration = Duration::from_millis(4);

/// One rendered preview frame
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub index: u64,
    pub total_frames: u64,
    pub state: FrameState,
    pub image: RgbaImage,
}

type Sink = Arc<Mutex<Box<dyn FnMut(PreviewFrame) + Send>>>;

/// State shared between a handle and its running loop
struct Shared {
    running: AtomicBool,
    playing: AtomicBool,
    frame: AtomicU64,
    total_frames: AtomicU64,
}

impl Shared {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            running: AtomicBool::new(true),
            playing: AtomicBool::new(true),
            frame: AtomicU64::new(0),
            total_frames: AtomicU64::new(0),
        })
    }
}

pub struct PreviewLoop;

impl PreviewLoop {
    /// Start a preview loop on the current tokio runtime
    pub fn spawn<S>(config: Config, fonts: Arc<FontBook>, sink: S) -> PreviewHandle
    where
        S: FnMut(PreviewFrame) + Send + 'static,
    {
        let sink: Sink = Arc::new(Mutex::new(Box::new(sink)));
        PreviewHandle::start(config, fonts, sink)
    }
}

/// Controls a running preview loop; dropping it stops the loop
pub struct PreviewHandle {
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
    fonts: Arc<FontBook>,
    sink: Sink,
}

impl PreviewHandle {
    fn start(config: Config, fonts: Arc<FontBook>, sink: Sink) -> Self {
        let shared = Shared::new();
        let config = config.sanitized();
        let timeline = Timeline::from_config(&config);
        shared
            .total_frames
            .store(timeline.frame_count(f64::from(PREVIEW_FPS)), Ordering::Release);

        let task = tokio::spawn(run(
            config,
            timeline,
            Arc::clone(&fonts),
            Arc::clone(&sink),
            Arc::clone(&shared),
        ));

        Self {
            shared,
            task: Some(task),
            fonts,
            sink,
        }
    }

    /// Stop the loop; no frame reaches the sink after this returns
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(task) = self.task.take() {
            task.abort();
            // Wait out a delivery already in flight; the loop re-checks `running` under this lock
            drop(self.sink.lock());
            debug!("Preview loop stopped");
        }
    }

    /// Replace the configuration: the old loop stops and a fresh one starts at frame 0
    pub fn restart(&mut self, config: Config) {
        self.stop();
        *self = Self::start(config, Arc::clone(&self.fonts), Arc::clone(&self.sink));
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn set_playing(&self, playing: bool) {
        self.shared.playing.store(playing, Ordering::Release);
    }

    pub fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Acquire)
    }

    /// Index of the next frame to render
    pub fn current_frame(&self) -> u64 {
        self.shared.frame.load(Ordering::Acquire)
    }

    pub fn total_frames(&self) -> u64 {
        self.shared.total_frames.load(Ordering::Acquire)
    }

    /// Jump to `frame`, clamped to the last frame
    pub fn seek(&self, frame: u64) {
        let last = self.total_frames().saturating_sub(1);
        self.shared.frame.store(frame.min(last), Ordering::Release);
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(config: Config, timeline: Timeline, fonts: Arc<FontBook>, sink: Sink, shared: Arc<Shared>) {
    let (width, height) = (config.background.width, config.background.height);
    let total_frames = shared.total_frames.load(Ordering::Acquire);
    if total_frames == 0 {
        info!("Nothing to preview");
        shared.running.store(false, Ordering::Release);
        return;
    }

    let mut compositor = match FrameCompositor::from_config(&config, fonts) {
        Ok(compositor) => compositor,
        Err(e) => {
            warn!("Preview unavailable: {}", e);
            shared.running.store(false, Ordering::Release);
            return;
        }
    };
    let mut background = BackgroundState::new(config.background.kind, width, height, config.background.seed);

    let frame_interval = Duration::from_secs_f64(1.0 / f64::from(PREVIEW_FPS));
    let mut ticker = time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_frame = Instant::now();

    debug!("Preview loop started: {} frames at {} fps", total_frames, PREVIEW_FPS);

    while shared.running.load(Ordering::Acquire) {
        ticker.tick().await;

        if !shared.running.load(Ordering::Acquire) {
            break;
        }
        if !shared.playing.load(Ordering::Acquire) {
            last_frame = Instant::now();
            continue;
        }
        if last_frame.elapsed() < frame_interval {
            continue;
        }
        last_frame = Instant::now();

        let index = shared.frame.load(Ordering::Acquire);
        background.step(width, height);
        let state = timeline.at_frame(index, PREVIEW_FPS);

        match compositor.compose(&state, Some(&background)) {
            Ok(image) => {
                let frame = PreviewFrame {
                    index,
                    total_frames,
                    state,
                    image: image.clone(),
                };
                match sink.lock() {
                    Ok(mut present) => {
                        if !shared.running.load(Ordering::Acquire) {
                            break;
                        }
                        (*present)(frame)
                    }
                    Err(_) => {
                        warn!("Preview sink poisoned, stopping");
                        break;
                    }
                }
            }
            Err(e) => warn!("Preview frame {} failed: {}", index, e),
        }

        // A concurrent seek wins over the automatic advance
        let _ = shared.frame.compare_exchange(
            index,
            (index + 1) % total_frames,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    shared.running.store(false, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationStep;

    fn silent_config(pause_ms: u64) -> Config {
        let mut config = Config::default();
        config.script = Some(vec![
            AnimationStep::type_text(""),
            AnimationStep::Pause { duration: pause_ms },
        ]);
        config.background.width = 24;
        config.background.height = 12;
        config.background.seed = Some(3);
        config
    }

    fn recorder() -> (Arc<Mutex<Vec<u64>>>, impl FnMut(PreviewFrame) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            move |frame: PreviewFrame| seen.lock().unwrap().push(frame.index)
        };
        (seen, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_advance_at_preview_rate_and_wrap() {
        let (seen, sink) = recorder();
        // 200ms at 15 fps is 3 frames
        let mut handle = PreviewLoop::spawn(silent_config(200), Arc::new(FontBook::empty()), sink);
        assert_eq!(handle.total_frames(), 3);

        time::sleep(Duration::from_millis(500)).await;
        handle.stop();

        let seen = seen.lock().unwrap().clone();
        assert!(seen.len() >= 5 && seen.len() <= 8, "rendered {} frames", seen.len());
        assert_eq!(&seen[..5], &[0, 1, 2, 0, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_immediate() {
        let (seen, sink) = recorder();
        let mut handle = PreviewLoop::spawn(silent_config(1000), Arc::new(FontBook::empty()), sink);

        time::sleep(Duration::from_millis(200)).await;
        handle.stop();
        assert!(!handle.is_running());
        let count = seen.lock().unwrap().len();

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(seen.lock().unwrap().len(), count);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_holds_the_frame() {
        let (seen, sink) = recorder();
        let handle = PreviewLoop::spawn(silent_config(1000), Arc::new(FontBook::empty()), sink);

        handle.set_playing(false);
        time::sleep(Duration::from_millis(300)).await;
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(handle.current_frame(), 0);

        handle.set_playing(true);
        time::sleep(Duration::from_millis(300)).await;
        assert!(!seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_to_first_frame() {
        let (seen, sink) = recorder();
        let mut handle = PreviewLoop::spawn(silent_config(1000), Arc::new(FontBook::empty()), sink);

        time::sleep(Duration::from_millis(400)).await;
        handle.restart(silent_config(2000));
        assert_eq!(handle.current_frame(), 0);
        assert_eq!(handle.total_frames(), 30);

        seen.lock().unwrap().clear();
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(seen.lock().unwrap().first(), Some(&0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_restart_waits_for_in_flight_frame() {
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let seen = Arc::new(Mutex::new(Vec::new()));

        // The first frame parks inside the sink until released
        let sink = {
            let seen = Arc::clone(&seen);
            let mut first = true;
            move |frame: PreviewFrame| {
                seen.lock().unwrap().push(frame.total_frames);
                if first {
                    first = false;
                    entered_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                }
            }
        };

        let handle = PreviewLoop::spawn(silent_config(1000), Arc::new(FontBook::empty()), sink);
        assert_eq!(handle.total_frames(), 15);
        tokio::task::spawn_blocking(move || entered_rx.recv_timeout(Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();

        let restart = tokio::task::spawn_blocking(move || {
            let mut handle = handle;
            handle.restart(silent_config(2000));
            handle
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!restart.is_finished());
        release_tx.send(()).unwrap();

        let mut handle = restart.await.unwrap();
        assert_eq!(handle.total_frames(), 30);

        tokio::time::sleep(Duration::from_millis(300)).await;
        handle.stop();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen[0], 15);
        assert!(seen.len() > 1, "restarted loop never delivered");
        assert!(seen[1..].iter().all(|&total| total == 30), "stale frames: {:?}", seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_is_clamped() {
        let (_seen, sink) = recorder();
        let handle = PreviewLoop::spawn(silent_config(1000), Arc::new(FontBook::empty()), sink);
        handle.set_playing(false);

        handle.seek(1000);
        assert_eq!(handle.current_frame(), handle.total_frames() - 1);
    }
}
