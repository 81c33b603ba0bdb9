/// Per-frame counters plus a frames-per-second estimate refreshed once per
/// second of wall time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub frames: u64,
    /// Physics steps run during the last frame.
    pub last_steps: u32,
    pub total_steps: u64,
    pub shapes_drawn: usize,
    pub shapes_skipped: usize,
    fps: f32,
    window_time: f32,
    window_frames: u32,
}

impl FrameStats {
    const WINDOW_SECONDS: f32 = 1.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Count one frame of `wall_dt` seconds that ran `steps` physics steps.
    pub fn record_frame(&mut self, wall_dt: f32, steps: u32) {
        self.frames += 1;
        self.last_steps = steps;
        self.total_steps += steps as u64;

        if wall_dt.is_finite() && wall_dt > 0.0 {
            self.window_time += wall_dt;
        }
        self.window_frames += 1;
        if self.window_time >= Self::WINDOW_SECONDS {
            self.fps = self.window_frames as f32 / self.window_time;
            self.window_time = 0.0;
            self.window_frames = 0;
        }
    }

    /// Frames per second over the last completed window; zero until the
    /// first window closes.
    pub fn fps(&self) -> f32 {
        self.fps
    }
}
