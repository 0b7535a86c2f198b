/// Match geometry and rules
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MatchConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub paddle_width: f64,
    pub paddle_height: f64,
    /// Distance from each side wall to the paddle's outer edge
    pub paddle_offset: f64,
    pub ball_radius: f64,
    /// Paddle travel per move command
    pub paddle_speed: f64,
    pub serve_vx: f64,
    pub serve_vy: f64,
    /// Max vertical velocity added by an edge hit on a paddle
    pub spin_factor: f64,
    pub winning_score: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 600.0,
            paddle_width: 15.0,
            paddle_height: 100.0,
            paddle_offset: 50.0,
            ball_radius: 10.0,
            paddle_speed: 8.0,
            serve_vx: 5.0,
            serve_vy: 3.0,
            spin_factor: 5.0,
            winning_score: 5,
        }
    }
}

impl MatchConfig {
    /// Highest legal paddle top edge
    pub fn paddle_max_y(&self) -> f64 {
        self.canvas_height - self.paddle_height
    }

    /// Starting top edge for both paddles (vertically centered)
    pub fn paddle_start_y(&self) -> f64 {
        self.paddle_max_y() / 2.0
    }

    pub fn validate(&self) -> Result<(), String> {
        let dims = [
            ("canvas_width", self.canvas_width),
            ("canvas_height", self.canvas_height),
            ("paddle_width", self.paddle_width),
            ("paddle_height", self.paddle_height),
            ("ball_radius", self.ball_radius),
            ("paddle_speed", self.paddle_speed),
        ];
        for (name, value) in dims {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{} must be finite and > 0", name));
            }
        }
        if !self.paddle_offset.is_finite() || self.paddle_offset < 0.0 {
            return Err("paddle_offset must be finite and >= 0".to_string());
        }
        if self.paddle_height > self.canvas_height {
            return Err("paddle_height must be <= canvas_height".to_string());
        }
        if 2.0 * (self.paddle_offset + self.paddle_width) >= self.canvas_width {
            return Err("paddles must not overlap horizontally".to_string());
        }
        if !self.serve_vx.is_finite() || self.serve_vx == 0.0 {
            return Err("serve_vx must be finite and non-zero".to_string());
        }
        if !self.serve_vy.is_finite() || !self.spin_factor.is_finite() {
            return Err("serve_vy and spin_factor must be finite".to_string());
        }
        if self.winning_score == 0 {
            return Err("winning_score must be >= 1".to_string());
        }
        Ok(())
    }
}
