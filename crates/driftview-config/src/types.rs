use serde::{Deserialize, Serialize};

/// Smallest allowed zoom (pixels per meter).
pub const MIN_SCALE: f32 = 5.0;
/// Largest allowed zoom (pixels per meter).
pub const MAX_SCALE: f32 = 500.0;

/// Zoom used when none is configured or the configured one is NaN.
pub const DEFAULT_SCALE: f32 = 50.0;

/// Clamp a zoom value into `[MIN_SCALE, MAX_SCALE]`. NaN maps to `DEFAULT_SCALE`.
pub fn clamp_scale(scale: f32) -> f32 {
    if scale.is_nan() {
        return DEFAULT_SCALE;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// An RGBA color with components in `0.0..=1.0`.
pub type Rgba = [f32; 4];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Sensor and pose feed connection.
    pub feed: FeedConfig,
    /// Pan/zoom defaults.
    pub viewport: ViewportConfig,
    /// Stroke widths and colors.
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// `host:port` of the companion device streaming sensor and pose packets.
    pub address: String,
    /// Give up on the connection after this long and fall back to a mock feed.
    pub connect_timeout_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:5760".to_string(),
            connect_timeout_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Zoom at startup in pixels per meter. Written back on exit.
    pub initial_scale: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            initial_scale: DEFAULT_SCALE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// On-screen grid line width in pixels, independent of zoom.
    pub grid_stroke_px: f32,
    /// On-screen path width in pixels, independent of zoom.
    pub path_stroke_px: f32,
    /// Origin marker radius in meters.
    pub marker_radius_m: f32,
    pub background_color: Rgba,
    pub grid_color: Rgba,
    /// Dead-reckoning path.
    pub inertial_color: Rgba,
    /// Visual-inertial tracker path.
    pub pose_color: Rgba,
    pub marker_color: Rgba,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            grid_stroke_px: 2.0,
            path_stroke_px: 5.0,
            marker_radius_m: 0.1,
            background_color: [1.0, 1.0, 1.0, 1.0],
            grid_color: [0.867, 0.867, 0.867, 1.0],
            inertial_color: [0.0, 0.0, 1.0, 1.0],
            pose_color: [1.0, 0.0, 0.0, 1.0],
            marker_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}
