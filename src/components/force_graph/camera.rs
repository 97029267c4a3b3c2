//! Camera transform and viewport fitting.
//!
//! All interaction math runs in a fixed logical canvas of
//! [`VIRTUAL_WIDTH`] x [`VIRTUAL_HEIGHT`] units. The [`Viewport`] maps that
//! logical canvas onto however many device pixels the element actually has,
//! so nothing here depends on DOM layout.
//!
//! # Coordinate Spaces
//!
//! - **Screen**: logical canvas units, after the viewport fit has been undone.
//! - **World**: simulation coordinates. `screen = world * scale + offset`.

/// Logical canvas width.
pub const VIRTUAL_WIDTH: f64 = 1600.0;
/// Logical canvas height.
pub const VIRTUAL_HEIGHT: f64 = 900.0;

/// Smallest allowed zoom factor.
pub const MIN_SCALE: f64 = 0.3;
/// Largest allowed zoom factor.
pub const MAX_SCALE: f64 = 3.0;

const ZOOM_STEP: f64 = 0.05;
const FOCUS_SCALE: f64 = 1.2;

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
	pub x: f64,
	pub y: f64,
	/// Zoom factor, always within `[MIN_SCALE, MAX_SCALE]`.
	pub scale: f64,
}

impl Default for Camera {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			scale: 1.0,
		}
	}
}

/// Convert a screen point to world coordinates.
pub fn screen_to_world(sx: f64, sy: f64, camera: &Camera) -> (f64, f64) {
	(
		(sx - camera.x) / camera.scale,
		(sy - camera.y) / camera.scale,
	)
}

/// Convert a world point to screen coordinates.
pub fn world_to_screen(wx: f64, wy: f64, camera: &Camera) -> (f64, f64) {
	(wx * camera.scale + camera.x, wy * camera.scale + camera.y)
}

/// Clamp a zoom factor into the allowed range.
pub fn clamp_scale(scale: f64) -> f64 {
	if scale.is_nan() {
		return 1.0;
	}
	scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// Zoom one wheel notch around a screen point.
///
/// The world point under `(screen_x, screen_y)` stays under it afterwards.
/// Positive `wheel_delta_y` (scrolling down) zooms out.
pub fn zoom_at_point(camera: &Camera, screen_x: f64, screen_y: f64, wheel_delta_y: f64) -> Camera {
	let factor = if wheel_delta_y > 0.0 {
		1.0 - ZOOM_STEP
	} else if wheel_delta_y < 0.0 {
		1.0 + ZOOM_STEP
	} else {
		return *camera;
	};
	let scale = clamp_scale(camera.scale * factor);
	let (wx, wy) = screen_to_world(screen_x, screen_y, camera);
	Camera {
		x: screen_x - wx * scale,
		y: screen_y - wy * scale,
		scale,
	}
}

/// Center the viewport on a world point, zooming in to at least 1.2x.
pub fn center_camera_on(
	camera: &Camera,
	world_x: f64,
	world_y: f64,
	viewport_w: f64,
	viewport_h: f64,
) -> Camera {
	let scale = clamp_scale(camera.scale.max(FOCUS_SCALE));
	Camera {
		x: viewport_w / 2.0 - world_x * scale,
		y: viewport_h / 2.0 - world_y * scale,
		scale,
	}
}

/// Uniform "meet" fit of the logical canvas into an element of `width` x `height` pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

impl Viewport {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			width: width.max(1.0),
			height: height.max(1.0),
		}
	}

	/// Pixels per logical unit.
	pub fn ratio(&self) -> f64 {
		(self.width / VIRTUAL_WIDTH).min(self.height / VIRTUAL_HEIGHT)
	}

	/// Pixel offset of the logical canvas' top-left corner (letterboxing).
	pub fn offset(&self) -> (f64, f64) {
		let r = self.ratio();
		(
			(self.width - VIRTUAL_WIDTH * r) / 2.0,
			(self.height - VIRTUAL_HEIGHT * r) / 2.0,
		)
	}

	/// Map element-local pixel coordinates to logical screen coordinates.
	pub fn to_logical(&self, px: f64, py: f64) -> (f64, f64) {
		let r = self.ratio();
		let (ox, oy) = self.offset();
		((px - ox) / r, (py - oy) / r)
	}
}
