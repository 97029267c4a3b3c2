//! Canvas rendering for the campaign graph.
//!
//! Stateless: every frame reads the live simulation nodes in place and draws
//! them. Rendering uses two passes for correct z-ordering:
//! 1. Edges (world space), each stroked by relation category
//! 2. Nodes, then rings and labels on top

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::camera::{Camera, Viewport};
use super::context::DisplaySettings;
use super::highlight::Highlight;
use super::relations::relation_meta;
use super::simulation::{SimNode, Simulation};
use super::theme::{Theme, edge_stroke, node_color};

/// Everything one frame needs, borrowed from the engine.
pub struct Frame<'a> {
	pub sim: &'a Simulation,
	pub camera: &'a Camera,
	pub viewport: &'a Viewport,
	pub highlight: &'a Highlight,
	pub selected: Option<&'a str>,
	pub display: &'a DisplaySettings,
	pub theme: &'a Theme,
}

/// Renders the complete graph to the canvas.
pub fn render(ctx: &CanvasRenderingContext2d, frame: &Frame<'_>) {
	draw_background(ctx, frame);

	let ratio = frame.viewport.ratio();
	let (ox, oy) = frame.viewport.offset();
	ctx.save();
	let _ = ctx.translate(ox, oy);
	let _ = ctx.scale(ratio, ratio);
	let _ = ctx.translate(frame.camera.x, frame.camera.y);
	let _ = ctx.scale(frame.camera.scale, frame.camera.scale);

	draw_edges(ctx, frame);
	draw_nodes(ctx, frame);

	ctx.restore();
	ctx.set_global_alpha(1.0);
}

fn draw_background(ctx: &CanvasRenderingContext2d, frame: &Frame<'_>) {
	let (w, h) = (frame.viewport.width, frame.viewport.height);
	let theme = frame.theme;
	match ctx.create_radial_gradient(w / 2.0, h / 2.0, 0.0, w / 2.0, h / 2.0, w.max(h) * 0.8) {
		Ok(gradient) => {
			let _ = gradient.add_color_stop(0.0, &theme.background_secondary.to_css());
			let _ = gradient.add_color_stop(1.0, &theme.background.to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		Err(_) => ctx.set_fill_style_str(&theme.background.to_css()),
	}
	ctx.fill_rect(0.0, 0.0, w, h);
}

/// Segment between two circles' rims, or `None` when they overlap.
pub fn edge_segment(a: (f64, f64, f64), b: (f64, f64, f64)) -> Option<((f64, f64), (f64, f64))> {
	let (dx, dy) = (b.0 - a.0, b.1 - a.1);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist <= a.2 + b.2 || dist < 0.001 {
		return None;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	Some((
		(a.0 + ux * a.2, a.1 + uy * a.2),
		(b.0 - ux * b.2, b.1 - uy * b.2),
	))
}

/// Arrowhead triangle with its tip at `tip`, pointing along `from -> tip`.
pub fn arrow_head(from: (f64, f64), tip: (f64, f64), size: f64) -> [(f64, f64); 3] {
	let (dx, dy) = (tip.0 - from.0, tip.1 - from.1);
	let dist = (dx * dx + dy * dy).sqrt().max(f64::EPSILON);
	let (ux, uy) = (dx / dist, dy / dist);
	let (bx, by) = (tip.0 - ux * size, tip.1 - uy * size);
	let (px, py) = (-uy * size * 0.5, ux * size * 0.5);
	[tip, (bx + px, by + py), (bx - px, by - py)]
}

fn node_draw_radius(node: &SimNode, display: &DisplaySettings) -> f64 {
	node.radius * display.node_scale
}

fn draw_edges(ctx: &CanvasRenderingContext2d, frame: &Frame<'_>) {
	let nodes = frame.sim.nodes();
	let k = frame.camera.scale;

	for link in frame.sim.links() {
		let (Some(s), Some(t)) = (nodes.get(link.source), nodes.get(link.target)) else {
			continue;
		};
		let (rs, rt) = (
			node_draw_radius(s, frame.display),
			node_draw_radius(t, frame.display),
		);
		let Some((start, end)) = edge_segment((s.x, s.y, rs), (t.x, t.y, rt)) else {
			continue;
		};

		let meta = relation_meta(&link.kind);
		let stroke = edge_stroke(meta.category);
		let opacity = frame.highlight.edge_opacity(&s.id, &t.id);
		let focused = frame.highlight.is_focus_edge(&s.id, &t.id);
		let emphasis = if focused { 1.6 } else { 1.0 };
		let width = stroke.width * emphasis / k;

		ctx.set_global_alpha(opacity);
		ctx.set_stroke_style_str(&stroke.color.to_css());
		ctx.set_line_width(width);
		match stroke.dash {
			Some((dash, gap)) => {
				let _ = ctx.set_line_dash(&js_sys::Array::of2(
					&JsValue::from_f64(dash),
					&JsValue::from_f64(gap),
				));
			}
			None => {
				let _ = ctx.set_line_dash(&js_sys::Array::new());
			}
		}

		let show_arrow = meta.directional && frame.display.show_arrows;
		let arrow_size = 7.0 / k.max(0.5);
		let line_end = if show_arrow {
			let back = edge_segment((start.0, start.1, 0.0), (end.0, end.1, arrow_size));
			back.map(|(_, e)| e).unwrap_or(end)
		} else {
			end
		};

		ctx.begin_path();
		ctx.move_to(start.0, start.1);
		ctx.line_to(line_end.0, line_end.1);
		ctx.stroke();

		if show_arrow {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
			let [tip, left, right] = arrow_head(start, end, arrow_size);
			ctx.set_fill_style_str(&stroke.color.to_css());
			ctx.begin_path();
			ctx.move_to(tip.0, tip.1);
			ctx.line_to(left.0, left.1);
			ctx.line_to(right.0, right.1);
			ctx.close_path();
			ctx.fill();
		}

		if focused && frame.display.show_relation_labels {
			let (mx, my) = ((start.0 + end.0) / 2.0, (start.1 + end.1) / 2.0);
			ctx.set_fill_style_str(&frame.theme.label.to_css());
			ctx.set_font(&format!("{}px sans-serif", frame.theme.label_size * 0.85 / k.max(0.6)));
			ctx.set_text_align("center");
			let _ = ctx.fill_text(&meta.label, mx, my - 4.0 / k);
			ctx.set_text_align("start");
		}
	}

	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(ctx: &CanvasRenderingContext2d, frame: &Frame<'_>) {
	let k = frame.camera.scale;
	let focus = frame.highlight.focus.as_deref();

	for node in frame.sim.nodes() {
		let radius = node_draw_radius(node, frame.display);
		let alpha = frame.highlight.node_opacity(&node.id);
		let color = node_color(node.node_type);

		ctx.set_global_alpha(alpha);
		match ctx.create_radial_gradient(
			node.x - radius * 0.3,
			node.y - radius * 0.3,
			0.0,
			node.x,
			node.y,
			radius,
		) {
			Ok(gradient) => {
				let _ = gradient.add_color_stop(0.0, &color.lighten(0.4).to_css());
				let _ = gradient.add_color_stop(0.7, &color.to_css());
				let _ = gradient.add_color_stop(1.0, &color.darken(0.2).to_css());
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
			}
			Err(_) => ctx.set_fill_style_str(&color.to_css()),
		}
		ctx.begin_path();
		let _ = ctx.arc(node.x, node.y, radius, 0.0, 2.0 * PI);
		ctx.fill();

		let ring = if frame.selected == Some(node.id.as_str()) {
			Some(frame.theme.selection_ring)
		} else if focus == Some(node.id.as_str()) {
			Some(frame.theme.focus_ring)
		} else {
			None
		};
		if let Some(ring) = ring {
			ctx.begin_path();
			let _ = ctx.arc(node.x, node.y, radius + 3.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&ring.to_css());
			ctx.set_line_width(2.0 / k);
			ctx.stroke();
		}

		if frame.display.show_labels && alpha > 0.3 {
			ctx.set_fill_style_str(&frame.theme.label.to_css());
			ctx.set_font(&format!("{}px sans-serif", frame.theme.label_size / k.max(0.6)));
			let _ = ctx.fill_text(&node.label, node.x + radius + 4.0 / k, node.y + 4.0 / k);
		}
	}
	ctx.set_global_alpha(1.0);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn segments_stop_at_node_rims() {
		let (start, end) = edge_segment((0.0, 0.0, 5.0), (100.0, 0.0, 10.0)).unwrap();
		assert!((start.0 - 5.0).abs() < 1e-9 && start.1.abs() < 1e-9);
		assert!((end.0 - 90.0).abs() < 1e-9 && end.1.abs() < 1e-9);
	}

	#[test]
	fn overlapping_nodes_draw_no_segment() {
		assert!(edge_segment((0.0, 0.0, 10.0), (15.0, 0.0, 10.0)).is_none());
		assert!(edge_segment((3.0, 3.0, 0.0), (3.0, 3.0, 0.0)).is_none());
	}

	#[test]
	fn arrow_points_back_along_the_edge() {
		let [tip, left, right] = arrow_head((0.0, 0.0), (10.0, 0.0), 4.0);
		assert_eq!(tip, (10.0, 0.0));
		assert!((left.0 - 6.0).abs() < 1e-9 && (right.0 - 6.0).abs() < 1e-9);
		assert!((left.1 - 2.0).abs() < 1e-9 && (right.1 + 2.0).abs() < 1e-9);
	}
}
