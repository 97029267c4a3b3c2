//! Leptos component wrapping the campaign graph canvas.
//!
//! The component creates an HTML canvas element and wires up pointer/wheel
//! event handlers for node dragging, panning, hovering and zooming. An
//! animation loop runs via `requestAnimationFrame`, ticking the active
//! simulation every frame and rendering at most ~30 times per second.
//!
//! All mutable engine state lives in one `GraphEngine` behind
//! `Rc<RefCell<Option<_>>>`. Handlers borrow it, then write reactive state
//! (focus, selection, positions) only after the borrow is released.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::html::Canvas;
use leptos::prelude::*;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, PointerEvent, WheelEvent, Window,
};

use super::camera::{
	Camera, VIRTUAL_HEIGHT, VIRTUAL_WIDTH, Viewport, center_camera_on, screen_to_world, zoom_at_point,
};
use super::context::{DisplaySettings, GraphContext, use_graph_context};
use super::highlight::{Adjacency, Highlight, compute_adjacency};
use super::interaction::{GestureEnd, Interaction, InteractionConfig, RenderThrottle, hit_test};
use super::render::{self, Frame};
use super::simulation::{PhysicsConfig, SimEvent, SimulationManager, SimulationTuning};
use super::theme::{Theme, node_radius};
use super::types::{GraphData, GraphLink, NodePositions, ViewMode};

/// Simulation, camera and gesture state for one mounted canvas.
struct GraphEngine {
	manager: SimulationManager,
	camera: Camera,
	viewport: Viewport,
	interaction: Interaction,
	throttle: RenderThrottle,
	highlight: Highlight,
	adjacency: Adjacency,
	/// Visible links, kept for highlight recomputation on focus changes.
	links: Vec<GraphLink>,
	display: DisplaySettings,
	selected: Option<String>,
	theme: Theme,
}

impl GraphEngine {
	fn new(viewport: Viewport, display: DisplaySettings, selected: Option<String>) -> Self {
		let config = InteractionConfig::default();
		Self {
			manager: SimulationManager::new(SimulationTuning::default()),
			camera: Camera::default(),
			viewport,
			interaction: Interaction::new(config),
			throttle: RenderThrottle::new(config.render_interval_ms),
			highlight: Highlight::default(),
			adjacency: Adjacency::new(),
			links: Vec::new(),
			display,
			selected,
			theme: Theme::default(),
		}
	}

	/// Replace the simulation for new data, physics or view mode.
	fn rebuild(&mut self, data: &GraphData, physics: PhysicsConfig, mode: ViewMode, cached: &NodePositions) {
		if let Some(sim) = self.manager.active_mut() {
			self.interaction.end(sim);
		}
		self.manager
			.start(data, physics, mode, cached, |n| node_radius(n.degree));
		self.links = data.links.clone();
		self.adjacency = compute_adjacency(&self.links);
		let focus = self.highlight.focus.take();
		self.highlight = Highlight::compute(focus.as_deref(), &self.links);
		self.throttle.mark_dirty();
		info!(
			"campaign-graph: simulation rebuilt ({mode:?}, {} nodes, {} links)",
			data.nodes.len(),
			data.links.len()
		);
	}

	fn set_focus(&mut self, focus: Option<&str>) {
		if self.highlight.focus.as_deref() == focus {
			return;
		}
		self.highlight = Highlight::compute(focus, &self.links);
		self.throttle.mark_dirty();
	}

	/// Topmost node under a logical screen point.
	fn node_at(&self, sx: f64, sy: f64) -> Option<String> {
		let sim = self.manager.active()?;
		let (wx, wy) = screen_to_world(sx, sy, &self.camera);
		hit_test(sim, wx, wy, self.display.node_scale, self.interaction.config.hit_slop)
	}

	fn begin_drag(&mut self, node_id: &str, sx: f64, sy: f64) -> bool {
		let Some(sim) = self.manager.active_mut() else {
			return false;
		};
		self.interaction
			.begin_drag(sim, &self.camera, &self.adjacency, node_id, sx, sy)
	}

	fn pointer_move(&mut self, sx: f64, sy: f64) {
		let Some(sim) = self.manager.active_mut() else {
			return;
		};
		if self.interaction.pointer_move(sim, &mut self.camera, sx, sy) {
			self.throttle.mark_dirty();
		}
	}

	/// End the current gesture. Returns the layout to persist after a drag.
	fn end_gesture(&mut self) -> Option<NodePositions> {
		let sim = self.manager.active_mut()?;
		match self.interaction.end(sim) {
			GestureEnd::Drag(_) => Some(sim.positions()),
			GestureEnd::Pan | GestureEnd::None => None,
		}
	}

	fn zoom_to(&mut self, node_id: &str) {
		let Some(node) = self.manager.active().and_then(|sim| sim.node(node_id)) else {
			return;
		};
		self.camera = center_camera_on(&self.camera, node.x, node.y, VIRTUAL_WIDTH, VIRTUAL_HEIGHT);
		self.throttle.mark_dirty();
	}

	/// Advance one animation frame. Returns the layout when the simulation settles.
	fn frame(&mut self, ctx: &CanvasRenderingContext2d, now: f64) -> Option<NodePositions> {
		let sim = self.manager.active_mut()?;
		let event = sim.tick();
		let settled = (event == Some(SimEvent::End)).then(|| sim.positions());

		if self.throttle.should_render(now, event.is_some()) {
			self.draw(ctx);
		}
		settled
	}

	fn draw(&self, ctx: &CanvasRenderingContext2d) {
		let Some(sim) = self.manager.active() else {
			return;
		};
		render::render(
			ctx,
			&Frame {
				sim,
				camera: &self.camera,
				viewport: &self.viewport,
				highlight: &self.highlight,
				selected: self.selected.as_deref(),
				display: &self.display,
				theme: &self.theme,
			},
		);
	}

	/// End any gesture and stop the simulation. The layout is not saved here:
	/// positions persist only on settle or drag release.
	fn teardown(&mut self) {
		if let Some(sim) = self.manager.active_mut() {
			self.interaction.end(sim);
		}
		if let Some(layout) = self.manager.teardown() {
			debug!("campaign-graph: discarding {} unsettled positions on unmount", layout.len());
		}
	}
}

type Engine = Rc<RefCell<Option<GraphEngine>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;
type ResizeCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn window_size(window: &Window) -> (f64, f64) {
	let dim = |v: Result<JsValue, JsValue>, fallback: f64| {
		v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	(
		dim(window.inner_width(), VIRTUAL_WIDTH),
		dim(window.inner_height(), VIRTUAL_HEIGHT),
	)
}

fn element_size(canvas: &HtmlCanvasElement, width: Option<f64>, height: Option<f64>) -> (f64, f64) {
	let parent = canvas.parent_element();
	(
		width.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_width() as f64)
				.filter(|w| *w > 0.0)
				.unwrap_or(VIRTUAL_WIDTH)
		}),
		height.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_height() as f64)
				.filter(|h| *h > 0.0)
				.unwrap_or(VIRTUAL_HEIGHT)
		}),
	)
}

/// Pointer position in element pixels.
fn element_point(canvas_ref: NodeRef<Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Pointer position in logical screen units, plus the engine it applies to.
fn with_logical<R>(
	engine: &Engine,
	canvas_ref: NodeRef<Canvas>,
	ev: &MouseEvent,
	f: impl FnOnce(&mut GraphEngine, f64, f64) -> R,
) -> Option<R> {
	let (px, py) = element_point(canvas_ref, ev)?;
	let mut guard = engine.try_borrow_mut().ok()?;
	let engine = guard.as_mut()?;
	let (sx, sy) = engine.viewport.to_logical(px, py);
	Some(f(engine, sx, sy))
}

/// Create the engine, start the animation loop and hook up resizing.
#[allow(clippy::too_many_arguments)]
fn mount_engine(
	canvas: &HtmlCanvasElement,
	graph: &GraphContext,
	engine: &Engine,
	animate: &FrameCallback,
	resize_cb: &ResizeCallback,
	alive: Arc<AtomicBool>,
	fullscreen: bool,
	size: (Option<f64>, Option<f64>),
) -> bool {
	let Some(window) = web_sys::window() else {
		warn!("campaign-graph: no window, canvas not mounted");
		return false;
	};
	let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
		Ok(Some(ctx)) => match ctx.dyn_into() {
			Ok(ctx) => ctx,
			Err(_) => return false,
		},
		_ => {
			warn!("campaign-graph: canvas has no 2d context");
			return false;
		}
	};

	let (w, h) = if fullscreen {
		window_size(&window)
	} else {
		element_size(canvas, size.0, size.1)
	};
	canvas.set_width(w as u32);
	canvas.set_height(h as u32);

	*engine.borrow_mut() = Some(GraphEngine::new(
		Viewport::new(w, h),
		graph.display.get_untracked(),
		graph.selected.get_untracked(),
	));

	if fullscreen {
		let (engine_resize, canvas_resize) = (engine.clone(), canvas.clone());
		*resize_cb.borrow_mut() = Some(Closure::new(move || {
			let Some(win) = web_sys::window() else {
				return;
			};
			let (nw, nh) = window_size(&win);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Ok(mut guard) = engine_resize.try_borrow_mut() {
				if let Some(e) = guard.as_mut() {
					e.viewport = Viewport::new(nw, nh);
					e.throttle.mark_dirty();
				}
			}
		}));
		if let Some(ref cb) = *resize_cb.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}
	}

	let (engine_anim, animate_inner, resize_inner) = (engine.clone(), animate.clone(), resize_cb.clone());
	let graph_anim = graph.clone();
	*animate.borrow_mut() = Some(Closure::new(move |now: f64| {
		if !alive.load(Ordering::Relaxed) {
			if let Some(mut e) = engine_anim.borrow_mut().take() {
				e.teardown();
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), resize_inner.borrow().as_ref()) {
				let _ = win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
			return;
		}

		let settled = match engine_anim.try_borrow_mut() {
			Ok(mut guard) => guard.as_mut().and_then(|e| e.frame(&ctx, now)),
			Err(_) => None,
		};
		if let Some(layout) = settled {
			debug!("campaign-graph: simulation settled, saving {} positions", layout.len());
			graph_anim.persist_positions(layout);
		}

		if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
			let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	}));
	if let Some(ref cb) = *animate.borrow() {
		let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
	}
	true
}

/// Renders the interactive campaign graph on a canvas element.
///
/// Reads everything from the [`GraphContext`] provided by an ancestor. The
/// component sizes itself to its parent container by default; set
/// `fullscreen = true` to fill the viewport and resize automatically with the
/// window. Explicit `width`/`height` override automatic sizing.
#[component]
pub fn ForceGraphCanvas(
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let graph = use_graph_context();
	let canvas_ref = NodeRef::<Canvas>::new();
	let engine: Engine = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: ResizeCallback = Rc::new(RefCell::new(None));
	let alive = Arc::new(AtomicBool::new(true));

	let alive_cleanup = alive.clone();
	on_cleanup(move || alive_cleanup.store(false, Ordering::Relaxed));

	// Rebuild the simulation whenever the visible data, physics or view mode change.
	let (engine_init, graph_init) = (engine.clone(), graph.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let physics = graph_init.physics.get();
		let mode = graph_init.view_mode.get();

		let mounted = engine_init.borrow().is_some();
		if !mounted
			&& !mount_engine(
				&canvas,
				&graph_init,
				&engine_init,
				&animate,
				&resize_cb,
				alive.clone(),
				fullscreen,
				(width, height),
			) {
			return;
		}

		let cached = graph_init.positions.get_untracked();
		graph_init.visible.with(|data| {
			if let Some(e) = engine_init.borrow_mut().as_mut() {
				e.rebuild(data, physics, mode, &cached);
			}
		});
	});

	let (engine_view, graph_view) = (engine.clone(), graph.clone());
	Effect::new(move |_| {
		let display = graph_view.display.get();
		let selected = graph_view.selected.get();
		let focus = graph_view.focus.get();
		if let Ok(mut guard) = engine_view.try_borrow_mut() {
			if let Some(e) = guard.as_mut() {
				e.display = display;
				e.selected = selected;
				e.set_focus(focus.as_deref());
				e.throttle.mark_dirty();
			}
		}
	});

	let (engine_reset, graph_reset) = (engine.clone(), graph.clone());
	Effect::new(move |_| {
		graph_reset.reset_view.track();
		if let Ok(mut guard) = engine_reset.try_borrow_mut() {
			if let Some(e) = guard.as_mut() {
				e.camera = Camera::default();
				e.throttle.mark_dirty();
			}
		}
	});

	let (engine_pd, graph_pd) = (engine.clone(), graph.clone());
	let on_pointerdown = move |ev: PointerEvent| {
		if ev.button() != 0 {
			return;
		}
		let dragged = with_logical(&engine_pd, canvas_ref, &ev, |e, sx, sy| match e.node_at(sx, sy) {
			Some(id) if e.begin_drag(&id, sx, sy) => Some(id),
			Some(_) => None,
			None => {
				e.interaction.begin_pan(&e.camera, sx, sy);
				None
			}
		})
		.flatten();

		if let Some(id) = dragged {
			if let Some(canvas) = canvas_ref.get_untracked() {
				let canvas: HtmlCanvasElement = canvas.into();
				let _ = canvas.set_pointer_capture(ev.pointer_id());
			}
			graph_pd.focus.set(Some(id));
		}
	};

	let (engine_pm, graph_pm) = (engine.clone(), graph.clone());
	let on_pointermove = move |ev: PointerEvent| {
		let hovered = with_logical(&engine_pm, canvas_ref, &ev, |e, sx, sy| {
			if e.interaction.is_active() {
				e.pointer_move(sx, sy);
				None
			} else {
				Some(e.node_at(sx, sy))
			}
		})
		.flatten();

		if let Some(hovered) = hovered {
			if graph_pm.focus.get_untracked() != hovered {
				graph_pm.focus.set(hovered);
			}
		}
	};

	let (engine_pu, graph_pu) = (engine.clone(), graph.clone());
	let on_pointerup = move |_: PointerEvent| {
		let layout = engine_pu
			.try_borrow_mut()
			.ok()
			.and_then(|mut guard| guard.as_mut().and_then(GraphEngine::end_gesture));
		if let Some(layout) = layout {
			graph_pu.persist_positions(layout);
		}
	};
	let on_pointercancel = on_pointerup.clone();

	let (engine_pl, graph_pl) = (engine.clone(), graph.clone());
	let on_pointerleave = move |_: PointerEvent| {
		let layout = engine_pl
			.try_borrow_mut()
			.ok()
			.and_then(|mut guard| guard.as_mut().and_then(GraphEngine::end_gesture));
		if let Some(layout) = layout {
			graph_pl.persist_positions(layout);
		}
		graph_pl.focus.set(None);
	};

	let (engine_dc, graph_dc) = (engine.clone(), graph.clone());
	let on_dblclick = move |ev: MouseEvent| {
		let hit = with_logical(&engine_dc, canvas_ref, &ev, |e, sx, sy| {
			let id = e.node_at(sx, sy)?;
			e.zoom_to(&id);
			Some(id)
		})
		.flatten();
		if let Some(id) = hit {
			graph_dc.selected.set(Some(id));
		}
	};

	let engine_wh = engine.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		with_logical(&engine_wh, canvas_ref, &ev, |e, sx, sy| {
			e.camera = zoom_at_point(&e.camera, sx, sy, ev.delta_y());
			e.throttle.mark_dirty();
		});
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:pointerdown=on_pointerdown
			on:pointermove=on_pointermove
			on:pointerup=on_pointerup
			on:pointercancel=on_pointercancel
			on:pointerleave=on_pointerleave
			on:dblclick=on_dblclick
			on:wheel=on_wheel
			style="display: block; cursor: grab; touch-action: none;"
		/>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::{GraphNode, NodeType};

	fn engine_with(ids: &[&str]) -> GraphEngine {
		let node = |id: &str| GraphNode {
			id: id.into(),
			entity_id: id.into(),
			label: id.into(),
			node_type: NodeType::Character,
			description: None,
			degree: 1,
		};
		let data = GraphData {
			nodes: ids.iter().map(|id| node(id)).collect(),
			links: vec![GraphLink {
				id: "edge-1".into(),
				source: ids[0].into(),
				target: ids[1].into(),
				kind: "KNOWS".into(),
			}],
		};
		let mut engine = GraphEngine::new(
			Viewport::new(VIRTUAL_WIDTH, VIRTUAL_HEIGHT),
			DisplaySettings::default(),
			None,
		);
		engine.rebuild(&data, PhysicsConfig::default(), ViewMode::Graph, &NodePositions::new());
		engine
	}

	fn grab(engine: &mut GraphEngine, id: &str) {
		let sim = engine.manager.active().unwrap();
		let node = sim.node(id).unwrap();
		let (x, y) = (node.x, node.y);
		assert!(engine.begin_drag(id, x, y));
	}

	#[test]
	fn drag_release_hands_back_a_layout() {
		let mut engine = engine_with(&["character-1", "character-2"]);
		grab(&mut engine, "character-1");
		let layout = engine.end_gesture().unwrap();
		assert_eq!(layout.len(), 2);
		assert!(engine.end_gesture().is_none());
	}

	#[test]
	fn unmount_mid_drag_stops_without_a_layout() {
		let mut engine = engine_with(&["character-1", "character-2"]);
		grab(&mut engine, "character-1");
		engine.teardown();
		assert!(engine.manager.active().is_none());
		assert!(!engine.interaction.is_active());
		assert!(engine.end_gesture().is_none());
	}
}
