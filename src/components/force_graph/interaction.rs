//! Pointer interaction state machines.
//!
//! A gesture is either idle, dragging one node, or panning the camera. Every
//! gesture ends through [`Interaction::end`], which pointer-up, pointer-leave
//! and teardown all call. Lookups of the dragged node tolerate it having been
//! removed mid-gesture; the gesture then silently becomes a no-op.

use super::camera::{Camera, screen_to_world};
use super::highlight::{Adjacency, bfs_distances};
use super::simulation::Simulation;

/// Tunables for drag feel and render pacing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionConfig {
	/// Share of the drag delta applied directly to first-degree neighbours.
	pub first_degree_nudge: f64,
	/// Share of the drag delta applied to second-degree neighbours.
	pub second_degree_nudge: f64,
	/// Minimum milliseconds between renders (~30 fps).
	pub render_interval_ms: f64,
	/// Extra hit radius around nodes, in world units.
	pub hit_slop: f64,
}

impl Default for InteractionConfig {
	fn default() -> Self {
		Self {
			first_degree_nudge: 0.6,
			second_degree_nudge: 0.3,
			render_interval_ms: 33.0,
			hit_slop: 4.0,
		}
	}
}

/// An in-progress node drag.
#[derive(Clone, Debug, PartialEq)]
pub struct DragState {
	pub node_id: String,
	/// Node position minus pointer world position at pointer-down.
	pub offset: (f64, f64),
	/// Neighbours that follow the drag, with their share of the delta.
	pub followers: Vec<(String, f64)>,
}

/// An in-progress canvas pan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanState {
	pub start_x: f64,
	pub start_y: f64,
	pub camera_start: Camera,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
	#[default]
	Idle,
	Dragging(DragState),
	Panning(PanState),
}

/// What ended when a gesture finished.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureEnd {
	None,
	/// A drag ended; the released node id.
	Drag(String),
	Pan,
}

/// Owns the current gesture.
#[derive(Clone, Debug, Default)]
pub struct Interaction {
	pub config: InteractionConfig,
	gesture: Gesture,
}

impl Interaction {
	pub fn new(config: InteractionConfig) -> Self {
		Self {
			config,
			gesture: Gesture::Idle,
		}
	}

	pub fn gesture(&self) -> &Gesture {
		&self.gesture
	}

	pub fn is_dragging(&self) -> bool {
		matches!(self.gesture, Gesture::Dragging(_))
	}

	pub fn is_active(&self) -> bool {
		self.gesture != Gesture::Idle
	}

	/// Start dragging `node_id` from screen point `(sx, sy)`.
	///
	/// Pins the node where it is, records the pointer offset so the node does
	/// not jump to the cursor, and raises the alpha target so neighbours keep
	/// reacting. Returns `false` when the node no longer exists.
	pub fn begin_drag(
		&mut self,
		sim: &mut Simulation,
		camera: &Camera,
		adjacency: &Adjacency,
		node_id: &str,
		sx: f64,
		sy: f64,
	) -> bool {
		self.end(sim);
		let (wx, wy) = screen_to_world(sx, sy, camera);
		let Some(node) = sim.node_mut(node_id) else {
			return false;
		};
		let offset = (node.x - wx, node.y - wy);
		node.fx = Some(node.x);
		node.fy = Some(node.y);

		let followers = bfs_distances(adjacency, node_id, 2)
			.into_iter()
			.filter_map(|(id, d)| match d {
				1 => Some((id, self.config.first_degree_nudge)),
				2 => Some((id, self.config.second_degree_nudge)),
				_ => None,
			})
			.collect();

		let drag_target = sim.tuning().drag_alpha_target;
		sim.set_alpha_target(drag_target);
		self.gesture = Gesture::Dragging(DragState {
			node_id: node_id.to_string(),
			offset,
			followers,
		});
		true
	}

	/// Start panning from screen point `(sx, sy)`.
	pub fn begin_pan(&mut self, camera: &Camera, sx: f64, sy: f64) {
		self.gesture = Gesture::Panning(PanState {
			start_x: sx,
			start_y: sy,
			camera_start: *camera,
		});
	}

	/// Feed a pointer move. Returns `true` when anything moved.
	pub fn pointer_move(&mut self, sim: &mut Simulation, camera: &mut Camera, sx: f64, sy: f64) -> bool {
		match &self.gesture {
			Gesture::Idle => false,
			Gesture::Panning(pan) => {
				camera.x = pan.camera_start.x + (sx - pan.start_x);
				camera.y = pan.camera_start.y + (sy - pan.start_y);
				true
			}
			Gesture::Dragging(drag) => {
				let (wx, wy) = screen_to_world(sx, sy, camera);
				let Some(node) = sim.node_mut(&drag.node_id) else {
					self.gesture = Gesture::Idle;
					return false;
				};
				let (nx, ny) = (wx + drag.offset.0, wy + drag.offset.1);
				let (dx, dy) = (
					nx - node.fx.unwrap_or(node.x),
					ny - node.fy.unwrap_or(node.y),
				);
				node.fx = Some(nx);
				node.fy = Some(ny);

				for (id, share) in &drag.followers {
					if let Some(follower) = sim.node_mut(id) {
						if follower.fx.is_none() {
							follower.x += dx * share;
							follower.y += dy * share;
						}
					}
				}
				true
			}
		}
	}

	/// End whatever gesture is active: unpin a dragged node and let the
	/// simulation relax towards its resting alpha target.
	pub fn end(&mut self, sim: &mut Simulation) -> GestureEnd {
		match std::mem::take(&mut self.gesture) {
			Gesture::Idle => GestureEnd::None,
			Gesture::Panning(_) => GestureEnd::Pan,
			Gesture::Dragging(drag) => {
				if let Some(node) = sim.node_mut(&drag.node_id) {
					if let (Some(fx), Some(fy)) = (node.fx, node.fy) {
						node.x = fx;
						node.y = fy;
					}
					node.fx = None;
					node.fy = None;
				}
				sim.release_to_rest();
				GestureEnd::Drag(drag.node_id)
			}
		}
	}
}

/// Topmost node whose drawn radius (times `radius_scale`, plus `slop`)
/// contains the world point.
pub fn hit_test(sim: &Simulation, wx: f64, wy: f64, radius_scale: f64, slop: f64) -> Option<String> {
	sim.nodes()
		.iter()
		.rev()
		.find(|n| {
			let r = n.radius * radius_scale + slop;
			let (dx, dy) = (n.x - wx, n.y - wy);
			dx * dx + dy * dy <= r * r
		})
		.map(|n| n.id.clone())
}

/// Paces renders independently of the physics tick rate.
#[derive(Clone, Copy, Debug)]
pub struct RenderThrottle {
	interval_ms: f64,
	last: Option<f64>,
	/// Requests a render on the next due frame (e.g. after a camera change).
	dirty: bool,
}

impl RenderThrottle {
	pub fn new(interval_ms: f64) -> Self {
		Self {
			interval_ms,
			last: None,
			dirty: true,
		}
	}

	pub fn mark_dirty(&mut self) {
		self.dirty = true;
	}

	/// Whether a frame at `now_ms` should be drawn. Records it if so.
	pub fn should_render(&mut self, now_ms: f64, simulating: bool) -> bool {
		let due = match self.last {
			None => true,
			Some(last) => now_ms - last >= self.interval_ms,
		};
		if due && (self.dirty || simulating) {
			self.dirty = false;
			self.last = Some(now_ms);
			return true;
		}
		false
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::highlight::compute_adjacency;
	use crate::components::force_graph::simulation::{PhysicsConfig, SimulationTuning};
	use crate::components::force_graph::types::{
		GraphData, GraphLink, GraphNode, NodePositions, NodeType, Position, ViewMode,
	};

	const EPS: f64 = 1e-9;

	fn graph() -> GraphData {
		let node = |id: &str| GraphNode {
			id: id.into(),
			entity_id: id.into(),
			label: id.into(),
			node_type: NodeType::Character,
			description: None,
			degree: 0,
		};
		let link = |s: &str, t: &str| GraphLink {
			id: format!("{s}{t}"),
			source: s.into(),
			target: t.into(),
			kind: "KNOWS".into(),
		};
		let mut data = GraphData {
			nodes: vec![node("a"), node("b"), node("c"), node("d")],
			links: vec![link("a", "b"), link("b", "c"), link("c", "d")],
		};
		data.recompute_degrees();
		data
	}

	fn setup() -> (Simulation, Adjacency) {
		let data = graph();
		let seeds: NodePositions = [
			("a", Position { x: 100.0, y: 100.0 }),
			("b", Position { x: 200.0, y: 100.0 }),
			("c", Position { x: 300.0, y: 100.0 }),
			("d", Position { x: 400.0, y: 100.0 }),
		]
		.into_iter()
		.map(|(k, v)| (k.to_string(), v))
		.collect();
		let sim = Simulation::new(
			&data,
			PhysicsConfig::default(),
			SimulationTuning::default(),
			ViewMode::Graph,
			&seeds,
			|_| 10.0,
		);
		(sim, compute_adjacency(&data.links))
	}

	fn pos(sim: &Simulation, id: &str) -> (f64, f64) {
		let n = sim.node(id).unwrap();
		(n.x, n.y)
	}

	#[test]
	fn drag_preserves_grab_offset() {
		for (grab_x, grab_y) in [(0.0, 0.0), (6.0, -4.0), (-9.5, 2.25)] {
			let (mut sim, adjacency) = setup();
			let mut camera = Camera {
				x: 30.0,
				y: -20.0,
				scale: 1.5,
			};
			let mut interaction = Interaction::default();
			let grab = crate::components::force_graph::camera::world_to_screen(
				100.0 + grab_x,
				100.0 + grab_y,
				&camera,
			);
			assert!(interaction.begin_drag(&mut sim, &camera, &adjacency, "a", grab.0, grab.1));

			let (dx, dy) = (37.0, -12.5);
			let scale = camera.scale;
			interaction.pointer_move(
				&mut sim,
				&mut camera,
				grab.0 + dx * scale,
				grab.1 + dy * scale,
			);
			let a = sim.node("a").unwrap();
			assert!((a.fx.unwrap() - (100.0 + dx)).abs() < EPS);
			assert!((a.fy.unwrap() - (100.0 + dy)).abs() < EPS);
		}
	}

	#[test]
	fn neighbours_follow_with_decaying_share() {
		let (mut sim, adjacency) = setup();
		let mut camera = Camera::default();
		let mut interaction = Interaction::default();
		interaction.begin_drag(&mut sim, &camera, &adjacency, "a", 100.0, 100.0);
		interaction.pointer_move(&mut sim, &mut camera, 100.0, 150.0);

		assert!((pos(&sim, "b").1 - 130.0).abs() < EPS);
		assert!((pos(&sim, "c").1 - 115.0).abs() < EPS);
		assert!((pos(&sim, "d").1 - 100.0).abs() < EPS);
		assert!(sim.node("b").unwrap().fx.is_none());
	}

	#[test]
	fn drag_lifecycle_pins_then_unpins() {
		let (mut sim, adjacency) = setup();
		let mut interaction = Interaction::default();
		let camera = Camera::default();
		interaction.begin_drag(&mut sim, &camera, &adjacency, "b", 200.0, 100.0);
		assert!(interaction.is_dragging());
		assert_eq!(sim.alpha_target(), SimulationTuning::default().drag_alpha_target);

		assert_eq!(interaction.end(&mut sim), GestureEnd::Drag("b".into()));
		let b = sim.node("b").unwrap();
		assert!(b.fx.is_none() && b.fy.is_none());
		assert_eq!(sim.alpha_target(), SimulationTuning::default().resting_alpha_target);
		assert_eq!(interaction.end(&mut sim), GestureEnd::None);
	}

	#[test]
	fn release_keeps_last_drag_position() {
		let (mut sim, adjacency) = setup();
		let mut camera = Camera::default();
		let mut interaction = Interaction::default();
		interaction.begin_drag(&mut sim, &camera, &adjacency, "d", 400.0, 100.0);
		interaction.pointer_move(&mut sim, &mut camera, 460.0, 180.0);
		interaction.end(&mut sim);

		let d = sim.node("d").unwrap();
		assert!(d.fx.is_none() && d.fy.is_none());
		assert!((d.x - 460.0).abs() < EPS);
		assert!((d.y - 180.0).abs() < EPS);
	}

	#[test]
	fn vanished_nodes_make_gestures_no_ops() {
		let (mut sim, adjacency) = setup();
		let mut camera = Camera::default();
		let mut interaction = Interaction::default();
		assert!(!interaction.begin_drag(&mut sim, &camera, &adjacency, "gone", 0.0, 0.0));
		assert!(!interaction.is_active());

		interaction.begin_drag(&mut sim, &camera, &adjacency, "a", 100.0, 100.0);
		sim = Simulation::new(
			&GraphData::default(),
			PhysicsConfig::default(),
			SimulationTuning::default(),
			ViewMode::Graph,
			&NodePositions::new(),
			|_| 10.0,
		);
		assert!(!interaction.pointer_move(&mut sim, &mut camera, 5.0, 5.0));
		assert!(!interaction.is_active());
		assert_eq!(interaction.end(&mut sim), GestureEnd::None);
	}

	#[test]
	fn panning_moves_camera_by_screen_delta() {
		let (mut sim, _) = setup();
		let mut camera = Camera {
			x: 10.0,
			y: 10.0,
			scale: 2.0,
		};
		let mut interaction = Interaction::default();
		interaction.begin_pan(&camera, 500.0, 500.0);
		interaction.pointer_move(&mut sim, &mut camera, 520.0, 470.0);
		interaction.pointer_move(&mut sim, &mut camera, 540.0, 440.0);
		assert_eq!((camera.x, camera.y, camera.scale), (50.0, -50.0, 2.0));
		assert_eq!(interaction.end(&mut sim), GestureEnd::Pan);
		assert!(!interaction.pointer_move(&mut sim, &mut camera, 0.0, 0.0));
	}

	#[test]
	fn hit_test_respects_radius_and_slop() {
		let (sim, _) = setup();
		assert_eq!(hit_test(&sim, 108.0, 100.0, 1.0, 0.0), Some("a".into()));
		assert_eq!(hit_test(&sim, 113.0, 100.0, 1.0, 0.0), None);
		assert_eq!(hit_test(&sim, 113.0, 100.0, 1.0, 4.0), Some("a".into()));
		assert_eq!(hit_test(&sim, 150.0, 150.0, 1.0, 4.0), None);
	}

	#[test]
	fn throttle_limits_frame_rate() {
		let mut throttle = RenderThrottle::new(33.0);
		assert!(throttle.should_render(0.0, true));
		assert!(!throttle.should_render(16.0, true));
		assert!(throttle.should_render(33.0, true));
		assert!(!throttle.should_render(100.0, false));
		throttle.mark_dirty();
		assert!(throttle.should_render(101.0, false));
		throttle.mark_dirty();
		assert!(!throttle.should_render(110.0, false));
		assert!(throttle.should_render(134.0, false));
		assert!(!throttle.should_render(200.0, false));
	}
}
