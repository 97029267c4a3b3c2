//! Force-directed layout simulation.
//!
//! A small velocity-Verlet style simulation in the spirit of d3-force: every
//! tick applies charge, link, centering, collision and (in timeline mode)
//! per-node axis forces to node velocities, then integrates positions. The
//! simulation cools by decaying `alpha` towards `alpha_target`; once `alpha`
//! drops below `alpha_min` it reports [`SimEvent::End`] and stops.
//!
//! [`SimulationManager`] owns the one active simulation of a mounted view and
//! tears it down before building the next.

use std::collections::HashMap;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::camera::{VIRTUAL_HEIGHT, VIRTUAL_WIDTH};
use super::types::{GraphData, GraphNode, NodePositions, NodeType, Position, ViewMode};

/// User-tunable force parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
	/// Many-body strength; negative values repel.
	pub charge_strength: f64,
	/// Rest length of a link.
	pub link_distance: f64,
	/// Multiplier on the per-link spring strength.
	pub link_strength: f64,
	/// Pull towards the canvas center.
	pub center_strength: f64,
	/// Minimum collision radius for connected nodes.
	pub collision_radius: f64,
}

impl Default for PhysicsConfig {
	fn default() -> Self {
		Self {
			charge_strength: -260.0,
			link_distance: 90.0,
			link_strength: 0.6,
			center_strength: 0.05,
			collision_radius: 28.0,
		}
	}
}

/// Fixed simulation constants. Not exposed in the settings UI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationTuning {
	pub alpha_start: f64,
	/// Starting alpha when every node was seeded from a previous layout.
	pub soft_alpha_start: f64,
	pub alpha_min: f64,
	pub alpha_decay: f64,
	/// Fraction of velocity removed each tick.
	pub velocity_decay: f64,
	pub collision_strength: f64,
	/// Alpha target held while a node is being dragged.
	pub drag_alpha_target: f64,
	/// Alpha target right after a drag is released; decays from there.
	pub resting_alpha_target: f64,
	pub timeline_event_strength: f64,
	/// Axis pull for non-event nodes linked to at least one event.
	pub timeline_related_strength: f64,
	/// Axis pull for non-event nodes with no event neighbours.
	pub timeline_loose_strength: f64,
	/// Maximum vertical jitter of event nodes around the axis.
	pub timeline_jitter: f64,
	pub timeline_margin: f64,
}

impl Default for SimulationTuning {
	fn default() -> Self {
		Self {
			alpha_start: 1.0,
			soft_alpha_start: 0.4,
			alpha_min: 0.001,
			alpha_decay: 0.0228,
			velocity_decay: 0.7,
			collision_strength: 0.8,
			drag_alpha_target: 0.3,
			resting_alpha_target: 0.1,
			timeline_event_strength: 1.0,
			timeline_related_strength: 0.3,
			timeline_loose_strength: 0.04,
			timeline_jitter: 120.0,
			timeline_margin: 120.0,
		}
	}
}

/// Per-node pull towards a fixed point, used by timeline mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisTarget {
	/// `None` leaves the horizontal position free.
	pub x: Option<f64>,
	pub y: f64,
	pub strength: f64,
}

/// Mutable per-node simulation state. Owned by the active [`Simulation`].
#[derive(Clone, Debug)]
pub struct SimNode {
	pub id: String,
	pub label: String,
	pub node_type: NodeType,
	/// Degree from the full data set, used for sizing.
	pub degree: usize,
	/// Incident links among the simulated links.
	pub visible_degree: usize,
	pub radius: f64,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Pinned position while dragged.
	pub fx: Option<f64>,
	pub fy: Option<f64>,
	/// Many-body strength; zero for orphans.
	pub charge: f64,
	/// Collision radius; zero for orphans.
	pub collide: f64,
	pub axis: Option<AxisTarget>,
}

impl SimNode {
	pub fn is_orphan(&self) -> bool {
		self.visible_degree == 0
	}

	pub fn position(&self) -> Position {
		Position {
			x: self.x,
			y: self.y,
		}
	}
}

/// A link resolved to node indices.
#[derive(Clone, Debug)]
pub struct SimLink {
	pub id: String,
	pub kind: String,
	pub source: usize,
	pub target: usize,
	strength: f64,
	bias: f64,
}

/// Emitted by [`Simulation::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimEvent {
	Tick,
	/// Alpha dropped below the minimum; the simulation has stopped.
	End,
}

/// A running force simulation over one visible node/link set.
pub struct Simulation {
	nodes: Vec<SimNode>,
	links: Vec<SimLink>,
	index: HashMap<String, usize>,
	physics: PhysicsConfig,
	tuning: SimulationTuning,
	center_strength: f64,
	alpha: f64,
	alpha_target: f64,
	/// When set, `alpha_target` itself decays each tick.
	resting: bool,
	running: bool,
}

impl Simulation {
	/// Build a simulation for already-filtered data.
	///
	/// Links whose endpoints are missing from `data.nodes` are dropped here.
	/// `seeds` provides start positions; unseeded nodes start on a phyllotaxis
	/// spiral around the canvas center (or at their timeline target).
	pub fn new(
		data: &GraphData,
		physics: PhysicsConfig,
		tuning: SimulationTuning,
		mode: ViewMode,
		seeds: &NodePositions,
		radius_for: impl Fn(&GraphNode) -> f64,
	) -> Self {
		let index: HashMap<String, usize> = data
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();

		let mut counts = vec![0usize; data.nodes.len()];
		let resolved: Vec<(usize, usize, &str, &str)> = data
			.links
			.iter()
			.filter_map(|l| {
				let (&s, &t) = (index.get(&l.source)?, index.get(&l.target)?);
				Some((s, t, l.id.as_str(), l.kind.as_str()))
			})
			.collect();
		for &(s, t, _, _) in &resolved {
			counts[s] += 1;
			counts[t] += 1;
		}

		let links = resolved
			.into_iter()
			.map(|(s, t, id, kind)| {
				let (cs, ct) = (counts[s].max(1) as f64, counts[t].max(1) as f64);
				SimLink {
					id: id.to_string(),
					kind: kind.to_string(),
					source: s,
					target: t,
					strength: physics.link_strength / cs.min(ct),
					bias: cs / (cs + ct),
				}
			})
			.collect::<Vec<_>>();

		let axis = match mode {
			ViewMode::Timeline => timeline_targets(data, &tuning),
			ViewMode::Graph => HashMap::new(),
		};

		let (cx, cy) = (VIRTUAL_WIDTH / 2.0, VIRTUAL_HEIGHT / 2.0);
		let golden = PI * (3.0 - 5f64.sqrt());
		let mut all_seeded = !data.nodes.is_empty();

		let nodes = data
			.nodes
			.iter()
			.enumerate()
			.map(|(i, node)| {
				let orphan = counts[i] == 0;
				let radius = radius_for(node);
				let target = axis.get(&node.id).copied();
				let (x, y) = match (seeds.get(&node.id), target) {
					(Some(p), _) if p.x.is_finite() && p.y.is_finite() => (p.x, p.y),
					(_, Some(AxisTarget { x: Some(tx), y: ty, .. })) => {
						all_seeded = false;
						(tx, ty)
					}
					_ => {
						all_seeded = false;
						let r = 10.0 * (i as f64).sqrt();
						let a = i as f64 * golden;
						(cx + r * a.cos(), cy + r * a.sin())
					}
				};
				SimNode {
					id: node.id.clone(),
					label: node.label.clone(),
					node_type: node.node_type,
					degree: node.degree,
					visible_degree: counts[i],
					radius,
					x,
					y,
					vx: 0.0,
					vy: 0.0,
					fx: None,
					fy: None,
					charge: if orphan { 0.0 } else { physics.charge_strength },
					collide: if orphan {
						0.0
					} else {
						radius.max(physics.collision_radius)
					},
					axis: target,
				}
			})
			.collect();

		let center_strength = match mode {
			ViewMode::Graph => physics.center_strength,
			ViewMode::Timeline => physics.center_strength * 0.1,
		};

		Self {
			nodes,
			links,
			index,
			physics,
			tuning,
			center_strength,
			alpha: if all_seeded {
				tuning.soft_alpha_start
			} else {
				tuning.alpha_start
			},
			alpha_target: 0.0,
			resting: false,
			running: true,
		}
	}

	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	pub fn links(&self) -> &[SimLink] {
		&self.links
	}

	pub fn physics(&self) -> &PhysicsConfig {
		&self.physics
	}

	pub fn tuning(&self) -> &SimulationTuning {
		&self.tuning
	}

	/// Look up a node by id.
	pub fn node(&self, id: &str) -> Option<&SimNode> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	pub fn node_mut(&mut self, id: &str) -> Option<&mut SimNode> {
		self.index.get(id).map(|&i| &mut self.nodes[i])
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	pub fn is_running(&self) -> bool {
		self.running
	}

	/// Hold alpha at `target` and make sure the simulation is ticking.
	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
		self.resting = false;
		self.restart();
	}

	/// Drop the alpha target to the resting value and let it fade from there.
	pub fn release_to_rest(&mut self) {
		self.alpha_target = self.tuning.resting_alpha_target;
		self.resting = true;
		self.restart();
	}

	pub fn restart(&mut self) {
		self.running = true;
	}

	pub fn stop(&mut self) {
		self.running = false;
	}

	/// Snapshot of every node position.
	pub fn positions(&self) -> NodePositions {
		self.nodes
			.iter()
			.map(|n| (n.id.clone(), n.position()))
			.collect()
	}

	/// Advance one step. Returns `None` once stopped.
	pub fn tick(&mut self) -> Option<SimEvent> {
		if !self.running {
			return None;
		}

		if self.resting {
			self.alpha_target *= 1.0 - self.tuning.alpha_decay;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.tuning.alpha_decay;

		self.apply_charge();
		self.apply_links();
		self.apply_center();
		self.apply_collision();
		self.apply_axis();

		let keep = 1.0 - self.tuning.velocity_decay;
		for node in &mut self.nodes {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= keep;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= keep;
					node.y += node.vy;
				}
			}
		}

		if self.alpha < self.tuning.alpha_min {
			self.running = false;
			return Some(SimEvent::End);
		}
		Some(SimEvent::Tick)
	}

	fn apply_charge(&mut self) {
		let n = self.nodes.len();
		let mut dv = vec![(0.0, 0.0); n];
		for i in 0..n {
			for j in 0..n {
				let strength = self.nodes[j].charge;
				if i == j || strength == 0.0 {
					continue;
				}
				let (mut dx, dy) = (
					self.nodes[j].x - self.nodes[i].x,
					self.nodes[j].y - self.nodes[i].y,
				);
				let mut l = dx * dx + dy * dy;
				if l == 0.0 {
					dx = jiggle(i, j);
					l = dx * dx;
				}
				if l < 1.0 {
					l = l.sqrt();
				}
				let w = strength * self.alpha / l;
				dv[i].0 += dx * w;
				dv[i].1 += dy * w;
			}
		}
		for (node, (dx, dy)) in self.nodes.iter_mut().zip(dv) {
			node.vx += dx;
			node.vy += dy;
		}
	}

	fn apply_links(&mut self) {
		for link in &self.links {
			let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 && y == 0.0 {
				x = jiggle(link.source, link.target);
			}
			let l = (x * x + y * y).sqrt();
			let k = (l - self.physics.link_distance) / l * self.alpha * link.strength;
			let (x, y) = (x * k, y * k);
			let b = link.bias;
			let t = &mut self.nodes[link.target];
			t.vx -= x * b;
			t.vy -= y * b;
			let s = &mut self.nodes[link.source];
			s.vx += x * (1.0 - b);
			s.vy += y * (1.0 - b);
		}
	}

	fn apply_center(&mut self) {
		let (cx, cy) = (VIRTUAL_WIDTH / 2.0, VIRTUAL_HEIGHT / 2.0);
		let k = self.center_strength * self.alpha;
		for node in &mut self.nodes {
			node.vx += (cx - node.x) * k;
			node.vy += (cy - node.y) * k;
		}
	}

	fn apply_collision(&mut self) {
		let n = self.nodes.len();
		let strength = self.tuning.collision_strength;
		for i in 0..n {
			for j in (i + 1)..n {
				let (ri, rj) = (self.nodes[i].collide, self.nodes[j].collide);
				if ri == 0.0 || rj == 0.0 {
					continue;
				}
				let r = ri + rj;
				let (a, b) = (&self.nodes[i], &self.nodes[j]);
				let mut x = a.x + a.vx - b.x - b.vx;
				let y = a.y + a.vy - b.y - b.vy;
				let mut l = x * x + y * y;
				if l >= r * r {
					continue;
				}
				if x == 0.0 && y == 0.0 {
					x = jiggle(i, j);
					l = x * x;
				}
				let l = l.sqrt();
				let k = (r - l) / l * strength;
				let (x, y) = (x * k, y * k);
				let w = (rj * rj) / (ri * ri + rj * rj);
				let a = &mut self.nodes[i];
				a.vx += x * w;
				a.vy += y * w;
				let b = &mut self.nodes[j];
				b.vx -= x * (1.0 - w);
				b.vy -= y * (1.0 - w);
			}
		}
	}

	fn apply_axis(&mut self) {
		let alpha = self.alpha;
		for node in &mut self.nodes {
			let Some(target) = node.axis else {
				continue;
			};
			let k = target.strength * alpha;
			if let Some(tx) = target.x {
				node.vx += (tx - node.x) * k;
			}
			node.vy += (target.y - node.y) * k;
		}
	}
}

/// Tiny deterministic nudge separating coincident nodes; antisymmetric in `(i, j)`.
fn jiggle(i: usize, j: usize) -> f64 {
	let e = 1e-6 * (1 + (i * 31 + j * 17) % 7) as f64;
	if i < j { e } else { -e }
}

/// Stable 32-bit FNV-1a hash of a string.
pub fn hash_id(id: &str) -> u32 {
	id.bytes().fold(0x811c_9dc5u32, |h, b| {
		(h ^ b as u32).wrapping_mul(0x0100_0193)
	})
}

/// Deterministic vertical offset in `[-amplitude, amplitude]` for a node id.
pub fn timeline_jitter(id: &str, amplitude: f64) -> f64 {
	let unit = (hash_id(id) % 10_000) as f64 / 9_999.0;
	(unit * 2.0 - 1.0) * amplitude
}

/// Compute timeline-mode axis targets.
///
/// Events are ranked by label (ties broken by id) and spread evenly across the
/// canvas width with a per-id vertical jitter. Other nodes are pulled weakly
/// towards the mean target of the events they link to, or just towards the
/// axis when they touch no event.
pub fn timeline_targets(data: &GraphData, tuning: &SimulationTuning) -> HashMap<String, AxisTarget> {
	let mut events: Vec<&GraphNode> = data
		.nodes
		.iter()
		.filter(|n| n.node_type == NodeType::Event)
		.collect();
	events.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.id.cmp(&b.id)));

	let cy = VIRTUAL_HEIGHT / 2.0;
	let span = VIRTUAL_WIDTH - 2.0 * tuning.timeline_margin;
	let count = events.len();

	let mut targets: HashMap<String, AxisTarget> = events
		.iter()
		.enumerate()
		.map(|(rank, node)| {
			let x = if count > 1 {
				tuning.timeline_margin + span * rank as f64 / (count - 1) as f64
			} else {
				VIRTUAL_WIDTH / 2.0
			};
			let target = AxisTarget {
				x: Some(x),
				y: cy + timeline_jitter(&node.id, tuning.timeline_jitter),
				strength: tuning.timeline_event_strength,
			};
			(node.id.clone(), target)
		})
		.collect();

	let mut pulls: HashMap<&str, (f64, f64, usize)> = HashMap::new();
	for link in &data.links {
		for (this, other) in [(&link.source, &link.target), (&link.target, &link.source)] {
			if targets.contains_key(this) {
				continue;
			}
			if let Some(AxisTarget { x: Some(x), y, .. }) = targets.get(other) {
				let acc = pulls.entry(this.as_str()).or_insert((0.0, 0.0, 0));
				acc.0 += x;
				acc.1 += y;
				acc.2 += 1;
			}
		}
	}

	let others: Vec<(String, AxisTarget)> = data
		.nodes
		.iter()
		.filter(|n| n.node_type != NodeType::Event)
		.map(|n| {
			let target = match pulls.get(n.id.as_str()) {
				Some(&(sx, sy, k)) => AxisTarget {
					x: Some(sx / k as f64),
					y: sy / k as f64,
					strength: tuning.timeline_related_strength,
				},
				None => AxisTarget {
					x: None,
					y: cy,
					strength: tuning.timeline_loose_strength,
				},
			};
			(n.id.clone(), target)
		})
		.collect();
	targets.extend(others);
	targets
}

/// Owns the single active simulation of a mounted graph view.
#[derive(Default)]
pub struct SimulationManager {
	tuning: SimulationTuning,
	active: Option<Simulation>,
}

impl SimulationManager {
	pub fn new(tuning: SimulationTuning) -> Self {
		Self {
			tuning,
			active: None,
		}
	}

	pub fn tuning(&self) -> &SimulationTuning {
		&self.tuning
	}

	/// Stop and discard the current simulation, then build a new one.
	///
	/// Start positions come from the discarded simulation where the node id
	/// survived, falling back to `cached` positions.
	pub fn start(
		&mut self,
		data: &GraphData,
		physics: PhysicsConfig,
		mode: ViewMode,
		cached: &NodePositions,
		radius_for: impl Fn(&GraphNode) -> f64,
	) -> &mut Simulation {
		let mut seeds = cached.clone();
		if let Some(mut previous) = self.active.take() {
			previous.stop();
			seeds.extend(previous.positions());
		}
		self.active
			.insert(Simulation::new(data, physics, self.tuning, mode, &seeds, radius_for))
	}

	pub fn active(&self) -> Option<&Simulation> {
		self.active.as_ref()
	}

	pub fn active_mut(&mut self) -> Option<&mut Simulation> {
		self.active.as_mut()
	}

	/// Stop the active simulation and drop it, returning its final layout.
	pub fn teardown(&mut self) -> Option<NodePositions> {
		self.active.take().map(|mut sim| {
			sim.stop();
			sim.positions()
		})
	}
}
