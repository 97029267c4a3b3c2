//! Overlay controls: view mode, filters, display toggles and camera reset.

use std::collections::BTreeSet;

use leptos::prelude::*;

use super::force_graph::context::{DisplaySettings, use_graph_context};
use super::force_graph::relations::relation_meta;
use super::force_graph::types::{NodeType, ViewMode};

/// A checkbox bound to one field of [`DisplaySettings`].
fn display_toggle(
	display: RwSignal<DisplaySettings>,
	label: &'static str,
	field: fn(&mut DisplaySettings) -> &mut bool,
) -> impl IntoView {
	view! {
		<label class="toggle">
			<input
				type="checkbox"
				prop:checked=move || {
					let mut current = display.get();
					*field(&mut current)
				}
				on:change=move |_| display.update(|d| {
					let flag = field(d);
					*flag = !*flag;
				})
			/>
			{label}
		</label>
	}
}

/// Graph/timeline switch, type and relation filters, display toggles.
#[component]
pub fn GraphControls() -> impl IntoView {
	let graph = use_graph_context();
	let (filters, display, view_mode, reset_view, data) = (
		graph.filters,
		graph.display,
		graph.view_mode,
		graph.reset_view,
		graph.data,
	);

	// Only kinds present in the data get a toggle.
	let relation_kinds = Memo::new(move |_| {
		data.with(|d| {
			d.links
				.iter()
				.map(|l| l.kind.clone())
				.collect::<BTreeSet<_>>()
				.into_iter()
				.collect::<Vec<_>>()
		})
	});

	let type_toggles = NodeType::ALL
		.into_iter()
		.map(|node_type| {
			view! {
				<label class="toggle">
					<input
						type="checkbox"
						prop:checked=move || filters.with(|f| f.type_visible(node_type))
						on:change=move |_| filters.update(|f| f.toggle_type(node_type))
					/>
					{node_type.label()}
				</label>
			}
		})
		.collect_view();

	view! {
		<div class="graph-controls">
			<div class="control-group">
				<button
					class:active=move || view_mode.get() == ViewMode::Graph
					on:click=move |_| view_mode.set(ViewMode::Graph)
				>
					"Graph"
				</button>
				<button
					class:active=move || view_mode.get() == ViewMode::Timeline
					on:click=move |_| view_mode.set(ViewMode::Timeline)
				>
					"Timeline"
				</button>
				<button on:click=move |_| reset_view.update(|n| *n = n.wrapping_add(1))>
					"Reset view"
				</button>
			</div>
			<div class="control-group">{type_toggles}</div>
			<div class="control-group">
				<For
					each=move || relation_kinds.get()
					key=|kind| kind.clone()
					children=move |kind: String| {
						let label = relation_meta(&kind).label.into_owned();
						let checked_kind = kind.clone();
						view! {
							<label class="toggle">
								<input
									type="checkbox"
									prop:checked=move || filters.with(|f| f.relation_visible(&checked_kind))
									on:change=move |_| filters.update(|f| f.toggle_relation(&kind))
								/>
								{label}
							</label>
						}
					}
				/>
			</div>
			<div class="control-group">
				<label class="toggle">
					<input
						type="checkbox"
						prop:checked=move || filters.with(|f| f.hide_orphans)
						on:change=move |_| filters.update(|f| f.hide_orphans = !f.hide_orphans)
					/>
					"Hide orphans"
				</label>
				{display_toggle(display, "Labels", |d| &mut d.show_labels)}
				{display_toggle(display, "Relation labels", |d| &mut d.show_relation_labels)}
				{display_toggle(display, "Arrows", |d| &mut d.show_arrows)}
			</div>
		</div>
	}
}
