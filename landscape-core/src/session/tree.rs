// Capability tree diagram session.
//
// What this does:
// - Owns the model, the tree, visibility, search and the tree layout engine
//   for one mounted diagram
// - Applies host actions (data, query, toggle, click, hover, expand/collapse
//   all) and re-lays out synchronously after each
// - Schedules a Transition task per relayout so exits can be dropped once
//   the host animation is over
// - Queues searchMatch / nodeActivate / systemClick events
//
// Click rules: a System node carrying a systemCode raises systemClick; any
// other node with children toggles; a leaf raises nodeActivate.

use std::collections::HashSet;

use log::{debug, warn};

use super::events::{DiagramEvent, EventQueue};
use super::schedule::{Scheduler, TaskKind, TickOutcome};
use crate::config::DiagramConfig;
use crate::interaction::{Highlight, ViewTransform};
use crate::layout::tree_layout::{TreeLayout, TreeLayoutEngine};
use crate::model::{GraphModel, InputError, NodeLevel, palette, parse_hierarchy};
use crate::output::{ErrorInfo, TreeLinkOutput, TreeNodeOutput, TreeOutput};
use crate::tree::{
    HierarchyTree, SearchState, TreeNodeId, Visibility, build_tree, derive_visible_tree,
    run_search, search_visibility,
};

/// Left margin before the root column.
const TREE_MARGIN: f32 = 40.0;

pub struct TreeSession {
    config: DiagramConfig,
    tree: HierarchyTree,
    visibility: Visibility,
    query: String,
    search: Option<SearchState>,
    hovered: Option<TreeNodeId>,
    engine: TreeLayoutEngine,
    layout: TreeLayout,
    scheduler: Scheduler,
    events: EventQueue,
    error: Option<InputError>,
}

impl TreeSession {
    pub fn new(config: DiagramConfig) -> Self {
        let tree = build_tree(&GraphModel::default());
        let visibility = Visibility::with_default_policy(&tree, config.expanded_depth);
        let engine = TreeLayoutEngine::new(config.tree.clone());
        let mut session = Self {
            config,
            tree,
            visibility,
            query: String::new(),
            search: None,
            hovered: None,
            engine,
            layout: TreeLayout::default(),
            scheduler: Scheduler::default(),
            events: EventQueue::default(),
            error: None,
        };
        session.relayout(None);
        session
    }

    pub fn tree(&self) -> &HierarchyTree {
        &self.tree
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    pub fn search(&self) -> Option<&SearchState> {
        self.search.as_ref()
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    pub fn epoch(&self) -> u64 {
        self.scheduler.epoch()
    }

    pub fn error(&self) -> Option<&InputError> {
        self.error.as_ref()
    }

    /// Replaces the hierarchy. Undecodable input leaves an empty diagram and
    /// an error for the host. An active query is re-run and reported.
    pub fn set_data(&mut self, json: &str) {
        self.scheduler.bump_epoch();
        let records = match parse_hierarchy(json) {
            Ok(records) => {
                self.error = None;
                records
            }
            Err(e) => {
                warn!("tree: {e}");
                self.error = Some(e);
                Vec::new()
            }
        };
        let model = GraphModel::from_hierarchy(&records);
        self.tree = build_tree(&model);
        debug!(
            "tree: {} nodes, depth {}, {} dropped",
            self.tree.len(),
            self.tree.max_depth(),
            self.tree.dropped.len()
        );
        self.hovered = None;
        self.engine.reset();
        self.events.clear();
        let searching = !self.query.is_empty();
        self.apply_query(searching);
        self.relayout(None);
    }

    /// Re-runs search. An empty query restores the default collapse policy.
    pub fn set_query(&mut self, query: &str, now_ms: f64) {
        self.scheduler.bump_epoch();
        self.query = query.to_string();
        self.apply_query(true);
        self.relayout(Some(now_ms));
    }

    fn apply_query(&mut self, notify: bool) {
        self.search = run_search(&self.tree, &self.query);
        self.visibility = match &self.search {
            Some(search) => search_visibility(&self.tree, search),
            None => Visibility::with_default_policy(&self.tree, self.config.expanded_depth),
        };
        if notify {
            let matched_ids = self
                .search
                .as_ref()
                .map(|s| s.matched_ids(&self.tree))
                .unwrap_or_default();
            self.events.push(DiagramEvent::SearchMatch { matched_ids });
        }
    }

    pub fn expand_all(&mut self, now_ms: f64) {
        self.visibility.expand_all();
        self.relayout(Some(now_ms));
    }

    pub fn collapse_all(&mut self, now_ms: f64) {
        self.visibility.collapse_all(&self.tree);
        self.relayout(Some(now_ms));
    }

    /// Returns false for unknown ids and leaves.
    pub fn toggle(&mut self, id: &str, now_ms: f64) -> bool {
        let Some(tid) = self.tree.get(id) else {
            return false;
        };
        let changed = self.visibility.toggle(&self.tree, tid);
        if changed {
            self.relayout(Some(now_ms));
        }
        changed
    }

    pub fn click(&mut self, id: &str, now_ms: f64) {
        let Some(tid) = self.tree.get(id) else {
            debug!("tree: click on unknown node {id:?}");
            return;
        };
        let node = self.tree.node(tid);
        let system_code = match node.level {
            NodeLevel::System => node.system_code.clone(),
            _ => None,
        };
        if let Some(system_code) = system_code {
            self.events.push(DiagramEvent::SystemClick { system_code });
        } else if !node.is_leaf() {
            self.toggle(id, now_ms);
        } else {
            let node_id = node.id.clone();
            self.events.push(DiagramEvent::NodeActivate { node_id });
        }
    }

    /// Hover by id; None or an unknown id clears it.
    pub fn hover(&mut self, id: Option<&str>) {
        self.hovered = id.and_then(|id| self.tree.get(id));
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.config.width = width.max(0.0);
        self.config.height = height.max(0.0);
        self.relayout(None);
    }

    /// Drives pending transitions. Stale epochs are ignored.
    pub fn tick(&mut self, now_ms: f64, epoch: u64) -> TickOutcome {
        if !self.scheduler.is_live(epoch) {
            return TickOutcome::Cancelled;
        }
        for task in self.scheduler.poll(now_ms) {
            if task == TaskKind::Transition {
                self.layout.exits.clear();
            }
        }
        if self.scheduler.is_idle() { TickOutcome::Settled } else { TickOutcome::Continue }
    }

    pub fn drain_events(&mut self) -> Vec<DiagramEvent> {
        self.events.drain()
    }

    /// Tears down: cancels pending tasks and drops all state.
    pub fn dispose(&mut self) {
        self.scheduler.bump_epoch();
        self.tree = build_tree(&GraphModel::default());
        self.visibility = Visibility::expanded(&self.tree);
        self.search = None;
        self.query.clear();
        self.hovered = None;
        self.engine.reset();
        self.layout = TreeLayout::default();
        self.events.clear();
        self.error = None;
    }

    fn relayout(&mut self, now_ms: Option<f64>) {
        let visible = if self.tree.is_empty() {
            Default::default()
        } else {
            derive_visible_tree(&self.tree, &self.visibility)
        };
        self.layout = self.engine.layout(&self.tree, &visible);
        if let Some(now) = now_ms {
            self.scheduler.schedule(TaskKind::Transition, now + self.config.transition_ms);
        }
    }

    pub fn highlight_of(&self, tid: TreeNodeId) -> Highlight {
        let (matched, on_path) = match &self.search {
            Some(s) => (s.is_match(tid), s.is_on_path(tid)),
            None => (false, false),
        };
        Highlight::classify(self.hovered == Some(tid), matched, on_path)
    }

    pub fn render(&self) -> TreeOutput {
        let nodes = self
            .layout
            .nodes
            .iter()
            .map(|placed| {
                let node = self.tree.node(placed.tid);
                TreeNodeOutput {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    level: node.level.as_str().to_string(),
                    depth: placed.depth,
                    x: placed.x,
                    y: placed.y,
                    x0: placed.x0,
                    y0: placed.y0,
                    collapsed: placed.collapsed,
                    has_children: !node.is_leaf(),
                    color: palette::level_color(&node.level),
                    highlight: self.highlight_of(placed.tid),
                    system_code: node.system_code.clone(),
                    system_count: node.system_count,
                }
            })
            .collect();

        let emphasized: HashSet<&str> = match &self.search {
            Some(s) => s
                .matched
                .iter()
                .chain(s.path.iter())
                .map(|&t| self.tree.node(t).id.as_str())
                .collect(),
            None => HashSet::new(),
        };
        let links = self
            .layout
            .links
            .iter()
            .map(|l| TreeLinkOutput {
                source: l.source.clone(),
                target: l.target.clone(),
                from: l.from,
                to: l.to,
                highlight: if emphasized.contains(l.target.as_str()) {
                    Highlight::OnPath
                } else {
                    Highlight::None
                },
            })
            .collect();

        TreeOutput {
            epoch: self.scheduler.epoch(),
            transform: ViewTransform { x: TREE_MARGIN, y: self.config.height / 2.0, k: 1.0 },
            nodes,
            links,
            exits: self.layout.exits.clone(),
            error: self.error.as_ref().map(ErrorInfo::from),
        }
    }

    pub fn render_json(&self) -> String {
        serde_json::to_string(&self.render()).unwrap_or_else(|e| {
            warn!("tree: render failed: {e}");
            "{}".to_string()
        })
    }
}

impl Default for TreeSession {
    fn default() -> Self {
        Self::new(DiagramConfig::default())
    }
}
