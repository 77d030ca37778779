//! Parent/child structure of the task list and its expand/collapse state.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::Task;

/// Reserved parent key of every root task.
pub const ROOT_KEY: &str = "#gantt-root#";
/// Extra left indent per nesting level.
pub const INDENT_STEP: f32 = 20.0;

/// Affordance drawn in front of a row label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symbol {
    Expand,
    Collapse,
    Neutral,
}

impl Symbol {
    pub fn glyph(self) -> &'static str {
        match self {
            Symbol::Expand => "+",
            Symbol::Collapse => "-",
            Symbol::Neutral => "",
        }
    }
}

/// Expand/collapse state of one task (or of the root).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub open: bool,
    pub symbol: Symbol,
    pub indent: f32,
    pub children: Vec<String>,
}

/// Per-task [`Operation`]s, shared by every granularity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationStore {
    ops: HashMap<String, Operation>,
}

impl OperationStore {
    pub fn get(&self, key: &str) -> Option<&Operation> {
        self.ops.get(key)
    }

    pub fn is_open(&self, key: &str) -> bool {
        self.ops.get(key).is_some_and(|op| op.open)
    }

    pub fn symbol(&self, key: &str) -> Symbol {
        self.ops.get(key).map(|op| op.symbol).unwrap_or(Symbol::Neutral)
    }

    pub fn indent(&self, key: &str) -> f32 {
        self.ops.get(key).map(|op| op.indent).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Result of one [`TaskTree::flatten`] pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Flattened<'a> {
    /// Visible tasks in display order.
    pub visible: Vec<&'a Task>,
    /// Earliest start and latest end over the visible drawable durations.
    pub window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// Total stacked bar slots of the visible rows.
    pub slots: usize,
}

impl Flattened<'_> {
    pub fn ids(&self) -> Vec<&str> {
        self.visible.iter().map(|t| t.id.as_str()).collect()
    }
}

/// Tasks in depth-first display order plus their shared expand/collapse state.
#[derive(Debug, Clone, Default)]
pub struct TaskTree {
    tasks: Vec<Task>,
    operations: OperationStore,
}

fn parent_key(task: &Task) -> &str {
    match task.parent.as_deref() {
        Some(parent) if !parent.is_empty() => parent,
        _ => ROOT_KEY,
    }
}

impl TaskTree {
    /// Orders `tasks` depth-first (siblings keep their input order) and builds
    /// one closed [`Operation`] per task. Tasks whose parent chain never
    /// reaches the root are dropped.
    pub fn new(tasks: Vec<Task>) -> Self {
        let mut children_of: HashMap<&str, Vec<usize>> = HashMap::new();
        for (idx, task) in tasks.iter().enumerate() {
            children_of.entry(parent_key(task)).or_default().push(idx);
        }

        let mut ops = HashMap::new();
        ops.insert(
            ROOT_KEY.to_string(),
            Operation {
                open: true,
                symbol: Symbol::Neutral,
                indent: 0.0,
                children: Vec::new(),
            },
        );

        let mut order = Vec::with_capacity(tasks.len());
        let mut seen = HashSet::new();
        let mut stack: Vec<(usize, f32)> = Vec::new();
        let push_children = |stack: &mut Vec<(usize, f32)>, key: &str, indent: f32| {
            if let Some(children) = children_of.get(key) {
                for &idx in children.iter().rev() {
                    stack.push((idx, indent + INDENT_STEP));
                }
            }
        };

        push_children(&mut stack, ROOT_KEY, 0.0);
        while let Some((idx, indent)) = stack.pop() {
            if !seen.insert(idx) {
                continue;
            }
            let task = &tasks[idx];
            let children: Vec<String> = children_of
                .get(task.id.as_str())
                .map(|c| c.iter().map(|&i| tasks[i].id.clone()).collect())
                .unwrap_or_default();
            ops.insert(
                task.id.clone(),
                Operation {
                    open: false,
                    symbol: if children.is_empty() {
                        Symbol::Neutral
                    } else {
                        Symbol::Expand
                    },
                    indent,
                    children,
                },
            );
            order.push(idx);
            push_children(&mut stack, task.id.as_str(), indent);
        }

        if let Some(root) = ops.get_mut(ROOT_KEY) {
            root.children = children_of
                .get(ROOT_KEY)
                .map(|c| c.iter().map(|&i| tasks[i].id.clone()).collect())
                .unwrap_or_default();
        }

        if order.len() < tasks.len() {
            for (idx, task) in tasks.iter().enumerate() {
                if !seen.contains(&idx) {
                    warn!(task = %task.id, parent = ?task.parent, "task is not reachable from the root; skipping");
                }
            }
        }

        let mut slots: Vec<Option<Task>> = tasks.into_iter().map(Some).collect();
        let tasks = order.into_iter().filter_map(|idx| slots[idx].take()).collect();

        Self {
            tasks,
            operations: OperationStore { ops },
        }
    }

    /// All reachable tasks in display order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn operations(&self) -> &OperationStore {
        &self.operations
    }

    /// Visible tasks (every ancestor open) and the date window they span.
    pub fn flatten(&self) -> Flattened<'_> {
        let mut shown: HashSet<&str> = HashSet::new();
        shown.insert(ROOT_KEY);

        let mut visible = Vec::new();
        let mut window: Option<(DateTime<Utc>, DateTime<Utc>)> = None;
        let mut slots = 0;

        for task in &self.tasks {
            let parent = parent_key(task);
            if !shown.contains(parent) || !self.operations.is_open(parent) {
                continue;
            }
            shown.insert(task.id.as_str());

            for duration in task.durations() {
                if let (Some(start), Some(end)) = (duration.start, duration.end) {
                    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
                    window = Some(match window {
                        Some((min, max)) => (min.min(lo), max.max(hi)),
                        None => (lo, hi),
                    });
                }
            }
            slots += task.bar_slots();
            visible.push(task);
        }

        Flattened {
            visible,
            window,
            slots,
        }
    }

    /// Opens a closed parent, or closes an open one together with all of its
    /// descendants. Returns `false` for unknown ids and leaves.
    pub fn toggle(&mut self, id: &str) -> bool {
        let Some(op) = self.operations.ops.get_mut(id) else {
            return false;
        };
        if op.children.is_empty() {
            return false;
        }
        if !op.open {
            op.open = true;
            op.symbol = Symbol::Collapse;
        } else {
            self.close(id);
        }
        true
    }

    fn close(&mut self, id: &str) {
        let mut stack = vec![id.to_string()];
        while let Some(key) = stack.pop() {
            if let Some(op) = self.operations.ops.get_mut(&key) {
                if op.children.is_empty() {
                    continue;
                }
                op.open = false;
                op.symbol = Symbol::Expand;
                stack.extend(op.children.iter().cloned());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn sample() -> TaskTree {
        TaskTree::new(vec![
            Task::new("a", "A").with_schedule(day(1), day(5)),
            Task::new("c", "C").with_parent("b").with_schedule(day(3), day(20)),
            Task::new("b", "B").with_parent("a").with_schedule(day(2), day(4)),
            Task::new("d", "D").with_schedule(day(6), day(8)),
        ])
    }

    #[test]
    fn orders_depth_first_even_when_children_come_first() {
        let tree = sample();
        let ids: Vec<&str> = tree.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn builds_indent_and_symbols() {
        let tree = sample();
        let ops = tree.operations();
        assert_eq!(ops.indent(ROOT_KEY), 0.0);
        assert_eq!(ops.indent("a"), INDENT_STEP);
        assert_eq!(ops.indent("c"), INDENT_STEP * 3.0);
        assert_eq!(ops.symbol("a"), Symbol::Expand);
        assert_eq!(ops.symbol("c"), Symbol::Neutral);
        assert!(ops.is_open(ROOT_KEY));
        assert!(!ops.is_open("a"));
    }

    #[test]
    fn collapsed_tree_shows_roots_only() {
        let tree = sample();
        let flat = tree.flatten();
        assert_eq!(flat.ids(), vec!["a", "d"]);
        assert_eq!(flat.window, Some((day(1), day(8))));
        assert_eq!(flat.slots, 2);
    }

    #[test]
    fn window_only_covers_visible_tasks() {
        let mut tree = sample();
        tree.toggle("a");
        tree.toggle("b");
        let flat = tree.flatten();
        assert_eq!(flat.ids(), vec!["a", "b", "c", "d"]);
        assert_eq!(flat.window, Some((day(1), day(20))));
    }

    #[test]
    fn closing_propagates_to_descendants() {
        let mut tree = sample();
        assert!(tree.toggle("a"));
        assert!(tree.toggle("b"));
        assert_eq!(tree.operations().symbol("a"), Symbol::Collapse);

        assert!(tree.toggle("a"));
        assert!(!tree.operations().is_open("b"));
        assert_eq!(tree.operations().symbol("a"), Symbol::Expand);
        assert_eq!(tree.operations().symbol("b"), Symbol::Expand);

        assert!(tree.toggle("a"));
        assert_eq!(tree.flatten().ids(), vec!["a", "b", "d"]);
    }

    #[test]
    fn toggle_round_trip_restores_visible_set() {
        let mut tree = sample();
        let before = tree.flatten().ids().join(",");
        tree.toggle("a");
        tree.toggle("a");
        assert_eq!(tree.flatten().ids().join(","), before);
    }

    #[test]
    fn leaves_and_unknown_ids_do_not_toggle() {
        let mut tree = sample();
        assert!(!tree.toggle("d"));
        assert!(!tree.toggle("missing"));
    }

    #[test]
    fn orphans_and_cycles_are_dropped() {
        let tree = TaskTree::new(vec![
            Task::new("a", "A"),
            Task::new("x", "X").with_parent("nobody"),
            Task::new("p", "P").with_parent("q"),
            Task::new("q", "Q").with_parent("p"),
        ]);
        let ids: Vec<&str> = tree.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn half_scheduled_durations_do_not_widen_window() {
        let mut task = Task::new("a", "A").with_schedule(day(3), day(4));
        task.timelines.push(crate::model::Duration {
            id: "late".into(),
            start: Some(day(1)),
            ..Default::default()
        });
        let tree = TaskTree::new(vec![task]);
        assert_eq!(tree.flatten().window, Some((day(3), day(4))));
    }
}
