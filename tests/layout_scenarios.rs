use chrono::{DateTime, TimeZone, Utc};
use gantt_canvas::layout::{position, FixedAdvance, LayoutEngine, TaskTree};
use gantt_canvas::model::{GanttOptions, Granularity, Header, RelationKind, Task};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn jan(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

fn laid_out(tree: &TaskTree, g: Granularity) -> LayoutEngine {
    let mut engine = LayoutEngine::new(
        g,
        vec![Header::new("name", "Name")],
        GanttOptions::default(),
        None,
    );
    engine.layout(tree, &FixedAdvance(7.0), jan(1));
    engine
}

fn parent_and_child() -> TaskTree {
    TaskTree::new(vec![
        Task::new("A", "A").with_schedule(jan(1), jan(5)),
        Task::new("B", "B").with_parent("A").with_schedule(jan(2), jan(4)),
    ])
}

#[test]
fn collapsed_parent_hides_child_until_toggled() {
    let mut tree = parent_and_child();
    let engine = laid_out(&tree, Granularity::Day);
    assert_eq!(engine.visible(), ["A"]);

    assert!(tree.toggle("A"));
    let engine = laid_out(&tree, Granularity::Day);
    assert_eq!(engine.visible(), ["A", "B"]);

    let (min, _) = engine.window().unwrap();
    let b = engine.bar("B").unwrap();
    assert_eq!(b.start.x, position(min, jan(2), Granularity::Day, true, None));
}

#[test]
fn toggling_open_then_closed_restores_visible_set() {
    let mut tree = parent_and_child();
    let before = laid_out(&tree, Granularity::Week).visible().to_vec();
    tree.toggle("A");
    tree.toggle("A");
    assert_eq!(laid_out(&tree, Granularity::Week).visible(), before.as_slice());
}

#[test]
fn self_relation_is_not_routed() {
    let tree = TaskTree::new(vec![Task::new("A", "A")
        .with_schedule(jan(1), jan(5))
        .with_relation("A", RelationKind::FinishToStart)]);
    let engine = laid_out(&tree, Granularity::Day);
    assert!(engine.relation("A#A#FS").is_none());
    assert!(engine.relations().is_empty());
}

#[test]
fn relation_into_collapsed_task_is_not_routed() {
    let tree = TaskTree::new(vec![
        Task::new("A", "A").with_schedule(jan(1), jan(5)),
        Task::new("B", "B").with_parent("A").with_schedule(jan(2), jan(4)),
        Task::new("C", "C")
            .with_schedule(jan(6), jan(8))
            .with_relation("B", RelationKind::FinishToStart),
    ]);
    let engine = laid_out(&tree, Granularity::Day);
    assert_eq!(engine.visible(), ["A", "C"]);
    assert!(engine.relation("C#B#FS").is_none());
}

#[test]
fn relation_to_unknown_task_is_dropped() {
    let tree = TaskTree::new(vec![Task::new("A", "A")
        .with_schedule(jan(1), jan(5))
        .with_relation("missing", RelationKind::StartToStart)]);
    let engine = laid_out(&tree, Granularity::Month);
    assert!(engine.relations().is_empty());
    assert!(engine.lanes().is_empty());
}

#[test]
fn relations_into_same_target_and_kind_share_a_lane() {
    let tree = TaskTree::new(vec![
        Task::new("A", "A")
            .with_schedule(jan(1), jan(3))
            .with_relation("C", RelationKind::FinishToStart),
        Task::new("B", "B")
            .with_schedule(jan(2), jan(6))
            .with_relation("C", RelationKind::FinishToStart),
        Task::new("C", "C").with_schedule(jan(8), jan(10)),
        Task::new("D", "D")
            .with_schedule(jan(3), jan(4))
            .with_relation("E", RelationKind::StartToStart),
        Task::new("E", "E").with_schedule(jan(5), jan(9)),
    ]);
    let engine = laid_out(&tree, Granularity::Day);

    let a = engine.relation("A#C#FS").unwrap();
    let b = engine.relation("B#C#FS").unwrap();
    let d = engine.relation("D#E#SS").unwrap();
    assert_eq!(a.lane, b.lane);
    assert_eq!(engine.lanes().get("C", RelationKind::FinishToStart), Some(a.lane));
    assert_eq!(engine.lanes().len(), 2);

    // The first claim pushed both edges outwards, so the next pair gets a
    // lane clear of the first one on the side it routes along.
    assert!(d.lane.min < a.lane.min);
    assert!(d.lane.max > a.lane.max);
    assert!(!a.instructions.is_empty());
    assert!(!d.instructions.is_empty());
}

#[test]
fn lanes_sit_outside_every_bar() {
    let tree = TaskTree::new(vec![
        Task::new("A", "A")
            .with_schedule(jan(1), jan(3))
            .with_relation("B", RelationKind::FinishToFinish),
        Task::new("B", "B").with_schedule(jan(4), jan(9)),
    ]);
    let engine = laid_out(&tree, Granularity::Day);
    let lane = engine.relation("A#B#FF").unwrap().lane;
    for bar in engine.bars() {
        assert!(lane.min < bar.start.x);
        assert!(lane.max > bar.end.x);
    }
}

#[test]
fn repeated_layout_does_not_drift() {
    let tree = TaskTree::new(vec![
        Task::new("A", "A")
            .with_schedule(jan(1), jan(3))
            .with_relation("B", RelationKind::StartToFinish),
        Task::new("B", "B").with_schedule(jan(4), jan(9)),
    ]);
    for g in Granularity::ALL {
        let mut engine = laid_out(&tree, g);
        let bars = engine.bars().to_vec();
        let relations = engine.relations().to_vec();
        engine.layout(&tree, &FixedAdvance(7.0), jan(1));
        assert_eq!(engine.bars(), bars.as_slice());
        assert_eq!(engine.relations(), relations.as_slice());
    }
}

/// Parent index of task `i` is drawn from the tasks before it, or none.
fn forest() -> impl Strategy<Value = Vec<Option<usize>>> {
    (1usize..12).prop_flat_map(|n| {
        (0..n)
            .map(|i| {
                if i == 0 {
                    Just(None).boxed()
                } else {
                    prop::option::of(0..i).boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

fn build(parents: &[Option<usize>]) -> TaskTree {
    TaskTree::new(
        parents
            .iter()
            .enumerate()
            .map(|(i, parent)| {
                let task = Task::new(format!("t{i}"), format!("Task {i}"))
                    .with_schedule(jan(1 + i as u32), jan(2 + i as u32));
                match parent {
                    Some(p) => task.with_parent(format!("t{p}")),
                    None => task,
                }
            })
            .collect(),
    )
}

proptest! {
    #[test]
    fn open_close_round_trip_restores_visible_ids(
        parents in forest(),
        pre in prop::collection::vec(0usize..12, 0..6),
        pick in 0usize..12,
    ) {
        let mut tree = build(&parents);
        for i in pre {
            tree.toggle(&format!("t{}", i % parents.len()));
        }
        let id = format!("t{}", pick % parents.len());
        prop_assume!(!tree.operations().is_open(&id));

        let before: Vec<String> = tree.flatten().ids().into_iter().map(String::from).collect();
        if tree.toggle(&id) {
            tree.toggle(&id);
        }
        let after: Vec<String> = tree.flatten().ids().into_iter().map(String::from).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn every_bar_is_at_least_the_minimum_width(
        parents in forest(),
        g in prop::sample::select(Granularity::ALL.to_vec()),
    ) {
        let mut tree = build(&parents);
        for i in 0..parents.len() {
            tree.toggle(&format!("t{i}"));
        }
        let engine = laid_out(&tree, g);
        for bar in engine.bars() {
            prop_assert!(bar.end.x - bar.start.x >= engine.minimum_bar_width() - 1e-3);
        }
    }
}
