use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use gantt_canvas::io::{import_csv_str, load_document, save_document};
use gantt_canvas::layout::{FixedAdvance, Size};
use gantt_canvas::model::{ChartDocument, Granularity, Header, Task};
use gantt_canvas::render::{GanttEngine, HeadlessHost, RecordingSurface};
use pretty_assertions::assert_eq;

fn demo_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/sample.gantt.json")
}

fn headless() -> GanttEngine<HeadlessHost> {
    let today = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    GanttEngine::new(
        HeadlessHost::new(Size::new(1280.0, 720.0), today),
        Box::new(FixedAdvance(7.0)),
        Granularity::Day,
    )
}

#[test]
fn demo_document_renders_and_routes() {
    let doc = load_document(&demo_path()).unwrap();
    assert_eq!(doc.options.column_width, 180.0);
    assert_eq!(doc.options.box_height, 60.0);

    let mut e = headless();
    e.render_document(doc).unwrap();
    let active = e.active().unwrap();
    assert_eq!(active.visible(), ["design", "build", "qa", "launch", "retro"]);

    // A duration with only a start date keeps its row but draws nothing.
    assert!(active.row("retro").is_some());
    assert!(active.bar("retro").is_none());
    assert!(active.bar("build#baseline").is_some());

    for key in ["design#build#FS", "build#qa#SS", "build#launch#FF", "qa#launch#SF"] {
        assert!(active.relation(key).is_some(), "{key} not routed");
    }

    e.toggle("design").unwrap();
    let active = e.active().unwrap();
    assert!(active.relation("wireframes#review#FS").is_some());

    let mut surface = RecordingSurface::new();
    e.frame(&mut surface).unwrap();
    assert!(surface.texts().contains(&"Wireframes"));
}

#[test]
fn documents_survive_a_save_and_load() {
    let doc = load_document(&demo_path()).unwrap();
    let path = std::env::temp_dir().join(format!("gantt-canvas-{}.json", std::process::id()));
    save_document(&doc, &path).unwrap();
    let reloaded = load_document(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(reloaded, doc);
}

#[test]
fn imported_csv_renders_with_resolved_relations() {
    let csv = "\
id,name,parent,start,end,progress,relations
a,Plan,,2024-01-01,2024-01-05,100,b:FS
b,Build,,2024-01-06,2024-01-20,40,
c,Polish,b,2024-01-15,2024-01-19,,
d,Broken,,not a date,2024-01-19,,
";
    let import = import_csv_str(csv).unwrap();
    assert_eq!(import.skipped, 1);

    let mut e = headless();
    e.render_document(import.document).unwrap();
    e.set_granularity(Granularity::Week).unwrap();
    let active = e.active().unwrap();
    assert_eq!(active.visible(), ["a", "b"]);
    assert!(active.relation("a#b#FS").is_some());
}

/// Two tasks starting at consecutive Berlin midnights on either side of the
/// 2024-03-31 spring-forward.
fn around_berlin_dst(timezone: &str) -> ChartDocument {
    let before = Utc.with_ymd_and_hms(2024, 3, 30, 23, 0, 0).unwrap();
    let after = Utc.with_ymd_and_hms(2024, 3, 31, 22, 0, 0).unwrap();
    let mut doc = ChartDocument::new(
        vec![Header::new("name", "Name")],
        vec![
            Task::new("before", "Before").with_schedule(before, after),
            Task::new("after", "After").with_schedule(after, after),
        ],
    );
    doc.timezone = Some(timezone.into());
    doc
}

fn start_gap(doc: ChartDocument) -> f32 {
    let mut e = headless();
    e.render_document(doc).unwrap();
    let active = e.active().unwrap();
    active.bar("after").unwrap().start.x - active.bar("before").unwrap().start.x
}

#[test]
fn named_timezone_keeps_days_whole_across_dst() {
    let day = Granularity::Day.unit_width();
    assert_eq!(start_gap(around_berlin_dst("Europe/Berlin")), day);
    // A fixed winter offset sees both starts on the same calendar day.
    assert_eq!(start_gap(around_berlin_dst("+01:00")), 0.0);
}

#[test]
fn named_timezone_survives_a_save_and_load() {
    let doc = around_berlin_dst("Asia/Kolkata");
    let path = std::env::temp_dir().join(format!("gantt-canvas-tz-{}.json", std::process::id()));
    save_document(&doc, &path).unwrap();
    let reloaded = load_document(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(reloaded.timezone.as_deref(), Some("Asia/Kolkata"));
    assert!(reloaded.zone().unwrap().is_some());
}
