use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

use chrono::{DateTime, Days, NaiveTime, Utc};
use gantt_canvas::io::{self, CsvImport};
use gantt_canvas::model::{ChartDocument, Duration, Granularity, Header, RelationKind, Task};
use gantt_canvas::render::{BarClick, GanttEngine};
use tracing::{error, info};

use crate::ui;
use crate::ui::host::EguiHost;
use crate::ui::surface::EguiMeasure;

/// Main application state.
pub struct GanttApp {
    ctx: egui::Context,
    engine: GanttEngine<EguiHost>,
    pub document: ChartDocument,
    /// Waiting for the first frame: egui has no fonts to measure with before.
    pending: Option<ChartDocument>,
    pub file_path: Option<PathBuf>,
    pub status_message: String,
    clicks: Receiver<BarClick>,
}

impl GanttApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let ctx = cc.egui_ctx.clone();
        let document = Self::sample_document();
        let measure = EguiMeasure::new(ctx.clone(), &document.options.font);

        let (tx, clicks) = mpsc::channel();
        let engine = GanttEngine::new(EguiHost::new(ctx.clone()), Box::new(measure), Granularity::Day)
            .with_bar_click(move |click| {
                // The receiver lives as long as the app; a failed send means shutdown.
                let _ = tx.send(click.clone());
            });

        Self {
            ctx,
            engine,
            pending: Some(document.clone()),
            document,
            file_path: None,
            status_message: "Ready".to_string(),
            clicks,
        }
    }

    /// Generate a sample chart for demonstration.
    fn sample_document() -> ChartDocument {
        let today: DateTime<Utc> = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
        let day = |offset: i64| {
            let shifted = if offset >= 0 {
                today.checked_add_days(Days::new(offset.unsigned_abs()))
            } else {
                today.checked_sub_days(Days::new(offset.unsigned_abs()))
            };
            shifted.unwrap_or(today)
        };
        let with_progress = |mut task: Task, percentage: f32, class: &str| {
            task.main.percentage = percentage;
            task.main.class = class.to_string();
            task
        };

        let headers = vec![Header::new("name", "Task"), Header::new("owner", "Owner")];
        let tasks = vec![
            Task::new("planning", "Planning")
                .with_schedule(day(-5), day(8))
                .with_cell("name", "Planning")
                .with_cell("owner", "Alice")
                .with_relation("execution", RelationKind::FinishToStart),
            with_progress(
                Task::new("kickoff", "Project Kickoff")
                    .with_parent("planning")
                    .with_schedule(day(-5), day(-2))
                    .with_cell("name", "Project Kickoff")
                    .with_cell("owner", "Alice")
                    .with_relation("requirements", RelationKind::FinishToStart),
                100.0,
                "#4285f4",
            ),
            with_progress(
                Task::new("requirements", "Requirements Gathering")
                    .with_parent("planning")
                    .with_schedule(day(-2), day(5))
                    .with_cell("name", "Requirements Gathering")
                    .with_cell("owner", "Bob"),
                60.0,
                "#34a853",
            ),
            Task::new("execution", "Execution")
                .with_schedule(day(6), day(30))
                .with_timeline(Duration::new("baseline", day(4), day(26)).with_class("#b0bec5"))
                .with_cell("name", "Execution")
                .with_cell("owner", "Carol"),
            Task::new("build", "Build")
                .with_parent("execution")
                .with_schedule(day(6), day(20))
                .with_cell("name", "Build")
                .with_cell("owner", "Dave")
                .with_relation("test", RelationKind::StartToStart),
            Task::new("test", "Test")
                .with_parent("execution")
                .with_schedule(day(12), day(28))
                .with_cell("name", "Test")
                .with_cell("owner", "Erin")
                .with_relation("release", RelationKind::FinishToFinish),
            with_progress(
                Task::new("release", "Release")
                    .with_schedule(day(28), day(30))
                    .with_cell("name", "Release")
                    .with_cell("owner", "Carol"),
                0.0,
                "#fb8c00",
            ),
        ];
        ChartDocument::new(headers, tasks)
    }

    pub fn granularity(&self) -> Granularity {
        self.engine.granularity()
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        match self.engine.set_granularity(granularity) {
            Ok(()) => self.status_message = format!("Scale: {granularity}"),
            Err(e) => self.report("Cannot change scale", &e),
        }
    }

    /// Lay out and show `document`, replacing the current chart.
    fn show_document(&mut self, document: ChartDocument) -> gantt_canvas::Result<()> {
        self.engine
            .set_measure(Box::new(EguiMeasure::new(self.ctx.clone(), &document.options.font)));
        self.engine.render_document(document.clone())?;
        self.document = document;
        Ok(())
    }

    pub fn open_document(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Gantt chart", &["json"])
            .pick_file()
        {
            match io::load_document(&path).and_then(|doc| self.show_document(doc)) {
                Ok(()) => {
                    self.status_message = format!("Opened {}", file_name(&path));
                    self.file_path = Some(path);
                }
                Err(e) => self.report("Error loading", &e),
            }
        }
    }

    pub fn save_document(&mut self) {
        match self.file_path.clone() {
            Some(path) => match io::save_document(&self.document, &path) {
                Ok(()) => self.status_message = "Chart saved".to_string(),
                Err(e) => self.report("Error saving", &e),
            },
            None => self.save_document_as(),
        }
    }

    pub fn save_document_as(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Gantt chart", &["json"])
            .set_file_name("chart.gantt.json")
            .save_file()
        {
            match io::save_document(&self.document, &path) {
                Ok(()) => {
                    self.status_message = "Chart saved".to_string();
                    self.file_path = Some(path);
                }
                Err(e) => self.report("Error saving", &e),
            }
        }
    }

    pub fn import_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV files", &["csv", "tsv", "txt"])
            .pick_file()
        {
            match io::import_csv(&path) {
                Ok(CsvImport { document, skipped }) => {
                    let count = document.tasks.len();
                    match self.show_document(document) {
                        Ok(()) => {
                            self.file_path = None;
                            self.status_message = if skipped > 0 {
                                format!("Imported {count} tasks ({skipped} rows skipped)")
                            } else {
                                format!("Imported {count} tasks")
                            };
                        }
                        Err(e) => self.report("CSV import failed", &e),
                    }
                }
                Err(e) => self.report("CSV import failed", &e),
            }
        }
    }

    fn report(&mut self, context: &str, e: &gantt_canvas::GanttError) {
        error!(error = %e, "{context}");
        self.status_message = format!("{context}: {e}");
    }

    fn drain_clicks(&mut self) {
        while let Ok(click) = self.clicks.try_recv() {
            let name = self
                .document
                .tasks
                .iter()
                .find(|t| t.id == click.task_id)
                .map(|t| t.name.as_str())
                .unwrap_or(click.task_id.as_str());
            info!(task = %click.task_id, duration = %click.duration_id, "bar selected");
            self.status_message = format!("Selected '{}' ({})", name, click.duration_id);
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl eframe::App for GanttApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::theme::apply_theme(ctx);

        if let Some(document) = self.pending.take() {
            if let Err(e) = self.show_document(document) {
                self.report("Cannot show chart", &e);
            }
        }

        let should_save = ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::S));
        if should_save {
            self.save_document();
        }

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_STATUS)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .font(ui::theme::font_status())
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!("Tasks: {}", self.document.tasks.len()))
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                        ui.label(egui::RichText::new(" · ").size(10.5).color(ui::theme::TEXT_DIM));
                        ui.label(
                            egui::RichText::new(format!("Scale: {}", self.engine.granularity()))
                                .size(10.5)
                                .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        // Central panel: Gantt chart
        let background = ui::theme::color_or(&self.document.options.canvas_bg, ui::theme::BG_PANEL);
        let chart_frame = egui::Frame::default()
            .fill(background)
            .inner_margin(egui::Margin::ZERO);
        let mut chart_error = None;
        egui::CentralPanel::default().frame(chart_frame).show(ctx, |ui| {
            if let Err(e) = ui::gantt_chart::show_gantt_chart(&mut self.engine, background, ui) {
                chart_error = Some(e);
            }
        });
        if let Some(e) = chart_error {
            self.report("Chart error", &e);
        }

        self.drain_clicks();
    }
}
