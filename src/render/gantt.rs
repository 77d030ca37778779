//! The public chart engine: owns one [`LayoutEngine`] per granularity, the
//! shared expand/collapse state, scrolling, and the host subscriptions.

use std::time::Duration;

use tracing::{debug, info};

use super::host::{FrameId, Host, Listener, TimerId};
use super::painter::{FrameState, Painter};
use super::surface::Surface;
use crate::error::{GanttError, Result};
use crate::layout::{
    BarGeometry, LayoutEngine, Point, RegionKind, Regions, Scroll, Size, TaskTree, TextMeasure,
};
use crate::model::{
    ChartDocument, ChartZone, GanttOptions, Granularity, Header, RelationColors, Task,
};

/// Idle time after the last pointer move before the tooltip disappears.
pub const TOOLTIP_HIDE_DELAY: Duration = Duration::from_millis(1000);

/// Payload of a click on a duration bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarClick {
    pub task_id: String,
    pub duration_id: String,
}

type ClickHandler = Box<dyn FnMut(&BarClick)>;

/// State established by `render()`.
struct Rendered {
    tree: TaskTree,
    engines: Vec<LayoutEngine>,
    options: GanttOptions,
    colors: RelationColors,
}

impl Rendered {
    fn engine(&self, g: Granularity) -> &LayoutEngine {
        &self.engines[g.index()]
    }
}

pub struct GanttEngine<H: Host> {
    host: H,
    measure: Box<dyn TextMeasure>,
    granularity: Granularity,
    on_bar_click: Option<ClickHandler>,
    rendered: Option<Rendered>,

    regions: Regions,
    scroll: Scroll,
    /// Pointer in chart content coordinates while it is over the chart.
    pointer: Option<Point>,
    tooltip_timer: Option<TimerId>,
    frame: Option<FrameId>,
    listening: bool,
    initial_load: bool,
    destroyed: bool,
}

impl<H: Host> GanttEngine<H> {
    pub fn new(host: H, measure: Box<dyn TextMeasure>, granularity: Granularity) -> Self {
        Self {
            host,
            measure,
            granularity,
            on_bar_click: None,
            rendered: None,
            regions: Regions::default(),
            scroll: Scroll::default(),
            pointer: None,
            tooltip_timer: None,
            frame: None,
            listening: false,
            initial_load: true,
            destroyed: false,
        }
    }

    pub fn with_bar_click(mut self, handler: impl FnMut(&BarClick) + 'static) -> Self {
        self.on_bar_click = Some(Box::new(handler));
        self
    }

    /// Replace the text measurer; takes effect on the next layout.
    pub fn set_measure(&mut self, measure: Box<dyn TextMeasure>) {
        self.measure = measure;
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn scroll(&self) -> &Scroll {
        &self.scroll
    }

    pub fn regions(&self) -> &Regions {
        &self.regions
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered.is_some()
    }

    fn rendered(&self) -> Result<&Rendered> {
        self.rendered.as_ref().ok_or(GanttError::NotRendered)
    }

    /// Layout of the active granularity.
    pub fn active(&self) -> Result<&LayoutEngine> {
        let rendered = self.rendered()?;
        Ok(rendered.engine(self.granularity))
    }

    pub fn tree(&self) -> Result<&TaskTree> {
        Ok(&self.rendered()?.tree)
    }

    /// Bar under the pointer, if the tooltip is showing.
    pub fn hovered(&self) -> Option<&BarGeometry> {
        let p = self.pointer?;
        self.active().ok()?.bar_at(p)
    }

    /// Replace the chart. Expand/collapse state starts fresh and scrolling
    /// returns to the origin.
    pub fn render(
        &mut self,
        headers: Vec<Header>,
        tasks: Vec<Task>,
        options: GanttOptions,
        colors: Option<RelationColors>,
        timezone: Option<ChartZone>,
    ) {
        info!(
            tasks = tasks.len(),
            headers = headers.len(),
            granularity = %self.granularity,
            "rendering chart"
        );
        let tree = TaskTree::new(tasks);
        let today = self.host.now();
        let engines = Granularity::ALL
            .iter()
            .map(|&g| {
                let mut engine = LayoutEngine::new(g, headers.clone(), options.clone(), timezone);
                engine.layout(&tree, self.measure.as_ref(), today);
                engine
            })
            .collect();

        self.rendered = Some(Rendered {
            tree,
            engines,
            options,
            colors: colors.unwrap_or_default(),
        });
        self.destroyed = false;
        self.pointer = None;
        self.scroll.reset();
        self.set_up();
    }

    pub fn render_document(&mut self, document: ChartDocument) -> Result<()> {
        let timezone = document.zone()?;
        self.render(
            document.headers,
            document.tasks,
            document.options,
            Some(document.relation_colors),
            timezone,
        );
        Ok(())
    }

    /// Switch the active granularity, keeping expand/collapse state.
    pub fn set_granularity(&mut self, granularity: Granularity) -> Result<()> {
        self.rendered()?;
        debug!(from = %self.granularity, to = %granularity, "switching granularity");
        self.granularity = granularity;
        self.relayout();
        if !self.destroyed {
            self.set_up();
        }
        Ok(())
    }

    fn relayout(&mut self) {
        let today = self.host.now();
        let g = self.granularity;
        let measure = self.measure.as_ref();
        if let Some(rendered) = self.rendered.as_mut() {
            let Rendered { tree, engines, .. } = rendered;
            engines[g.index()].layout(tree, measure, today);
        }
    }

    fn set_up(&mut self) {
        if let Some(id) = self.frame.take() {
            self.host.cancel_frame(id);
        }
        self.initial_load = true;
        self.compute_regions();
        if !self.listening {
            for listener in Listener::ALL {
                self.host.listen(listener);
            }
            self.listening = true;
        }
        self.frame = Some(self.host.request_frame());
    }

    fn compute_regions(&mut self) {
        let Some(rendered) = self.rendered.as_ref() else {
            return;
        };
        let columns = rendered.engine(self.granularity).headers().len() + 1;
        self.regions = Regions::new(
            columns as f32 * rendered.options.column_width,
            rendered.options.header_height,
            self.host.canvas_size(),
        );
    }

    fn update_scroll_limits(&mut self) {
        let Some(rendered) = self.rendered.as_ref() else {
            return;
        };
        let engine = rendered.engine(self.granularity);
        self.scroll.set_limits(
            Size::new(engine.content_width(), engine.content_height()),
            &self.regions,
        );
        if self.initial_load {
            self.initial_load = false;
            let boundary = engine.boundary();
            self.scroll.x = if boundary.is_empty() {
                0.0
            } else {
                (boundary.min - engine.unit_width()).min(self.scroll.max_x).max(0.0)
            };
        }
    }

    /// Paint the current state and schedule the next frame.
    pub fn frame(&mut self, surface: &mut dyn Surface) -> Result<()> {
        self.rendered()?;
        self.frame = None;
        if self.destroyed {
            return Ok(());
        }
        self.update_scroll_limits();

        let canvas = self.host.canvas_size();
        surface.set_backing_size(canvas, self.host.pixel_ratio());
        let tooltip = self.tooltip_anchor();
        if let Some(rendered) = self.rendered.as_ref() {
            let engine = rendered.engine(self.granularity);
            let painter = Painter::new(&rendered.options, &rendered.colors, self.measure.as_ref());
            painter.paint(
                surface,
                engine,
                &FrameState {
                    regions: &self.regions,
                    scroll: &self.scroll,
                    canvas,
                    tooltip: tooltip.and_then(|(at, local)| engine.bar_at(local).map(|bar| (at, bar))),
                },
            );
        }
        self.frame = Some(self.host.request_frame());
        Ok(())
    }

    /// Canvas position of the tooltip pointer and the chart-local hover point.
    fn tooltip_anchor(&self) -> Option<(Point, Point)> {
        let p = self.pointer?;
        if p.y - self.scroll.y <= 0.0 {
            return None;
        }
        let at = Point::new(
            p.x + self.regions.chart.x - self.scroll.x,
            p.y + self.regions.chart.y - self.scroll.y,
        );
        Some((at, p))
    }

    /// Wheel input at canvas point `p`.
    pub fn wheel(&mut self, p: Point, dx: f32, dy: f32) -> Result<bool> {
        self.rendered()?;
        if self.destroyed {
            return Ok(false);
        }
        self.update_scroll_limits();
        Ok(self.scroll.wheel(&self.regions, p, dx, dy))
    }

    /// Pointer movement at canvas point `p`; re-arms the tooltip hide timer.
    pub fn pointer_move(&mut self, p: Point) -> Result<()> {
        self.rendered()?;
        if self.destroyed {
            return Ok(());
        }
        if let Some(id) = self.tooltip_timer.take() {
            self.host.cancel_timer(id);
        }
        let (kind, local) = self.regions.classify(p, &self.scroll);
        self.pointer = (kind == RegionKind::Chart).then_some(local);
        self.tooltip_timer = Some(self.host.start_timer(TOOLTIP_HIDE_DELAY));
        Ok(())
    }

    pub fn timer_fired(&mut self, id: TimerId) {
        if self.tooltip_timer == Some(id) {
            self.tooltip_timer = None;
            self.pointer = None;
        }
    }

    /// Click at canvas point `p`: reports bar clicks and toggles rows clicked
    /// inside the first label column.
    pub fn click(&mut self, p: Point) -> Result<Option<BarClick>> {
        let rendered = self.rendered()?;
        if self.destroyed {
            return Ok(None);
        }
        let (kind, local) = self.regions.classify(p, &self.scroll);
        match kind {
            RegionKind::Chart => {
                let Some(bar) = rendered.engine(self.granularity).bar_at(local) else {
                    return Ok(None);
                };
                let click = BarClick {
                    task_id: bar.data.task_id.clone(),
                    duration_id: bar.data.duration_id.clone(),
                };
                debug!(task = %click.task_id, duration = %click.duration_id, "bar clicked");
                if let Some(handler) = self.on_bar_click.as_mut() {
                    handler(&click);
                }
                Ok(Some(click))
            }
            RegionKind::Labels if local.x < rendered.options.column_width * 2.0 => {
                let task_id = rendered
                    .engine(self.granularity)
                    .row_at(local)
                    .map(|row| row.data.task_id.clone());
                if let Some(task_id) = task_id {
                    self.toggle(&task_id)?;
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Expand or collapse a task and lay the active granularity out again.
    pub fn toggle(&mut self, task_id: &str) -> Result<bool> {
        let rendered = self.rendered.as_mut().ok_or(GanttError::NotRendered)?;
        if !rendered.tree.toggle(task_id) {
            return Ok(false);
        }
        debug!(task = task_id, open = rendered.tree.operations().is_open(task_id), "toggled");
        self.relayout();
        self.update_scroll_limits();
        Ok(true)
    }

    /// Re-read the canvas size.
    pub fn resize(&mut self) -> Result<()> {
        self.rendered()?;
        if !self.destroyed {
            self.set_up();
        }
        Ok(())
    }

    pub fn clear_screen(&self, surface: &mut dyn Surface) -> Result<()> {
        let rendered = self.rendered()?;
        Painter::new(&rendered.options, &rendered.colors, self.measure.as_ref())
            .clear(surface, &self.regions);
        Ok(())
    }

    /// Cancel the pending frame and tooltip timer and drop every listener.
    /// Input is ignored afterwards until the next `render`. Safe to call more
    /// than once.
    pub fn destroy(&mut self) {
        if let Some(id) = self.frame.take() {
            self.host.cancel_frame(id);
        }
        if let Some(id) = self.tooltip_timer.take() {
            self.host.cancel_timer(id);
        }
        if self.listening {
            for listener in Listener::ALL {
                self.host.unlisten(listener);
            }
            self.listening = false;
        }
        if !self.destroyed {
            debug!("engine destroyed");
        }
        self.pointer = None;
        self.destroyed = true;
    }
}

impl<H: Host> Drop for GanttEngine<H> {
    fn drop(&mut self) {
        self.destroy();
    }
}
