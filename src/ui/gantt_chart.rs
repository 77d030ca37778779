use egui::{Color32, Pos2, Sense, Ui, Vec2};
use gantt_canvas::layout::{Point, Size};
use gantt_canvas::render::{GanttEngine, Listener};
use gantt_canvas::Result;

use crate::ui::host::EguiHost;
use crate::ui::surface::EguiSurface;

/// Render the chart canvas into the remaining space of `ui` and forward this
/// pass's pointer and wheel input to the engine.
pub fn show_gantt_chart(
    engine: &mut GanttEngine<EguiHost>,
    background: Color32,
    ui: &mut Ui,
) -> Result<()> {
    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click());
    let rect = response.rect;
    painter.rect_filled(rect, 0.0, background);

    let resized = engine
        .host_mut()
        .set_canvas_size(Size::new(rect.width(), rect.height()));
    if !engine.is_rendered() {
        return Ok(());
    }
    if resized {
        engine.resize()?;
    }

    let local = |p: Pos2| Point::new(p.x - rect.min.x, p.y - rect.min.y);

    if let Some(pos) = response.hover_pos() {
        let moved = ui.input(|i| i.pointer.delta() != Vec2::ZERO);
        if moved && engine.host().is_listening(Listener::PointerMove) {
            engine.pointer_move(local(pos))?;
        }
        let scroll = ui.input(|i| i.smooth_scroll_delta);
        if scroll != Vec2::ZERO && engine.host().is_listening(Listener::Wheel) {
            // egui reports how far content should move; the engine wants
            // wheel deltas, which point the other way.
            engine.wheel(local(pos), -scroll.x, -scroll.y)?;
        }
    }

    if response.clicked() && engine.host().is_listening(Listener::Click) {
        if let Some(pos) = response.interact_pointer_pos() {
            engine.click(local(pos))?;
        }
    }

    for id in engine.host_mut().due_timers() {
        engine.timer_fired(id);
    }

    if engine.host_mut().take_frame().is_some() {
        let mut surface = EguiSurface::new(painter, rect.min, background);
        engine.frame(&mut surface)?;
    }
    Ok(())
}
