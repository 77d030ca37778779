use crate::app::GanttApp;
use crate::ui::theme;
use egui::{menu, RichText, Ui};
use gantt_canvas::model::Granularity;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut GanttApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_menu()), |ui| {
            if ui.button("  Open...").clicked() {
                app.open_document();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Save          Ctrl+S").clicked() {
                app.save_document();
                ui.close_menu();
            }
            if ui.button("  Save As...").clicked() {
                app.save_document_as();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Import CSV...").clicked() {
                app.import_csv();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            ui.label(RichText::new("Timeline Scale").small().weak());
            let mut granularity = app.granularity();
            for g in Granularity::ALL {
                if ui.radio_value(&mut granularity, g, g.label()).clicked() {
                    app.set_granularity(g);
                    ui.close_menu();
                }
            }
        });
    });
}
