//! The drawing surface a backend provides and the replay of [`Instruction`]
//! lists onto it.

use crate::layout::{Instruction, Point, Region, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
}

/// Canvas-style immediate drawing API.
///
/// Text is vertically centred on its anchor and painted in the text colour,
/// independent of the fill style.
pub trait Surface {
    /// Called before every frame with the display size and the device pixel
    /// ratio. The backing store is `size * pixel_ratio` device pixels while
    /// drawing calls stay in display pixels.
    fn set_backing_size(&mut self, size: Size, pixel_ratio: f32);

    fn save(&mut self);
    fn restore(&mut self);
    /// Intersect the clip with `region` in current coordinates.
    fn clip(&mut self, region: Region);
    fn translate(&mut self, dx: f32, dy: f32);
    fn clear(&mut self, region: Region);

    fn set_fill_style(&mut self, color: &str);
    fn set_stroke_style(&mut self, color: &str);
    fn set_text_color(&mut self, color: &str);
    fn set_line_width(&mut self, width: f32);
    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: TextAlign);

    fn begin_path(&mut self);
    fn close_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn arc_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32);
    fn quadratic_curve_to(&mut self, cx: f32, cy: f32, x: f32, y: f32);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32);
    fn fill_text(&mut self, text: &str, x: f32, y: f32);
}

/// Closed rounded-rectangle path; the caller fills and strokes it.
pub fn rounded_rect(surface: &mut dyn Surface, x: f32, y: f32, width: f32, height: f32, r: f32) {
    surface.begin_path();
    surface.move_to(x + r, y);
    surface.line_to(x + width - r, y);
    surface.quadratic_curve_to(x + width, y, x + width, y + r);
    surface.line_to(x + width, y + height - r);
    surface.quadratic_curve_to(x + width, y + height, x + width - r, y + height);
    surface.line_to(x + r, y + height);
    surface.quadratic_curve_to(x, y + height, x, y + height - r);
    surface.line_to(x, y + r);
    surface.quadratic_curve_to(x, y, x + r, y);
    surface.close_path();
}

fn triangle(surface: &mut dyn Surface, a: Point, b: Point, c: Point) {
    surface.begin_path();
    surface.move_to(a.x, a.y);
    surface.line_to(b.x, b.y);
    surface.line_to(c.x, c.y);
    surface.close_path();
    surface.fill();
    surface.stroke();
}

/// Replay `instructions` onto `surface`.
pub fn interpret(instructions: &[Instruction], surface: &mut dyn Surface) {
    for instruction in instructions {
        match instruction {
            Instruction::BeginPath => surface.begin_path(),
            Instruction::ClosePath => surface.close_path(),
            Instruction::Fill => surface.fill(),
            Instruction::Stroke => surface.stroke(),
            Instruction::MoveTo { x, y } => surface.move_to(*x, *y),
            Instruction::LineTo { x, y } => surface.line_to(*x, *y),
            Instruction::ArcTo {
                x1,
                y1,
                x2,
                y2,
                radius,
            } => surface.arc_to(*x1, *y1, *x2, *y2, *radius),
            Instruction::QuadraticCurveTo { cx, cy, x, y } => {
                surface.quadratic_curve_to(*cx, *cy, *x, *y)
            }
            Instruction::Rect {
                x,
                y,
                width,
                height,
            } => surface.stroke_rect(*x, *y, *width, *height),
            Instruction::Box {
                x,
                y,
                width,
                height,
                radius,
            } => {
                rounded_rect(surface, *x, *y, *width, *height, *radius);
                surface.fill();
                surface.stroke();
            }
            Instruction::Triangle { a, b, c } => {
                // The arrowhead ends a relation path that has not been stroked yet.
                surface.stroke();
                triangle(surface, *a, *b, *c);
            }
            Instruction::FillText { text, x, y } => surface.fill_text(text, *x, *y),
        }
    }
}
