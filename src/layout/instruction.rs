//! Backend-neutral drawing program.
//!
//! Layout and routing emit lists of [`Instruction`]s instead of painting. A
//! backend replays them with [`crate::render::interpret`]; the same lists are
//! kept next to each [`Geometry`] entry so hit-testing and repainting share one
//! source of truth.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    BeginPath,
    ClosePath,
    Fill,
    Stroke,
    MoveTo {
        x: f32,
        y: f32,
    },
    LineTo {
        x: f32,
        y: f32,
    },
    /// Tangent arc through the corner `(x1, y1)` towards `(x2, y2)`.
    ArcTo {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        radius: f32,
    },
    QuadraticCurveTo {
        cx: f32,
        cy: f32,
        x: f32,
        y: f32,
    },
    /// Stroked rectangle outline.
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    /// Filled and stroked rounded rectangle.
    Box {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
    },
    /// Filled arrowhead; strokes the pending path first.
    Triangle {
        a: Point,
        b: Point,
        c: Point,
    },
    FillText {
        text: String,
        x: f32,
        y: f32,
    },
}

impl Instruction {
    pub fn move_to(p: Point) -> Self {
        Instruction::MoveTo { x: p.x, y: p.y }
    }

    pub fn line_to(p: Point) -> Self {
        Instruction::LineTo { x: p.x, y: p.y }
    }

    pub fn arc_to(corner: Point, towards: Point, radius: f32) -> Self {
        Instruction::ArcTo {
            x1: corner.x,
            y1: corner.y,
            x2: towards.x,
            y2: towards.y,
            radius,
        }
    }

    pub fn text(text: impl Into<String>, x: f32, y: f32) -> Self {
        Instruction::FillText {
            text: text.into(),
            x,
            y,
        }
    }

    /// Every coordinate this instruction touches, in order.
    pub fn points(&self) -> Vec<Point> {
        match self {
            Instruction::BeginPath
            | Instruction::ClosePath
            | Instruction::Fill
            | Instruction::Stroke => Vec::new(),
            Instruction::MoveTo { x, y }
            | Instruction::LineTo { x, y }
            | Instruction::FillText { x, y, .. } => vec![Point::new(*x, *y)],
            Instruction::ArcTo { x1, y1, x2, y2, .. } => {
                vec![Point::new(*x1, *y1), Point::new(*x2, *y2)]
            }
            Instruction::QuadraticCurveTo { cx, cy, x, y } => {
                vec![Point::new(*cx, *cy), Point::new(*x, *y)]
            }
            Instruction::Rect {
                x,
                y,
                width,
                height,
            }
            | Instruction::Box {
                x,
                y,
                width,
                height,
                ..
            } => vec![Point::new(*x, *y), Point::new(x + width, y + height)],
            Instruction::Triangle { a, b, c } => vec![*a, *b, *c],
        }
    }
}

/// One laid-out rectangle with its paint program and tooltip/click payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry<M> {
    pub start: Point,
    pub end: Point,
    pub instructions: Vec<Instruction>,
    pub data: M,
}

impl<M> Geometry<M> {
    /// Inclusive on every edge.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.start.x && p.x <= self.end.x && p.y >= self.start.y && p.y <= self.end.y
    }

    pub fn width(&self) -> f32 {
        self.end.x - self.start.x
    }

    pub fn height(&self) -> f32 {
        self.end.y - self.start.y
    }
}

/// First entry whose rectangle contains `p`.
pub fn hit_test<'a, M>(
    entries: impl IntoIterator<Item = &'a Geometry<M>>,
    p: Point,
) -> Option<&'a Geometry<M>>
where
    M: 'a,
{
    entries.into_iter().find(|entry| entry.contains(p))
}
