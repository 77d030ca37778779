//! Screen regions of the chart and the scroll state shared between them.

use serde::{Deserialize, Serialize};

use super::instruction::Point;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned screen rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Region {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionKind {
    /// Column headers; never scrolls.
    Header,
    /// Date labels; scrolls horizontally.
    DateHeader,
    /// Task label column; scrolls vertically.
    Labels,
    /// Bars and relations; scrolls both ways.
    Chart,
}

/// The four non-overlapping regions of the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Regions {
    pub header: Region,
    pub dates: Region,
    pub labels: Region,
    pub chart: Region,
}

impl Regions {
    /// `header_width` is the full width of the label column.
    pub fn new(header_width: f32, header_height: f32, canvas: Size) -> Self {
        let available = canvas.height - header_height;
        let body = canvas.width - header_width;
        Self {
            header: Region::new(0.0, 0.0, header_width, header_height),
            dates: Region::new(header_width, 0.0, body, header_height),
            labels: Region::new(0.0, header_height, header_width, available),
            chart: Region::new(header_width, header_height, body, available),
        }
    }

    pub fn get(&self, kind: RegionKind) -> Region {
        match kind {
            RegionKind::Header => self.header,
            RegionKind::DateHeader => self.dates,
            RegionKind::Labels => self.labels,
            RegionKind::Chart => self.chart,
        }
    }

    /// Region under a canvas point and the point in that region's scrolled
    /// content space.
    pub fn classify(&self, p: Point, scroll: &Scroll) -> (RegionKind, Point) {
        let (kind, sx, sy) = if p.x < self.dates.x && p.y < self.labels.y {
            (RegionKind::Header, 0.0, 0.0)
        } else if p.x > self.dates.x && p.y < self.labels.y {
            (RegionKind::DateHeader, scroll.x, 0.0)
        } else if p.x < self.dates.x && p.y > self.header.y {
            (RegionKind::Labels, 0.0, scroll.y)
        } else {
            (RegionKind::Chart, scroll.x, scroll.y)
        };
        let origin = self.get(kind).origin();
        (kind, Point::new(p.x - origin.x + sx, p.y - origin.y + sy))
    }
}

/// Scroll offsets and their current limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scroll {
    pub x: f32,
    pub y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Scroll {
    /// Recompute the limits for content of the given size and re-clamp.
    pub fn set_limits(&mut self, content: Size, regions: &Regions) {
        self.max_x = (content.width - regions.dates.width).max(0.0);
        self.max_y = (content.height - regions.labels.height).max(0.0);
        self.clamp();
    }

    pub fn clamp(&mut self) {
        self.x = self.x.min(self.max_x).max(0.0);
        self.y = self.y.min(self.max_y).max(0.0);
    }

    /// Apply a wheel delta at canvas point `p`. Returns whether the pointer
    /// was over a scrollable region.
    pub fn wheel(&mut self, regions: &Regions, p: Point, dx: f32, dy: f32) -> bool {
        let scrolled = if p.x >= regions.chart.x && p.y >= regions.chart.y {
            self.x += dx;
            self.y += dy;
            true
        } else if p.x >= regions.dates.x && p.y < regions.dates.y + regions.dates.height {
            self.x += dx;
            true
        } else if p.x < regions.labels.width && p.y >= regions.labels.y {
            self.y += dy;
            true
        } else {
            false
        };
        self.clamp();
        scrolled
    }

    pub fn reset(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn regions() -> Regions {
        Regions::new(600.0, 50.0, Size::new(1200.0, 650.0))
    }

    #[test]
    fn regions_tile_the_canvas() {
        let r = regions();
        assert_eq!(r.dates, Region::new(600.0, 0.0, 600.0, 50.0));
        assert_eq!(r.labels, Region::new(0.0, 50.0, 600.0, 600.0));
        assert_eq!(r.chart, Region::new(600.0, 50.0, 600.0, 600.0));
    }

    #[test]
    fn classify_applies_only_the_relevant_scroll() {
        let r = regions();
        let scroll = Scroll {
            x: 100.0,
            y: 40.0,
            max_x: 500.0,
            max_y: 500.0,
        };
        assert_eq!(
            r.classify(Point::new(10.0, 10.0), &scroll),
            (RegionKind::Header, Point::new(10.0, 10.0))
        );
        assert_eq!(
            r.classify(Point::new(700.0, 10.0), &scroll),
            (RegionKind::DateHeader, Point::new(200.0, 10.0))
        );
        assert_eq!(
            r.classify(Point::new(10.0, 60.0), &scroll),
            (RegionKind::Labels, Point::new(10.0, 50.0))
        );
        assert_eq!(
            r.classify(Point::new(700.0, 60.0), &scroll),
            (RegionKind::Chart, Point::new(200.0, 50.0))
        );
    }

    #[test]
    fn chart_wheel_moves_both_axes_and_clamps() {
        let r = regions();
        let mut scroll = Scroll::default();
        scroll.set_limits(Size::new(1000.0, 800.0), &r);
        assert_eq!((scroll.max_x, scroll.max_y), (400.0, 200.0));

        assert!(scroll.wheel(&r, Point::new(700.0, 300.0), 50.0, 30.0));
        assert_eq!((scroll.x, scroll.y), (50.0, 30.0));

        scroll.wheel(&r, Point::new(700.0, 300.0), 10_000.0, 10_000.0);
        assert_eq!((scroll.x, scroll.y), (400.0, 200.0));

        scroll.wheel(&r, Point::new(700.0, 300.0), -10_000.0, -10_000.0);
        assert_eq!((scroll.x, scroll.y), (0.0, 0.0));
    }

    #[test]
    fn bands_scroll_one_axis() {
        let r = regions();
        let mut scroll = Scroll::default();
        scroll.set_limits(Size::new(1000.0, 800.0), &r);

        scroll.wheel(&r, Point::new(700.0, 10.0), 20.0, 20.0);
        assert_eq!((scroll.x, scroll.y), (20.0, 0.0));

        scroll.wheel(&r, Point::new(10.0, 300.0), 20.0, 20.0);
        assert_eq!((scroll.x, scroll.y), (20.0, 20.0));

        assert!(!scroll.wheel(&r, Point::new(10.0, 10.0), 20.0, 20.0));
        assert_eq!((scroll.x, scroll.y), (20.0, 20.0));
    }

    #[test]
    fn shrinking_content_reclamps() {
        let r = regions();
        let mut scroll = Scroll {
            x: 300.0,
            y: 150.0,
            ..Default::default()
        };
        scroll.set_limits(Size::new(700.0, 620.0), &r);
        assert_eq!((scroll.x, scroll.y), (100.0, 20.0));
    }
}
