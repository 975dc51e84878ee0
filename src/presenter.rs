use crate::grid::{Cell, Size};
use crate::session::SessionState;

/// A continuous board position, in cell units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl From<Cell> for Point {
    fn from(cell: Cell) -> Self {
        Point {
            x: cell.x as f32,
            y: cell.y as f32,
        }
    }
}

/// Blends two head-first snapshots.
///
/// Segments are matched by their distance from the head. A segment with no
/// counterpart in `previous` (the tail that appears when the snake grows)
/// is drawn where it is now.
pub fn interpolate(previous: &[Cell], current: &[Cell], t: f32) -> Vec<Point> {
    let t = t.clamp(0.0, 1.0);
    current
        .iter()
        .enumerate()
        .map(|(i, &now)| {
            let now = Point::from(now);
            match previous.get(i) {
                Some(&then) => {
                    let then = Point::from(then);
                    Point {
                        x: then.x + (now.x - then.x) * t,
                        y: then.y + (now.y - then.y) * t,
                    }
                }
                None => now,
            }
        })
        .collect()
}

/// Everything a UI needs to draw one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderState {
    pub size: Size,
    pub segments: Vec<Point>,
    pub food: Option<Cell>,
    pub obstacles: Vec<Cell>,
    pub score: u32,
    pub high_score: u32,
    pub state: SessionState,
    pub fraction: f32,
}

impl RenderState {
    pub fn head(&self) -> Option<Point> {
        self.segments.first().copied()
    }
}
