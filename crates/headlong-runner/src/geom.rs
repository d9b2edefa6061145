use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in screen-space px (Y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Strict AABB overlap; rectangles that only share an edge do not
    /// count as overlapping.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// This rect grown by `margin` on every side.
    pub fn inflated(&self, margin: f32) -> Rect {
        Rect {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }
}

/// Circle-vs-rect intersection via the closest point on the rect.
/// Tangent contact counts as intersecting.
pub fn circle_intersects_rect(cx: f32, cy: f32, radius: f32, rect: &Rect) -> bool {
    let closest_x = cx.clamp(rect.x, rect.right());
    let closest_y = cy.clamp(rect.y, rect.bottom());
    let dx = cx - closest_x;
    let dy = cy - closest_y;
    dx * dx + dy * dy <= radius * radius
}

/// Euclidean distance between two points.
pub fn dist(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    (x1 - x2).hypot(y1 - y2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_basic() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        let c = Rect::new(20.0, 0.0, 5.0, 5.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn inflated_grows_symmetrically() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0).inflated(2.0);
        assert_eq!(r.x, 8.0);
        assert_eq!(r.y, 18.0);
        assert_eq!(r.width, 34.0);
        assert_eq!(r.height, 44.0);
    }

    #[test]
    fn circle_hits_rect_face_and_misses_corner_gap() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(circle_intersects_rect(5.0, -3.0, 4.0, &r));
        assert!(circle_intersects_rect(5.0, 5.0, 1.0, &r), "Center inside");
        assert!(circle_intersects_rect(5.0, -4.0, 4.0, &r), "Tangent counts");
        // Close to the corner diagonally: gap is sqrt(2*3^2) ≈ 4.24 > 4
        assert!(!circle_intersects_rect(13.0, 13.0, 4.0, &r));
    }

    #[test]
    fn dist_matches_hypot() {
        assert_eq!(dist(0.0, 0.0, 3.0, 4.0), 5.0);
    }
}
