use crate::error::PageError;
use crate::types::{Point, Pt};
use serde::{Deserialize, Serialize};
use std::ops::Index;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    points: Vec<Point>,
    closed: bool,
}

impl Boundary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rectangle(width: Pt, height: Pt) -> Self {
        let mut boundary = Boundary::new();
        boundary.push_rectangle(width, height);
        boundary
    }

    fn push_rectangle(&mut self, width: Pt, height: Pt) {
        self.points = vec![
            Point::new(Pt::ZERO, height),
            Point::new(width, height),
            Point::new(width, Pt::ZERO),
            Point::new(Pt::ZERO, Pt::ZERO),
        ];
        self.closed = false;
        self.seal();
    }

    pub fn closed_from(points: impl IntoIterator<Item = Point>) -> Self {
        let mut boundary = Boundary {
            points: points.into_iter().collect(),
            closed: false,
        };
        if !boundary.points.is_empty() {
            boundary.seal();
        }
        boundary
    }

    pub fn from_top_left(top_left: Point, width: Pt, height: Pt) -> Self {
        let Point { x, y } = top_left;
        Boundary::closed_from([
            Point::new(x, y),
            Point::new(x + width, y),
            Point::new(x + width, y - height),
            Point::new(x, y - height),
        ])
    }

    pub fn reset(&mut self) {
        self.points.clear();
        self.closed = false;
    }

    pub fn push_point(&mut self, point: Point) -> Result<&mut Self, PageError> {
        if self.closed {
            return Err(PageError::BoundaryClosed);
        }
        self.points.push(point);
        Ok(self)
    }

    // Repeats the first point at the end. No points can be pushed afterwards.
    pub fn close(&mut self) -> Result<(), PageError> {
        if self.closed {
            return Err(PageError::BoundaryClosed);
        }
        if self.points.is_empty() {
            return Err(PageError::EmptyBoundary);
        }
        self.seal();
        Ok(())
    }

    fn seal(&mut self) {
        let first = self.points[0];
        self.points.push(first);
        self.closed = true;
    }

    pub fn translate(&mut self, index: usize, dx: Pt, dy: Pt) -> Result<(), PageError> {
        if !self.closed {
            return Err(PageError::BoundaryNotClosed);
        }
        let len = self.points.len();
        let point = self
            .points
            .get_mut(index)
            .ok_or(PageError::PointOutOfRange { index, len })?;
        *point = point.translate(dx, dy);
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn width(&self) -> Pt {
        let (min, max) = self.extent(|p| p.x);
        max - min
    }

    pub fn height(&self) -> Pt {
        let (min, max) = self.extent(|p| p.y);
        max - min
    }

    fn extent(&self, axis: impl Fn(&Point) -> Pt) -> (Pt, Pt) {
        let mut iter = self.points.iter().map(axis);
        let Some(first) = iter.next() else {
            return (Pt::ZERO, Pt::ZERO);
        };
        iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)))
    }

    pub fn top_left(&self) -> Option<Point> {
        let x = self.points.iter().map(|p| p.x).reduce(Pt::min)?;
        let y = self.points.iter().map(|p| p.y).reduce(Pt::max)?;
        Some(Point::new(x, y))
    }
}

impl Index<usize> for Boundary {
    type Output = Point;

    fn index(&self, index: usize) -> &Point {
        &self.points[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(v: i32) -> Pt {
        Pt::from_i32(v)
    }

    #[test]
    fn rectangle_is_closed_with_five_points() {
        let boundary = Boundary::rectangle(pt(595), pt(842));
        assert!(boundary.is_closed());
        assert_eq!(boundary.len(), 5);
        assert_eq!(boundary[0], Point::new(pt(0), pt(842)));
        assert_eq!(boundary[1], Point::new(pt(595), pt(842)));
        assert_eq!(boundary[2], Point::new(pt(595), pt(0)));
        assert_eq!(boundary[3], Point::new(pt(0), pt(0)));
        assert_eq!(boundary[4], boundary[0]);
        assert_eq!(boundary.width(), pt(595));
        assert_eq!(boundary.height(), pt(842));
    }

    #[test]
    fn push_after_close_is_rejected() {
        let mut boundary = Boundary::new();
        boundary
            .push_point(Point::new(pt(0), pt(0)))
            .expect("open boundary accepts points");
        boundary.close().expect("close");
        assert!(matches!(
            boundary.push_point(Point::new(pt(1), pt(1))),
            Err(PageError::BoundaryClosed)
        ));
        boundary.reset();
        assert!(!boundary.is_closed());
        assert!(boundary.is_empty());
    }

    #[test]
    fn close_requires_a_point() {
        let mut boundary = Boundary::new();
        assert!(matches!(boundary.close(), Err(PageError::EmptyBoundary)));
    }

    #[test]
    fn translate_requires_closed_boundary_and_valid_index() {
        let mut open = Boundary::new();
        open.push_point(Point::new(pt(0), pt(0))).expect("push");
        assert!(matches!(
            open.translate(0, pt(1), pt(1)),
            Err(PageError::BoundaryNotClosed)
        ));

        let mut boundary = Boundary::rectangle(pt(100), pt(100));
        assert!(matches!(
            boundary.translate(5, pt(1), pt(1)),
            Err(PageError::PointOutOfRange { index: 5, len: 5 })
        ));
        boundary.translate(0, pt(10), pt(5)).expect("translate");
        assert_eq!(boundary[0], Point::new(pt(10), pt(95)));
    }

    #[test]
    fn clone_is_independent() {
        let original = Boundary::rectangle(pt(100), pt(100));
        let mut copy = original.clone();
        copy.translate(1, pt(-20), Pt::ZERO).expect("translate");
        assert_eq!(original[1], Point::new(pt(100), pt(100)));
        assert_eq!(copy[1], Point::new(pt(80), pt(100)));
    }
}
