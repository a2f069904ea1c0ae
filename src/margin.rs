use crate::boundary::Boundary;
use crate::error::PageError;
use crate::types::Pt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Bottom, Side::Left, Side::Right];

    pub fn attribute(self) -> &'static str {
        match self {
            Side::Top => "margin-top",
            Side::Bottom => "margin-bottom",
            Side::Left => "margin-left",
            Side::Right => "margin-right",
        }
    }

    pub fn from_attribute(name: &str) -> Option<Side> {
        Side::ALL.into_iter().find(|side| side.attribute() == name)
    }

    // Indices into the closed page boundary: 0 top-left, 1 top-right,
    // 2 bottom-right, 3 bottom-left, 4 the closing copy of 0.
    fn translation(self, delta: Pt) -> (&'static [usize], Pt, Pt) {
        const LEFT: &[usize] = &[0, 3, 4];
        const RIGHT: &[usize] = &[1, 2];
        const TOP: &[usize] = &[0, 1, 4];
        const BOTTOM: &[usize] = &[2, 3];
        match self {
            Side::Left => (LEFT, delta, Pt::ZERO),
            Side::Right => (RIGHT, -delta, Pt::ZERO),
            Side::Top => (TOP, Pt::ZERO, delta),
            Side::Bottom => (BOTTOM, Pt::ZERO, -delta),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top: Pt,
    pub right: Pt,
    pub bottom: Pt,
    pub left: Pt,
}

impl Margins {
    pub fn all(value: f32) -> Self {
        let v = Pt::from_f32(value);
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn get(&self, side: Side) -> Pt {
        match side {
            Side::Top => self.top,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub(crate) fn set(&mut self, side: Side, value: Pt) {
        match side {
            Side::Top => self.top = value,
            Side::Bottom => self.bottom = value,
            Side::Left => self.left = value,
            Side::Right => self.right = value,
        }
    }

    pub fn horizontal(&self) -> Pt {
        self.left + self.right
    }

    pub fn vertical(&self) -> Pt {
        self.top + self.bottom
    }

    pub fn parse_shorthand(raw: &str) -> Option<Margins> {
        let values: Vec<Pt> = raw
            .split_whitespace()
            .map(Pt::parse)
            .collect::<Option<Vec<_>>>()?;
        let (top, right, bottom, left) = match values.as_slice() {
            [all] => (*all, *all, *all, *all),
            [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
            [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
            [top, right, bottom, left] => (*top, *right, *bottom, *left),
            _ => return None,
        };
        Some(Margins {
            top,
            right,
            bottom,
            left,
        })
    }
}

pub fn translate_margin(boundary: &mut Boundary, side: Side, delta: Pt) -> Result<(), PageError> {
    if !boundary.is_closed() {
        return Ok(());
    }
    let (indexes, dx, dy) = side.translation(delta);
    for &index in indexes {
        if index < boundary.len() {
            boundary.translate(index, dx, dy)?;
        }
    }
    Ok(())
}

pub fn real_boundary(content: &Boundary, margins: &Margins) -> Result<Boundary, PageError> {
    let mut boundary = content.clone();
    if boundary.len() < 5 {
        return Ok(boundary);
    }
    let Margins {
        top,
        right,
        bottom,
        left,
    } = *margins;
    boundary.translate(0, -left, -top)?;
    boundary.translate(1, right, -top)?;
    boundary.translate(2, right, bottom)?;
    boundary.translate(3, -left, bottom)?;
    boundary.translate(4, -left, -top)?;
    Ok(boundary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn pt(v: i32) -> Pt {
        Pt::from_i32(v)
    }

    #[test]
    fn each_side_moves_its_own_corners() {
        let mut boundary = Boundary::rectangle(pt(100), pt(200));
        translate_margin(&mut boundary, Side::Left, pt(10)).expect("left");
        translate_margin(&mut boundary, Side::Right, pt(20)).expect("right");
        translate_margin(&mut boundary, Side::Top, pt(30)).expect("top");
        translate_margin(&mut boundary, Side::Bottom, pt(40)).expect("bottom");

        assert_eq!(boundary[0], Point::new(pt(10), pt(170)));
        assert_eq!(boundary[1], Point::new(pt(80), pt(170)));
        assert_eq!(boundary[2], Point::new(pt(80), pt(40)));
        assert_eq!(boundary[3], Point::new(pt(10), pt(40)));
        assert_eq!(boundary[4], boundary[0]);
    }

    #[test]
    fn open_boundary_is_left_alone() {
        let mut boundary = Boundary::new();
        translate_margin(&mut boundary, Side::Top, pt(10)).expect("no-op");
        assert!(boundary.is_empty());
    }

    #[test]
    fn real_boundary_undoes_margins() {
        let mut content = Boundary::rectangle(pt(100), pt(200));
        let margins = Margins {
            top: pt(5),
            right: pt(6),
            bottom: pt(7),
            left: pt(8),
        };
        for side in Side::ALL {
            translate_margin(&mut content, side, margins.get(side)).expect("translate");
        }
        let real = real_boundary(&content, &margins).expect("real");
        assert_eq!(real, Boundary::rectangle(pt(100), pt(200)));
    }

    #[test]
    fn shorthand_expands_like_css() {
        let m = Margins::parse_shorthand("10 20").expect("two values");
        assert_eq!((m.top, m.right, m.bottom, m.left), (pt(10), pt(20), pt(10), pt(20)));
        assert!(Margins::parse_shorthand("1 2 3 4 5").is_none());
        assert!(Margins::parse_shorthand("x").is_none());
    }
}
