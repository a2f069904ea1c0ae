use crate::types::{Color, Point, Pt};

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    FillPolygon {
        points: Vec<Point>,
        color: Color,
    },
    StrokePolygon {
        points: Vec<Point>,
        color: Color,
        width: Pt,
    },
    Text {
        origin: Point,
        text: String,
        font: Option<String>,
        font_size: Pt,
        color: Color,
    },
}

impl Task {
    pub fn text(&self) -> Option<&str> {
        match self {
            Task::Text { text, .. } => Some(text.as_str()),
            _ => None,
        }
    }
}
