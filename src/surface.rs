use crate::task::Task;
use crate::types::{Color, Pt, Size};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    fn next() -> Self {
        SurfaceId(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Opaque page content taken over from a source template document.
    Imported { content: Arc<Vec<u8>> },
    SetFont { name: String, size: Pt },
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(Pt),
    MoveTo { x: Pt, y: Pt },
    LineTo { x: Pt, y: Pt },
    ClosePath,
    Fill,
    Stroke,
    DrawString { x: Pt, y: Pt, text: String },
}

#[derive(Debug, Clone, PartialEq)]
struct GraphicsState {
    fill_color: Option<Color>,
    stroke_color: Option<Color>,
    line_width: Option<Pt>,
    font: Option<(String, Pt)>,
}

impl GraphicsState {
    fn initial() -> Self {
        Self {
            fill_color: None,
            stroke_color: None,
            line_width: None,
            font: None,
        }
    }
}

#[derive(Debug)]
pub struct Surface {
    id: SurfaceId,
    size: Size,
    commands: Vec<Command>,
    state: GraphicsState,
}

impl Surface {
    pub fn new(size: Size) -> Self {
        Self {
            id: SurfaceId::next(),
            size,
            commands: Vec::new(),
            state: GraphicsState::initial(),
        }
    }

    pub(crate) fn with_imported_content(size: Size, content: Vec<u8>) -> Self {
        let mut surface = Surface::new(size);
        surface.commands.push(Command::Imported {
            content: Arc::new(content),
        });
        surface
    }

    pub fn copy(&self) -> Surface {
        Surface {
            id: SurfaceId::next(),
            size: self.size,
            commands: self.commands.clone(),
            state: self.state.clone(),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> Pt {
        self.size.width
    }

    pub fn height(&self) -> Pt {
        self.size.height
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn set_font(&mut self, name: &str, size: Pt) {
        if let Some((current, current_size)) = &self.state.font {
            if current == name && *current_size == size {
                return;
            }
        }
        self.state.font = Some((name.to_string(), size));
        self.commands.push(Command::SetFont {
            name: name.to_string(),
            size,
        });
    }

    pub fn set_fill_color(&mut self, color: Color) {
        if self.state.fill_color == Some(color) {
            return;
        }
        self.state.fill_color = Some(color);
        self.commands.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        if self.state.stroke_color == Some(color) {
            return;
        }
        self.state.stroke_color = Some(color);
        self.commands.push(Command::SetStrokeColor(color));
    }

    pub fn set_line_width(&mut self, width: Pt) {
        let width = width.max(Pt::ZERO);
        if self.state.line_width == Some(width) {
            return;
        }
        self.state.line_width = Some(width);
        self.commands.push(Command::SetLineWidth(width));
    }

    fn trace(&mut self, points: &[crate::types::Point]) {
        let mut iter = points.iter();
        let Some(first) = iter.next() else {
            return;
        };
        self.commands.push(Command::MoveTo {
            x: first.x,
            y: first.y,
        });
        for point in iter {
            self.commands.push(Command::LineTo {
                x: point.x,
                y: point.y,
            });
        }
        self.commands.push(Command::ClosePath);
    }

    pub fn execute(&mut self, task: &Task) {
        match task {
            Task::FillPolygon { points, color } => {
                if points.is_empty() {
                    return;
                }
                self.set_fill_color(*color);
                self.trace(points);
                self.commands.push(Command::Fill);
            }
            Task::StrokePolygon {
                points,
                color,
                width,
            } => {
                if points.is_empty() {
                    return;
                }
                self.set_stroke_color(*color);
                self.set_line_width(*width);
                self.trace(points);
                self.commands.push(Command::Stroke);
            }
            Task::Text {
                origin,
                text,
                font,
                font_size,
                color,
            } => {
                if let Some(font) = font {
                    self.set_font(font, *font_size);
                }
                self.set_fill_color(*color);
                self.commands.push(Command::DrawString {
                    x: origin.x,
                    y: origin.y,
                    text: text.clone(),
                });
            }
        }
    }

    pub fn execute_all(&mut self, tasks: &[Task]) {
        for task in tasks {
            self.execute(task);
        }
    }

    pub fn drawn_strings(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::DrawString { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}
