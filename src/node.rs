use crate::attributes::{AttrValue, Attributes, CONTAINER_DEFAULTS, TEXT_DEFAULTS};
use crate::boundary::Boundary;
use crate::error::PageError;
use crate::page::PageId;
use crate::task::Task;
use crate::types::{Color, Pt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub(crate) const DEFAULT_FONT_SIZE: i32 = 12;

pub trait Layout {
    fn attributes(&self) -> &Attributes;
    fn attributes_mut(&mut self) -> &mut Attributes;
    fn boundary(&self) -> &Boundary;
    fn boundary_mut(&mut self) -> &mut Boundary;

    fn children(&self) -> &[Node] {
        &[]
    }

    fn children_mut(&mut self) -> &mut [Node] {
        &mut []
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Container(Container),
    Text(TextNode),
}

impl Node {
    pub fn measured_height(&self) -> Pt {
        match self {
            Node::Container(container) => container.measured_height(),
            Node::Text(text) => text.measured_height(),
        }
    }

    pub fn draw(&self) -> Vec<Task> {
        match self {
            Node::Container(container) => container.draw(),
            Node::Text(text) => text.draw(),
        }
    }

    pub fn to_state(&self) -> NodeState {
        match self {
            Node::Container(container) => NodeState {
                kind: NodeKind::Container,
                attributes: container.attributes.values().clone(),
                children: container.children.iter().map(Node::to_state).collect(),
            },
            Node::Text(text) => NodeState {
                kind: NodeKind::Text,
                attributes: text.attributes.values().clone(),
                children: Vec::new(),
            },
        }
    }

    pub fn from_state(state: NodeState) -> Result<Node, PageError> {
        match state.kind {
            NodeKind::Container => {
                let mut container = Container::new();
                for (name, value) in state.attributes {
                    container.attributes.set(&name, value)?;
                }
                for child in state.children {
                    container.children.push(Node::from_state(child)?);
                }
                Ok(Node::Container(container))
            }
            NodeKind::Text => {
                let mut text = TextNode::new("");
                for (name, value) in state.attributes {
                    text.attributes.set(&name, value)?;
                }
                Ok(Node::Text(text))
            }
        }
    }
}

impl Layout for Node {
    fn attributes(&self) -> &Attributes {
        match self {
            Node::Container(node) => node.attributes(),
            Node::Text(node) => node.attributes(),
        }
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        match self {
            Node::Container(node) => node.attributes_mut(),
            Node::Text(node) => node.attributes_mut(),
        }
    }

    fn boundary(&self) -> &Boundary {
        match self {
            Node::Container(node) => node.boundary(),
            Node::Text(node) => node.boundary(),
        }
    }

    fn boundary_mut(&mut self) -> &mut Boundary {
        match self {
            Node::Container(node) => node.boundary_mut(),
            Node::Text(node) => node.boundary_mut(),
        }
    }

    fn children(&self) -> &[Node] {
        match self {
            Node::Container(node) => node.children(),
            Node::Text(_) => &[],
        }
    }

    fn children_mut(&mut self) -> &mut [Node] {
        match self {
            Node::Container(node) => node.children_mut(),
            Node::Text(_) => &mut [],
        }
    }
}

impl From<Container> for Node {
    fn from(value: Container) -> Self {
        Node::Container(value)
    }
}

impl From<TextNode> for Node {
    fn from(value: TextNode) -> Self {
        Node::Text(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Container,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    pub kind: NodeKind,
    pub attributes: BTreeMap<String, AttrValue>,
    pub children: Vec<NodeState>,
}

#[derive(Debug, Clone)]
pub struct Container {
    attributes: Attributes,
    boundary: Boundary,
    children: Vec<Node>,
    owner: Option<PageId>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    pub fn new() -> Self {
        Self {
            attributes: Attributes::with_defaults(&CONTAINER_DEFAULTS),
            boundary: Boundary::new(),
            children: Vec::new(),
            owner: None,
        }
    }

    pub fn with_height(height: f32) -> Self {
        let mut container = Container::new();
        container
            .attributes
            .values_mut()
            .insert("height".to_string(), AttrValue::from(height));
        container
    }

    pub fn set_attribute(
        &mut self,
        name: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), PageError> {
        self.attributes.set(name, value)
    }

    pub fn with_child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    pub fn remove_all(&mut self) {
        self.children.clear();
    }

    pub fn height(&self) -> Option<Pt> {
        self.attributes.number("height")
    }

    pub fn width(&self) -> Option<Pt> {
        self.attributes.number("width")
    }

    pub fn owner(&self) -> Option<PageId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: PageId) {
        self.owner = Some(owner);
    }

    pub(crate) fn set_boundary(&mut self, boundary: Boundary) {
        self.boundary = boundary;
    }

    pub(crate) fn force_attribute(&mut self, name: &'static str, value: impl Into<AttrValue>) {
        self.attributes
            .values_mut()
            .insert(name.to_string(), value.into());
    }

    fn measured_height(&self) -> Pt {
        match self.height() {
            Some(height) => height,
            None => self.children.iter().map(Node::measured_height).sum(),
        }
    }

    pub fn draw(&self) -> Vec<Task> {
        let mut tasks = enhancement_tasks(&self.attributes, &self.boundary);
        for child in &self.children {
            tasks.extend(child.draw());
        }
        tasks
    }
}

impl Layout for Container {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    fn boundary_mut(&mut self) -> &mut Boundary {
        &mut self.boundary
    }

    fn children(&self) -> &[Node] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }
}

#[derive(Debug, Clone)]
pub struct TextNode {
    attributes: Attributes,
    boundary: Boundary,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        let mut attributes = Attributes::with_defaults(&TEXT_DEFAULTS);
        attributes
            .values_mut()
            .insert("text".to_string(), AttrValue::Text(text.into()));
        Self {
            attributes,
            boundary: Boundary::new(),
        }
    }

    pub fn set_attribute(
        &mut self,
        name: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), PageError> {
        self.attributes.set(name, value)
    }

    pub fn text(&self) -> &str {
        self.attributes.text("text").unwrap_or("")
    }

    fn font_size(&self) -> Pt {
        self.attributes
            .number("font-size")
            .unwrap_or_else(|| Pt::from_i32(DEFAULT_FONT_SIZE))
    }

    fn measured_height(&self) -> Pt {
        if let Some(height) = self.attributes.number("height") {
            return height;
        }
        if let Some(line_height) = self.attributes.number("line-height") {
            return line_height;
        }
        let font_size = self.font_size();
        font_size + font_size / 5
    }

    pub fn draw(&self) -> Vec<Task> {
        let mut tasks = enhancement_tasks(&self.attributes, &self.boundary);
        let Some(top_left) = self.boundary.top_left() else {
            return tasks;
        };
        let font_size = self.font_size();
        tasks.push(Task::Text {
            origin: top_left.translate(Pt::ZERO, font_size),
            text: self.text().to_string(),
            font: self.attributes.text("font-type").map(str::to_string),
            font_size,
            color: self.attributes.color("color").unwrap_or(Color::BLACK),
        });
        tasks
    }
}

impl Layout for TextNode {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    fn boundary_mut(&mut self) -> &mut Boundary {
        &mut self.boundary
    }
}

pub(crate) fn enhancement_tasks(attributes: &Attributes, boundary: &Boundary) -> Vec<Task> {
    let mut tasks = Vec::new();
    if boundary.is_empty() {
        return tasks;
    }
    if let Some(color) = attributes.color("background-color") {
        tasks.push(Task::FillPolygon {
            points: boundary.points().to_vec(),
            color,
        });
    }
    if let Some(color) = attributes.color("border-color") {
        let width = attributes
            .number("border-width")
            .unwrap_or_else(|| Pt::from_i32(1));
        tasks.push(Task::StrokePolygon {
            points: boundary.points().to_vec(),
            color,
            width,
        });
    }
    tasks
}
