use crate::attributes::{AttrValue, Attributes, PAGE_DEFAULTS};
use crate::boundary::Boundary;
use crate::document::Document;
use crate::error::PageError;
use crate::formatter::{CONVERT_ATTRIBUTES, STANDARD_LAYOUT, convert_tree};
use crate::margin::{Margins, Side, real_boundary, translate_margin};
use crate::node::{Layout, Node, NodeState, enhancement_tasks};
use crate::page_context::PageContext;
use crate::placeholder::Placeholders;
use crate::runtime::RuntimeNode;
use crate::surface::Surface;
use crate::task::Task;
use crate::types::{Color, Point, Pt, Size};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PAGE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(u64);

impl PageId {
    fn next() -> Self {
        PageId(NEXT_PAGE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageSetup {
    pub size: Size,
    pub margins: Margins,
    pub font: Option<String>,
    pub font_size: Option<Pt>,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            size: Size::a4(),
            margins: Margins::default(),
            font: None,
            font_size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageState {
    pub attributes: BTreeMap<String, AttrValue>,
    pub margins: Margins,
    pub body: Vec<NodeState>,
    pub runtime_nodes: Vec<RuntimeNode>,
}

#[derive(Debug)]
pub struct Page {
    id: PageId,
    pub(crate) attributes: Attributes,
    pub(crate) margins: Margins,
    pub(crate) boundary: Boundary,
    body: Vec<Node>,
    pub(crate) placeholders: Placeholders,
    surface: Option<Surface>,
    runtime_nodes: Vec<RuntimeNode>,
    template_prepared: bool,
    context: Option<PageContext>,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    pub fn new() -> Self {
        let id = PageId::next();
        let attributes = Attributes::with_defaults(&PAGE_DEFAULTS);
        let size = Size::a4();
        let boundary = Boundary::rectangle(size.width, size.height);
        let placeholders = Placeholders::empty(id, &boundary, size);
        Self {
            id,
            attributes,
            margins: Margins::default(),
            boundary,
            body: Vec::new(),
            placeholders,
            surface: None,
            runtime_nodes: Vec::new(),
            template_prepared: false,
            context: None,
        }
    }

    pub fn with_setup(setup: &PageSetup) -> Result<Self, PageError> {
        let mut page = Page::new();
        page.set_page_size(&setup.size.to_spec())?;
        for side in Side::ALL {
            page.set_margin(side, setup.margins.get(side))?;
        }
        if let Some(font) = &setup.font {
            page.attributes.set("font-type", font.as_str())?;
        }
        if let Some(size) = setup.font_size {
            page.attributes.set("font-size", size)?;
        }
        page.initialize_placeholders()?;
        Ok(page)
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn set_attribute(
        &mut self,
        name: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), PageError> {
        let value = value.into();
        let invalid = |value: &AttrValue| PageError::InvalidAttribute {
            name: name.to_string(),
            value: value.describe(),
        };
        if let Some(side) = Side::from_attribute(name) {
            let margin = value.as_number().ok_or_else(|| invalid(&value))?;
            return self.set_margin(side, margin);
        }
        match name {
            "page-size" => {
                let spec = value.as_text().ok_or_else(|| invalid(&value))?.to_string();
                self.set_page_size(&spec)
            }
            "width" | "height" => {
                let length = value.as_number().ok_or_else(|| invalid(&value))?;
                let mut size = self.page_size();
                if name == "width" {
                    size.width = length;
                } else {
                    size.height = length;
                }
                self.set_page_size(&size.to_spec())
            }
            "margin" => {
                let margins = match &value {
                    AttrValue::Number(all) => Margins {
                        top: *all,
                        right: *all,
                        bottom: *all,
                        left: *all,
                    },
                    AttrValue::Text(raw) => {
                        Margins::parse_shorthand(raw).ok_or_else(|| invalid(&value))?
                    }
                    _ => return Err(invalid(&value)),
                };
                if Side::ALL.into_iter().any(|side| margins.get(side) < Pt::ZERO) {
                    return Err(invalid(&value));
                }
                for side in Side::ALL {
                    self.set_margin(side, margins.get(side))?;
                }
                Ok(())
            }
            _ => self.attributes.set(name, value),
        }
    }

    pub fn set_page_size(&mut self, spec: &str) -> Result<(), PageError> {
        let size = Size::parse_spec(spec)?;
        self.attributes.set("page-size", spec)?;
        self.attributes.set("width", size.width)?;
        self.attributes.set("height", size.height)?;
        self.initialize_boundary()
    }

    fn initialize_boundary(&mut self) -> Result<(), PageError> {
        let Size { width, height } = self.page_size();
        if self.boundary.is_closed() {
            self.boundary.reset();
        }
        self.boundary
            .push_point(Point::new(Pt::ZERO, height))?
            .push_point(Point::new(width, height))?
            .push_point(Point::new(width, Pt::ZERO))?
            .push_point(Point::new(Pt::ZERO, Pt::ZERO))?;
        self.boundary.close()?;
        for side in Side::ALL {
            translate_margin(&mut self.boundary, side, self.margins.get(side))?;
        }
        Ok(())
    }

    pub fn page_size(&self) -> Size {
        Size::new(self.real_width(), self.real_height())
    }

    pub fn real_width(&self) -> Pt {
        self.attributes.number("width").unwrap_or(Pt::ZERO)
    }

    pub fn real_height(&self) -> Pt {
        self.attributes.number("height").unwrap_or(Pt::ZERO)
    }

    pub fn content_width(&self) -> Pt {
        self.real_width() - self.margins.horizontal()
    }

    pub fn content_height(&self) -> Pt {
        self.real_height() - self.margins.vertical()
    }

    pub fn margin(&self, side: Side) -> Pt {
        self.margins.get(side)
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    pub fn set_margin(&mut self, side: Side, value: Pt) -> Result<(), PageError> {
        if value < Pt::ZERO {
            return Err(PageError::InvalidAttribute {
                name: side.attribute().to_string(),
                value: value.to_string(),
            });
        }
        let delta = value - self.margins.get(side);
        translate_margin(&mut self.boundary, side, delta)?;
        self.margins.set(side, value);
        self.attributes.set(side.attribute(), value)
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn real_boundary(&self) -> Result<Boundary, PageError> {
        real_boundary(&self.boundary, &self.margins)
    }

    pub fn push(&mut self, node: impl Into<Node>) {
        self.body.push(node.into());
    }

    pub fn body(&self) -> &[Node] {
        &self.body
    }

    pub fn mark_as_runtime_node(&mut self, mut node: RuntimeNode) {
        node.set_owner(self.id);
        self.runtime_nodes.push(node);
    }

    pub fn runtime_nodes(&self) -> &[RuntimeNode] {
        &self.runtime_nodes
    }

    pub fn runtime_nodes_mut(&mut self) -> &mut [RuntimeNode] {
        &mut self.runtime_nodes
    }

    pub fn context(&self) -> Result<&PageContext, PageError> {
        self.context.as_ref().ok_or(PageError::MissingPageContext)
    }

    pub fn set_context(&mut self, context: PageContext) {
        self.context = Some(context);
    }

    pub fn is_template_prepared(&self) -> bool {
        self.template_prepared
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn take_surface(&mut self) -> Option<Surface> {
        self.surface.take()
    }

    pub fn break_at(&self, _height: Pt) -> Result<Page, PageError> {
        Err(PageError::IllegalPagination)
    }

    pub fn format(&mut self, document: &mut Document) -> Result<(), PageError> {
        if self.attributes.text("document-template").is_some() {
            self.ensure_surface(document)?;
        }
        let convert = document.formatter(CONVERT_ATTRIBUTES)?;
        convert.format(self, document)?;
        for node in &mut self.body {
            convert_tree(convert.as_ref(), node, document)?;
        }
        let layout = document.formatter(STANDARD_LAYOUT)?;
        layout.format(self, document)
    }

    pub fn ensure_surface(&mut self, document: &mut Document) -> Result<(), PageError> {
        if self.surface.is_some() {
            return Ok(());
        }
        match self.surface_from_source(document)? {
            Some((surface, index)) => {
                let size = surface.size();
                self.surface = Some(surface);
                self.set_page_size(&size.to_spec())?;
                if let Some(logger) = document.debug() {
                    logger.log_event(&json!({
                        "type": "page.surface.bind",
                        "page": self.id.0,
                        "source": "inherited",
                        "index": index,
                        "size": size.to_spec(),
                    }));
                    logger.increment("surface.inherited", 1);
                }
            }
            None => {
                let spec = self.page_size().to_spec();
                self.surface = Some(document.create_surface(&spec)?);
                if let Some(logger) = document.debug() {
                    logger.log_event(&json!({
                        "type": "page.surface.bind",
                        "page": self.id.0,
                        "source": "fresh",
                        "size": spec,
                    }));
                    logger.increment("surface.fresh", 1);
                }
            }
        }
        self.apply_default_style(document);
        Ok(())
    }

    fn surface_from_source(
        &self,
        document: &mut Document,
    ) -> Result<Option<(Surface, usize)>, PageError> {
        let Some(path) = self.attributes.text("document-template") else {
            return Ok(None);
        };
        let engine = document.load_engine(path)?;
        let surfaces = engine.attached_surfaces();
        if surfaces.is_empty() {
            return Ok(None);
        }
        let index = match &self.context {
            Some(context) => (context.page_number() - 1) % surfaces.len(),
            None => 0,
        };
        Ok(Some((surfaces[index].copy(), index)))
    }

    fn apply_default_style(&mut self, document: &Document) {
        let font = document.resolve_font(self.attributes.text("font-type"));
        let font_size = self
            .attributes
            .number("font-size")
            .or(document.setup().font_size);
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if let (Some(font), Some(size)) = (font, font_size) {
            surface.set_font(&font, size);
        }
        surface.set_fill_color(Color::BLACK);
        surface.set_stroke_color(Color::BLACK);
    }

    pub fn ensure_template(&mut self, document: &Document) -> Result<Vec<Task>, PageError> {
        if self.template_prepared {
            return Ok(Vec::new());
        }
        let convert = document.formatter(CONVERT_ATTRIBUTES)?;
        convert.format(self, document)?;
        let layout = document.formatter(STANDARD_LAYOUT)?;
        layout.format(&mut self.placeholders.header, document)?;
        layout.format(&mut self.placeholders.footer, document)?;
        layout.format(&mut self.placeholders.watermark, document)?;

        let mut tasks = enhancement_tasks(&self.attributes, &self.real_boundary()?);
        let enhancements = tasks.len();
        let footer = self.placeholders.footer.draw();
        let header = self.placeholders.header.draw();
        let watermark = self.placeholders.watermark.draw();
        let counts = (footer.len(), header.len(), watermark.len());
        tasks.extend(footer);
        tasks.extend(header);
        tasks.extend(watermark);

        self.placeholders.clear_children();
        self.template_prepared = true;
        if let Some(logger) = document.debug() {
            logger.log_event(&json!({
                "type": "page.template.harvest",
                "page": self.id.0,
                "enhancements": enhancements,
                "footer": counts.0,
                "header": counts.1,
                "watermark": counts.2,
            }));
            logger.increment("template.harvest", 1);
        }
        Ok(tasks)
    }

    pub fn prepare_template(&mut self, document: &mut Document) -> Result<(), PageError> {
        self.ensure_surface(document)?;
        let tasks = self.ensure_template(document)?;
        self.execute(&tasks)?;
        if let Some(logger) = document.debug() {
            logger.log_event(&json!({
                "type": "page.template.prepare",
                "page": self.id.0,
                "tasks": tasks.len(),
            }));
        }
        Ok(())
    }

    pub fn draw(&mut self, document: &mut Document) -> Result<Vec<Task>, PageError> {
        self.ensure_surface(document)?;
        let surface_id = self
            .surface
            .as_ref()
            .map(Surface::id)
            .ok_or(PageError::UnboundSurface)?;
        document.attach_surface(surface_id);

        // Runtime nodes go first so a missing context fails before the
        // template is harvested and marked prepared.
        let mut runtime = Vec::new();
        for node in &mut self.runtime_nodes {
            node.evaluate(self.context.as_ref())?;
            runtime.extend(node.drawing_tasks());
        }
        let template = if self.template_prepared {
            Vec::new()
        } else {
            self.ensure_template(document)?
        };
        let body: Vec<Task> = self.body.iter().flat_map(Node::draw).collect();

        if let Some(logger) = document.debug() {
            logger.log_event(&json!({
                "type": "page.draw",
                "page": self.id.0,
                "template": template.len(),
                "body": body.len(),
                "runtime": runtime.len(),
            }));
            logger.increment("page.draw", 1);
        }
        let mut tasks = template;
        tasks.extend(body);
        tasks.extend(runtime);
        Ok(tasks)
    }

    pub fn execute(&mut self, tasks: &[Task]) -> Result<(), PageError> {
        let surface = self.surface.as_mut().ok_or(PageError::UnboundSurface)?;
        surface.execute_all(tasks);
        Ok(())
    }

    pub fn copy(&self) -> Page {
        let id = PageId::next();
        let runtime_nodes = self
            .runtime_nodes
            .iter()
            .map(|node| {
                let mut copy = node.copy_as_runtime();
                copy.set_owner(id);
                copy
            })
            .collect();
        let mut placeholders = self.placeholders.clone();
        placeholders.set_owner(id);
        Page {
            id,
            attributes: self.attributes.clone(),
            margins: self.margins,
            boundary: self.boundary.clone(),
            body: self.body.clone(),
            placeholders,
            surface: self.surface.as_ref().map(Surface::copy),
            runtime_nodes,
            template_prepared: self.template_prepared,
            context: self.context,
        }
    }

    pub fn flush(&mut self) {
        self.body.clear();
        self.runtime_nodes.clear();
        self.placeholders.clear_children();
    }

    pub fn to_state(&self) -> PageState {
        PageState {
            attributes: self.attributes.values().clone(),
            margins: self.margins,
            body: self.body.iter().map(Node::to_state).collect(),
            runtime_nodes: self.runtime_nodes.clone(),
        }
    }

    pub fn from_state(state: PageState) -> Result<Page, PageError> {
        let mut page = Page::new();
        for (name, value) in state.attributes {
            if name == "page-size" || Side::from_attribute(&name).is_some() {
                continue;
            }
            page.attributes.set(&name, value)?;
        }
        let size = page.page_size();
        page.set_page_size(&size.to_spec())?;
        for side in Side::ALL {
            page.set_margin(side, state.margins.get(side))?;
        }
        for node in state.body {
            page.body.push(Node::from_state(node)?);
        }
        for node in state.runtime_nodes {
            page.mark_as_runtime_node(node);
        }
        page.initialize_placeholders()?;
        Ok(page)
    }

    pub fn to_json(&self) -> Result<String, PageError> {
        Ok(serde_json::to_string(&self.to_state())?)
    }

    pub fn from_json(raw: &str) -> Result<Page, PageError> {
        let state: PageState = serde_json::from_str(raw)?;
        Page::from_state(state)
    }
}

impl Layout for Page {
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
        &self.body
    }

    fn children_mut(&mut self) -> &mut [Node] {
        &mut self.body
    }
}
