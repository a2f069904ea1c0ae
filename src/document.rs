use crate::debug::DebugLogger;
use crate::engine::{Engine, hex_sha256};
use crate::error::PageError;
use crate::formatter::{
    CONVERT_ATTRIBUTES, ConvertAttributesFormatter, Formatter, LayoutFormatter, STANDARD_LAYOUT,
};
use crate::margin::{Margins, Side};
use crate::page::{Page, PageSetup};
use crate::page_context::PageContext;
use crate::surface::{Surface, SurfaceId};
use crate::types::{Pt, Size};
use rayon::prelude::*;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

pub struct DocumentBuilder {
    setup: PageSetup,
    debug_path: Option<PathBuf>,
    parallel: bool,
    template_pins: BTreeMap<String, String>,
    formatters: Vec<(String, Arc<dyn Formatter>)>,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self {
            setup: PageSetup::default(),
            debug_path: None,
            parallel: false,
            template_pins: BTreeMap::new(),
            formatters: Vec::new(),
        }
    }

    pub fn from_env() -> Self {
        let mut builder = Self::new();
        if let Ok(path) = std::env::var("PAGESETTER_DEBUG_LOG") {
            if !path.trim().is_empty() {
                builder.debug_path = Some(PathBuf::from(path));
            }
        }
        builder.parallel = std::env::var("PAGESETTER_PARALLEL")
            .map(|v| env_flag(&v))
            .unwrap_or(false);
        builder
    }

    pub fn page_size(mut self, size: Size) -> Self {
        self.setup.size = size;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.setup.margins = margins;
        self
    }

    pub fn font(mut self, name: impl Into<String>, size: Pt) -> Self {
        self.setup.font = Some(name.into());
        self.setup.font_size = Some(size);
        self
    }

    // Write JSONL events for surface binding, template harvesting and drawing.
    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    // Execute page tasks on the rayon pool during render.
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn pin_template(mut self, path: impl Into<String>, sha256: impl Into<String>) -> Self {
        self.template_pins.insert(path.into(), sha256.into());
        self
    }

    pub fn formatter(mut self, name: impl Into<String>, formatter: Arc<dyn Formatter>) -> Self {
        self.formatters.push((name.into(), formatter));
        self
    }

    pub fn build(self) -> Result<Document, PageError> {
        let Size { width, height } = self.setup.size;
        if width <= Pt::ZERO || height <= Pt::ZERO {
            return Err(PageError::InvalidConfiguration(format!(
                "page size must be positive, got {}",
                self.setup.size.to_spec()
            )));
        }
        if Side::ALL
            .into_iter()
            .any(|side| self.setup.margins.get(side) < Pt::ZERO)
        {
            return Err(PageError::InvalidConfiguration(
                "margins must not be negative".to_string(),
            ));
        }
        if self.setup.margins.horizontal() >= width || self.setup.margins.vertical() >= height {
            return Err(PageError::InvalidConfiguration(
                "margins leave no content area".to_string(),
            ));
        }
        if let Some(size) = self.setup.font_size {
            if size <= Pt::ZERO {
                return Err(PageError::InvalidConfiguration(
                    "font size must be positive".to_string(),
                ));
            }
        }
        for (path, digest) in &self.template_pins {
            if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(PageError::InvalidConfiguration(format!(
                    "sha256 pin for {} is not 64 hex characters",
                    path
                )));
            }
        }
        let debug = if let Some(path) = &self.debug_path {
            Some(Arc::new(DebugLogger::new(path)?))
        } else {
            None
        };
        Ok(self.assemble(debug))
    }

    fn assemble(self, debug: Option<Arc<DebugLogger>>) -> Document {
        let mut formatters: HashMap<String, Arc<dyn Formatter>> = HashMap::new();
        formatters.insert(
            CONVERT_ATTRIBUTES.to_string(),
            Arc::new(ConvertAttributesFormatter),
        );
        formatters.insert(STANDARD_LAYOUT.to_string(), Arc::new(LayoutFormatter));
        for (name, formatter) in self.formatters {
            formatters.insert(name, formatter);
        }
        Document {
            setup: self.setup,
            formatters,
            engine: Engine::new(),
            sources: HashMap::new(),
            template_pins: self.template_pins,
            attached: Vec::new(),
            debug,
            parallel: self.parallel,
        }
    }
}

fn env_flag(raw: &str) -> bool {
    let raw = raw.trim();
    raw == "1" || raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("yes")
}

pub struct Document {
    setup: PageSetup,
    formatters: HashMap<String, Arc<dyn Formatter>>,
    engine: Engine,
    sources: HashMap<String, Engine>,
    template_pins: BTreeMap<String, String>,
    attached: Vec<SurfaceId>,
    debug: Option<Arc<DebugLogger>>,
    parallel: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        DocumentBuilder::new().assemble(None)
    }

    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }

    pub fn setup(&self) -> &PageSetup {
        &self.setup
    }

    pub fn new_page(&self) -> Result<Page, PageError> {
        Page::with_setup(&self.setup)
    }

    pub fn formatter(&self, name: &str) -> Result<Arc<dyn Formatter>, PageError> {
        self.formatters
            .get(name)
            .cloned()
            .ok_or_else(|| PageError::UnknownFormatter(name.to_string()))
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn create_surface(&self, size_spec: &str) -> Result<Surface, PageError> {
        self.engine.create_surface(size_spec)
    }

    pub fn attach_surface(&mut self, surface: SurfaceId) {
        if !self.attached.contains(&surface) {
            self.attached.push(surface);
        }
    }

    pub fn attached_surfaces(&self) -> &[SurfaceId] {
        &self.attached
    }

    pub fn register_source(&mut self, name: impl Into<String>, engine: Engine) {
        self.sources.insert(name.into(), engine);
    }

    pub fn load_engine(&mut self, path: &str) -> Result<&Engine, PageError> {
        if !self.sources.contains_key(path) {
            let bytes = std::fs::read(path)?;
            if let Some(expected) = self.template_pins.get(path) {
                let actual = hex_sha256(&bytes);
                if !actual.eq_ignore_ascii_case(expected) {
                    return Err(PageError::TemplateIntegrity {
                        path: path.to_string(),
                        expected: expected.clone(),
                        actual,
                    });
                }
            }
            let engine = Engine::load_bytes(&bytes)?.with_source(path);
            if let Some(logger) = &self.debug {
                logger.log_event(&json!({
                    "type": "template.load",
                    "path": path,
                    "pages": engine.attached_surfaces().len(),
                    "bytes": bytes.len(),
                }));
                logger.increment("template.load", 1);
            }
            self.sources.insert(path.to_string(), engine);
        }
        self.sources
            .get(path)
            .ok_or_else(|| PageError::TemplateSource(format!("{} is not loaded", path)))
    }

    pub fn resolve_font(&self, page_font: Option<&str>) -> Option<String> {
        page_font
            .map(str::to_string)
            .or_else(|| self.setup.font.clone())
    }

    pub(crate) fn debug(&self) -> Option<&DebugLogger> {
        self.debug.as_deref()
    }

    pub fn render(&mut self, mut pages: Vec<Page>) -> Result<Engine, PageError> {
        let count = pages.len();
        for (index, page) in pages.iter_mut().enumerate() {
            page.set_context(PageContext::new(index + 1, count)?);
            page.format(self)?;
        }
        let mut task_lists = Vec::with_capacity(count);
        for page in pages.iter_mut() {
            task_lists.push(page.draw(self)?);
        }

        let start = Instant::now();
        if self.parallel {
            pages
                .par_iter_mut()
                .zip(task_lists.par_iter())
                .try_for_each(|(page, tasks)| page.execute(tasks))?;
        } else {
            for (page, tasks) in pages.iter_mut().zip(task_lists.iter()) {
                page.execute(tasks)?;
            }
        }
        if let Some(logger) = &self.debug {
            logger.log_event(&json!({
                "type": "document.execute",
                "pages": count,
                "tasks": task_lists.iter().map(Vec::len).sum::<usize>(),
                "parallel": self.parallel,
                "ms": start.elapsed().as_secs_f64() * 1000.0,
            }));
        }

        let mut output = Engine::new();
        for page in pages.iter_mut() {
            output.attach(page.take_surface().ok_or(PageError::UnboundSurface)?);
        }
        Ok(output)
    }

    pub fn stamp(&mut self, template: &mut Page, count: usize) -> Result<Vec<Page>, PageError> {
        template.prepare_template(self)?;
        Ok((0..count).map(|_| template.copy()).collect())
    }

    pub fn finish(&self) {
        if let Some(logger) = &self.debug {
            logger.emit_summary("document");
            logger.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{make_template_pdf, temp_pdf_path};
    use crate::node::{Container, TextNode};
    use crate::runtime::RuntimeNode;
    use crate::types::Point;

    fn numbered_pages(document: &Document, count: usize) -> Vec<Page> {
        (0..count)
            .map(|index| {
                let mut page = document.new_page().expect("page");
                page.attach_footer(Container::with_height(20.0).with_child(TextNode::new("footer")))
                    .expect("footer");
                page.push(TextNode::new(format!("body {}", index + 1)));
                page.mark_as_runtime_node(RuntimeNode::new(
                    "{page} of {pages}",
                    Point::from_f32(500.0, 10.0),
                ));
                page
            })
            .collect()
    }

    #[test]
    fn render_paints_pages_in_order() {
        let mut document = Document::builder()
            .margins(Margins::all(36.0))
            .build()
            .expect("document");
        let pages = numbered_pages(&document, 3);
        let output = document.render(pages).expect("render");
        let surfaces = output.attached_surfaces();
        assert_eq!(surfaces.len(), 3);
        assert_eq!(
            surfaces[1].drawn_strings(),
            vec!["footer", "body 2", "2 of 3"]
        );
        assert_eq!(document.attached_surfaces().len(), 3);
    }

    #[test]
    fn parallel_render_matches_sequential() {
        let mut sequential = Document::new();
        let mut parallel = Document::builder().parallel(true).build().expect("document");
        let a = sequential
            .render(numbered_pages(&sequential, 4))
            .expect("sequential");
        let b = parallel
            .render(numbered_pages(&parallel, 4))
            .expect("parallel");
        for (left, right) in a.attached_surfaces().iter().zip(b.attached_surfaces()) {
            assert_eq!(left.commands(), right.commands());
        }
    }

    #[test]
    fn stamp_prepares_once_and_copies() {
        let mut document = Document::new();
        let mut template = document.new_page().expect("page");
        template
            .attach_header(Container::with_height(30.0).with_child(TextNode::new("letterhead")))
            .expect("header");
        let copies = document.stamp(&mut template, 3).expect("stamp");
        assert_eq!(copies.len(), 3);
        assert!(copies.iter().all(Page::is_template_prepared));
        let ids: Vec<_> = copies
            .iter()
            .map(|page| page.surface().expect("copied surface").id())
            .collect();
        assert_ne!(ids[0], ids[1]);
        assert_eq!(
            copies[2].surface().expect("copied surface").drawn_strings(),
            vec!["letterhead"]
        );
    }

    #[test]
    fn pinned_template_must_match() {
        let bytes = make_template_pdf(&[(612, 792)]);
        let path = temp_pdf_path("document_pin");
        std::fs::write(&path, &bytes).expect("write pdf");
        let path_str = path.to_string_lossy().to_string();

        let mut wrong = Document::builder()
            .pin_template(path_str.clone(), "0".repeat(64))
            .build()
            .expect("document");
        let err = wrong.load_engine(&path_str).expect_err("digest mismatch");
        assert!(matches!(err, PageError::TemplateIntegrity { .. }));

        let mut right = Document::builder()
            .pin_template(path_str.clone(), hex_sha256(&bytes).to_uppercase())
            .build()
            .expect("document");
        assert_eq!(right.load_engine(&path_str).expect("load").attached_surfaces().len(), 1);

        let _ = std::fs::remove_file(&path);
        assert!(right.load_engine(&path_str).is_ok(), "served from cache");
    }

    #[test]
    fn builder_rejects_bad_configuration() {
        let no_content = Document::builder()
            .page_size(Size::new(Pt::from_i32(100), Pt::from_i32(100)))
            .margins(Margins::all(50.0))
            .build();
        assert!(matches!(no_content, Err(PageError::InvalidConfiguration(_))));

        let negative = Document::builder().margins(Margins::all(-5.0)).build();
        assert!(matches!(negative, Err(PageError::InvalidConfiguration(_))));

        let bad_pin = Document::builder().pin_template("a.pdf", "abc").build();
        assert!(matches!(bad_pin, Err(PageError::InvalidConfiguration(_))));

        let zero_font = Document::builder().font("Helvetica", Pt::ZERO).build();
        assert!(matches!(zero_font, Err(PageError::InvalidConfiguration(_))));
    }

    #[test]
    fn unknown_formatter_is_an_error() {
        let document = Document::new();
        assert!(matches!(
            document.formatter("typeset"),
            Err(PageError::UnknownFormatter(name)) if name == "typeset"
        ));
    }

    #[test]
    fn debug_log_records_events_and_summary() {
        let path = std::env::temp_dir().join(format!(
            "pagesetter_debug_{}_{}.jsonl",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        let mut document = Document::builder()
            .debug_log(&path)
            .build()
            .expect("document");
        let pages = numbered_pages(&document, 2);
        document.render(pages).expect("render");
        document.finish();

        let raw = std::fs::read_to_string(&path).expect("read log");
        let events: Vec<serde_json::Value> = raw
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        let kinds: Vec<&str> = events
            .iter()
            .filter_map(|event| event["type"].as_str())
            .collect();
        assert!(kinds.contains(&"page.surface.bind"));
        assert!(kinds.contains(&"page.template.harvest"));
        assert!(kinds.contains(&"page.draw"));
        assert!(kinds.contains(&"document.execute"));
        let summary = events.last().expect("summary");
        assert_eq!(summary["type"], "debug.summary");
        assert_eq!(summary["counts"]["page.draw"], 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn env_flag_values() {
        assert!(env_flag("1"));
        assert!(env_flag(" TRUE "));
        assert!(env_flag("yes"));
        assert!(!env_flag("0"));
        assert!(!env_flag(""));
    }
}
