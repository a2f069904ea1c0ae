use crate::boundary::Boundary;
use crate::error::PageError;
use crate::margin::Side;
use crate::node::Container;
use crate::page::{Page, PageId};
use crate::types::{Pt, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Header,
    Footer,
    Watermark,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Header, Slot::Footer, Slot::Watermark];

    pub fn name(self) -> &'static str {
        match self {
            Slot::Header => "header",
            Slot::Footer => "footer",
            Slot::Watermark => "watermark",
        }
    }

    pub fn from_name(name: &str) -> Option<Slot> {
        Slot::ALL.into_iter().find(|slot| slot.name() == name)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Placeholders {
    pub(crate) header: Container,
    pub(crate) footer: Container,
    pub(crate) watermark: Container,
}

impl Placeholders {
    pub(crate) fn empty(owner: PageId, boundary: &Boundary, size: Size) -> Self {
        let strip = |boundary: Boundary| {
            let mut node = Container::with_height(0.0);
            node.force_attribute("static-size", true);
            node.force_attribute("width", size.width);
            node.set_owner(owner);
            node.set_boundary(boundary);
            node
        };
        let mut watermark = Container::new();
        watermark.force_attribute("vertical-align", "middle");
        watermark.force_attribute("width", size.width);
        watermark.force_attribute("height", size.height);
        watermark.set_owner(owner);
        watermark.set_boundary(boundary.clone());
        Self {
            header: strip(header_strip(boundary, Pt::ZERO)),
            footer: strip(footer_strip(boundary, Pt::ZERO)),
            watermark,
        }
    }

    pub(crate) fn clear_children(&mut self) {
        self.header.remove_all();
        self.footer.remove_all();
        self.watermark.remove_all();
    }

    pub(crate) fn set_owner(&mut self, owner: PageId) {
        self.header.set_owner(owner);
        self.footer.set_owner(owner);
        self.watermark.set_owner(owner);
    }
}

fn header_strip(boundary: &Boundary, height: Pt) -> Boundary {
    let (Some(left), Some(right)) = (boundary.get(0), boundary.get(1)) else {
        return Boundary::new();
    };
    Boundary::closed_from([
        left.translate(Pt::ZERO, -height),
        right.translate(Pt::ZERO, -height),
        right,
        left,
    ])
}

fn footer_strip(boundary: &Boundary, height: Pt) -> Boundary {
    let (Some(right), Some(left)) = (boundary.get(2), boundary.get(3)) else {
        return Boundary::new();
    };
    Boundary::closed_from([
        left,
        right,
        right.translate(Pt::ZERO, height),
        left.translate(Pt::ZERO, height),
    ])
}

fn placeholder_height(node: &Container, slot: Slot) -> Result<Pt, PageError> {
    node.height()
        .filter(|height| *height >= Pt::ZERO)
        .ok_or_else(|| PageError::InvalidPlaceholder(slot.name().to_string()))
}

impl Page {
    pub fn attach_header(&mut self, mut node: Container) -> Result<(), PageError> {
        let height = placeholder_height(&node, Slot::Header)?;
        node.force_attribute("height", height);
        node.force_attribute("static-size", true);
        node.set_owner(self.id());
        self.set_margin(Side::Top, self.margins.top + height)?;
        node.force_attribute("width", self.content_width());
        node.set_boundary(header_strip(&self.boundary, height));
        self.placeholders.header = node;
        Ok(())
    }

    pub fn attach_footer(&mut self, mut node: Container) -> Result<(), PageError> {
        let height = placeholder_height(&node, Slot::Footer)?;
        node.force_attribute("height", height);
        node.force_attribute("static-size", true);
        node.set_owner(self.id());
        self.set_margin(Side::Bottom, self.margins.bottom + height)?;
        node.force_attribute("width", self.content_width());
        node.set_boundary(footer_strip(&self.boundary, height));
        self.placeholders.footer = node;
        Ok(())
    }

    pub fn attach_watermark(&mut self, mut node: Container) -> Result<(), PageError> {
        node.force_attribute("vertical-align", "middle");
        node.force_attribute("width", self.content_width());
        node.force_attribute("height", self.content_height());
        node.set_owner(self.id());
        node.set_boundary(self.boundary.clone());
        self.placeholders.watermark = node;
        Ok(())
    }

    pub fn placeholder(&self, name: &str) -> Option<&Container> {
        match Slot::from_name(name)? {
            Slot::Header => Some(&self.placeholders.header),
            Slot::Footer => Some(&self.placeholders.footer),
            Slot::Watermark => None,
        }
    }

    pub fn has_placeholder(&self, name: &str) -> bool {
        Slot::from_name(name).is_some()
    }

    pub fn set_placeholder(&mut self, name: &str, node: Container) -> Result<(), PageError> {
        match Slot::from_name(name) {
            Some(Slot::Header) => self.attach_header(node),
            Some(Slot::Footer) => self.attach_footer(node),
            Some(Slot::Watermark) => self.attach_watermark(node),
            None => Err(PageError::UnknownPlaceholder(name.to_string())),
        }
    }

    pub fn header(&self) -> &Container {
        &self.placeholders.header
    }

    pub fn footer(&self) -> &Container {
        &self.placeholders.footer
    }

    pub fn watermark(&self) -> &Container {
        &self.placeholders.watermark
    }

    pub(crate) fn initialize_placeholders(&mut self) -> Result<(), PageError> {
        self.attach_header(Container::with_height(0.0))?;
        self.attach_footer(Container::with_height(0.0))?;
        self.attach_watermark(Container::new())
    }
}
