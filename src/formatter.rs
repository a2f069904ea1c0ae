use crate::attributes::AttrValue;
use crate::boundary::Boundary;
use crate::document::Document;
use crate::error::PageError;
use crate::node::Layout;
use crate::types::Pt;

pub const CONVERT_ATTRIBUTES: &str = "convert-attributes";
pub const STANDARD_LAYOUT: &str = "layout";

pub trait Formatter: Send + Sync {
    fn format(&self, node: &mut dyn Layout, document: &Document) -> Result<(), PageError>;
}

const NUMERIC_ATTRIBUTES: &[&str] = &[
    "width",
    "height",
    "margin-top",
    "margin-bottom",
    "margin-left",
    "margin-right",
    "font-size",
    "line-height",
    "border-width",
];

#[derive(Debug, Default)]
pub struct ConvertAttributesFormatter;

impl Formatter for ConvertAttributesFormatter {
    fn format(&self, node: &mut dyn Layout, _document: &Document) -> Result<(), PageError> {
        let kind = node.attributes().kind();
        for name in NUMERIC_ATTRIBUTES {
            let raw = match node.attributes().get(name) {
                Some(AttrValue::Text(raw)) => raw.clone(),
                _ => continue,
            };
            let value = Pt::parse(&raw).ok_or_else(|| {
                PageError::Format(format!(
                    "attribute {} of {} expects a number, got \"{}\"",
                    name, kind, raw
                ))
            })?;
            node.attributes_mut().set(name, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct LayoutFormatter;

impl Formatter for LayoutFormatter {
    fn format(&self, node: &mut dyn Layout, document: &Document) -> Result<(), PageError> {
        let boundary = node.boundary();
        if !boundary.is_closed() {
            return Ok(());
        }
        let Some(top_left) = boundary.top_left() else {
            return Ok(());
        };
        let width = boundary.width();
        let height = boundary.height();
        let align = node
            .attributes()
            .text("vertical-align")
            .unwrap_or("top")
            .to_string();

        let children = node.children_mut();
        let total: Pt = children.iter().map(|child| child.measured_height()).sum();
        let mut offset = match align.as_str() {
            "middle" => ((height - total) / 2).max(Pt::ZERO),
            "bottom" => (height - total).max(Pt::ZERO),
            _ => Pt::ZERO,
        };
        for child in children.iter_mut() {
            let child_height = child.measured_height();
            *child.boundary_mut() = Boundary::from_top_left(
                top_left.translate(Pt::ZERO, offset),
                width,
                child_height,
            );
            if !child.children().is_empty() {
                self.format(child, document)?;
            }
            offset += child_height;
        }
        Ok(())
    }
}

pub fn convert_tree(
    formatter: &dyn Formatter,
    node: &mut dyn Layout,
    document: &Document,
) -> Result<(), PageError> {
    formatter.format(node, document)?;
    for child in node.children_mut() {
        convert_tree(formatter, child, document)?;
    }
    Ok(())
}
