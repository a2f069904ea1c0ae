mod attributes;
mod boundary;
mod debug;
mod document;
mod engine;
mod error;
mod formatter;
mod margin;
mod node;
mod page;
mod page_context;
mod placeholder;
mod runtime;
mod surface;
mod task;
mod types;

pub use attributes::{
    AttrValue, AttributeDefaults, Attributes, CONTAINER_DEFAULTS, DefaultValue, PAGE_DEFAULTS,
    TEXT_DEFAULTS,
};
pub use boundary::Boundary;
pub use document::{Document, DocumentBuilder};
pub use engine::Engine;
pub use error::PageError;
pub use formatter::{
    CONVERT_ATTRIBUTES, ConvertAttributesFormatter, Formatter, LayoutFormatter, STANDARD_LAYOUT,
    convert_tree,
};
pub use margin::{Margins, Side, real_boundary, translate_margin};
pub use node::{Container, Layout, Node, NodeKind, NodeState, TextNode};
pub use page::{Page, PageId, PageSetup, PageState};
pub use page_context::PageContext;
pub use placeholder::Slot;
pub use runtime::RuntimeNode;
pub use surface::{Command, Surface, SurfaceId};
pub use task::Task;
pub use types::{Color, Point, Pt, Size};
