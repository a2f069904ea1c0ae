use crate::error::PageError;
use crate::node::DEFAULT_FONT_SIZE;
use crate::page::PageId;
use crate::page_context::PageContext;
use crate::task::Task;
use crate::types::{Color, Point, Pt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeNode {
    template: String,
    origin: Point,
    font: Option<String>,
    font_size: Pt,
    color: Color,
    #[serde(skip)]
    owner: Option<PageId>,
    #[serde(skip)]
    value: Option<String>,
}

impl RuntimeNode {
    pub fn new(template: impl Into<String>, origin: Point) -> Self {
        Self {
            template: template.into(),
            origin,
            font: None,
            font_size: Pt::from_i32(DEFAULT_FONT_SIZE),
            color: Color::BLACK,
            owner: None,
            value: None,
        }
    }

    pub fn with_font(mut self, name: impl Into<String>, size: Pt) -> Self {
        self.font = Some(name.into());
        self.font_size = size;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn set_template(&mut self, template: impl Into<String>) {
        self.template = template.into();
        self.value = None;
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn owner(&self) -> Option<PageId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: PageId) {
        self.owner = Some(owner);
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn evaluate(&mut self, context: Option<&PageContext>) -> Result<(), PageError> {
        let context = context.ok_or(PageError::MissingPageContext)?;
        let value = self
            .template
            .replace("{page}", &context.page_number().to_string())
            .replace("{pages}", &context.page_count().to_string());
        self.value = Some(value);
        Ok(())
    }

    pub fn drawing_tasks(&self) -> Vec<Task> {
        let Some(value) = &self.value else {
            return Vec::new();
        };
        vec![Task::Text {
            origin: self.origin,
            text: value.clone(),
            font: self.font.clone(),
            font_size: self.font_size,
            color: self.color,
        }]
    }

    pub fn copy_as_runtime(&self) -> RuntimeNode {
        RuntimeNode {
            owner: None,
            value: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_needs_a_context() {
        let mut node = RuntimeNode::new("{page}", Point::from_f32(0.0, 0.0));
        assert!(matches!(
            node.evaluate(None),
            Err(PageError::MissingPageContext)
        ));
        assert!(node.drawing_tasks().is_empty());
    }

    #[test]
    fn placeholders_are_substituted() {
        let mut node = RuntimeNode::new("Page {page} of {pages}", Point::from_f32(10.0, 20.0));
        let ctx = PageContext::new(2, 5).expect("ctx");
        node.evaluate(Some(&ctx)).expect("evaluate");
        assert_eq!(node.value(), Some("Page 2 of 5"));
        let tasks = node.drawing_tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text(), Some("Page 2 of 5"));
    }

    #[test]
    fn runtime_copy_is_independent() {
        let mut original = RuntimeNode::new("{page}", Point::from_f32(0.0, 0.0));
        let ctx = PageContext::new(1, 1).expect("ctx");
        original.evaluate(Some(&ctx)).expect("evaluate");

        let mut copy = original.copy_as_runtime();
        assert_eq!(copy.value(), None);
        copy.set_template("changed");
        assert_eq!(original.template(), "{page}");
        assert_eq!(original.value(), Some("1"));
    }
}
