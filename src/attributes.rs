use crate::error::PageError;
use crate::types::{Color, Pt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Number(Pt),
    Text(String),
    Flag(bool),
    Color(Color),
}

impl AttrValue {
    pub fn as_number(&self) -> Option<Pt> {
        match self {
            AttrValue::Number(value) => Some(*value),
            AttrValue::Text(raw) => Pt::parse(raw),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(raw) => Some(raw.as_str()),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            AttrValue::Flag(value) => Some(*value),
            AttrValue::Text(raw) => {
                let raw = raw.trim();
                Some(raw == "1" || raw.eq_ignore_ascii_case("true"))
            }
            AttrValue::Number(value) => Some(*value != Pt::ZERO),
            AttrValue::Color(_) => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            AttrValue::Color(color) => Some(*color),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AttrValue::Number(value) => value.to_string(),
            AttrValue::Text(raw) => raw.clone(),
            AttrValue::Flag(value) => value.to_string(),
            AttrValue::Color(c) => format!("rgb({}, {}, {})", c.r, c.g, c.b),
        }
    }
}

impl From<Pt> for AttrValue {
    fn from(value: Pt) -> Self {
        AttrValue::Number(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Number(Pt::from_i32(value))
    }
}

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        AttrValue::Number(Pt::from_f32(value))
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Flag(value)
    }
}

impl From<Color> for AttrValue {
    fn from(value: Color) -> Self {
        AttrValue::Color(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Unset,
    Number(i32),
    Text(&'static str),
    Flag(bool),
}

impl DefaultValue {
    fn materialize(self) -> Option<AttrValue> {
        match self {
            DefaultValue::Unset => None,
            DefaultValue::Number(value) => Some(AttrValue::from(value)),
            DefaultValue::Text(raw) => Some(AttrValue::from(raw)),
            DefaultValue::Flag(value) => Some(AttrValue::Flag(value)),
        }
    }
}

type Entry = (&'static str, DefaultValue);

#[derive(Debug)]
pub struct AttributeDefaults {
    pub kind: &'static str,
    tables: &'static [&'static [Entry]],
}

const NODE_TABLE: &[Entry] = &[
    ("width", DefaultValue::Unset),
    ("height", DefaultValue::Unset),
    ("margin-top", DefaultValue::Number(0)),
    ("margin-bottom", DefaultValue::Number(0)),
    ("margin-left", DefaultValue::Number(0)),
    ("margin-right", DefaultValue::Number(0)),
    ("font-type", DefaultValue::Unset),
    ("font-size", DefaultValue::Unset),
    ("line-height", DefaultValue::Unset),
    ("color", DefaultValue::Unset),
    ("text-align", DefaultValue::Text("left")),
    ("vertical-align", DefaultValue::Text("top")),
    ("static-size", DefaultValue::Flag(false)),
    ("background-color", DefaultValue::Unset),
    ("border-color", DefaultValue::Unset),
    ("border-width", DefaultValue::Number(1)),
];

const TEXT_TABLE: &[Entry] = &[("text", DefaultValue::Text(""))];

const PAGE_TABLE: &[Entry] = &[
    ("page-size", DefaultValue::Text("595:842")),
    ("width", DefaultValue::Number(595)),
    ("height", DefaultValue::Number(842)),
    ("encoding", DefaultValue::Text("utf-8")),
    ("static-size", DefaultValue::Flag(true)),
    ("text-align", DefaultValue::Text("left")),
    ("text-decoration", DefaultValue::Text("none")),
    ("alpha", DefaultValue::Number(1)),
    ("document-template", DefaultValue::Unset),
];

pub static CONTAINER_DEFAULTS: AttributeDefaults = AttributeDefaults {
    kind: "container",
    tables: &[NODE_TABLE],
};

pub static TEXT_DEFAULTS: AttributeDefaults = AttributeDefaults {
    kind: "text",
    tables: &[NODE_TABLE, TEXT_TABLE],
};

pub static PAGE_DEFAULTS: AttributeDefaults = AttributeDefaults {
    kind: "page",
    tables: &[NODE_TABLE, PAGE_TABLE],
};

impl AttributeDefaults {
    pub fn declares(&self, name: &str) -> bool {
        self.tables
            .iter()
            .any(|table| table.iter().any(|(declared, _)| *declared == name))
    }

    fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.tables.iter().flat_map(|table| table.iter())
    }
}

#[derive(Debug, Clone)]
pub struct Attributes {
    defaults: &'static AttributeDefaults,
    values: BTreeMap<String, AttrValue>,
}

impl Attributes {
    pub fn with_defaults(defaults: &'static AttributeDefaults) -> Self {
        let mut values = BTreeMap::new();
        for (name, default) in defaults.entries() {
            match default.materialize() {
                Some(value) => {
                    values.insert(name.to_string(), value);
                }
                None => {
                    values.remove(*name);
                }
            }
        }
        Self { defaults, values }
    }

    pub fn kind(&self) -> &'static str {
        self.defaults.kind
    }

    pub fn set(&mut self, name: &str, value: impl Into<AttrValue>) -> Result<(), PageError> {
        if !self.defaults.declares(name) {
            return Err(PageError::UnknownAttribute(name.to_string()));
        }
        self.values.insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn unset(&mut self, name: &str) {
        self.values.remove(name);
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    pub fn number(&self, name: &str) -> Option<Pt> {
        self.get(name).and_then(AttrValue::as_number)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_text)
    }

    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(AttrValue::as_flag).unwrap_or(false)
    }

    pub fn color(&self, name: &str) -> Option<Color> {
        self.get(name).and_then(AttrValue::as_color)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.values.iter()
    }

    pub(crate) fn values(&self) -> &BTreeMap<String, AttrValue> {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut BTreeMap<String, AttrValue> {
        &mut self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_override_node_defaults() {
        let attrs = Attributes::with_defaults(&PAGE_DEFAULTS);
        assert_eq!(attrs.text("page-size"), Some("595:842"));
        assert!(attrs.flag("static-size"));
        assert_eq!(attrs.number("margin-top"), Some(Pt::ZERO));
        assert!(attrs.get("document-template").is_none());

        let container = Attributes::with_defaults(&CONTAINER_DEFAULTS);
        assert!(!container.flag("static-size"));
        assert!(container.get("height").is_none());
    }

    #[test]
    fn undeclared_attribute_is_rejected() {
        let mut attrs = Attributes::with_defaults(&CONTAINER_DEFAULTS);
        let err = attrs.set("page-size", "1:1").expect_err("not a container attribute");
        assert!(matches!(err, PageError::UnknownAttribute(name) if name == "page-size"));
    }

    #[test]
    fn numeric_text_reads_as_number() {
        let mut attrs = Attributes::with_defaults(&CONTAINER_DEFAULTS);
        attrs.set("height", "50").expect("declared");
        assert_eq!(attrs.number("height"), Some(Pt::from_i32(50)));
        attrs.set("height", "tall").expect("declared");
        assert_eq!(attrs.number("height"), None);
    }
}
