//! Property schema
//!
//! Components declare their properties once (name, attribute, kind,
//! default, reflection) and route every change through `PropertySchema::update`,
//! which coerces the value, stores it and mirrors it to the attribute.

use md_dom::{Document, NodeId};
use serde_json::{Map, Value};

use crate::Options;

/// Value kind a property is coerced to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Boolean,
    Number,
    String,
}

/// One declared property
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySpec {
    pub name: &'static str,
    pub attribute: &'static str,
    pub kind: PropertyKind,
    pub default: Value,
    pub reflect: bool,
}

impl PropertySpec {
    pub fn boolean(name: &'static str, attribute: &'static str, default: bool) -> Self {
        Self { name, attribute, kind: PropertyKind::Boolean, default: Value::Bool(default), reflect: false }
    }

    pub fn number(name: &'static str, attribute: &'static str, default: f64) -> Self {
        Self { name, attribute, kind: PropertyKind::Number, default: Value::from(default), reflect: false }
    }

    pub fn string(name: &'static str, attribute: &'static str, default: &str) -> Self {
        Self { name, attribute, kind: PropertyKind::String, default: Value::from(default), reflect: false }
    }

    /// Mirror changes to the attribute
    pub fn reflected(mut self) -> Self {
        self.reflect = true;
        self
    }

    fn from_attribute(&self, raw: &str) -> Value {
        match self.kind {
            PropertyKind::Boolean => Value::Bool(!raw.trim().eq_ignore_ascii_case("false")),
            PropertyKind::Number => raw
                .trim()
                .parse::<f64>()
                .map(Value::from)
                .unwrap_or_else(|_| self.default.clone()),
            PropertyKind::String => Value::from(raw),
        }
    }
}

/// Current property values of one component instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    values: Map<String, Value>,
}

impl Properties {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_bool(&self, name: &str) -> bool {
        self.values.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.values.get(name)?.as_f64()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name)?.as_str()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A property change produced by `update`
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    pub name: &'static str,
    pub old: Value,
    pub new: Value,
}

/// Declared property set for a component
#[derive(Debug, Clone, Default)]
pub struct PropertySchema {
    specs: Vec<PropertySpec>,
}

impl PropertySchema {
    pub fn new(specs: Vec<PropertySpec>) -> Self {
        Self { specs }
    }

    pub fn spec(&self, name: &str) -> Option<&PropertySpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn specs(&self) -> &[PropertySpec] {
        &self.specs
    }

    pub fn defaults(&self) -> Properties {
        let values = self
            .specs
            .iter()
            .map(|s| (s.name.to_string(), s.default.clone()))
            .collect();
        Properties { values }
    }

    /// Initial values read from the element's attributes.
    ///
    /// A present boolean attribute is true unless its value is `"false"`;
    /// absent attributes fall back to the default.
    pub fn from_attributes(&self, doc: &Document, node: NodeId) -> Properties {
        let mut props = self.defaults();
        for spec in &self.specs {
            if let Some(raw) = doc.get_attr(node, spec.attribute) {
                props.values.insert(spec.name.to_string(), spec.from_attribute(raw));
            }
        }
        props
    }

    /// Apply every declared property found in a parsed options mapping
    pub fn apply_options(
        &self,
        doc: &mut Document,
        node: NodeId,
        props: &mut Properties,
        options: &Options,
    ) -> Vec<PropertyChange> {
        self.specs
            .iter()
            .filter_map(|spec| {
                let value = options.get(spec.name)?.clone();
                self.update(doc, node, props, spec.name, value)
            })
            .collect()
    }

    /// Coerce, store and reflect one property.
    ///
    /// Returns None for unknown names, values that cannot be coerced, and
    /// writes that do not change the stored value.
    pub fn update(
        &self,
        doc: &mut Document,
        node: NodeId,
        props: &mut Properties,
        name: &str,
        value: Value,
    ) -> Option<PropertyChange> {
        let Some(spec) = self.spec(name) else {
            tracing::debug!("unknown property '{}'", name);
            return None;
        };
        let Some(new) = coerce(spec.kind, &value) else {
            tracing::debug!("property '{}' rejected value {}", name, value);
            return None;
        };
        let old = props.values.get(spec.name).cloned().unwrap_or(Value::Null);
        if old == new {
            return None;
        }
        props.values.insert(spec.name.to_string(), new.clone());

        if spec.reflect {
            reflect(doc, node, spec, &new);
        }
        Some(PropertyChange { name: spec.name, old, new })
    }
}

/// Convert a value to the given kind
pub fn coerce(kind: PropertyKind, value: &Value) -> Option<Value> {
    match (kind, value) {
        (PropertyKind::Boolean, Value::Bool(_)) => Some(value.clone()),
        (PropertyKind::Boolean, Value::Null) => Some(Value::Bool(false)),
        (PropertyKind::Boolean, Value::Number(n)) => Some(Value::Bool(n.as_f64() != Some(0.0))),
        (PropertyKind::Boolean, Value::String(s)) => Some(Value::Bool(!s.eq_ignore_ascii_case("false"))),
        (PropertyKind::Number, Value::Number(_)) => Some(value.clone()),
        (PropertyKind::Number, Value::String(s)) => s.trim().parse::<f64>().ok().map(Value::from),
        (PropertyKind::Number, Value::Bool(b)) => Some(Value::from(if *b { 1 } else { 0 })),
        (PropertyKind::String, Value::String(_)) => Some(value.clone()),
        (PropertyKind::String, Value::Number(n)) => Some(Value::from(n.to_string())),
        (PropertyKind::String, Value::Bool(b)) => Some(Value::from(b.to_string())),
        _ => None,
    }
}

fn reflect(doc: &mut Document, node: NodeId, spec: &PropertySpec, value: &Value) {
    let result = match value {
        Value::Bool(true) => doc.set_attr(node, spec.attribute, "").map(|_| ()),
        Value::Bool(false) | Value::Null => {
            doc.remove_attr(node, spec.attribute);
            Ok(())
        }
        Value::String(s) => doc.set_attr(node, spec.attribute, s).map(|_| ()),
        other => doc.set_attr(node, spec.attribute, &other.to_string()).map(|_| ()),
    };
    if let Err(err) = result {
        tracing::debug!("cannot reflect '{}': {}", spec.name, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_options;

    fn schema() -> PropertySchema {
        PropertySchema::new(vec![
            PropertySpec::boolean("open", "open", false).reflected(),
            PropertySpec::boolean("closeOnEscape", "data-close-on-escape", true),
            PropertySpec::number("duration", "data-duration", 250.0),
            PropertySpec::string("label", "aria-label", "").reflected(),
        ])
    }

    #[test]
    fn test_defaults_and_attributes() {
        let mut doc = Document::new();
        let node = doc.create_element("div");
        doc.set_attr(node, "data-close-on-escape", "false").unwrap();
        doc.set_attr(node, "data-duration", "120").unwrap();
        doc.set_attr(node, "open", "").unwrap();

        let props = schema().from_attributes(&doc, node);
        assert!(props.get_bool("open"));
        assert!(!props.get_bool("closeOnEscape"));
        assert_eq!(props.get_f64("duration"), Some(120.0));
        assert_eq!(props.get_str("label"), Some(""));
    }

    #[test]
    fn test_update_reflects_boolean() {
        let mut doc = Document::new();
        let node = doc.create_element("div");
        let schema = schema();
        let mut props = schema.defaults();

        let change = schema.update(&mut doc, node, &mut props, "open", Value::Bool(true)).unwrap();
        assert_eq!(change.old, Value::Bool(false));
        assert_eq!(doc.get_attr(node, "open"), Some(""));

        assert!(schema.update(&mut doc, node, &mut props, "open", Value::from("true")).is_none());
        schema.update(&mut doc, node, &mut props, "open", Value::Bool(false));
        assert!(!doc.has_attr(node, "open"));
    }

    #[test]
    fn test_update_rejects_unknown_and_uncoercible() {
        let mut doc = Document::new();
        let node = doc.create_element("div");
        let schema = schema();
        let mut props = schema.defaults();
        assert!(schema.update(&mut doc, node, &mut props, "nope", Value::Null).is_none());
        assert!(schema.update(&mut doc, node, &mut props, "duration", Value::from("soon")).is_none());
        assert_eq!(props.get_f64("duration"), Some(250.0));
    }

    #[test]
    fn test_apply_options() {
        let mut doc = Document::new();
        let node = doc.create_element("div");
        let schema = schema();
        let mut props = schema.defaults();
        let options = parse_options("closeOnEscape: false; label: Confirm; target: #x");

        let changes = schema.apply_options(&mut doc, node, &mut props, &options);
        assert_eq!(changes.len(), 2);
        assert!(!props.get_bool("closeOnEscape"));
        assert_eq!(doc.get_attr(node, "aria-label"), Some("Confirm"));
    }
}
