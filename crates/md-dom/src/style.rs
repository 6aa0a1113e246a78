//! Inline style declarations
//!
//! Parses and serializes the `style` attribute as an ordered list of
//! `property: value` declarations. Custom properties (`--name`) keep their
//! case; standard properties are lowercased.

/// Parsed `style` attribute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `style` attribute value; malformed declarations are skipped
    pub fn parse(text: &str) -> Self {
        let mut style = Self::new();
        for decl in text.split(';') {
            let Some((prop, value)) = decl.split_once(':') else {
                continue;
            };
            let prop = prop.trim();
            let value = value.trim();
            if prop.is_empty() || value.is_empty() {
                continue;
            }
            style.set(prop, value);
        }
        style
    }

    /// Get a property value
    pub fn get(&self, property: &str) -> Option<&str> {
        let key = normalize(property);
        self.declarations
            .iter()
            .find(|(p, _)| *p == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a property, returning the previous value
    pub fn set(&mut self, property: &str, value: &str) -> Option<String> {
        let key = normalize(property);
        if let Some(decl) = self.declarations.iter_mut().find(|(p, _)| *p == key) {
            return Some(std::mem::replace(&mut decl.1, value.trim().to_string()));
        }
        self.declarations.push((key, value.trim().to_string()));
        None
    }

    /// Remove a property, returning its value
    pub fn remove(&mut self, property: &str) -> Option<String> {
        let key = normalize(property);
        let pos = self.declarations.iter().position(|(p, _)| *p == key)?;
        Some(self.declarations.remove(pos).1)
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Serialize back to attribute form
    pub fn to_css(&self) -> String {
        self.declarations
            .iter()
            .map(|(p, v)| format!("{}: {};", p, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn normalize(property: &str) -> String {
    let property = property.trim();
    if property.starts_with("--") {
        property.to_string()
    } else {
        property.to_ascii_lowercase()
    }
}
