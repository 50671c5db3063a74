use std::fmt;
use std::sync::Arc;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="no"?>"#;

fn has_declaration(markup: &[u8]) -> bool {
    markup.trim_ascii_start().starts_with(b"<?xml")
}

/// An immutable pair of formula source and the vector markup rendered from it.
///
/// The markup buffer is shared, so cloning a record is cheap and every copy
/// (list entry, export, clipboard) sees the same bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderRecord {
    formula: String,
    markup: Arc<[u8]>,
}

impl RenderRecord {
    /// Builds a record from markup delivered by the engine, adding the XML
    /// declaration when the markup does not already start with one.
    pub fn from_bridge(formula: impl Into<String>, markup: impl AsRef<[u8]>) -> Self {
        let markup = markup.as_ref();
        let bytes: Vec<u8> = if has_declaration(markup) {
            markup.to_vec()
        } else {
            let mut bytes = Vec::with_capacity(XML_DECLARATION.len() + markup.len());
            bytes.extend_from_slice(XML_DECLARATION.as_bytes());
            bytes.extend_from_slice(markup);
            bytes
        };
        Self {
            formula: formula.into(),
            markup: Arc::from(bytes),
        }
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn markup(&self) -> &[u8] {
        &self.markup
    }

    pub fn markup_text(&self) -> String {
        String::from_utf8_lossy(&self.markup).into_owned()
    }
}

impl fmt::Debug for RenderRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderRecord")
            .field("formula", &self.formula)
            .field("markup_len", &self.markup.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_is_added_once() {
        let record = RenderRecord::from_bridge("x", "<svg></svg>");
        assert!(record.markup_text().starts_with(XML_DECLARATION));

        let again = RenderRecord::from_bridge("x", record.markup());
        assert_eq!(again.markup(), record.markup());
        assert_eq!(again.markup_text().matches("<?xml").count(), 1);
    }

    #[test]
    fn existing_declaration_with_other_attributes_is_kept() {
        let markup = "<?xml version=\"1.0\"?>\n<svg/>";
        let record = RenderRecord::from_bridge("y", markup);
        assert_eq!(record.markup_text(), markup);
    }

    #[test]
    fn clones_share_markup() {
        let record = RenderRecord::from_bridge("z", "<svg/>");
        let copy = record.clone();
        assert!(std::ptr::eq(record.markup().as_ptr(), copy.markup().as_ptr()));
        assert_eq!(copy.formula(), "z");
    }
}
