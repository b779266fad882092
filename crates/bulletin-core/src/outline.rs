//! Order-of-worship data model.
//!
//! Section order and line order are rendering order. Nothing in this crate
//! sorts, merges or dedupes them.

use serde::{Deserialize, Serialize};

/// One line of a section, e.g. `Call to Worship - {{ call_to_worship_verse }}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub text: String,
    /// Rendered with a footnote glyph in front of it.
    #[serde(default)]
    pub is_footnote: bool,
}

impl LineItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_footnote: false,
        }
    }

    pub fn footnote(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_footnote: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl Section {
    pub fn new(title: impl Into<String>, items: Vec<LineItem>) -> Self {
        Self {
            title: title.into(),
            items,
        }
    }
}

/// A complete service liturgy, either as a stored skeleton or resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOutline {
    #[serde(default)]
    pub benediction_song: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl ServiceOutline {
    /// The outline used for a service with no configured liturgy.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.benediction_song.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.sections.iter().map(|section| section.items.len()).sum()
    }

    pub fn section_titles(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|section| section.title.as_str())
    }

    /// Every piece of text in rendering order: titles, lines, then the benediction song.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|section| {
                std::iter::once(section.title.as_str())
                    .chain(section.items.iter().map(|item| item.text.as_str()))
            })
            .chain(std::iter::once(self.benediction_song.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_stored_camel_case_skeleton() {
        let outline: ServiceOutline = serde_json::from_value(json!({
            "benedictionSong": "Doxology",
            "sections": [
                {
                    "title": "BEFORE WORSHIP",
                    "items": [
                        { "text": "Prelude" },
                        { "text": "Silent Prayer", "isFootnote": true }
                    ]
                },
                { "title": "GOD CALLS HIS PEOPLE TO WORSHIP" }
            ]
        }))
        .expect("skeleton parses");

        assert_eq!(outline.benediction_song, "Doxology");
        assert_eq!(
            outline.section_titles().collect::<Vec<_>>(),
            vec!["BEFORE WORSHIP", "GOD CALLS HIS PEOPLE TO WORSHIP"]
        );
        assert_eq!(outline.sections[0].items[0], LineItem::new("Prelude"));
        assert_eq!(outline.sections[0].items[1], LineItem::footnote("Silent Prayer"));
        assert!(outline.sections[1].items.is_empty());
        assert_eq!(outline.line_count(), 2);
    }

    #[test]
    fn texts_follow_rendering_order() {
        let outline = ServiceOutline {
            benediction_song: "Amen".to_string(),
            sections: vec![
                Section::new("A", vec![LineItem::new("a1"), LineItem::new("a2")]),
                Section::new("B", vec![LineItem::new("b1")]),
            ],
        };
        assert_eq!(
            outline.texts().collect::<Vec<_>>(),
            vec!["A", "a1", "a2", "B", "b1", "Amen"]
        );
    }

    #[test]
    fn empty_outline_is_empty() {
        assert!(ServiceOutline::empty().is_empty());
        assert_eq!(ServiceOutline::empty().line_count(), 0);
    }
}
