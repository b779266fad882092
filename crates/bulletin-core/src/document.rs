//! Renderer-facing content blocks.
//!
//! A [`Document`] is the ordered block sequence handed to a layout engine.
//! Column, frame and page geometry belong to the renderer; this module only
//! fixes what is said and in which order.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Heading {
        text: String,
        level: u8,
    },
    Paragraph {
        text: String,
    },
    /// A bordered box with a centered title, e.g. WELCOME! or ANNOUNCEMENTS.
    BoxedList {
        title: String,
        entries: Vec<String>,
    },
    /// A two-column "this week / next week" table.
    ScheduleTable {
        title: String,
        this_week: String,
        next_week: String,
    },
    /// One order-of-worship line.
    LineItem {
        text: String,
        footnote: bool,
    },
    /// Continue in the next frame (column).
    FrameBreak,
    PageBreak,
}

impl Block {
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Block::Heading {
            text: text.into(),
            level,
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub title: String,
    pub service_date: String,
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(title: impl Into<String>, service_date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            service_date: service_date.into(),
            blocks: Vec::new(),
        }
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Every string the renderer will print, in block order.
    pub fn texts(&self) -> Vec<&str> {
        let mut texts = vec![self.title.as_str()];
        for block in &self.blocks {
            match block {
                Block::Heading { text, .. }
                | Block::Paragraph { text }
                | Block::LineItem { text, .. } => texts.push(text),
                Block::BoxedList { title, entries } => {
                    texts.push(title);
                    texts.extend(entries.iter().map(String::as_str));
                }
                Block::ScheduleTable {
                    title,
                    this_week,
                    next_week,
                } => {
                    texts.push(title);
                    texts.push(this_week);
                    texts.push(next_week);
                }
                Block::FrameBreak | Block::PageBreak => {}
            }
        }
        texts
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to serialize document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Consumer of a resolved [`Document`].
pub trait DocumentRenderer {
    fn render(&self, document: &Document) -> Result<String, RenderError>;
}

/// Plain-text proof of the bulletin, one block after another.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    pub footnote_glyph: String,
    pub width: usize,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            footnote_glyph: "*".to_string(),
            width: 60,
        }
    }
}

impl TextRenderer {
    pub fn new(footnote_glyph: impl Into<String>) -> Self {
        Self {
            footnote_glyph: footnote_glyph.into(),
            ..Self::default()
        }
    }

    fn rule(&self, ch: char) -> String {
        std::iter::repeat_n(ch, self.width).collect()
    }

    fn centered(&self, text: &str) -> String {
        let len = text.chars().count();
        if len >= self.width {
            return text.to_string();
        }
        let pad = (self.width - len) / 2;
        format!("{}{}", " ".repeat(pad), text)
    }
}

impl DocumentRenderer for TextRenderer {
    fn render(&self, document: &Document) -> Result<String, RenderError> {
        let mut lines = vec![
            self.centered(&document.title),
            self.centered(&document.service_date),
            String::new(),
        ];

        for block in &document.blocks {
            match block {
                Block::Heading { text, level } => {
                    lines.push(String::new());
                    if *level <= 1 {
                        lines.push(self.centered(text));
                        lines.push(self.rule('='));
                    } else {
                        lines.push(text.clone());
                    }
                }
                Block::Paragraph { text } => lines.push(text.clone()),
                Block::BoxedList { title, entries } => {
                    lines.push(self.rule('-'));
                    lines.push(self.centered(title));
                    for entry in entries {
                        lines.push(format!("  {entry}"));
                    }
                    lines.push(self.rule('-'));
                }
                Block::ScheduleTable {
                    title,
                    this_week,
                    next_week,
                } => {
                    lines.push(title.clone());
                    lines.push(format!("  This week: {this_week}"));
                    lines.push(format!("  Next week: {next_week}"));
                }
                Block::LineItem { text, footnote } => {
                    if *footnote {
                        lines.push(format!("  {}{text}", self.footnote_glyph));
                    } else {
                        lines.push(format!("  {text}"));
                    }
                }
                Block::FrameBreak => lines.push(String::new()),
                Block::PageBreak => lines.push("\u{000C}".to_string()),
            }
        }

        let mut rendered = lines.join("\n");
        rendered.push('\n');
        Ok(rendered)
    }
}

/// Pretty JSON of the block sequence, for an external layout engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl DocumentRenderer for JsonRenderer {
    fn render(&self, document: &Document) -> Result<String, RenderError> {
        Ok(serde_json::to_string_pretty(document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> Document {
        let mut document = Document::new("Pilgrim Church", "August 20th, 2023");
        document.push(Block::BoxedList {
            title: "ANNOUNCEMENTS".to_string(),
            entries: vec!["<b>Family Night</b> resumes Wednesday.".to_string()],
        });
        document.push(Block::ScheduleTable {
            title: "Coffee & Snack".to_string(),
            this_week: "Swayze & Monroe".to_string(),
            next_week: "Spencley & Howell".to_string(),
        });
        document.push(Block::FrameBreak);
        document.push(Block::heading("BEFORE WORSHIP", 2));
        document.push(Block::LineItem {
            text: "Prelude".to_string(),
            footnote: false,
        });
        document.push(Block::LineItem {
            text: "Hymn of Praise - #382".to_string(),
            footnote: true,
        });
        document
    }

    #[test]
    fn text_renderer_prefixes_footnotes_with_glyph() {
        let rendered = TextRenderer::new("†").render(&document()).unwrap();
        assert!(rendered.contains("  †Hymn of Praise - #382\n"));
        assert!(rendered.contains("  Prelude\n"));
        assert!(rendered.contains("This week: Swayze & Monroe"));
        assert!(rendered.contains("Next week: Spencley & Howell"));
    }

    #[test]
    fn text_renderer_keeps_block_order() {
        let rendered = TextRenderer::default().render(&document()).unwrap();
        let announcements = rendered.find("ANNOUNCEMENTS").unwrap();
        let heading = rendered.find("BEFORE WORSHIP").unwrap();
        let prelude = rendered.find("Prelude").unwrap();
        assert!(announcements < heading && heading < prelude);
    }

    #[test]
    fn json_renderer_tags_blocks_by_kind() {
        let rendered = JsonRenderer.render(&document()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["service_date"], "August 20th, 2023");
        assert_eq!(value["blocks"][0]["kind"], "boxed_list");
        assert_eq!(value["blocks"][2]["kind"], "frame_break");
        assert_eq!(value["blocks"][5]["footnote"], true);
    }

    #[test]
    fn texts_lists_every_printed_string() {
        let document = document();
        let texts = document.texts();
        assert_eq!(texts[0], "Pilgrim Church");
        assert!(texts.contains(&"Spencley & Howell"));
        assert!(texts.contains(&"Hymn of Praise - #382"));
    }
}
