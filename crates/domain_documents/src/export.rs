//! Document export sinks
//!
//! A sink turns a `DocumentLayout` into downloadable bytes. `JsonSink` keeps
//! the full structure; `TextSink` prints fixed-width pages separated by form
//! feeds.

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::layout::{Align, Block, DocumentLayout, TableBlock, TotalsBlock};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedDocument {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ExportedDocument {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Produces a file from a rendered layout
pub trait DocumentSink: Send + Sync {
    fn export(&self, layout: &DocumentLayout) -> Result<ExportedDocument, RenderError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSink {
    pub pretty: bool,
}

impl DocumentSink for JsonSink {
    fn export(&self, layout: &DocumentLayout) -> Result<ExportedDocument, RenderError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(layout)?
        } else {
            serde_json::to_vec(layout)?
        };
        Ok(ExportedDocument {
            file_name: format!("{}.json", layout.file_stem),
            content_type: "application/json".to_string(),
            bytes,
        })
    }
}

pub const PAGE_SEPARATOR: char = '\u{000C}';

#[derive(Debug, Clone, Copy)]
pub struct TextSink {
    /// Characters per line
    pub width: usize,
}

impl Default for TextSink {
    fn default() -> Self {
        Self { width: 96 }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn pad(cell: &str, width: usize, align: Align) -> String {
    let fill = width.saturating_sub(char_len(cell));
    match align {
        Align::Left => format!("{}{}", cell, " ".repeat(fill)),
        Align::Right => format!("{}{}", " ".repeat(fill), cell),
    }
}

impl TextSink {
    fn rule(&self, out: &mut String, c: char) {
        out.extend(std::iter::repeat(c).take(self.width));
        out.push('\n');
    }

    fn right(&self, out: &mut String, text: &str) {
        out.push_str(&pad(text, self.width, Align::Right));
        out.push('\n');
    }

    fn table(&self, out: &mut String, table: &TableBlock) {
        if let Some(ref caption) = table.caption {
            if table.continued {
                out.push_str(&format!("{} (continued)\n", caption));
            } else {
                out.push_str(&format!("{}\n", caption));
            }
        }

        let mut widths: Vec<usize> = table.columns.iter().map(|c| char_len(&c.heading)).collect();
        for row in &table.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(char_len(cell));
                }
            }
        }

        let header: Vec<String> = table
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad(&c.heading, *w, c.align))
            .collect();
        out.push_str(header.join("  ").trim_end());
        out.push('\n');
        self.rule(out, '-');

        for row in &table.rows {
            let cells: Vec<String> = table
                .columns
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (c, w))| pad(row.get(i).map(String::as_str).unwrap_or(""), *w, c.align))
                .collect();
            out.push_str(cells.join("  ").trim_end());
            out.push('\n');
        }
        out.push('\n');
    }

    fn totals(&self, out: &mut String, totals: &TotalsBlock) {
        for (label, value) in &totals.rows {
            self.right(out, &format!("{}: {}", label, value));
        }
        self.rule(out, '=');
        self.right(out, &format!("{}: {}", totals.grand_total.0, totals.grand_total.1));
    }

    /// Renders the layout as text without encoding it
    pub fn render_text(&self, layout: &DocumentLayout) -> String {
        let mut out = String::new();
        let page_count = layout.pages.len();

        for (index, page) in layout.pages.iter().enumerate() {
            if index > 0 {
                out.push(PAGE_SEPARATOR);
            }
            for block in &page.blocks {
                match block {
                    Block::Issuer(issuer) => {
                        out.push_str(&issuer.name.to_uppercase());
                        out.push('\n');
                        for line in &issuer.lines {
                            out.push_str(line);
                            out.push('\n');
                        }
                        self.rule(&mut out, '=');
                    }
                    Block::Title(title) => {
                        out.push_str(&title.title.to_uppercase());
                        out.push('\n');
                        for (label, value) in &title.fields {
                            out.push_str(&format!("{}: {}\n", label, value));
                        }
                        out.push('\n');
                    }
                    Block::BillTo(party) => {
                        out.push_str(&format!("{}:\n{}\n", party.heading, party.name));
                        for line in &party.lines {
                            out.push_str(line);
                            out.push('\n');
                        }
                        out.push('\n');
                    }
                    Block::Table(table) => self.table(&mut out, table),
                    Block::Totals(totals) => self.totals(&mut out, totals),
                    Block::Text(text) => {
                        for line in &text.lines {
                            out.push_str(line);
                            out.push('\n');
                        }
                        out.push('\n');
                    }
                }
            }
            self.right(&mut out, &format!("Page {} of {}", page.number, page_count));
        }
        out
    }
}

impl DocumentSink for TextSink {
    fn export(&self, layout: &DocumentLayout) -> Result<ExportedDocument, RenderError> {
        if self.width < 20 {
            return Err(RenderError::Export(format!("text width {} is too narrow", self.width)));
        }
        Ok(ExportedDocument {
            file_name: format!("{}.txt", layout.file_stem),
            content_type: "text/plain; charset=utf-8".to_string(),
            bytes: self.render_text(layout).into_bytes(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Column, DocumentKind, Page, TextBlock};

    fn layout() -> DocumentLayout {
        DocumentLayout {
            kind: DocumentKind::Quotation,
            title: "Quotation QT-00001".into(),
            file_stem: "quotation-qt-00001".into(),
            pages: vec![
                Page {
                    number: 1,
                    blocks: vec![Block::Table(TableBlock {
                        caption: None,
                        columns: vec![Column::left("Item"), Column::right("Amount")],
                        rows: vec![vec!["Tiles".into(), "₹1,000.00".into()]],
                        continued: false,
                    })],
                },
                Page {
                    number: 2,
                    blocks: vec![Block::Text(TextBlock { lines: vec!["Thank you".into()] })],
                },
            ],
        }
    }

    #[test]
    fn test_json_sink_round_trips_layout() {
        let exported = JsonSink::default().export(&layout()).unwrap();
        assert_eq!(exported.file_name, "quotation-qt-00001.json");
        let parsed: DocumentLayout = serde_json::from_slice(&exported.bytes).unwrap();
        assert_eq!(parsed, layout());
    }

    #[test]
    fn test_text_sink_separates_pages() {
        let exported = TextSink::default().export(&layout()).unwrap();
        let text = String::from_utf8(exported.bytes).unwrap();
        assert_eq!(text.matches(PAGE_SEPARATOR).count(), 1);
        assert!(text.contains("Tiles  ₹1,000.00"));
        assert!(text.contains("Page 2 of 2"));
    }

    #[test]
    fn test_text_sink_rejects_tiny_width() {
        assert!(TextSink { width: 5 }.export(&layout()).is_err());
    }
}
