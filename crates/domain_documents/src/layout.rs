//! Layout description and pagination
//!
//! A `DocumentLayout` is a device-independent description of pages and the
//! blocks placed on them. Heights are abstract units tracked by `PageBudget`;
//! sinks decide how a block is drawn.

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Quotation,
    LeaseStatement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLayout {
    pub kind: DocumentKind,
    pub title: String,
    /// Base name for exported files, without extension
    pub file_stem: String,
    pub pages: Vec<Page>,
}

impl DocumentLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every table row across all pages, in order
    pub fn table_rows(&self) -> impl Iterator<Item = &Vec<String>> {
        self.pages
            .iter()
            .flat_map(|page| page.blocks.iter())
            .filter_map(|block| match block {
                Block::Table(table) => Some(table.rows.iter()),
                _ => None,
            })
            .flatten()
    }

    pub fn totals(&self) -> Option<&TotalsBlock> {
        self.pages
            .iter()
            .flat_map(|page| page.blocks.iter())
            .find_map(|block| match block {
                Block::Totals(totals) => Some(totals),
                _ => None,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based
    pub number: u32,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Issuer(IssuerBlock),
    Title(TitleBlock),
    BillTo(PartyBlock),
    Table(TableBlock),
    Totals(TotalsBlock),
    Text(TextBlock),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuerBlock {
    pub name: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleBlock {
    pub title: String,
    /// Label/value pairs such as number and date
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyBlock {
    pub heading: String,
    pub name: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub heading: String,
    pub align: Align,
}

impl Column {
    pub fn left(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            align: Align::Left,
        }
    }

    pub fn right(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            align: Align::Right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBlock {
    pub caption: Option<String>,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
    /// True on pages after the first one the table appears on
    pub continued: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalsBlock {
    pub rows: Vec<(String, String)>,
    pub grand_total: (String, String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub lines: Vec<String>,
}

/// Vertical space per page and per block, in layout units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageBudget {
    pub page_height: u32,
    pub header_height: u32,
    pub title_height: u32,
    pub bill_to_height: u32,
    pub row_height: u32,
    pub totals_height: u32,
}

impl Default for PageBudget {
    /// A4 portrait in points
    fn default() -> Self {
        Self {
            page_height: 842,
            header_height: 90,
            title_height: 50,
            bill_to_height: 70,
            row_height: 20,
            totals_height: 100,
        }
    }
}

impl PageBudget {
    /// A budget where a continuation page holds at least `rows` table rows
    ///
    /// Saturates at `u32::MAX` units; `validate` still applies.
    pub fn with_rows_per_page(rows: u32) -> Self {
        let base = Self::default();
        let first_page_minimum = base
            .fixed_height()
            .saturating_add(base.row_height.saturating_mul(2));
        Self {
            page_height: base
                .row_height
                .saturating_mul(rows.saturating_add(1))
                .max(first_page_minimum),
            ..base
        }
    }

    /// Issuer, title and bill-to blocks together
    fn fixed_height(&self) -> u32 {
        self.header_height
            .saturating_add(self.title_height)
            .saturating_add(self.bill_to_height)
    }

    /// Every page must hold at least the column header and one row, and the
    /// first page must hold its fixed blocks
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.row_height == 0 {
            return Err(RenderError::InvalidBudget("row height must be positive".into()));
        }
        if self.row_height.checked_mul(2).map_or(true, |needed| self.page_height < needed) {
            return Err(RenderError::InvalidBudget(format!(
                "page height {} cannot hold a table header and one row",
                self.page_height
            )));
        }
        if self.totals_height > self.page_height {
            return Err(RenderError::InvalidBudget(format!(
                "totals height {} exceeds page height {}",
                self.totals_height, self.page_height
            )));
        }
        let fixed = self.fixed_height();
        if fixed > self.page_height {
            return Err(RenderError::InvalidBudget(format!(
                "header blocks need {} units but a page has {}",
                fixed, self.page_height
            )));
        }
        Ok(())
    }
}

/// Places blocks top to bottom and breaks pages when the budget runs out
pub(crate) struct Paginator {
    budget: PageBudget,
    pages: Vec<Page>,
    current: Vec<Block>,
    remaining: u32,
}

impl Paginator {
    pub(crate) fn new(budget: PageBudget) -> Result<Self, RenderError> {
        budget.validate()?;
        Ok(Self {
            budget,
            pages: Vec::new(),
            current: Vec::new(),
            remaining: budget.page_height,
        })
    }

    pub(crate) fn budget(&self) -> &PageBudget {
        &self.budget
    }

    fn break_page(&mut self) {
        let blocks = std::mem::take(&mut self.current);
        self.pages.push(Page {
            number: self.pages.len() as u32 + 1,
            blocks,
        });
        self.remaining = self.budget.page_height;
    }

    /// Places a block, moving to a fresh page first if it does not fit
    pub(crate) fn place(&mut self, block: Block, height: u32) {
        if height > self.remaining && !self.current.is_empty() {
            self.break_page();
        }
        self.remaining = self.remaining.saturating_sub(height);
        self.current.push(block);
    }

    /// Places a table, repeating its column header on every page it spans
    pub(crate) fn place_table(
        &mut self,
        caption: Option<String>,
        columns: Vec<Column>,
        rows: Vec<Vec<String>>,
    ) {
        let row_height = self.budget.row_height;
        let mut rows = rows.into_iter().peekable();
        let mut continued = false;

        loop {
            // Column header plus at least one row must fit.
            let needed = if rows.peek().is_some() { row_height.saturating_mul(2) } else { row_height };
            if self.remaining < needed && !self.current.is_empty() {
                self.break_page();
            }
            self.remaining = self.remaining.saturating_sub(row_height);

            let mut chunk = Vec::new();
            while self.remaining >= row_height {
                match rows.next() {
                    Some(row) => {
                        self.remaining -= row_height;
                        chunk.push(row);
                    }
                    None => break,
                }
            }

            self.current.push(Block::Table(TableBlock {
                caption: caption.clone(),
                columns: columns.clone(),
                rows: chunk,
                continued,
            }));

            if rows.peek().is_none() {
                break;
            }
            continued = true;
            self.break_page();
        }
    }

    /// Places text one line per row, continuing on new pages as needed
    pub(crate) fn place_text(&mut self, lines: Vec<String>) {
        let row_height = self.budget.row_height;
        let mut lines = lines.into_iter().peekable();

        while lines.peek().is_some() {
            if self.remaining < row_height && !self.current.is_empty() {
                self.break_page();
            }
            let mut chunk = Vec::new();
            while self.remaining >= row_height || chunk.is_empty() {
                match lines.next() {
                    Some(line) => {
                        self.remaining = self.remaining.saturating_sub(row_height);
                        chunk.push(line);
                    }
                    None => break,
                }
            }
            self.current.push(Block::Text(TextBlock { lines: chunk }));
        }
    }

    pub(crate) fn finish(mut self) -> Vec<Page> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.break_page();
        }
        self.pages
    }
}
