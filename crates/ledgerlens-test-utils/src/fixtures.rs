//! Statement fixtures: lay out text fragments the way a PDF extractor
//! delivers them.

use ledgerlens_core::{BoundingBox, TextFragment};

/// Units of width per character in fixture text.
const CHAR_WIDTH: f64 = 6.0;

/// Line height between fixture rows.
const LINE_HEIGHT: f64 = 15.0;

/// Fixture line height for fragments.
const TEXT_HEIGHT: f64 = 10.0;

/// Y position where a fixture page overflows onto the next.
const PAGE_BREAK_Y: f64 = 760.0;

/// Column geometry of the default five-column fixture layout.
#[derive(Debug, Clone, Copy)]
pub struct FixtureLayout {
    /// Left edge of the date column
    pub date_x: f64,
    /// Left edge of the description column
    pub description_x: f64,
    /// Right edge amounts in the debit column align to
    pub debit_right: f64,
    /// Right edge amounts in the credit column align to
    pub credit_right: f64,
    /// Right edge amounts in the balance column align to
    pub balance_right: f64,
}

impl Default for FixtureLayout {
    fn default() -> Self {
        Self {
            date_x: 40.0,
            description_x: 130.0,
            debit_right: 390.0,
            credit_right: 490.0,
            balance_right: 600.0,
        }
    }
}

/// Builder producing positioned fragments for a synthetic statement.
///
/// Rows advance down the page by a fixed line height and overflow onto
/// the next page past the page-break Y, like a real multi-page statement.
#[derive(Debug)]
pub struct StatementFixture {
    layout: FixtureLayout,
    fragments: Vec<TextFragment>,
    page: u32,
    y: f64,
}

impl StatementFixture {
    /// Start a fixture at the top of page 1.
    pub fn new() -> Self {
        Self {
            layout: FixtureLayout::default(),
            fragments: Vec::new(),
            page: 1,
            y: 40.0,
        }
    }

    /// Start a fixture with custom column geometry.
    pub fn with_layout(layout: FixtureLayout) -> Self {
        Self {
            layout,
            ..Self::new()
        }
    }

    fn bbox(&self, x: f64, text: &str) -> BoundingBox {
        BoundingBox::new(x, self.y, text.len() as f64 * CHAR_WIDTH, TEXT_HEIGHT)
            .expect("fixture box")
    }

    fn advance(&mut self) {
        self.y += LINE_HEIGHT;
        if self.y > PAGE_BREAK_Y {
            self.page += 1;
            self.y = 40.0;
        }
    }

    fn push(&mut self, x: f64, text: &str) {
        let bbox = self.bbox(x, text);
        self.fragments
            .push(TextFragment::native(text, bbox, self.page));
    }

    fn push_right_aligned(&mut self, right_edge: f64, text: &str) {
        let width = text.len() as f64 * CHAR_WIDTH;
        let bbox = BoundingBox::new(right_edge - width, self.y, width, TEXT_HEIGHT)
            .expect("fixture box");
        self.fragments
            .push(TextFragment::native(text, bbox, self.page));
    }

    /// A full-width free-text line (letterhead, marker rows).
    pub fn free_line(mut self, text: &str) -> Self {
        self.push(self.layout.date_x, text);
        self.advance();
        self
    }

    /// The standard five-column header row.
    pub fn header_row(self) -> Self {
        self.header_row_titled(&["Date", "Description", "Debit", "Credit", "Balance"])
    }

    /// A header row with custom titles (date, description, debit, credit,
    /// balance order).
    pub fn header_row_titled(mut self, titles: &[&str; 5]) -> Self {
        self.push(self.layout.date_x, titles[0]);
        self.push(self.layout.description_x, titles[1]);
        self.push_right_aligned(self.layout.debit_right, titles[2]);
        self.push_right_aligned(self.layout.credit_right, titles[3]);
        self.push_right_aligned(self.layout.balance_right, titles[4]);
        self.advance();
        self
    }

    /// A transaction row; `None` leaves the cell blank on the page.
    pub fn row(
        mut self,
        date: &str,
        description: &str,
        debit: Option<&str>,
        credit: Option<&str>,
        balance: Option<&str>,
    ) -> Self {
        self.push(self.layout.date_x, date);
        self.push(self.layout.description_x, description);
        if let Some(debit) = debit {
            self.push_right_aligned(self.layout.debit_right, debit);
        }
        if let Some(credit) = credit {
            self.push_right_aligned(self.layout.credit_right, credit);
        }
        if let Some(balance) = balance {
            self.push_right_aligned(self.layout.balance_right, balance);
        }
        self.advance();
        self
    }

    /// A wrapped description continuation line (description column only).
    pub fn continuation(mut self, text: &str) -> Self {
        self.push(self.layout.description_x, text);
        self.advance();
        self
    }

    /// A blank vertical gap, e.g. between a table and a footer.
    pub fn gap(mut self, units: f64) -> Self {
        self.y += units;
        if self.y > PAGE_BREAK_Y {
            self.page += 1;
            self.y = 40.0;
        }
        self
    }

    /// Jump to the top of the next page.
    pub fn page_break(mut self) -> Self {
        self.page += 1;
        self.y = 40.0;
        self
    }

    /// Finish and return the fragments.
    pub fn build(self) -> Vec<TextFragment> {
        self.fragments
    }
}

impl Default for StatementFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// The S1 minimal valid document: three US-format transactions under an
/// opening-balance marker.
pub fn minimal_statement() -> Vec<TextFragment> {
    StatementFixture::new()
        .free_line("Opening Balance 7,200.00")
        .header_row()
        .row("2025-01-15", "Salary", None, Some("5,250.00"), Some("12,450.00"))
        .row("2025-01-16", "Transfer", Some("1,200.00"), None, Some("11,250.00"))
        .row("2025-01-17", "Purchase", Some("89.99"), None, Some("11,160.01"))
        .build()
}
