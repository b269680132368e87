use serde::{Deserialize, Serialize};

/// One priced line of a receipt, in order of appearance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    #[serde(rename = "Item")]
    pub description: String,
    #[serde(rename = "Price")]
    pub price: f64,
}

impl LineItem {
    pub fn new(description: impl Into<String>, price: f64) -> Self {
        Self { description: description.into(), price }
    }
}

/// Raw tokens taken from the Subtotal / Tax / Total lines.
///
/// Values are kept exactly as OCR produced them (`"$12.50"`, `"12,50"`, …);
/// absent fields serialize as `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReceiptSummary {
    #[serde(rename = "Subtotal")]
    pub subtotal: Option<String>,
    #[serde(rename = "Tax")]
    pub tax: Option<String>,
    #[serde(rename = "Total")]
    pub total: Option<String>,
}

/// Which summary slot a line feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryField {
    Subtotal,
    Tax,
    Total,
}

impl SummaryField {
    /// Keywords in match order. "Subtotal" must come before "Total".
    pub const ORDERED: [SummaryField; 3] =
        [SummaryField::Subtotal, SummaryField::Tax, SummaryField::Total];

    pub fn keyword(self) -> &'static str {
        match self {
            SummaryField::Subtotal => "Subtotal",
            SummaryField::Tax => "Tax",
            SummaryField::Total => "Total",
        }
    }
}

impl std::fmt::Display for SummaryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

impl ReceiptSummary {
    pub fn set(&mut self, field: SummaryField, value: impl Into<String>) {
        let slot = match field {
            SummaryField::Subtotal => &mut self.subtotal,
            SummaryField::Tax => &mut self.tax,
            SummaryField::Total => &mut self.total,
        };
        *slot = Some(value.into());
    }
}

/// Line items plus summary totals parsed from one OCR text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParsedReceipt {
    pub items: Vec<LineItem>,
    pub summary: ReceiptSummary,
}
