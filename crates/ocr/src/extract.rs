use crate::types::{LineItem, ParsedReceipt, SummaryField};

/// Characters stripped from a price token before numeric parsing.
const PRICE_NOISE: [char; 3] = ['$', '€', ','];

// ── Public extraction API ─────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// Parse raw OCR text into line items and summary totals.
    ///
    /// Every line is handled on its own: summary keywords are checked first
    /// (Subtotal, then Tax, then Total, case-sensitive substring match) and the
    /// last token of a matching line overwrites that slot. Any other line with
    /// at least two tokens whose last token parses as a price becomes an item.
    pub fn extract(ocr_text: &str) -> ParsedReceipt {
        let mut receipt = ParsedReceipt::default();

        for line in split_lines(ocr_text) {
            if let Some(field) = Self::summary_field(line) {
                if let Some(token) = line.split_whitespace().last() {
                    receipt.summary.set(field, token);
                }
                continue;
            }

            if let Some(item) = Self::line_item(line) {
                receipt.items.push(item);
            }
        }

        receipt
    }

    fn summary_field(line: &str) -> Option<SummaryField> {
        SummaryField::ORDERED
            .into_iter()
            .find(|field| line.contains(field.keyword()))
    }

    fn line_item(line: &str) -> Option<LineItem> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (last, rest) = tokens.split_last()?;
        if rest.is_empty() {
            return None;
        }
        let price = parse_price(last)?;
        Some(LineItem::new(rest.join(" "), price))
    }
}

// ── Line splitting ────────────────────────────────────────────────────────────

/// Split on every line boundary OCR engines emit, including a lone `\r`,
/// form feed and the Unicode line/paragraph separators.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| {
        matches!(
            c,
            '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
        )
    })
}

// ── Price parsing ─────────────────────────────────────────────────────────────

/// `"$1,234.56"` → `1234.56`. Non-finite values are rejected so the item list
/// always serializes as valid JSON.
pub fn parse_price(token: &str) -> Option<f64> {
    let clean: String = token.chars().filter(|c| !PRICE_NOISE.contains(c)).collect();
    strip_digit_separators(&clean)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Drop each `_` that sits between two digits (`1_000.50`). Any other
/// underscore is left in place and fails the parse.
fn strip_digit_separators(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|&(i, &c)| {
            let between_digits = i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
            !(c == '_' && between_digits)
        })
        .map(|(_, &c)| c)
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
