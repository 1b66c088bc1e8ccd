use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::debug;

/// Extension-to-owner lookup for recording lines.
const OWNER_TAGS: &[(&str, &str)] = &[("*200", "Vikki"), ("*201", "Assistant")];

const UNKNOWN_OWNER: &str = "UnknownUser";

/// One recording entry extracted from an exported call listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallRecord {
    /// Stable identifier used to address the audio on the remote endpoint.
    pub id: String,
    /// Date and time text exactly as it appears in the listing.
    pub date_time: String,
    pub from_number: String,
    pub to_number: String,
    /// Human owner of the recording line, derived from the extension.
    pub owner_tag: String,
}

pub fn owner_tag_for_extension(extension: &str) -> &'static str {
    OWNER_TAGS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, tag)| *tag)
        .unwrap_or(UNKNOWN_OWNER)
}

/// Extract call records from an exported listing document, in document order.
///
/// Rows without a usable identifier are skipped. Missing cells degrade to
/// empty fields. A document with no recognizable rows yields an empty list.
pub fn parse_listing(html: &str) -> Vec<CallRecord> {
    let document = Html::parse_document(html);

    let row_sel = Selector::parse("tr.recording").unwrap_or_else(|_| unreachable!());
    let date_sel = Selector::parse("td.date").unwrap_or_else(|_| unreachable!());
    let rec_sel = Selector::parse("td.rec span.phonenumber").unwrap_or_else(|_| unreachable!());
    let from_sel = Selector::parse("td.from span.phonenumber").unwrap_or_else(|_| unreachable!());
    let cell_sel = Selector::parse("td").unwrap_or_else(|_| unreachable!());
    let number_sel = Selector::parse("span.phonenumber").unwrap_or_else(|_| unreachable!());

    let mut records = Vec::new();

    for row in document.select(&row_sel) {
        let id = match row.value().attr("data-id") {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                debug!("Skipping recording row without a data-id attribute");
                continue;
            }
        };

        let date_time = row
            .select(&date_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let extension = row
            .select(&rec_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let from_number = row
            .select(&from_sel)
            .next()
            .map(|el| strip_whitespace(&element_text(el)))
            .unwrap_or_default();

        // The "to" cell carries no distinguishing class; it is the fifth
        // cell of the row by position.
        let to_number = row
            .select(&cell_sel)
            .nth(4)
            .and_then(|cell| cell.select(&number_sel).next())
            .map(|el| strip_whitespace(&element_text(el)))
            .unwrap_or_default();

        records.push(CallRecord {
            id,
            date_time,
            from_number,
            to_number,
            owner_tag: owner_tag_for_extension(&extension).to_string(),
        });
    }

    records
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn strip_whitespace(s: &str) -> String {
    s.split_whitespace().collect()
}
