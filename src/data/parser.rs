//! Table row parser for the user directory page
//!
//! The directory page lists one user per table row: a left-aligned cell with
//! the identifier followed by a plain cell with the display name. The parser
//! walks the page as a stream of tag and text events and keeps a handful of
//! flags to pick those pairs out. It is not a general table reader.

use std::borrow::Cow;

use chrono::Utc;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::{debug, warn};

use super::MappingRecord;

/// Names with more tokens than this are shortened
const MAX_NAME_TOKENS: usize = 3;

/// Elements whose content is raw text, not markup
const RAW_TEXT_TAGS: [&str; 2] = ["script", "style"];

/// Decides whether a cell start tag opens the identifier cell
pub trait KeyCellRule {
    /// `attributes` holds the `(name, value)` pairs of the `<td>` tag
    fn is_key_cell(&self, attributes: &[(String, String)]) -> bool;
}

/// The identifier cell is the one carrying any attribute at all
///
/// On the directory page only the identifier cell is aligned explicitly.
/// Pages where other cells carry attributes will be misread.
#[derive(Debug, Clone, Copy, Default)]
pub struct HasAttributes;

impl KeyCellRule for HasAttributes {
    fn is_key_cell(&self, attributes: &[(String, String)]) -> bool {
        !attributes.is_empty()
    }
}

/// Which cell of the current row the parser is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Cell {
    #[default]
    None,
    Key,
    Name,
}

/// Streaming parser producing one `MappingRecord` per page
///
/// State only lives for one pass: `feed` and `finish` both reset it, so the
/// same parser can be reused for the next page.
#[derive(Debug, Default)]
pub struct TableRowParser<R = HasAttributes> {
    rule: R,
    in_row: bool,
    cell: Cell,
    pending_key: Option<String>,
    pairs: Vec<(String, String)>,
}

impl TableRowParser<HasAttributes> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: KeyCellRule> TableRowParser<R> {
    /// Creates a parser with a custom identifier-cell rule
    pub fn with_rule(rule: R) -> Self {
        Self {
            rule,
            in_row: false,
            cell: Cell::None,
            pending_key: None,
            pairs: Vec::new(),
        }
    }

    /// Parses a whole HTML page into a record
    ///
    /// Malformed markup never fails the pass. If the tokenizer gives up, the
    /// pairs completed so far make up the record.
    pub fn feed(&mut self, html: &str) -> MappingRecord {
        let html = strip_raw_text(html);
        let mut reader = Reader::from_str(&html);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        loop {
            match reader.read_event() {
                Ok(Event::Start(tag)) => {
                    let (name, attributes) = tag_parts(&tag);
                    self.start_tag(&name, &attributes);
                }
                Ok(Event::Empty(tag)) => {
                    let (name, attributes) = tag_parts(&tag);
                    self.start_tag(&name, &attributes);
                    self.end_tag(&name);
                }
                Ok(Event::End(tag)) => {
                    let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                    self.end_tag(&name);
                }
                Ok(Event::Text(text)) => {
                    let raw = String::from_utf8_lossy(&text);
                    self.text(&html_escape::decode_html_entities(&raw));
                }
                Ok(Event::CData(data)) => {
                    self.text(&String::from_utf8_lossy(&data));
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        position = reader.buffer_position(),
                        "Stopped reading directory page early: {}", e
                    );
                    break;
                }
            }
        }

        self.finish()
    }

    /// Handles a start tag
    pub fn start_tag(&mut self, name: &str, attributes: &[(String, String)]) {
        if !self.in_row {
            if name.eq_ignore_ascii_case("tr") {
                self.in_row = true;
            }
            return;
        }

        if !name.eq_ignore_ascii_case("td") {
            return;
        }

        if self.has_pending_key() {
            self.cell = Cell::Name;
        } else if self.rule.is_key_cell(attributes) {
            self.cell = Cell::Key;
        }
    }

    /// Handles an end tag
    pub fn end_tag(&mut self, name: &str) {
        if self.in_row && name.eq_ignore_ascii_case("tr") {
            // An identifier without a name cell is dropped with its row.
            self.in_row = false;
            self.cell = Cell::None;
            self.pending_key = None;
        } else if name.eq_ignore_ascii_case("td") {
            self.cell = Cell::None;
        }
    }

    /// Handles text content
    pub fn text(&mut self, data: &str) {
        if !self.in_row {
            return;
        }

        match self.cell {
            Cell::Key => self.pending_key = Some(data.to_string()),
            Cell::Name => {
                if let Some(key) = self.pending_key.take() {
                    self.pairs.push((key, shorten_name(data)));
                }
            }
            Cell::None => {}
        }
    }

    /// Closes the current pass and returns everything collected in it
    pub fn finish(&mut self) -> MappingRecord {
        let pairs = std::mem::take(&mut self.pairs);
        self.in_row = false;
        self.cell = Cell::None;
        self.pending_key = None;

        debug!(pairs = pairs.len(), "Parsed directory page");
        MappingRecord::new(pairs, Utc::now())
    }

    fn has_pending_key(&self) -> bool {
        self.pending_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

/// Keeps the first two and the last token of names longer than three tokens
///
/// Tokens are split on single spaces, so runs of spaces count as empty tokens.
pub fn shorten_name(name: &str) -> String {
    let tokens: Vec<&str> = name.split(' ').collect();
    if tokens.len() > MAX_NAME_TOKENS {
        format!("{} {} {}", tokens[0], tokens[1], tokens[tokens.len() - 1])
    } else {
        name.to_string()
    }
}

/// Drops the bodies of `<script>` and `<style>` elements
///
/// Their content is not markup, so rows written out by a script must not
/// reach the tokenizer. An element that is never closed loses everything
/// up to the end of the page.
fn strip_raw_text(html: &str) -> Cow<'_, str> {
    let lower = html.to_ascii_lowercase();
    let mut out = String::new();
    let mut pos = 0;

    while let Some((body_start, tag)) = next_raw_text_open(&lower, pos) {
        let close = format!("</{}", tag);
        let body_end = lower[body_start..]
            .find(&close)
            .map_or(html.len(), |i| body_start + i);

        out.push_str(&html[pos..body_start]);
        pos = body_end;
    }

    if pos == 0 {
        return Cow::Borrowed(html);
    }
    out.push_str(&html[pos..]);
    Cow::Owned(out)
}

/// Finds the next raw text start tag at or after `from`
///
/// Returns the offset just past its `>` and the tag name. `lower` must be
/// the ASCII-lowercased page.
fn next_raw_text_open(lower: &str, from: usize) -> Option<(usize, &'static str)> {
    let mut search = from;
    while let Some(rel) = lower[search..].find('<') {
        let start = search + rel + 1;
        let rest = &lower[start..];
        for tag in RAW_TEXT_TAGS {
            let Some(after) = rest.strip_prefix(tag) else {
                continue;
            };
            if after.starts_with(|c: char| c == '>' || c == '/' || c.is_ascii_whitespace()) {
                let open_end = rest.find('>')?;
                return Some((start + open_end + 1, tag));
            }
        }
        search = start;
    }
    None
}

fn tag_parts(tag: &BytesStart<'_>) -> (String, Vec<(String, String)>) {
    let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
    let attributes = tag
        .html_attributes()
        .filter_map(Result::ok)
        .map(|attr| {
            (
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                String::from_utf8_lossy(&attr.value).into_owned(),
            )
        })
        .collect();
    (name, attributes)
}
