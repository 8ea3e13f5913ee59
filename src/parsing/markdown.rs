//! Renders the small markdown dialect used in tutor replies into an HTML fragment.
//!
//! Every line is HTML-escaped before it is classified, so markup in the output
//! only ever comes from the renderer itself.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RULE_RE: Regex = Regex::new(r"^-{3,}$").unwrap();
    static ref TABLE_ROW_RE: Regex = Regex::new(r"^\|(.+)\|$").unwrap();
    static ref SEPARATOR_CELL_RE: Regex = Regex::new(r"^[-:\s]+$").unwrap();
    static ref HEADING_RE: Regex = Regex::new(r"^(#{1,4})\s+(.+)$").unwrap();
    static ref UNORDERED_RE: Regex = Regex::new(r"^[-*]\s+(.+)$").unwrap();
    static ref ORDERED_RE: Regex = Regex::new(r"^\d+\.\s+(.+)$").unwrap();
    // Order matters: bold before italic so `**x**` is not read as two empty italics.
    static ref INLINE_RULES: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"\*\*(.+?)\*\*").unwrap(), "<strong>${1}</strong>"),
        (Regex::new(r"\*(.+?)\*").unwrap(), "<em>${1}</em>"),
        (Regex::new(r"`(.+?)`").unwrap(), "<code>${1}</code>"),
        (Regex::new(r"~~(.+?)~~").unwrap(), "<del>${1}</del>"),
        (Regex::new(r"__(.+?)__").unwrap(), "<u>${1}</u>"),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn open_tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "<ul>",
            ListKind::Ordered => "<ol>",
        }
    }

    fn close_tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "</ul>",
            ListKind::Ordered => "</ol>",
        }
    }
}

#[derive(Debug, Default)]
struct TableBuffer {
    rows: Vec<Vec<String>>,
    header_row: Option<usize>,
}

impl TableBuffer {
    fn push_separator(&mut self) {
        if self.header_row.is_none() && !self.rows.is_empty() {
            self.header_row = Some(self.rows.len() - 1);
        }
    }

    fn to_html(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        let mut html = String::from(r#"<div class="md-table-wrapper"><table class="md-table">"#);
        if let Some(header_idx) = self.header_row {
            html.push_str("<thead><tr>");
            for cell in &self.rows[header_idx] {
                html.push_str(&format!("<th>{}</th>", format_inline(cell)));
            }
            html.push_str("</tr></thead>");
        }
        html.push_str("<tbody>");
        for (idx, row) in self.rows.iter().enumerate() {
            if Some(idx) == self.header_row {
                continue;
            }
            html.push_str("<tr>");
            for cell in row {
                html.push_str(&format!("<td>{}</td>", format_inline(cell)));
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table></div>");
        html
    }
}

/// What the renderer currently has open.
#[derive(Debug)]
enum RenderState {
    Idle,
    List(ListKind),
    Table(TableBuffer),
}

#[derive(Debug, PartialEq)]
enum LineKind<'a> {
    Rule,
    TableRow(Vec<String>),
    TableSeparator,
    Heading(usize, &'a str),
    ListItem(ListKind, &'a str),
    Blank,
    Paragraph(&'a str),
}

fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if RULE_RE.is_match(trimmed) {
        return LineKind::Rule;
    }
    if let Some(caps) = TABLE_ROW_RE.captures(line) {
        let inner = caps.get(1).map_or("", |m| m.as_str());
        let cells: Vec<String> = inner.split('|').map(|c| c.trim().to_string()).collect();
        let is_separator =
            inner.contains('-') && cells.iter().all(|c| SEPARATOR_CELL_RE.is_match(c));
        return if is_separator {
            LineKind::TableSeparator
        } else {
            LineKind::TableRow(cells)
        };
    }
    if let Some(caps) = HEADING_RE.captures(line) {
        let level = caps.get(1).map_or(1, |m| m.len());
        let text = caps.get(2).map_or("", |m| m.as_str());
        return LineKind::Heading(level, text);
    }
    if let Some(caps) = UNORDERED_RE.captures(line) {
        return LineKind::ListItem(ListKind::Unordered, caps.get(1).map_or("", |m| m.as_str()));
    }
    if let Some(caps) = ORDERED_RE.captures(line) {
        return LineKind::ListItem(ListKind::Ordered, caps.get(1).map_or("", |m| m.as_str()));
    }
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    LineKind::Paragraph(line)
}

fn escape(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// Applies emphasis, code, strikethrough and underline to already-escaped text.
fn format_inline(escaped: &str) -> String {
    let mut out = escaped.to_string();
    for (re, replacement) in INLINE_RULES.iter() {
        out = re.replace_all(&out, *replacement).into_owned();
    }
    out
}

struct Renderer {
    out: String,
    state: RenderState,
}

impl Renderer {
    fn new() -> Self {
        Self {
            out: String::new(),
            state: RenderState::Idle,
        }
    }

    fn close_open_block(&mut self) {
        match std::mem::replace(&mut self.state, RenderState::Idle) {
            RenderState::Idle => {}
            RenderState::List(kind) => self.out.push_str(kind.close_tag()),
            RenderState::Table(table) => self.out.push_str(&table.to_html()),
        }
    }

    /// Applies `edit` to the open table, opening one first if needed.
    fn with_table(&mut self, edit: impl FnOnce(&mut TableBuffer)) {
        if let RenderState::Table(table) = &mut self.state {
            edit(table);
            return;
        }
        self.close_open_block();
        let mut table = TableBuffer::default();
        edit(&mut table);
        self.state = RenderState::Table(table);
    }

    fn line(&mut self, raw_line: &str) {
        let escaped = escape(raw_line.trim_end_matches('\r'));
        match classify(&escaped) {
            LineKind::TableRow(cells) => self.with_table(|table| table.rows.push(cells)),
            LineKind::TableSeparator => self.with_table(|table| table.push_separator()),
            LineKind::ListItem(kind, text) => {
                if !matches!(self.state, RenderState::List(open) if open == kind) {
                    self.close_open_block();
                    self.out.push_str(kind.open_tag());
                    self.state = RenderState::List(kind);
                }
                self.out.push_str(&format!("<li>{}</li>", format_inline(text)));
            }
            LineKind::Rule => {
                self.close_open_block();
                self.out.push_str("<hr>");
            }
            LineKind::Heading(level, text) => {
                self.close_open_block();
                self.out
                    .push_str(&format!("<h{level}>{}</h{level}>", format_inline(text)));
            }
            LineKind::Blank => self.close_open_block(),
            LineKind::Paragraph(text) => {
                self.close_open_block();
                self.out.push_str(&format!("<p>{}</p>", format_inline(text)));
            }
        }
    }

    fn finish(mut self) -> String {
        self.close_open_block();
        self.out
    }
}

/// Renders `text` to a safe HTML fragment. `None` and empty input give an empty string.
pub fn render<'a>(text: impl Into<Option<&'a str>>) -> String {
    let text = match text.into() {
        Some(t) if !t.is_empty() => t,
        _ => return String::new(),
    };
    let mut renderer = Renderer::new();
    for line in text.split('\n') {
        renderer.line(line);
    }
    renderer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case("Hello world", "<p>Hello world</p>")]
    #[case("# Title", "<h1>Title</h1>")]
    #[case("#### Deep", "<h4>Deep</h4>")]
    #[case("##### Too deep", "<p>##### Too deep</p>")]
    #[case("---", "<hr>")]
    #[case("  -----  ", "<hr>")]
    #[case("**bold** and *it*", "<p><strong>bold</strong> and <em>it</em></p>")]
    #[case("`code` ~~gone~~ __under__", "<p><code>code</code> <del>gone</del> <u>under</u></p>")]
    #[case("Tom & \"Jerry\"", "<p>Tom &amp; &quot;Jerry&quot;</p>")]
    fn renders_single_lines(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(render(input), expected);
    }

    #[test]
    fn none_renders_empty() {
        assert_eq!(render(None), "");
    }

    #[test]
    fn script_tags_are_escaped() {
        let html = render("<script>alert(1)</script>\n- <b>x</b>\n# <i>h</i>");
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b>"));
        assert!(!html.contains("<i>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn groups_list_items_and_closes_on_paragraph() {
        let html = render("- one\n- two\nAfter");
        assert_eq!(html, "<ul><li>one</li><li>two</li></ul><p>After</p>");
    }

    #[test]
    fn switching_list_kind_opens_new_list() {
        let html = render("- a\n1. b\n2. c\n* d");
        assert_eq!(
            html,
            "<ul><li>a</li></ul><ol><li>b</li><li>c</li></ol><ul><li>d</li></ul>"
        );
    }

    #[test]
    fn blank_line_ends_list() {
        let html = render("1. a\n\n1. b");
        assert_eq!(html, "<ol><li>a</li></ol><ol><li>b</li></ol>");
    }

    #[test]
    fn table_with_header() {
        let html = render("| Wrong | Right |\n|---|:---:|\n| goed | went |\nDone");
        assert_eq!(
            html,
            "<div class=\"md-table-wrapper\"><table class=\"md-table\">\
             <thead><tr><th>Wrong</th><th>Right</th></tr></thead>\
             <tbody><tr><td>goed</td><td>went</td></tr></tbody></table></div>\
             <p>Done</p>"
        );
    }

    #[test]
    fn table_without_separator_has_no_head() {
        let html = render("| a | **b** |");
        assert_eq!(
            html,
            "<div class=\"md-table-wrapper\"><table class=\"md-table\">\
             <tbody><tr><td>a</td><td><strong>b</strong></td></tr></tbody></table></div>"
        );
    }

    #[test]
    fn list_then_table_closes_list() {
        let html = render("- item\n| x |");
        assert!(html.starts_with("<ul><li>item</li></ul><div"));
    }

    #[test]
    fn leading_separator_opens_headless_table() {
        assert_eq!(
            render("|---|\n| a |"),
            "<div class=\"md-table-wrapper\"><table class=\"md-table\">\
             <tbody><tr><td>a</td></tr></tbody></table></div>"
        );
    }

    #[test]
    fn rule_between_rows_starts_a_second_table() {
        let html = render("| a |\n---\n| b |");
        assert_eq!(html.matches("<table").count(), 2);
        assert!(html.contains("</table></div><hr><div"));
    }

    #[test]
    fn crlf_lines_are_handled() {
        assert_eq!(render("- a\r\n- b\r\n"), "<ul><li>a</li><li>b</li></ul>");
    }
}
