//! Terminal output utilities: ANSI formatting, embed rendering, tables.

use patto_core::{Delivery, Embed, EmbedColor, ReplyPayload};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";

/// `NO_COLOR` wins; otherwise any non-dumb terminal gets ANSI styling.
pub fn supports_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::env::var_os("COLORTERM").is_some() || std::env::var("TERM").is_ok_and(|term| term != "dumb")
}

pub fn strip_ansi(s: &str) -> String {
    let mut plain = String::with_capacity(s.len());
    let mut in_escape = false;
    for c in s.chars() {
        match (in_escape, c) {
            (false, '\x1b') => in_escape = true,
            (false, c) => plain.push(c),
            (true, 'm') => in_escape = false,
            (true, _) => {}
        }
    }
    plain
}

fn paint(text: &str, style: &str, color: bool) -> String {
    if color {
        format!("{style}{text}{RESET}")
    } else {
        text.to_string()
    }
}

fn note(glyph: &str, label: &str, style: &str, msg: &str) -> String {
    if supports_color() {
        format!("{style}{BOLD}{glyph}{RESET} {msg}")
    } else {
        format!("{label}: {msg}")
    }
}

pub fn note_info(msg: &str) {
    println!("{}", note("ℹ", "INFO", CYAN, msg));
}

pub fn note_error(msg: &str) {
    eprintln!("{}", note("✗", "ERROR", RED, msg));
}

pub fn note_success(msg: &str) {
    println!("{}", note("✓", "OK", GREEN, msg));
}

// ---------------------------------------------------------------------------
// Reply rendering
// ---------------------------------------------------------------------------

fn embed_style(color: EmbedColor) -> &'static str {
    match color {
        EmbedColor::Error => RED,
        EmbedColor::Success => GREEN,
        EmbedColor::Warning => YELLOW,
        EmbedColor::Info => BLUE,
        EmbedColor::Notice => MAGENTA,
    }
}

/// Render an embed as an indented block with a colored side bar.
pub fn render_embed(embed: &Embed, color: bool) -> String {
    let bar = paint("┃", embed_style(embed.color), color);
    let mut lines = Vec::new();
    if let Some(title) = &embed.title {
        lines.push(format!("{bar} {}", paint(title, BOLD, color)));
    }
    if let Some(description) = &embed.description {
        lines.extend(description.lines().map(|l| format!("{bar} {l}")));
    }
    for field in &embed.fields {
        lines.push(format!("{bar} {}", paint(&field.name, BOLD, color)));
        lines.extend(field.value.lines().map(|l| format!("{bar}   {l}")));
    }
    if let Some(footer) = &embed.footer {
        lines.push(format!("{bar} {}", paint(footer, DIM, color)));
    }
    lines.join("\n")
}

/// Render a whole payload, tagged with how it was delivered.
pub fn render_payload(delivery: Delivery, payload: &ReplyPayload, color: bool) -> String {
    let tag = match (delivery, payload.ephemeral) {
        (_, true) => "[only you]",
        (Delivery::Reply, false) => "[reply]",
        (Delivery::Send, false) => "[message]",
    };
    let mut out = vec![paint(tag, DIM, color)];
    if let Some(content) = &payload.content {
        out.push(content.clone());
    }
    out.extend(payload.embeds.iter().map(|e| render_embed(e, color)));
    for custom_id in &payload.components {
        out.push(paint(&format!("[component {custom_id}]"), CYAN, color));
    }
    out.join("\n")
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

pub enum Align {
    Left,
    Right,
}

pub struct Column {
    pub header: String,
    pub align: Align,
}

impl Column {
    pub fn left(header: impl Into<String>) -> Self {
        Self { header: header.into(), align: Align::Left }
    }

    pub fn right(header: impl Into<String>) -> Self {
        Self { header: header.into(), align: Align::Right }
    }
}

fn visible_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

/// Two-space indented table with a dashed rule under the header.
/// Cells beyond the column count are dropped, missing cells render empty.
pub fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| visible_width(cell))
                .fold(visible_width(&column.header), usize::max)
        })
        .collect();

    let row_line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(columns.iter().zip(&widths))
            .map(|(cell, (column, width))| {
                let pad = " ".repeat(width.saturating_sub(visible_width(cell)));
                match column.align {
                    Align::Left => format!("{cell}{pad}"),
                    Align::Right => format!("{pad}{cell}"),
                }
            })
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    let mut out = row_line(columns.iter().map(|c| c.header.as_str()).collect());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}\n", rule.join("  ")));
    for row in rows {
        out.push_str(&row_line(
            (0..columns.len()).map(|i| row.get(i).map_or("", String::as_str)).collect(),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ansi() {
        let colored = format!("{GREEN}hello{RESET}");
        assert_eq!(strip_ansi(&colored), "hello");
    }

    #[test]
    fn renders_embed_plain() {
        let embed = Embed::new(EmbedColor::Info)
            .title("Help")
            .description("line one\nline two")
            .field("Usage", "`!ping`", false)
            .footer("footer");
        let text = render_embed(&embed, false);
        assert_eq!(
            text,
            "┃ Help\n┃ line one\n┃ line two\n┃ Usage\n┃   `!ping`\n┃ footer"
        );
    }

    #[test]
    fn tags_ephemeral_payloads() {
        let payload = ReplyPayload::text("hidden").ephemeral();
        assert!(render_payload(Delivery::Reply, &payload, false).starts_with("[only you]"));
        let payload = ReplyPayload::text("hi").with_component("btn_1234567890");
        let text = render_payload(Delivery::Send, &payload, false);
        assert!(text.starts_with("[message]"));
        assert!(text.contains("[component btn_1234567890]"));
    }

    #[test]
    fn renders_table() {
        let cols = vec![Column::left("Name"), Column::right("Count")];
        let rows = vec![
            vec!["Alice".to_string(), "42".to_string()],
            vec!["Bob".to_string(), "7".to_string()],
        ];
        let table = render_table(&cols, &rows);
        assert!(table.contains("Alice     42"));
        assert!(table.contains("Bob        7"));
        assert!(table.starts_with("  Name   Count\n  -----  -----\n"));
    }
}
