//! Flomo HTML export parser
//!
//! A Flomo export is one HTML page with a `.memo` element per note. Each memo
//! has a `.time` stamp, one or more `.content` bodies and an optional `.files`
//! block of `<img>` references relative to the page.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::warn;

static MEMO: Lazy<Selector> = Lazy::new(|| selector(".memo"));
static TIME: Lazy<Selector> = Lazy::new(|| selector(".time"));
static CONTENT: Lazy<Selector> = Lazy::new(|| selector(".content"));
static FILE_IMAGES: Lazy<Selector> = Lazy::new(|| selector(".files img"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#(\S*)").expect("tag pattern is valid"));

const TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// One memo from a Flomo export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlomoNote {
    /// Creation time exactly as printed in the export
    pub time: String,
    /// Body converted to Markdown
    pub content: String,
    /// Hashtags found in the body, without the leading `#`
    pub tags: Vec<String>,
    /// Attachment paths relative to the export page
    pub files: Vec<String>,
}

impl FlomoNote {
    /// Creation time, read as local time
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let time = self.time.trim();
        TIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(time, format).ok())
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
            .map(|local| local.with_timezone(&Utc))
    }
}

/// Parse every memo from an export page, newest first
///
/// Memos whose time cannot be read sort after all dated memos.
pub fn parse_flomo_html(html: &str) -> Vec<FlomoNote> {
    let document = Html::parse_document(html);

    let mut notes: Vec<FlomoNote> = document.select(&MEMO).map(parse_memo).collect();
    notes.sort_by_key(|note| std::cmp::Reverse(note.created_at()));
    notes
}

fn parse_memo(memo: ElementRef<'_>) -> FlomoNote {
    let time: String = memo
        .select(&TIME)
        .flat_map(|el| el.text())
        .collect::<String>()
        .trim()
        .to_string();

    let mut content = String::new();
    for body in memo.select(&CONTENT) {
        let text = body_to_markdown(body);
        if !content.is_empty() {
            content.push('\n');
        }
        content.push_str(&text);
    }

    let tags = TAG
        .captures_iter(&content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|tag| !tag.is_empty())
        .collect();

    let files = memo
        .select(&FILE_IMAGES)
        .filter_map(|img| img.value().attr("src"))
        .map(str::to_string)
        .collect();

    FlomoNote {
        time,
        content,
        tags,
        files,
    }
}

/// Convert one `.content` body to Markdown, falling back to its plain text
fn body_to_markdown(body: ElementRef<'_>) -> String {
    match htmd::convert(&body.inner_html()) {
        Ok(markdown) => markdown.trim().to_string(),
        Err(e) => {
            warn!("Markdown conversion failed, keeping plain text: {}", e);
            body.text().collect::<String>().trim().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"
    <html><body>
      <div class="memo">
        <div class="time">2024-01-01 10:00:00</div>
        <div class="content"><p>First #tag1</p></div>
        <div class="files"><img src="file/a.png" /></div>
      </div>
      <div class="memo">
        <div class="time">2024-01-02 10:00:00</div>
        <div class="content"><p>Second #tag2 #nested/tag</p></div>
        <div class="files"><img src="file/b.png" /><img src="file/c.png" /></div>
      </div>
    </body></html>"#;

    #[test]
    fn test_parse_sorts_newest_first() {
        let notes = parse_flomo_html(EXPORT);

        assert_eq!(notes.len(), 2);
        assert!(notes[0].content.contains("Second"));
        assert_eq!(notes[0].tags, vec!["tag2", "nested/tag"]);
        assert_eq!(notes[0].files, vec!["file/b.png", "file/c.png"]);
        assert_eq!(notes[1].tags, vec!["tag1"]);
        assert_eq!(notes[1].time, "2024-01-01 10:00:00");
    }

    #[test]
    fn test_multiple_content_blocks_joined_by_newline() {
        let html = r#"<div class="memo"><div class="time">2024-03-01 08:30:00</div>
            <div class="content"><p>one</p></div><div class="content"><p>two</p></div></div>"#;
        let notes = parse_flomo_html(html);
        assert_eq!(notes[0].content, "one\ntwo");
        assert!(notes[0].files.is_empty());
    }

    fn memo_with(body: &str) -> FlomoNote {
        let html = format!(
            r#"<div class="memo"><div class="time">2024-03-01 08:30:00</div>
            <div class="content">{}</div></div>"#,
            body
        );
        parse_flomo_html(&html).remove(0)
    }

    #[test]
    fn test_inline_formatting_becomes_markdown() {
        assert_eq!(
            memo_with("<p>a <strong>bold</strong> word</p>").content,
            "a **bold** word"
        );
        assert_eq!(
            memo_with(r#"<p>see <a href="https://x.dev">docs</a></p>"#).content,
            "see [docs](https://x.dev)"
        );
    }

    #[test]
    fn test_markdown_characters_in_text_are_escaped() {
        assert_eq!(
            memo_with("<p>*not bold* and _plain_</p>").content,
            r"\*not bold\* and \_plain\_"
        );
    }

    #[test]
    fn test_paragraphs_are_separated_by_blank_line() {
        assert_eq!(memo_with("<p>first</p><p>second</p>").content, "first\n\nsecond");
    }

    #[test]
    fn test_bare_hash_is_not_a_tag() {
        let html = r#"<div class="memo"><div class="time">2024-03-01 08:30:00</div>
            <div class="content"><p>price # 5</p></div></div>"#;
        assert!(parse_flomo_html(html)[0].tags.is_empty());
    }

    #[test]
    fn test_undated_memos_sort_last() {
        let html = r#"
            <div class="memo"><div class="time">yesterday</div><div class="content">x</div></div>
            <div class="memo"><div class="time">2024-03-01 08:30</div><div class="content">y</div></div>"#;
        let notes = parse_flomo_html(html);
        assert_eq!(notes[0].content, "y");
        assert!(notes[0].created_at().is_some());
        assert!(notes[1].created_at().is_none());
    }

    #[test]
    fn test_created_at_is_local_time() {
        let note = FlomoNote {
            time: "2024-01-02 10:00:00".to_string(),
            content: String::new(),
            tags: vec![],
            files: vec![],
        };
        let expected = Local
            .with_ymd_and_hms(2024, 1, 2, 10, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(note.created_at(), Some(expected));
    }
}
