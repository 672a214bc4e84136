//! WeChat Reading highlights parser
//!
//! The export is plain text. Blocks are separated by two consecutive empty
//! lines: the first block is book info (title line first, wrapped in `《》`),
//! every later block is one chapter. Lines starting with `◆ ` set the current
//! chapter title. Inside a chapter, single empty lines separate highlights.

use serde::{Deserialize, Serialize};

const CHAPTER_MARKER: &str = "◆ ";
const REVIEW_CHAPTER: &str = "◆  点评";

/// One highlight and the chapter it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeixinNote {
    pub chapter_title: String,
    pub content: String,
}

/// Parsed export of one book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeixinBook {
    pub book_name: String,
    /// Tag attached to every note, `#微信读书/<book name>`
    pub tag: String,
    pub notes: Vec<WeixinNote>,
}

impl WeixinNote {
    /// Text of the note as sent to the remote service
    pub fn render(&self, tag: &str) -> String {
        format!("{}\n\n章节: {}\n\n{}", self.content, self.chapter_title, tag)
    }
}

struct Chapter<'a> {
    title: &'a str,
    lines: Vec<&'a str>,
}

/// Parse a WeChat Reading export
pub fn parse_weixin_text(text: &str) -> WeixinBook {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let mut book_info: Vec<&str> = Vec::new();
    let mut chapters: Vec<Chapter<'_>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut title = "";

    for (index, line) in lines.iter().copied().enumerate() {
        if line.starts_with(CHAPTER_MARKER) {
            title = line;
        } else {
            current.push(line);
        }

        let previous_empty = index == 0 || lines[index - 1].is_empty();
        if line.is_empty() && previous_empty {
            let block = std::mem::take(&mut current);
            if book_info.is_empty() {
                book_info = block;
            } else {
                chapters.push(Chapter { title, lines: block });
            }
        }
    }

    // Exports normally end with a double blank line; keep a final unterminated block
    if current.iter().any(|line| !line.is_empty()) && !book_info.is_empty() {
        chapters.push(Chapter {
            title,
            lines: current,
        });
    }

    let book_name = book_info
        .first()
        .map(|line| line.replace(['《', '》'], ""))
        .unwrap_or_default();
    let tag = format!("#微信读书/{}", book_name);

    let mut notes = Vec::new();
    for chapter in chapters
        .iter()
        .filter(|chapter| !chapter.title.contains(REVIEW_CHAPTER))
    {
        let chapter_title = chapter
            .title
            .replacen(CHAPTER_MARKER, "", 1)
            .trim()
            .to_string();

        let mut highlight: Vec<String> = Vec::new();
        for line in chapter.lines.iter().chain(std::iter::once(&"")) {
            if line.is_empty() {
                if !highlight.is_empty() {
                    notes.push(WeixinNote {
                        chapter_title: chapter_title.clone(),
                        content: highlight.join("\n"),
                    });
                }
                highlight.clear();
            } else {
                highlight.push(line.replace(">>", ">"));
            }
        }
    }

    WeixinBook {
        book_name,
        tag,
        notes,
    }
}
