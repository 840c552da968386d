use crate::types::FeedInfo;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;

/// Inputs shorter than this are not worth a summarization call.
pub const MIN_SUMMARY_INPUT_CHARS: usize = 200;
pub const READING_WORDS_PER_MINUTE: usize = 200;
pub const HIGH_ACTIVITY_COMMENTS: u32 = 100;
pub const MAX_IMAGE_WIDTH: u32 = 400;

pub const DEFAULT_FAVICON: &str = "🍵";
pub const HACKER_NEWS_FAVICON: &str = "https://news.ycombinator.com/favicon.ico";
const HACKER_NEWS_HOST: &str = "news.ycombinator.com";
const INSTAPAPER_ICON: &str =
    "https://staticinstapaper.s3.dualstack.us-west-2.amazonaws.com/img/favicon.png";

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"))
}

fn comments_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)Comments URL:\s*(?:<a[^>]*href="([^"]+)"|(https?://\S+?)(?:<|\s|$))"#)
            .expect("static regex")
    })
}

fn comments_count_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)#?\s*Comments:\s*(\d+)").expect("static regex"))
}

/// Removes markup tags and collapses the remaining whitespace.
pub fn strip_html(html: &str) -> String {
    tag_regex()
        .replace_all(html, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a feed is a Hacker News style discussion feed.
pub fn is_discussion_feed(feed: &FeedInfo) -> bool {
    feed.link
        .as_deref()
        .map(|l| l.contains(HACKER_NEWS_HOST))
        .unwrap_or(false)
        || feed.title.contains("Hacker News")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentsInfo {
    pub link: Option<String>,
    pub count: u32,
}

impl CommentsInfo {
    pub fn marker(&self) -> &'static str {
        if self.count >= HIGH_ACTIVITY_COMMENTS {
            "🔥 "
        } else {
            "💬 "
        }
    }
}

/// Pulls the comments link and count out of a discussion item's description.
/// Anything missing falls back to no link and zero comments.
pub fn parse_comments_info(description: &str) -> CommentsInfo {
    let link = comments_url_regex().captures(description).and_then(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim().to_string())
    });
    let count = comments_count_regex()
        .captures(description)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);

    CommentsInfo { link, count }
}

/// `N min` at a fixed reading speed; `None` when it rounds down to zero.
pub fn reading_time(word_count: usize) -> Option<String> {
    let minutes = word_count / READING_WORDS_PER_MINUTE;
    (minutes > 0).then(|| format!("{} min", minutes))
}

/// Truncates to `limit` characters and drops inputs too short to summarize.
pub fn summary_input(text: &str, limit: usize) -> Option<String> {
    let truncated: String = text.chars().take(limit).collect();
    if truncated.chars().count() < MIN_SUMMARY_INPUT_CHARS {
        return None;
    }
    Some(truncated)
}

pub fn instapaper_link(link: &str) -> String {
    format!(
        "[<img height=\"16\" src=\"{}\">](https://www.instapaper.com/hello2?url={})",
        INSTAPAPER_ICON, link
    )
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

/// Scales `(width, height)` down to `max_width`, keeping the aspect ratio.
pub fn scale_to_width(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let ratio = width as f64 / height as f64;
    (max_width, (max_width as f64 / ratio) as u32)
}

/// Returns the first `<img>` tag found in `html`, resized when it declares both
/// dimensions. Empty when there is no image.
pub fn extract_image_tag(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let Ok(selector) = Selector::parse("img") else {
        return String::new();
    };
    let fragment = Html::parse_fragment(html);
    let Some(img) = fragment.select(&selector).next() else {
        return String::new();
    };

    let element = img.value();
    let dims = match (
        element.attr("width").and_then(|w| w.trim().parse::<u32>().ok()),
        element.attr("height").and_then(|h| h.trim().parse::<u32>().ok()),
    ) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Some(scale_to_width(w, h, MAX_IMAGE_WIDTH)),
        _ => None,
    };

    let mut tag = String::from("<img");
    for (name, value) in element.attrs() {
        let value = match (name, dims) {
            ("width", Some((w, _))) => w.to_string(),
            ("height", Some((_, h))) => h.to_string(),
            _ => value.to_string(),
        };
        tag.push_str(&format!(" {}=\"{}\"", name, escape_attr(&value)));
    }
    tag.push_str(" />");
    tag
}

/// Readable text of a page: article paragraphs, then any paragraphs, then the body.
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    for selector in ["article p", "p", "body"] {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        let text = document
            .select(&sel)
            .map(|el| el.text().collect::<Vec<_>>().join(" "))
            .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if !text.is_empty() {
            return text;
        }
    }
    String::new()
}
