//! Conversions from posts and articles into template [`Value`]s. Templates
//! don't escape anything, so every text field is HTML-escaped here.

use chrono::{DateTime, FixedOffset, Locale};
use gtmpl_value::Value;
use pulldown_cmark::escape::escape_html;
use std::collections::HashMap;
use url::Url;

use crate::document::{Article, PostSummary};
use crate::readtime::ReadTime;

/// The display format for publication dates, e.g. `15 mar 2021`.
pub const DATE_FORMAT: &str = "%d %b %Y";

pub fn escaped(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // writing into a `String` can't fail
    let _ = escape_html(&mut out, text);
    out
}

/// Formats a publication date for display. Unpublished documents have no
/// date and display as an empty string.
pub fn format_date(date: Option<&DateTime<FixedOffset>>, locale: Locale) -> String {
    match date {
        Some(date) => date.format_localized(DATE_FORMAT, locale).to_string(),
        None => String::new(),
    }
}

pub fn url_value(url: &Url) -> Value {
    Value::String(url.to_string())
}

pub fn option_url_value(url: Option<&Url>) -> Value {
    url.map_or(Value::Nil, url_value)
}

/// Converts a listing entry into a [`Value::Object`] with fields `id`, `url`,
/// `title`, `subtitle`, `author` and `date`.
pub fn summary_value(post: &PostSummary, url: &Url, locale: Locale) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("id".to_owned(), Value::String(escaped(&post.id)));
    m.insert("url".to_owned(), url_value(url));
    m.insert("title".to_owned(), Value::String(escaped(&post.title)));
    m.insert("subtitle".to_owned(), Value::String(escaped(&post.subtitle)));
    m.insert("author".to_owned(), Value::String(escaped(&post.author)));
    m.insert(
        "date".to_owned(),
        Value::String(format_date(post.published_at.as_ref(), locale)),
    );
    Value::Object(m)
}

/// Converts an article into a [`Value::Object`]. `content` is the article's
/// pre-rendered HTML and is passed through as is; `banner` is nil when the
/// article has no banner image.
pub fn article_value(
    article: &Article,
    content: String,
    read_time: ReadTime,
    locale: Locale,
) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("uid".to_owned(), Value::String(escaped(&article.uid)));
    m.insert("title".to_owned(), Value::String(escaped(&article.title)));
    m.insert("subtitle".to_owned(), Value::String(escaped(&article.subtitle)));
    m.insert("author".to_owned(), Value::String(escaped(&article.author)));
    m.insert(
        "date".to_owned(),
        Value::String(format_date(article.published_at.as_ref(), locale)),
    );
    m.insert(
        "banner".to_owned(),
        match &article.banner.url {
            Some(url) => Value::String(escaped(url)),
            None => Value::Nil,
        },
    );
    m.insert(
        "banner_alt".to_owned(),
        Value::String(escaped(article.banner.alt.as_deref().unwrap_or("banner"))),
    );
    m.insert("read_time".to_owned(), Value::String(read_time.to_string()));
    m.insert("content".to_owned(), Value::String(content));
    Value::Object(m)
}
