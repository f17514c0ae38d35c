//! Defines the shapes of the documents returned by the Prismic API and their
//! projections into the types the rest of the crate works with: [`PostPage`]s
//! of [`PostSummary`]s for the listing, and [`Article`]s for post pages.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer};

use crate::readtime::{ArticleBody, Section};

/// The layout of Prismic's `first_publication_date` and friends, e.g.
/// `2021-03-15T19:25:28+0000`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// A single document as returned by the search endpoint. `D` is the shape of
/// the document's `data` field, which depends on the custom type.
#[derive(Clone, Debug, Deserialize)]
pub struct Document<D> {
    /// Prismic's internal document ID.
    pub id: String,

    /// The human-readable identifier used in routes. Required by every route,
    /// but nullable on the API side.
    #[serde(default)]
    pub uid: Option<String>,

    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub first_publication_date: Option<DateTime<FixedOffset>>,

    pub data: D,
}

impl<D> Document<D> {
    /// Returns the document's `uid` or a [`MissingFieldError`] if it has none.
    pub fn uid(&self) -> Result<&str, MissingFieldError> {
        self.uid.as_deref().ok_or_else(|| MissingFieldError {
            id: self.id.clone(),
            field: "uid",
        })
    }
}

/// The fields of a `post` document that the listing asks for.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SummaryData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// All of the fields of a `post` document.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ArticleData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub banner: Banner,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<ContentSection>,
}

/// An image field. Prismic returns `{}` for an empty image field, so every
/// member is optional.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Banner {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

/// One entry of the `content` group: a heading and a rich text body.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ContentSection {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: Vec<RichTextBlock>,
}

/// A block-level rich text element.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub spans: Vec<Span>,

    /// Set on `image` blocks only.
    #[serde(default)]
    pub url: Option<String>,

    /// Set on `image` blocks only.
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Preformatted,
    ListItem,
    OListItem,
    Image,
    #[serde(other)]
    Unsupported,
}

/// An inline annotation over `[start, end)` of a block's text. Offsets count
/// UTF-16 code units, as in the JavaScript strings Prismic produces.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,

    #[serde(rename = "type")]
    pub kind: SpanKind,

    #[serde(default)]
    pub data: Option<SpanData>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    #[serde(other)]
    Unsupported,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
}

/// The body of a search response. Only the results and the link to the next
/// page are of interest.
#[derive(Clone, Debug, Deserialize)]
pub struct SearchResponse<D> {
    #[serde(default = "Vec::new")]
    pub results: Vec<Document<D>>,

    #[serde(default)]
    pub next_page: Option<String>,
}

/// A post as it appears in the listing.
#[derive(Clone, Debug, PartialEq)]
pub struct PostSummary {
    pub id: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    /// Projects a document down to the fields shown in the listing. Fails if
    /// the document has no `uid`.
    pub fn from_document<D: Into<SummaryData>>(
        document: Document<D>,
    ) -> Result<PostSummary, MissingFieldError> {
        let id = document.uid()?.to_owned();
        let data: SummaryData = document.data.into();
        Ok(PostSummary {
            id,
            published_at: document.first_publication_date,
            title: data.title.unwrap_or_default(),
            subtitle: data.subtitle.unwrap_or_default(),
            author: data.author.unwrap_or_default(),
        })
    }
}

impl From<ArticleData> for SummaryData {
    fn from(data: ArticleData) -> SummaryData {
        SummaryData {
            title: data.title,
            subtitle: data.subtitle,
            author: data.author,
        }
    }
}

/// One page of post summaries. A `next_page_token` of `None` means there are
/// no more pages.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostPage {
    pub items: Vec<PostSummary>,
    pub next_page_token: Option<String>,
}

impl PostPage {
    /// Projects every result of a search response into a [`PostSummary`].
    pub fn from_response<D: Into<SummaryData>>(
        response: SearchResponse<D>,
    ) -> Result<PostPage, MissingFieldError> {
        Ok(PostPage {
            items: response
                .results
                .into_iter()
                .map(PostSummary::from_document)
                .collect::<Result<Vec<_>, _>>()?,
            next_page_token: response.next_page,
        })
    }
}

/// A fully-fetched post, ready to be rendered on its own page.
#[derive(Clone, Debug)]
pub struct Article {
    pub uid: String,
    pub published_at: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner: Banner,
    pub content: Vec<ContentSection>,
}

impl Article {
    pub fn from_document(
        document: Document<ArticleData>,
    ) -> Result<Article, MissingFieldError> {
        let uid = document.uid()?.to_owned();
        let data = document.data;
        Ok(Article {
            uid,
            published_at: document.first_publication_date,
            title: data.title.unwrap_or_default(),
            subtitle: data.subtitle.unwrap_or_default(),
            author: data.author.unwrap_or_default(),
            banner: data.banner,
            content: data.content,
        })
    }

    /// Extracts the countable text of the article for read-time estimation.
    pub fn body(&self) -> ArticleBody {
        ArticleBody(
            self.content
                .iter()
                .map(|section| Section {
                    heading: section.heading.clone(),
                    text_blocks: section
                        .body
                        .iter()
                        .filter_map(|block| block.text.clone())
                        .collect(),
                })
                .collect(),
        )
    }
}

fn deserialize_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) => DateTime::parse_from_str(&s, TIMESTAMP_FORMAT)
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid timestamp `{}`: {}", s, e))),
    }
}

// Prismic sends `null` for empty fields; `#[serde(default)]` only covers
// absent ones.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Returned when a document lacks a field the site can't do without.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingFieldError {
    /// Prismic's internal ID of the offending document.
    pub id: String,
    pub field: &'static str,
}

impl fmt::Display for MissingFieldError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "document `{}` has no `{}`", self.id, self.field)
    }
}

impl std::error::Error for MissingFieldError {}

#[cfg(test)]
mod test {
    use super::*;

    const LISTING_JSON: &str = r#"{
        "page": 1,
        "results_per_page": 2,
        "next_page": "https://spacetraveling.cdn.prismic.io/api/v2/documents/search?page=2",
        "results": [
            {
                "id": "YE-1",
                "uid": "como-utilizar-hooks",
                "type": "post",
                "first_publication_date": "2021-03-15T19:25:28+0000",
                "data": {
                    "title": "Como utilizar Hooks",
                    "subtitle": "Pensando em sincronização em vez de ciclos de vida",
                    "author": "Joseph Oliveira"
                }
            },
            {
                "id": "YE-2",
                "uid": "criando-um-app-cra-do-zero",
                "type": "post",
                "first_publication_date": null,
                "data": { "title": "Criando um app CRA do zero" }
            }
        ]
    }"#;

    #[test]
    fn test_post_page_from_response() -> Result<(), Box<dyn std::error::Error>> {
        let response: SearchResponse<SummaryData> = serde_json::from_str(LISTING_JSON)?;
        let page = PostPage::from_response(response)?;

        assert_eq!(
            Some("https://spacetraveling.cdn.prismic.io/api/v2/documents/search?page=2"),
            page.next_page_token.as_deref()
        );
        assert_eq!(2, page.items.len());

        let first = &page.items[0];
        assert_eq!("como-utilizar-hooks", first.id);
        assert_eq!("Joseph Oliveira", first.author);
        assert_eq!(
            Some(DateTime::parse_from_rfc3339("2021-03-15T19:25:28+00:00")?),
            first.published_at
        );

        let second = &page.items[1];
        assert_eq!("criando-um-app-cra-do-zero", second.id);
        assert_eq!(None, second.published_at);
        assert_eq!("", second.subtitle);
        assert_eq!("", second.author);
        Ok(())
    }

    #[test]
    fn test_terminal_page_has_no_token() -> Result<(), Box<dyn std::error::Error>> {
        let response: SearchResponse<SummaryData> =
            serde_json::from_str(r#"{"next_page": null, "results": []}"#)?;
        assert_eq!(PostPage::default(), PostPage::from_response(response)?);
        Ok(())
    }

    #[test]
    fn test_missing_uid_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
        let response: SearchResponse<SummaryData> = serde_json::from_str(
            r#"{"next_page": null, "results": [{"id": "YE-3", "uid": null, "data": {}}]}"#,
        )?;
        assert_eq!(
            Err(MissingFieldError {
                id: String::from("YE-3"),
                field: "uid"
            }),
            PostPage::from_response(response)
        );
        Ok(())
    }

    #[test]
    fn test_invalid_timestamp_is_rejected() {
        let result: Result<Document<SummaryData>, _> = serde_json::from_str(
            r#"{"id": "YE-4", "first_publication_date": "yesterday", "data": {}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_article_defaults_and_body() -> Result<(), Box<dyn std::error::Error>> {
        let document: Document<ArticleData> = serde_json::from_str(
            r#"{
                "id": "YE-5",
                "uid": "intro",
                "data": {
                    "title": "Intro",
                    "banner": {},
                    "content": [
                        {
                            "heading": "Intro",
                            "body": [
                                {"type": "paragraph", "text": "one two three", "spans": []},
                                {"type": "image", "url": "https://images.prismic.io/a.png"},
                                {"type": "embed", "oembed": {}}
                            ]
                        },
                        {"heading": null, "body": []}
                    ]
                }
            }"#,
        )?;
        let article = Article::from_document(document)?;

        assert_eq!("intro", article.uid);
        assert_eq!(Banner::default(), article.banner);
        assert_eq!(BlockKind::Unsupported, article.content[0].body[2].kind);
        assert_eq!(
            ArticleBody(vec![
                Section {
                    heading: Some(String::from("Intro")),
                    text_blocks: vec![String::from("one two three")],
                },
                Section::default(),
            ]),
            article.body()
        );
        Ok(())
    }

    #[test]
    fn test_null_fields_default_to_empty() -> Result<(), Box<dyn std::error::Error>> {
        let document: Document<ArticleData> = serde_json::from_str(
            r#"{
                "id": "YE-6",
                "uid": "draft",
                "data": {
                    "title": "Draft",
                    "banner": null,
                    "content": [
                        {"heading": "Intro", "body": null},
                        {"heading": null, "body": [{"type": "paragraph", "text": "hi", "spans": null}]}
                    ]
                }
            }"#,
        )?;
        let article = Article::from_document(document)?;

        assert_eq!(Banner::default(), article.banner);
        assert!(article.content[0].body.is_empty());
        assert!(article.content[1].body[0].spans.is_empty());

        let empty: Document<ArticleData> = serde_json::from_str(
            r#"{"id": "YE-7", "uid": "empty", "data": {"banner": null, "content": null}}"#,
        )?;
        assert!(Article::from_document(empty)?.content.is_empty());
        Ok(())
    }
}
