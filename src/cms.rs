//! Access to the Prismic content repository. The rest of the crate only sees
//! the [`ContentSource`] and [`PageFetcher`] traits; [`Client`] implements
//! both over Prismic's REST API and tests substitute in-memory fakes.

use std::fmt;

use log::debug;
use serde::Deserialize;
use url::Url;

use crate::config::{Repository, Route};
use crate::document::{
    ArticleData, Document, MissingFieldError, PostPage, SearchResponse, SummaryData,
};

/// The largest page size the search endpoint accepts.
pub const MAX_PAGE_SIZE: usize = 100;

/// Parameters for [`ContentSource::get_by_type`].
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    /// The document fields to return (without the type prefix, e.g. `title`).
    /// An empty list returns every field.
    pub fetch: Vec<String>,

    pub page_size: usize,
}

/// Fetches the page of post summaries identified by a `next_page` token.
pub trait PageFetcher {
    fn fetch_page(&self, token: &str) -> Result<PostPage>;
}

impl<F> PageFetcher for F
where
    F: Fn(&str) -> Result<PostPage>,
{
    fn fetch_page(&self, token: &str) -> Result<PostPage> {
        self(token)
    }
}

/// Queries documents of a custom type (`kind`) from the content repository.
pub trait ContentSource {
    /// Returns the first page of documents of type `kind`, projected into
    /// post summaries.
    fn get_by_type(&self, kind: &str, query: &Query) -> Result<PostPage>;

    /// Returns the document of type `kind` whose uid is `uid`, or
    /// [`Error::NotFound`].
    fn get_by_uid(&self, kind: &str, uid: &str) -> Result<Document<ArticleData>>;

    /// Returns every document of type `kind`, following all pages.
    fn get_all_by_type(&self, kind: &str) -> Result<Vec<Document<ArticleData>>>;
}

/// A Prismic client bound to the master ref of a repository.
pub struct Client {
    http: reqwest::blocking::Client,
    endpoint: Url,
    master_ref: String,
    routes: String,
}

#[derive(Deserialize)]
struct ApiEntry {
    refs: Vec<ApiRef>,
}

#[derive(Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    id: String,

    #[serde(default, rename = "isMasterRef")]
    is_master_ref: bool,
}

#[derive(serde::Serialize)]
struct RouteParam<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    path: &'a str,
}

impl Client {
    /// Connects to `repository`, looking up its current master ref. Every
    /// query made through the client reads from that ref, so a build sees a
    /// consistent snapshot of the repository.
    pub fn connect(repository: &Repository, routes: &[Route]) -> Result<Client> {
        let http = reqwest::blocking::Client::new();
        let entry: ApiEntry = get_json(&http, repository.api_endpoint.as_str())?;
        let master_ref = entry
            .refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.id)
            .ok_or(Error::NoMasterRef)?;
        debug!("using master ref `{}` of {}", master_ref, repository.api_endpoint);
        Client::with_ref(http, repository.api_endpoint.clone(), master_ref, routes)
    }

    fn with_ref(
        http: reqwest::blocking::Client,
        endpoint: Url,
        master_ref: String,
        routes: &[Route],
    ) -> Result<Client> {
        let routes: Vec<RouteParam> = routes
            .iter()
            .map(|r| RouteParam {
                kind: &r.kind,
                path: &r.path,
            })
            .collect();
        Ok(Client {
            http,
            endpoint,
            master_ref,
            routes: serde_json::to_string(&routes)?,
        })
    }

    /// Builds the search URL for `predicate`. `fetch` fields are qualified
    /// with `kind` as the API expects (`post.title`).
    fn search_url(
        &self,
        kind: &str,
        predicate: &str,
        fetch: &[String],
        page_size: usize,
    ) -> Result<Url> {
        let mut url = self.endpoint.join("documents/search")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", &self.master_ref);
            pairs.append_pair("q", &format!("[{}]", predicate));
            pairs.append_pair("pageSize", &page_size.to_string());
            if !fetch.is_empty() {
                let fields: Vec<String> =
                    fetch.iter().map(|f| format!("{}.{}", kind, f)).collect();
                pairs.append_pair("fetch", &fields.join(","));
            }
            pairs.append_pair("routes", &self.routes);
        }
        Ok(url)
    }
}

impl PageFetcher for Client {
    fn fetch_page(&self, token: &str) -> Result<PostPage> {
        let response: SearchResponse<SummaryData> = get_json(&self.http, token)?;
        Ok(PostPage::from_response(response)?)
    }
}

impl ContentSource for Client {
    fn get_by_type(&self, kind: &str, query: &Query) -> Result<PostPage> {
        let url = self.search_url(kind, &type_predicate(kind), &query.fetch, query.page_size)?;
        self.fetch_page(url.as_str())
    }

    fn get_by_uid(&self, kind: &str, uid: &str) -> Result<Document<ArticleData>> {
        let url = self.search_url(kind, &uid_predicate(kind, uid), &[], 1)?;
        let response: SearchResponse<ArticleData> = get_json(&self.http, url.as_str())?;
        first_or_not_found(response, kind, uid)
    }

    fn get_all_by_type(&self, kind: &str) -> Result<Vec<Document<ArticleData>>> {
        let url = self.search_url(kind, &type_predicate(kind), &[], MAX_PAGE_SIZE)?;
        let mut documents = Vec::new();
        let mut next = Some(String::from(url));
        while let Some(page_url) = next {
            let response: SearchResponse<ArticleData> = get_json(&self.http, &page_url)?;
            documents.extend(response.results);
            next = response.next_page;
        }
        Ok(documents)
    }
}

fn type_predicate(kind: &str) -> String {
    format!("[at(document.type,{})]", quote(kind))
}

fn uid_predicate(kind: &str, uid: &str) -> String {
    format!("[at(my.{}.uid,{})]", kind, quote(uid))
}

// Predicate values are JSON-style string literals.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn first_or_not_found(
    response: SearchResponse<ArticleData>,
    kind: &str,
    uid: &str,
) -> Result<Document<ArticleData>> {
    response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| Error::NotFound {
            kind: kind.to_owned(),
            uid: uid.to_owned(),
        })
}

fn get_json<T: serde::de::DeserializeOwned>(
    http: &reqwest::blocking::Client,
    url: &str,
) -> Result<T> {
    debug!("GET {}", url);
    let body = http.get(url).send()?.error_for_status()?.text()?;
    Ok(serde_json::from_str(&body)?)
}

/// The result of a fallible CMS operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to fetch content. Everything but [`Error::NotFound`]
/// and [`Error::MalformedDocument`] is a transport or decoding problem.
#[derive(Debug)]
pub enum Error {
    /// Returned when a request fails or the API answers with a non-2xx status.
    Http(reqwest::Error),

    /// Returned when a response body is not the JSON we expect.
    Json(serde_json::Error),

    /// Returned when a request URL can't be built.
    UrlParse(url::ParseError),

    /// Returned when the API entry point lists no master ref.
    NoMasterRef,

    /// Returned when no document of type `kind` has the requested uid.
    NotFound { kind: String, uid: String },

    /// Returned when a document lacks a required field.
    MalformedDocument(MissingFieldError),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Http(err) => err.fmt(f),
            Error::Json(err) => write!(f, "decoding API response: {}", err),
            Error::UrlParse(err) => err.fmt(f),
            Error::NoMasterRef => write!(f, "API entry point has no master ref"),
            Error::NotFound { kind, uid } => {
                write!(f, "no `{}` document with uid `{}`", kind, uid)
            }
            Error::MalformedDocument(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::NoMasterRef => None,
            Error::NotFound { .. } => None,
            Error::MalformedDocument(err) => Some(err),
        }
    }
}

impl From<reqwest::Error> for Error {
    /// Converts a [`reqwest::Error`] into an [`Error`]. This allows us to use
    /// the `?` operator on requests.
    fn from(err: reqwest::Error) -> Error {
        Error::Http(err)
    }
}

impl From<serde_json::Error> for Error {
    /// Converts a [`serde_json::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator when decoding response bodies.
    fn from(err: serde_json::Error) -> Error {
        Error::Json(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<MissingFieldError> for Error {
    fn from(err: MissingFieldError) -> Error {
        Error::MalformedDocument(err)
    }
}
