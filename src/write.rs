use chrono::Locale;
use gtmpl::{Template, Value};
use log::debug;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

use crate::config::Route;
use crate::document::Article;
use crate::listing::ListingState;
use crate::readtime::ReadTime;
use crate::richtext;
use crate::value::{article_value, escaped, option_url_value, summary_value, url_value};

/// Responsible for templating and writing the listing and article pages to
/// disk.
pub struct Writer<'a> {
    /// The template for article pages.
    pub posts_template: &'a Template,

    /// The template for listing pages.
    pub index_template: &'a Template,

    /// The base URL for listing pages. The first listing page is located at
    /// `{index_base_url}/index.html`, the one after it at
    /// `{index_base_url}/1.html`, and so on.
    pub index_base_url: &'a Url,

    /// The directory in which the listing HTML files will be written.
    pub index_output_directory: &'a Path,

    /// The URL at which the site's output root is served. Article URLs are
    /// resolved against it.
    pub site_root: &'a Url,

    /// The root output directory. Article files are written below it at the
    /// path given by `post_route`.
    pub root_output_directory: &'a Path,

    /// The route for article pages.
    pub post_route: &'a Route,

    /// The locale for dates.
    pub locale: Locale,

    /// The site's title, made available to both templates.
    pub site_title: &'a str,

    /// The URL for the site's home page. This is made available to both
    /// templates, typically as the destination for the site-header link.
    pub home_page: &'a Url,

    /// The URL for the static assets, typically for the theme's stylesheet.
    pub static_url: &'a Url,

    /// The URL of the Atom feed.
    pub atom_url: &'a Url,
}

impl Writer<'_> {
    /// Takes a single [`Page`], templates it, and writes it to disk.
    fn write_page(&self, page: &Page) -> Result<()> {
        let mut value = page.to_value();
        if let Value::Object(obj) = &mut value {
            obj.insert("site_title".to_owned(), Value::String(escaped(self.site_title)));
            obj.insert("home_page".to_owned(), url_value(self.home_page));
            obj.insert("static_url".to_owned(), url_value(self.static_url));
            obj.insert("atom_url".to_owned(), url_value(self.atom_url));
        }
        if let Some(dir) = page.file_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        debug!("writing {}", page.file_path.display());
        let context = gtmpl::Context::from(value).map_err(Error::Template)?;
        page.template
            .execute(&mut std::fs::File::create(&page.file_path)?, &context)?;
        Ok(())
    }

    /// The URL of an article page, e.g. `{site_root}/post/{uid}/`.
    pub fn post_url(&self, uid: &str) -> Result<Url> {
        Ok(self
            .site_root
            .join(&format!("{}/", self.post_route.resolve(uid)))?)
    }

    /// The output file of an article page, e.g.
    /// `{root_output_directory}/post/{uid}/index.html`.
    pub fn post_file_path(&self, uid: &str) -> PathBuf {
        self.root_output_directory
            .join(self.post_route.resolve(uid))
            .join("index.html")
    }

    /// Writes listing page `number`, which shows every post accumulated in
    /// `state`. The page only links to the next one if `state` can load more.
    pub fn write_listing_page(&self, number: usize, state: &ListingState) -> Result<()> {
        self.write_page(&self.listing_page(number, state)?)
    }

    fn listing_page(&self, number: usize, state: &ListingState) -> Result<Page> {
        let items = state
            .accumulated()
            .iter()
            .map(|post| Ok(summary_value(post, &self.post_url(&post.id)?, self.locale)))
            .collect::<Result<Vec<Value>>>()?;

        Ok(Page {
            item: Value::Array(items),
            file_path: self.index_output_directory.join(index_file_name(number)),
            next: match state.has_more() {
                false => None,
                true => Some(self.index_base_url.join(&index_file_name(number + 1))?),
            },
            template: self.index_template,
        })
    }

    /// Renders an article and writes it to its page.
    pub fn write_article(&self, article: &Article, read_time: ReadTime) -> Result<()> {
        let mut content = String::new();
        richtext::render_sections(&mut content, &article.content)?;
        self.write_page(&Page {
            item: article_value(article, content, read_time, self.locale),
            file_path: self.post_file_path(&article.uid),
            next: None,
            template: self.posts_template,
        })
    }
}

/// The file name of listing page `number`; the first page is the directory's
/// `index.html`.
fn index_file_name(number: usize) -> String {
    match number {
        0 => String::from("index.html"),
        _ => format!("{}.html", number),
    }
}

/// An object representing an output HTML file. A [`Page`] can be converted to a
/// [`Value`] and thus rendered in a template via [`Page::to_value`].
struct Page<'a> {
    /// The main item for the page.
    item: Value,

    /// The target location on disk for the output file.
    file_path: PathBuf,

    /// The URL for the next page, if any. For listing pages this is the "load
    /// more" link.
    next: Option<Url>,

    /// The template with which the page will be rendered.
    template: &'a Template,
}

impl Page<'_> {
    /// Converts a [`Page`] into a [`Value`]. The result is a [`Value::Object`]
    /// with fields `item` and `next` (see [`Page`] for descriptions).
    fn to_value(&self) -> Value {
        use std::collections::HashMap;

        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("item".to_owned(), self.item.clone());
        m.insert("next".to_owned(), option_url_value(self.next.as_ref()));
        Value::Object(m)
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// An error building a page URL.
    UrlParse(url::ParseError),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}
