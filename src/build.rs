//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: paging through the post listing
//! ([`crate::listing`]), fetching and rendering every article
//! ([`crate::write`]), copying the theme's static directory into the output
//! directory, and generating the Atom feed.

use crate::cms::{ContentSource, Error as CmsError, PageFetcher, Query};
use crate::config::Config;
use crate::document::{Article, MissingFieldError};
use crate::feed::{Error as FeedError, *};
use crate::listing::ListingState;
use crate::readtime;
use crate::write::{Error as WriteError, *};
use gtmpl::Template;
use log::{info, warn};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The custom type of blog posts in the content repository.
pub const POST_TYPE: &str = "post";

/// The fields the listing needs from each post.
pub const LISTING_FIELDS: [&str; 3] = ["title", "subtitle", "author"];

/// Builds the site from a [`Config`] object, reading content from `source`.
pub fn build_site<S>(config: &Config, source: &S) -> Result<()>
where
    S: ContentSource + PageFetcher,
{
    let post_route = config.route(POST_TYPE).ok_or(Error::NoRoute(POST_TYPE))?;

    // Parse the template files.
    let index_template = parse_template(config.index_template.iter())?;
    let posts_template = parse_template(config.posts_template.iter())?;

    // Blow away the old output directories so we don't have any collisions.
    // The root output directory itself is left alone in case the user passes
    // the wrong directory.
    rmdir(&config.index_output_directory)?;
    rmdir(&config.static_output_directory)?;
    let posts_output_directory = config.root_output_directory.join(post_route.resolve(""));
    if posts_output_directory != config.root_output_directory {
        rmdir(&posts_output_directory)?;
    }

    let writer = Writer {
        posts_template: &posts_template,
        index_template: &index_template,
        index_base_url: &config.index_url,
        index_output_directory: &config.index_output_directory,
        site_root: &config.site_root,
        root_output_directory: &config.root_output_directory,
        post_route,
        locale: config.locale,
        site_title: &config.title,
        home_page: &config.home_page,
        static_url: &config.static_url,
        atom_url: &config.atom_url,
    };

    let listing = write_listing(&writer, config, source)?;
    write_articles(&writer, source)?;

    // copy static directory
    if config.static_source_directory.is_dir() {
        copy_dir(
            &config.static_source_directory,
            &config.static_output_directory,
        )?;
    }

    // copy /pages/index.html to /index.html
    let _ = std::fs::copy(
        &config.index_output_directory.join("index.html"),
        &config.root_output_directory.join("index.html"),
    )?;

    // create the atom feed
    let posts = listing
        .accumulated()
        .iter()
        .map(|post| Ok((writer.post_url(&post.id)?, post)))
        .collect::<Result<Vec<(Url, _)>>>()?;
    write_feed(
        FeedConfig {
            title: config.title.clone(),
            id: config.home_page.to_string(),
            author: config.author.clone(),
            home_page: config.home_page.clone(),
            atom_url: config.atom_url.clone(),
        },
        &posts,
        File::create(config.root_output_directory.join("feed.atom"))?,
    )?;

    Ok(())
}

/// Seeds the listing with the first page of posts and loads more until the
/// source runs out, writing one listing page per step. Returns the final
/// state.
fn write_listing<S>(writer: &Writer, config: &Config, source: &S) -> Result<ListingState>
where
    S: ContentSource + PageFetcher,
{
    info!("fetching the first {} posts", config.page_size);
    let query = Query {
        fetch: LISTING_FIELDS.iter().map(|f| f.to_string()).collect(),
        page_size: config.page_size,
    };
    let mut listing = ListingState::initialize(source.get_by_type(POST_TYPE, &query)?);
    let mut number = 0;
    loop {
        writer.write_listing_page(number, &listing)?;
        if !listing.has_more() {
            break;
        }
        listing = listing.load_more(source)?;
        number += 1;
    }
    info!(
        "wrote {} listing pages with {} posts",
        number + 1,
        listing.accumulated().len()
    );
    Ok(listing)
}

/// Enumerates every post, fetches each one by uid and writes its page.
fn write_articles<S: ContentSource>(writer: &Writer, source: &S) -> Result<()> {
    let documents = source.get_all_by_type(POST_TYPE)?;
    info!("rendering {} articles", documents.len());
    for document in &documents {
        let uid = document.uid()?;
        let article = Article::from_document(source.get_by_uid(POST_TYPE, uid)?)?;
        let read_time = readtime::estimate(&article.body());
        if read_time.minutes() == 0 {
            warn!("article `{}` has no text", article.uid);
        }
        writer.write_article(&article, read_time)?;
    }
    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    use walkdir::WalkDir;
    for result in WalkDir::new(src) {
        let entry = result?;
        let target = match entry.path().strip_prefix(src) {
            Ok(relative) => dst.join(relative),
            Err(_) => continue,
        };
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

// Concatenates the template files and parses the result into one template, so
// a file may use `define`s from the files listed before it.
fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        let template_file = template_file.as_ref();
        File::open(&template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push(' ');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during fetching content,
/// writing, cleaning output directories, parsing template files, and other
/// I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned when the content repository can't be read.
    Cms(CmsError),

    /// Returned when no route is configured for a content type.
    NoRoute(&'static str),

    /// Returned for errors writing pages to disk as HTML files.
    Write(WriteError),

    /// Returned for I/O problems while cleaning output directories.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned for errors writing the feed.
    Feed(FeedError),

    /// Returned for errors walking the static directory.
    WalkDir(walkdir::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Cms(err) => err.fmt(f),
            Error::NoRoute(kind) => write!(f, "No route configured for type `{}`", kind),
            Error::Write(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => err.fmt(f),
            Error::Feed(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Cms(err) => Some(err),
            Error::NoRoute(_) => None,
            Error::Write(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Feed(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<CmsError> for Error {
    /// Converts [`CmsError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: CmsError) -> Error {
        Error::Cms(err)
    }
}

impl From<MissingFieldError> for Error {
    fn from(err: MissingFieldError) -> Error {
        Error::Cms(CmsError::MalformedDocument(err))
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}
