//! Support for creating Atom feeds from the post listing.

use crate::config::Author;
use crate::document::PostSummary;
use atom_syndication::{Entry, Error as AtomError, Feed, Link, Person, Text};
use chrono::{DateTime, FixedOffset, Utc};
use std::fmt;
use std::io::Write;
use url::Url;

/// Bundled configuration for creating a feed.
pub struct FeedConfig {
    pub title: String,
    pub id: String,
    pub author: Option<Author>,
    pub home_page: Url,
    pub atom_url: Url,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and a list of posts
/// paired with their page URLs, and writes the result to a
/// [`std::io::Write`]. This function takes ownership of the provided
/// [`FeedConfig`].
pub fn write_feed<W: Write>(config: FeedConfig, posts: &[(Url, &PostSummary)], w: W) -> Result<()> {
    feed(config, posts).write_to(w)?;
    Ok(())
}

type FixedDateTime = DateTime<FixedOffset>;

fn feed(config: FeedConfig, posts: &[(Url, &PostSummary)]) -> Feed {
    // The feed was last updated when its most recent post was published.
    let updated: FixedDateTime = posts
        .iter()
        .filter_map(|(_, post)| post.published_at)
        .max()
        .unwrap_or_else(|| Utc::now().into());

    let FeedConfig {
        title,
        id,
        author,
        home_page,
        atom_url,
    } = config;

    let mut feed = Feed::default();
    feed.set_title(Text::plain(title));
    feed.set_id(id);
    feed.set_updated(updated);
    feed.set_authors(author_to_people(author.as_ref()));
    feed.set_links(vec![link(&home_page, "alternate"), link(&atom_url, "self")]);
    feed.set_entries(
        posts
            .iter()
            .map(|(url, post)| entry(url, post, updated, author.as_ref()))
            .collect::<Vec<Entry>>(),
    );
    feed
}

fn entry(url: &Url, post: &PostSummary, fallback: FixedDateTime, author: Option<&Author>) -> Entry {
    let mut entry = Entry::default();
    entry.set_id(url.to_string());
    entry.set_title(Text::plain(post.title.clone()));
    entry.set_updated(post.published_at.unwrap_or(fallback));
    entry.set_published(post.published_at);
    entry.set_links(vec![link(url, "alternate")]);
    if !post.subtitle.is_empty() {
        entry.set_summary(Some(Text::plain(post.subtitle.clone())));
    }
    // Posts name their own author; the site author is only a fallback.
    if !post.author.is_empty() {
        let mut person = Person::default();
        person.set_name(post.author.clone());
        entry.set_authors(vec![person]);
    } else {
        entry.set_authors(author_to_people(author));
    }
    entry
}

fn link(url: &Url, rel: &str) -> Link {
    let mut link = Link::default();
    link.set_href(url.to_string());
    link.set_rel(rel);
    link
}

fn author_to_people(author: Option<&Author>) -> Vec<Person> {
    match author {
        Some(author) => {
            let mut person = Person::default();
            person.set_name(author.name.clone());
            person.set_email(author.email.clone());
            vec![person]
        }
        None => Vec::new(),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is an Atom-related error, including I/O errors
    /// while writing the feed.
    Atom(AtomError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Atom(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Atom(err) => Some(err),
        }
    }
}

impl From<AtomError> for Error {
    /// Converts [`AtomError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn post(id: &str, published_at: Option<&str>, author: &str) -> PostSummary {
        PostSummary {
            id: id.to_owned(),
            published_at: published_at.map(|d| DateTime::parse_from_rfc3339(d).unwrap()),
            title: format!("Title {}", id),
            subtitle: String::from("Pensando em sincronização"),
            author: author.to_owned(),
        }
    }

    fn config() -> FeedConfig {
        FeedConfig {
            title: String::from("spacetraveling"),
            id: String::from("https://example.org/"),
            author: Some(Author {
                name: String::from("Site Author"),
                email: None,
            }),
            home_page: Url::parse("https://example.org/").unwrap(),
            atom_url: Url::parse("https://example.org/feed.atom").unwrap(),
        }
    }

    #[test]
    fn test_feed_entries() {
        let older = post("a", Some("2021-03-15T19:25:28+00:00"), "Joseph Oliveira");
        let newer = post("b", Some("2021-03-25T19:27:35+00:00"), "");
        let unpublished = post("c", None, "Danilo Vieira");
        let posts = vec![
            (Url::parse("https://example.org/post/a/").unwrap(), &older),
            (Url::parse("https://example.org/post/b/").unwrap(), &newer),
            (Url::parse("https://example.org/post/c/").unwrap(), &unpublished),
        ];

        let feed = feed(config(), &posts);

        assert_eq!("https://example.org/", feed.id());
        assert_eq!("Site Author", feed.authors()[0].name());
        assert_eq!(newer.published_at, Some(*feed.updated()));
        assert_eq!(3, feed.entries().len());

        let first = &feed.entries()[0];
        assert_eq!("https://example.org/post/a/", first.id());
        assert_eq!("Joseph Oliveira", first.authors()[0].name());

        let second = &feed.entries()[1];
        assert_eq!("Site Author", second.authors()[0].name());

        let third = &feed.entries()[2];
        assert_eq!(None, third.published());
        assert_eq!(feed.updated(), third.updated());
    }

    #[test]
    fn test_write_feed() {
        let p = post("a", Some("2021-03-15T19:25:28+00:00"), "Joseph Oliveira");
        let posts = vec![(Url::parse("https://example.org/post/a/").unwrap(), &p)];
        let mut out = Vec::new();
        write_feed(config(), &posts, &mut out).unwrap();
        let xml = String::from_utf8(out).unwrap();
        assert!(xml.contains("Title a"));
        assert!(xml.contains(r#"href="https://example.org/feed.atom""#));
    }
}
