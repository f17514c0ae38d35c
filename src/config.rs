//! Loads the project configuration. A project is a directory containing a
//! `spacetraveling.yaml` file and a `theme` directory with a `theme.yaml`
//! file. The resulting [`Config`] is built once at startup and handed by
//! reference to everything that needs it.

use chrono::Locale;
use serde::Deserialize;
use std::convert::TryFrom;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "spacetraveling.yaml";

fn default_page_size() -> usize {
    1
}

fn default_locale() -> String {
    String::from("pt_BR")
}

fn default_routes() -> Vec<Route> {
    vec![Route {
        kind: String::from("post"),
        path: String::from("/post/:uid"),
    }]
}

#[derive(Deserialize)]
struct Project {
    pub repository_name: String,

    #[serde(default)]
    pub api_endpoint: Option<Url>,

    pub site_root: Url,

    pub title: String,

    #[serde(default)]
    pub author: Option<Author>,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default = "default_routes")]
    pub routes: Vec<Route>,
}

#[derive(Deserialize)]
struct Theme {
    index_template: Vec<PathBuf>,
    posts_template: Vec<PathBuf>,
}

/// The author of the site, credited in the Atom feed.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Author {
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,
}

/// A route resolution rule: documents of type `kind` live at `path`, where
/// `:uid` is replaced with the document's uid (e.g. `/post/:uid`).
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Route {
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
}

impl Route {
    /// Substitutes `uid` into the route's path and returns it without the
    /// leading or trailing slashes, ready to be joined onto the site root.
    pub fn resolve(&self, uid: &str) -> String {
        self.path.replace(":uid", uid).trim_matches('/').to_owned()
    }
}

/// The content repository to read from.
#[derive(Clone, Debug, PartialEq)]
pub struct Repository {
    pub name: String,

    /// The REST API root, always ending in a slash.
    pub api_endpoint: Url,
}

impl Repository {
    /// Uses the CDN endpoint for `name` unless `api_endpoint` is given.
    pub fn new(name: &str, api_endpoint: Option<Url>) -> Result<Repository> {
        let api_endpoint = match api_endpoint {
            Some(url) => url,
            None => Url::parse(&format!("https://{}.cdn.prismic.io/api/v2/", name))?,
        };
        Ok(Repository {
            name: name.to_owned(),
            api_endpoint: with_trailing_slash(api_endpoint),
        })
    }
}

pub struct Config {
    pub repository: Repository,
    pub routes: Vec<Route>,
    pub title: String,
    pub author: Option<Author>,
    pub locale: Locale,
    pub page_size: usize,
    pub home_page: Url,
    pub site_root: Url,
    pub index_url: Url,
    pub static_url: Url,
    pub atom_url: Url,
    pub index_template: Vec<PathBuf>,
    pub posts_template: Vec<PathBuf>,
    pub root_output_directory: PathBuf,
    pub index_output_directory: PathBuf,
    pub static_source_directory: PathBuf,
    pub static_output_directory: PathBuf,
}

impl Config {
    /// Searches `dir` and its ancestors for a project file and loads it.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(Error::ProjectFileNotFound),
            }
        }
    }

    /// Loads the project file at `path` and the theme next to it.
    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let project: Project = serde_yaml::from_str(&read(path)?)?;
        let project_root = path
            .parent()
            .ok_or_else(|| Error::NoParentDirectory(path.to_owned()))?;
        let theme_dir = project_root.join("theme");
        let theme: Theme = serde_yaml::from_str(&read(&theme_dir.join("theme.yaml"))?)?;
        Config::new(project, theme, &theme_dir, output_directory)
    }

    fn new(
        project: Project,
        theme: Theme,
        theme_dir: &Path,
        output_directory: &Path,
    ) -> Result<Config> {
        if project.page_size == 0 {
            return Err(Error::InvalidPageSize);
        }
        // Without `:uid` every document lands on the same page.
        if let Some(route) = project.routes.iter().find(|r| !r.path.contains(":uid")) {
            return Err(Error::RouteWithoutUid(route.clone()));
        }
        let locale = Locale::try_from(project.locale.as_str())
            .map_err(|_| Error::UnknownLocale(project.locale.clone()))?;
        let site_root = with_trailing_slash(project.site_root);

        Ok(Config {
            repository: Repository::new(&project.repository_name, project.api_endpoint)?,
            routes: project.routes,
            title: project.title,
            author: project.author,
            locale,
            page_size: project.page_size,
            home_page: site_root.clone(),
            index_url: site_root.join("pages/")?,
            static_url: site_root.join("static/")?,
            atom_url: site_root.join("feed.atom")?,
            site_root,
            index_template: theme
                .index_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            posts_template: theme
                .posts_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            root_output_directory: output_directory.to_owned(),
            index_output_directory: output_directory.join("pages"),
            static_source_directory: theme_dir.join("static"),
            static_output_directory: output_directory.join("static"),
        })
    }

    /// Returns the route for documents of type `kind`, if any. The first
    /// matching rule wins.
    pub fn route(&self, kind: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.kind == kind)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn read(path: &Path) -> Result<String> {
    let mut contents = String::new();
    File::open(path)
        .and_then(|mut file| file.read_to_string(&mut contents))
        .map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
    Ok(contents)
}

/// The result of loading configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the project configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no ancestor directory holds a project file.
    ProjectFileNotFound,

    /// Returned when the project file path has no parent directory.
    NoParentDirectory(PathBuf),

    /// Returned when a project or theme file can't be read.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when a project or theme file isn't valid YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when a configured URL is invalid.
    UrlParse(url::ParseError),

    /// Returned when `locale` isn't a known locale name.
    UnknownLocale(String),

    /// Returned when `page_size` is zero.
    InvalidPageSize,

    /// Returned when a route's path has no `:uid` placeholder.
    RouteWithoutUid(Route),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ProjectFileNotFound => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::NoParentDirectory(path) => write!(
                f,
                "Can't get parent directory for project file '{}'",
                path.display()
            ),
            Error::Open { path, err } => {
                write!(f, "Opening '{}': {}", path.display(), err)
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::UnknownLocale(locale) => write!(f, "Unknown locale `{}`", locale),
            Error::InvalidPageSize => write!(f, "`page_size` must be at least 1"),
            Error::RouteWithoutUid(route) => write!(
                f,
                "Route `{}` for type `{}` has no `:uid` placeholder",
                route.path, route.kind
            ),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { err, .. } => Some(err),
            Error::DeserializeYaml(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn config(project_yaml: &str) -> Result<Config> {
        let project: Project = serde_yaml::from_str(project_yaml)?;
        let theme: Theme = serde_yaml::from_str(
            "index_template: [header.html, index.html]\nposts_template: [header.html, post.html]\n",
        )?;
        Config::new(project, theme, Path::new("/project/theme"), Path::new("/out"))
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let config = config(
            "repository_name: spacetraveling\nsite_root: https://example.org/blog\ntitle: spacetraveling\n",
        )?;

        assert_eq!(
            "https://spacetraveling.cdn.prismic.io/api/v2/",
            config.repository.api_endpoint.as_str()
        );
        assert_eq!(1, config.page_size);
        assert_eq!(Locale::pt_BR, config.locale);
        assert_eq!(default_routes(), config.routes);
        assert_eq!("https://example.org/blog/", config.home_page.as_str());
        assert_eq!("https://example.org/blog/pages/", config.index_url.as_str());
        assert_eq!("https://example.org/blog/feed.atom", config.atom_url.as_str());
        assert_eq!(
            vec![
                PathBuf::from("/project/theme/header.html"),
                PathBuf::from("/project/theme/index.html")
            ],
            config.index_template
        );
        assert_eq!(PathBuf::from("/out/pages"), config.index_output_directory);
        Ok(())
    }

    #[test]
    fn test_explicit_values() -> Result<()> {
        let config = config(
            r#"
repository_name: spacetraveling
api_endpoint: http://localhost:8080/api/v2
site_root: https://example.org/
title: spacetraveling
author:
  name: Joseph Oliveira
page_size: 5
locale: en_US
routes:
  - type: post
    path: /articles/:uid
  - type: post
    path: /ignored/:uid
"#,
        )?;

        assert_eq!(
            "http://localhost:8080/api/v2/",
            config.repository.api_endpoint.as_str()
        );
        assert_eq!(5, config.page_size);
        assert_eq!(Locale::en_US, config.locale);
        assert_eq!(
            Some(Author {
                name: String::from("Joseph Oliveira"),
                email: None,
            }),
            config.author
        );
        let route = config.route("post").expect("post route");
        assert_eq!("articles/hooks", route.resolve("hooks"));
        assert!(config.route("page").is_none());
        Ok(())
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let result = config(
            "repository_name: r\nsite_root: https://example.org/\ntitle: t\npage_size: 0\n",
        );
        assert!(matches!(result, Err(Error::InvalidPageSize)));
    }

    #[test]
    fn test_unknown_locale_is_rejected() {
        let result = config(
            "repository_name: r\nsite_root: https://example.org/\ntitle: t\nlocale: xx_XX\n",
        );
        assert!(matches!(result, Err(Error::UnknownLocale(_))));
    }

    #[test]
    fn test_route_without_uid_is_rejected() {
        let result = config(
            "repository_name: r\nsite_root: https://example.org/\ntitle: t\nroutes:\n  - type: post\n    path: /\n",
        );
        match result {
            Err(Error::RouteWithoutUid(route)) => assert_eq!("/", route.path),
            Err(err) => panic!("unexpected error: {}", err),
            Ok(_) => panic!("route without `:uid` was accepted"),
        }
    }

    #[test]
    fn test_resolve_trims_slashes() {
        let route = Route {
            kind: String::from("post"),
            path: String::from("/post/:uid/"),
        };
        assert_eq!("post/hooks", route.resolve("hooks"));
        assert_eq!("post", route.resolve(""));
    }
}
