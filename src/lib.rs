//! The library code for the `spacetraveling` static blog generator. Content
//! lives in a Prismic repository; the generator pulls it through the
//! [`crate::cms`] traits and writes plain HTML files. The architecture can be
//! broken down into three steps:
//!
//! 1. Paging through the post listing ([`crate::listing`]). The listing starts
//!    from the first page of post summaries and grows by one upstream page
//!    per "load more" step. Every step becomes a listing page whose "load
//!    more" link points at the next one, until the repository runs out.
//! 2. Rendering articles. Every post is fetched by uid, its read time is
//!    estimated ([`crate::readtime`]) and its rich text content is rendered
//!    ([`crate::richtext`]).
//! 3. Writing everything to disk through the theme's templates
//!    ([`crate::write`]), along with the theme's static assets and an Atom
//!    feed ([`crate::feed`]).
//!
//! [`crate::build::build_site`] ties the steps together.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod cms;
pub mod config;
pub mod document;
pub mod feed;
pub mod listing;
pub mod readtime;
pub mod richtext;
pub mod value;
pub mod write;
