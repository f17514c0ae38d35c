//! The paginated post listing. A [`ListingState`] starts from the first page
//! of posts and grows by one upstream page per [`ListingState::load_more`]
//! call, always appending in the order pages were requested.

use log::debug;

use crate::cms::{PageFetcher, Result};
use crate::document::{PostPage, PostSummary};

/// The posts shown so far and the token for the next page, if any.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListingState {
    accumulated: Vec<PostSummary>,
    cursor: Option<String>,
}

impl ListingState {
    /// Seeds a listing with the first page of posts.
    pub fn initialize(first_page: PostPage) -> ListingState {
        ListingState {
            accumulated: first_page.items,
            cursor: first_page.next_page_token,
        }
    }

    /// The posts in display order.
    pub fn accumulated(&self) -> &[PostSummary] {
        &self.accumulated
    }

    /// The token of the next page. `None` once the last page has been loaded.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Whether the "load more" action should be offered at all.
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    /// Fetches the page at the cursor and returns a new state with that
    /// page's posts appended. Posts are never deduplicated.
    ///
    /// When there is no cursor this is a no-op and `fetcher` isn't called. On
    /// failure the error is returned and `self` is left as it was; retrying
    /// is up to the caller. Since the new state is only available once the
    /// fetch has returned, pages can't be appended out of order.
    pub fn load_more<F: PageFetcher + ?Sized>(&self, fetcher: &F) -> Result<ListingState> {
        let cursor = match &self.cursor {
            Some(cursor) => cursor,
            None => return Ok(self.clone()),
        };

        let page = fetcher.fetch_page(cursor)?;
        debug!(
            "loaded {} more posts (next page: {:?})",
            page.items.len(),
            page.next_page_token
        );

        let mut accumulated = Vec::with_capacity(self.accumulated.len() + page.items.len());
        accumulated.extend_from_slice(&self.accumulated);
        accumulated.extend(page.items);
        Ok(ListingState {
            accumulated,
            cursor: page.next_page_token,
        })
    }
}
