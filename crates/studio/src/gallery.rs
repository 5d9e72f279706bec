//! Offset-paginated gallery.
//!
//! Page 0 replaces the accumulated items (the refresh path); any later
//! page appends to them without deduplication. `has_more` is recomputed on
//! every fetch as "the page came back full". A failed fetch leaves items
//! and page index untouched.

use std::sync::Arc;

use dreamcanvas_client::ImageApi;
use dreamcanvas_core::image::Image;
use dreamcanvas_core::pagination::{has_more, next_index, previous_index, PageWindow};
use serde::Serialize;
use tokio::sync::watch;

use crate::error::StudioError;
use crate::notify::{Notification, Notifier};
use crate::sequence::RequestSequence;

const FETCH_FALLBACK: &str = "Failed to fetch images";

/// Snapshot published by [`GalleryPager`].
///
/// The presentation layer tells a first load from an incremental one by
/// looking at `loading` together with `page_index`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryState {
    pub page_index: u32,
    pub items: Vec<Image>,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for GalleryState {
    fn default() -> Self {
        Self {
            page_index: 0,
            items: Vec::new(),
            has_more: true,
            loading: false,
            error: None,
        }
    }
}

pub struct GalleryPager {
    api: Arc<dyn ImageApi>,
    notifier: Arc<dyn Notifier>,
    page_size: u32,
    state: watch::Sender<GalleryState>,
    seq: RequestSequence,
}

impl GalleryPager {
    pub fn new(api: Arc<dyn ImageApi>, notifier: Arc<dyn Notifier>, page_size: u32) -> Self {
        Self {
            api,
            notifier,
            page_size: page_size.max(1),
            state: watch::Sender::new(GalleryState::default()),
            seq: RequestSequence::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<GalleryState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> GalleryState {
        self.state.borrow().clone()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetch one page and fold it into the accumulated items.
    ///
    /// If a newer fetch was issued while this one was in flight, the
    /// response is discarded and [`StudioError::Superseded`] returned.
    pub async fn fetch_page(&self, page_index: u32) -> Result<Vec<Image>, StudioError> {
        let window = PageWindow::for_page(page_index, self.page_size);
        let token = self.seq.issue();
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
        tracing::debug!(page_index, limit = window.limit, offset = window.offset, "Fetching gallery page");

        let result = self.api.list_images(window).await;

        if !self.seq.is_latest(token) {
            tracing::debug!(page_index, "Discarding superseded gallery page");
            return Err(StudioError::Superseded);
        }

        match result {
            Ok(fetched) => {
                let more = has_more(fetched.len(), self.page_size);
                tracing::info!(page_index, count = fetched.len(), has_more = more, "Gallery page loaded");
                self.state.send_modify(|s| {
                    if page_index == 0 {
                        s.items = fetched.clone();
                    } else {
                        s.items.extend(fetched.iter().cloned());
                    }
                    s.page_index = page_index;
                    s.has_more = more;
                    s.loading = false;
                });
                Ok(fetched)
            }
            Err(e) => {
                let message = e.display_message(FETCH_FALLBACK);
                tracing::error!(page_index, error = %e, "Failed to fetch gallery page");
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(message.clone());
                });
                self.notifier.notify(Notification::error("Error", message.clone()));
                Err(StudioError::Fetch(message))
            }
        }
    }

    /// Reload from page 0, replacing all items and resetting `has_more`.
    pub async fn refresh(&self) -> Result<Vec<Image>, StudioError> {
        self.fetch_page(0).await
    }

    /// Fetch the page after the current one.
    ///
    /// Returns `Ok(None)` without fetching when the last page has been seen.
    pub async fn next_page(&self) -> Result<Option<Vec<Image>>, StudioError> {
        let (current, more) = {
            let s = self.state.borrow();
            (s.page_index, s.has_more)
        };
        match next_index(current, more) {
            Some(next) => self.fetch_page(next).await.map(Some),
            None => {
                tracing::debug!(page_index = current, "No more gallery pages");
                Ok(None)
            }
        }
    }

    /// Fetch the page before the current one (page 0 at the floor).
    pub async fn previous_page(&self) -> Result<Vec<Image>, StudioError> {
        let current = self.state.borrow().page_index;
        self.fetch_page(previous_index(current)).await
    }
}
