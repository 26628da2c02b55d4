//! In-memory fetcher for exercising the pipeline without a network

use crate::crawler::{FetchError, PageFetcher, RawContent};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

struct Scripted {
    response: Result<Vec<u8>, FetchError>,
    delay: Duration,
}

/// Serves canned responses keyed by URL and records every request
///
/// URLs without a canned response answer with HTTP 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, Scripted>,
    panicking: HashSet<String>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, body: &str) -> Self {
        self.page_after(url, body, Duration::ZERO)
    }

    pub fn page_after(mut self, url: &str, body: &str, delay: Duration) -> Self {
        self.responses.insert(
            url.to_string(),
            Scripted {
                response: Ok(body.as_bytes().to_vec()),
                delay,
            },
        );
        self
    }

    pub fn failure(mut self, url: &str, error: FetchError) -> Self {
        self.responses.insert(
            url.to_string(),
            Scripted {
                response: Err(error),
                delay: Duration::ZERO,
            },
        );
        self
    }

    /// Makes the fetch of `url` panic
    pub fn panic_on(mut self, url: &str) -> Self {
        self.panicking.insert(url.to_string());
        self
    }

    /// Every URL requested so far, in request order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of fetches observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<RawContent, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());

        if self.panicking.contains(url) {
            panic!("fetch of {} blew up", url);
        }

        let Some(scripted) = self.responses.get(url) else {
            return Err(FetchError::NonSuccessStatus {
                url: url.to_string(),
                status: 404,
            });
        };

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        scripted.response.clone().map(|bytes| RawContent {
            status_code: 200,
            bytes,
        })
    }
}

/// Listing page markup with one entry per `(path, title)` pair
pub fn listing_html(items: &[(&str, &str)]) -> String {
    let entries: String = items
        .iter()
        .map(|(path, title)| {
            format!(
                r#"<div class="search-title-row"><a href="{path}"><h3>{title}</h3></a><div class="price-details">PKR 100</div><img class="lazy pic" data-original="{path}.jpg"></div>"#
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", entries)
}

/// Detail page markup
pub fn detail_html(manufacturer: &str, details: &str) -> String {
    format!(
        r#"<html><body><h5 class="nomargin">{manufacturer}</h5><div class="primary-lang"><p>{details}</p></div></body></html>"#
    )
}
