//! In-memory catalog used by provider tests

use crate::transport::{Connector, Transport, TransportError};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Server URL the fake catalog answers for
pub(crate) const TEST_SERVER: &str = "https://subscene.test";

/// A request received by the fake catalog.
#[derive(Debug, Clone)]
pub(crate) struct Request {
    /// Path and query, without the server
    pub key: String,
    pub cookies: BTreeMap<String, String>,
}

#[derive(Default)]
struct State {
    pages: HashMap<String, Vec<u8>>,
    failing: HashMap<String, u16>,
    requests: Vec<Request>,
    connections: usize,
}

/// Serves canned pages and records every request.
///
/// Pages are keyed by path plus query (`/subtitles/title?q=Show`). Unknown
/// keys answer with HTTP 404.
#[derive(Clone, Default)]
pub(crate) struct FakeCatalog {
    state: Rc<RefCell<State>>,
}

impl FakeCatalog {
    pub fn serve(&self, key: &str, body: impl Into<Vec<u8>>) -> &Self {
        self.state
            .borrow_mut()
            .pages
            .insert(key.to_string(), body.into());
        self
    }

    pub fn fail(&self, key: &str, status: u16) -> &Self {
        self.state
            .borrow_mut()
            .failing
            .insert(key.to_string(), status);
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.borrow().requests.clone()
    }

    pub fn requested_keys(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.key).collect()
    }

    pub fn request(&self, key: &str) -> Option<Request> {
        self.requests().into_iter().find(|r| r.key == key)
    }

    pub fn connections(&self) -> usize {
        self.state.borrow().connections
    }
}

impl Connector for FakeCatalog {
    type Session = FakeCatalog;

    fn connect(&self) -> Result<FakeCatalog, TransportError> {
        self.state.borrow_mut().connections += 1;
        Ok(self.clone())
    }
}

impl Transport for FakeCatalog {
    fn get(
        &self,
        url: &str,
        params: &[(&str, &str)],
        cookies: &BTreeMap<String, String>,
    ) -> Result<Vec<u8>, TransportError> {
        let mut key = url.strip_prefix(TEST_SERVER).unwrap_or(url).to_string();
        if !params.is_empty() {
            let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            key = format!("{}?{}", key, query.join("&"));
        }

        let mut state = self.state.borrow_mut();
        state.requests.push(Request {
            key: key.clone(),
            cookies: cookies.clone(),
        });

        if let Some(status) = state.failing.get(&key) {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: *status,
            });
        }

        state
            .pages
            .get(&key)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// A row of a fixture listing.
pub(crate) struct Row<'a> {
    language: &'a str,
    link: &'a str,
    name: &'a str,
    hearing_impaired: bool,
}

impl<'a> Row<'a> {
    pub fn new(language: &'a str, link: &'a str, name: &'a str) -> Self {
        Self {
            language,
            link,
            name,
            hearing_impaired: false,
        }
    }

    pub fn hearing_impaired(mut self) -> Self {
        self.hearing_impaired = true;
        self
    }
}

/// Listing page; with `marker` it reads like a release name search result.
pub(crate) fn listing_page(
    marker: bool,
    year: Option<u32>,
    imdb_href: Option<&str>,
    rows: &[Row<'_>],
) -> String {
    let mut html = String::from("<html><body><div class=\"content\">");

    if marker {
        html.push_str("<h2>Subtitle search by \"release\"</h2>");
    }

    html.push_str("<div class=\"header\"><ul>");
    if let Some(year) = year {
        html.push_str(&format!("<li><strong>Year:</strong> {}</li>", year));
    }
    if let Some(href) = imdb_href {
        html.push_str(&format!("<li><a class=\"imdb\" href=\"{}\">Imdb</a></li>", href));
    }
    html.push_str("</ul></div>");

    html.push_str("<table><thead><tr><th>Name</th></tr></thead><tbody>");
    for row in rows {
        html.push_str(&format!(
            "<tr><td class=\"a1\"><a href=\"{}\"><span class=\"l r\">{}</span><span>{}</span></a></td>",
            row.link, row.language, row.name
        ));
        if row.hearing_impaired {
            html.push_str("<td class=\"a41\"></td>");
        } else {
            html.push_str("<td class=\"a40\"></td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table></div></body></html>");
    html
}

/// Title search result page with the given container class.
pub(crate) fn search_results_page(container_class: &str, links: &[(&str, &str)]) -> String {
    let mut html = format!("<html><body><div class=\"{}\"><h2>TV-Series</h2><ul>", container_class);
    for (text, href) in links {
        html.push_str(&format!(
            "<li><div class=\"title\"><a href=\"{}\">{}</a></div></li>",
            href, text
        ));
    }
    html.push_str("</ul></div></body></html>");
    html
}

/// Subtitle detail page.
pub(crate) fn subtitle_page(download_href: Option<&str>, bread_href: Option<&str>) -> String {
    let mut html = String::from("<html><body>");
    if let Some(href) = bread_href {
        html.push_str(&format!("<div class=\"bread\"><a href=\"{}\">Show</a></div>", href));
    }
    if let Some(href) = download_href {
        html.push_str(&format!(
            "<div class=\"download\"><a href=\"{}\">Download</a></div>",
            href
        ));
    }
    html.push_str("</body></html>");
    html
}
