//! Page-fetching search cursors over the catalog listings.

use tracing::instrument;

use super::api::LocalAlacartaApi;
use super::error::{AlacartaError, Result};
use super::params::{QueryParams, WebServiceRequest};
use super::types::{Program, Video};
use super::xml::XmlDocument;

/// Items requested per page.
pub const PAGE_ITEMS: u32 = 20;

/// Letters accepted by the program index.
pub const VALID_LETTERS: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

const PROGRAMS_METHOD: &str = "p3ac/llistatProgramesLletra.jsp";
const VIDEOS_METHOD: &str = "p3ac/p3acLlistatVideos.jsp";
const TEXT_SEARCH_METHOD: &str = "searcher/tvc/p3acSearchVideos.jsp";

/// Letters the program index can be browsed by.
#[must_use]
pub const fn valid_letters() -> &'static [char] {
    &VALID_LETTERS
}

/// A fetched page: its index and document.
#[derive(Debug, Clone)]
struct ResolvedPage {
    index: u32,
    xml: XmlDocument,
}

/// Generic cursor over a paged listing method.
///
/// Starts unresolved; every successful `fetch_page` replaces the current page.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct PagedSearch {
    method: String,
    search_terms: QueryParams,
    current: Option<ResolvedPage>,
}

impl PagedSearch {
    /// Creates an unresolved cursor.
    #[must_use]
    pub fn new(method: impl Into<String>, search_terms: QueryParams) -> Self {
        Self {
            method: method.into(),
            search_terms,
            current: None,
        }
    }

    /// Method path.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Fixed search terms.
    #[must_use]
    pub const fn search_terms(&self) -> &QueryParams {
        &self.search_terms
    }

    /// Index of the last fetched page, `None` before the first fetch.
    #[must_use]
    pub fn page_index(&self) -> Option<u32> {
        self.current.as_ref().map(|p| p.index)
    }

    /// Document of the last fetched page.
    #[must_use]
    pub fn xml(&self) -> Option<&XmlDocument> {
        self.current.as_ref().map(|p| &p.xml)
    }

    /// Builds the request for `page`: search terms, then `page`, then `pageItems`.
    #[must_use]
    pub fn request_for(&self, page: u32) -> WebServiceRequest {
        let params = self
            .search_terms
            .clone()
            .with("page", page)
            .with("pageItems", PAGE_ITEMS);
        WebServiceRequest::new(self.method.as_str(), params)
    }

    /// Fetches page `index`; indexes `<= 0` mean the first page.
    ///
    /// The previous page is kept when the call fails.
    ///
    /// # Errors
    ///
    /// Propagates the client error, including `NoResultsFound`.
    #[instrument(skip_all, fields(method = %self.method, index = index))]
    pub async fn fetch_page(
        &mut self,
        api: &(impl LocalAlacartaApi + Sync),
        index: i64,
    ) -> Result<&XmlDocument> {
        let page = u32::try_from(index.max(1)).unwrap_or(u32::MAX);
        let request = self.request_for(page);
        let xml = api.execute(&request, true).await?;
        tracing::debug!(page, items = xml.elements("item").len(), "Page fetched");
        let resolved = self.current.insert(ResolvedPage { index: page, xml });
        Ok(&resolved.xml)
    }

    /// Total page count reported by the last page, if any.
    #[must_use]
    pub fn total_pages(&self) -> Option<u32> {
        self.xml()
            .and_then(|xml| xml.first_element("dades"))
            .and_then(|dades| dades.field("total_pages"))
            .and_then(|raw| raw.parse().ok())
    }

    /// Whether a page after the current one exists; `None` before the first fetch.
    #[must_use]
    pub fn has_next_page(&self) -> Option<bool> {
        let current = self.page_index()?;
        Some(self.total_pages().is_some_and(|total| total > current))
    }

    /// Whether a page before the current one exists; `None` before the first fetch.
    #[must_use]
    pub fn has_previous_page(&self) -> Option<bool> {
        self.page_index().map(|index| index > 1)
    }
}

/// Programs starting with a letter, on air or archived.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct ProgramSearch {
    paging: PagedSearch,
}

impl ProgramSearch {
    /// Creates a program search for `letter` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `InvalidLetter` unless `letter` is a single letter `A`-`Z`.
    pub fn new(letter: &str, archive: bool) -> Result<Self> {
        let upper = letter.trim().to_uppercase();
        let mut chars = upper.chars();
        let valid = matches!(
            (chars.next(), chars.next()),
            (Some(c), None) if VALID_LETTERS.contains(&c)
        );
        if !valid {
            return Err(AlacartaError::InvalidLetter(String::from(letter)));
        }

        let mut terms = QueryParams::new().with("lletra", upper);
        if archive {
            terms.insert("arxiu", true);
        }
        Ok(Self {
            paging: PagedSearch::new(PROGRAMS_METHOD, terms),
        })
    }

    /// Paging state.
    #[must_use]
    pub const fn paging(&self) -> &PagedSearch {
        &self.paging
    }

    /// Fetches a page of programs.
    ///
    /// # Errors
    ///
    /// Propagates every client error, `NoResultsFound` included, and fails
    /// with `Service` if an item cannot be extracted.
    pub async fn get_page(
        &mut self,
        api: &(impl LocalAlacartaApi + Sync),
        index: i64,
    ) -> Result<Vec<Program>> {
        let xml = self.paging.fetch_page(api, index).await?;
        xml.elements("item")
            .into_iter()
            .map(Program::from_element)
            .collect()
    }
}

/// Kind of video listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSearchKind {
    /// Videos of one program.
    ByProgram(u64),
    /// Featured videos.
    Featured,
    /// Most voted videos.
    MostVoted,
    /// Most viewed videos.
    MostViewed,
    /// Free-text search.
    Text(String),
}

/// A video listing.
///
/// An empty result from the service yields an empty page, not an error.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct VideoSearch {
    kind: VideoSearchKind,
    paging: PagedSearch,
}

impl VideoSearch {
    /// Creates a video search.
    #[must_use]
    pub fn new(kind: VideoSearchKind) -> Self {
        let (method, terms) = match &kind {
            VideoSearchKind::ByProgram(id) => (
                VIDEOS_METHOD,
                QueryParams::new()
                    .with("type", "videosprog")
                    .with("id", id.to_string()),
            ),
            VideoSearchKind::Featured => (VIDEOS_METHOD, QueryParams::new().with("type", "destacats")),
            VideoSearchKind::MostVoted => (VIDEOS_METHOD, QueryParams::new().with("type", "mesvotats")),
            VideoSearchKind::MostViewed => {
                (VIDEOS_METHOD, QueryParams::new().with("type", "mesvistos"))
            }
            VideoSearchKind::Text(term) => (
                TEXT_SEARCH_METHOD,
                QueryParams::new().with("textBusca", term.as_str()),
            ),
        };
        Self {
            kind,
            paging: PagedSearch::new(method, terms.with("device", "web")),
        }
    }

    /// Kind of listing.
    #[must_use]
    pub const fn kind(&self) -> &VideoSearchKind {
        &self.kind
    }

    /// Paging state.
    #[must_use]
    pub const fn paging(&self) -> &PagedSearch {
        &self.paging
    }

    /// Fetches a page of videos; `NoResultsFound` becomes an empty list.
    ///
    /// # Errors
    ///
    /// Propagates `Connection` and `Service` errors, and fails with `Service`
    /// if an item cannot be extracted.
    pub async fn get_page(
        &mut self,
        api: &(impl LocalAlacartaApi + Sync),
        index: i64,
    ) -> Result<Vec<Video>> {
        let xml = match self.paging.fetch_page(api, index).await {
            Ok(xml) => xml,
            Err(AlacartaError::NoResultsFound) => {
                tracing::debug!(kind = ?self.kind, "No videos found");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };
        xml.elements("item")
            .into_iter()
            .map(Video::from_element)
            .collect()
    }
}
