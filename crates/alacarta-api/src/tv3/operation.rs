//! Catalog operations and their dispatch.

use tracing::instrument;

use super::api::LocalAlacartaApi;
use super::error::Result;
use super::search::{PagedSearch, ProgramSearch, VideoSearch, VideoSearchKind, valid_letters};
use super::types::{Program, Video, sort_newest_first};
use super::video_link::VideoLink;

/// Page selector for listings without other arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageArgs {
    /// Requested page; values `<= 0` mean the first page.
    pub page: i64,
}

/// Arguments of [`Operation::Programs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramsArgs {
    /// Index letter (case-insensitive, `A`-`Z`).
    pub letter: String,
    /// Archived programs instead of the ones on air.
    pub archive: bool,
    /// Requested page.
    pub page: i64,
}

/// Arguments of [`Operation::Videos`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideosArgs {
    /// Program ID.
    pub program_id: u64,
    /// Requested page.
    pub page: i64,
}

/// Arguments of [`Operation::PlayVideo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayVideoArgs {
    /// Video ID.
    pub video_id: u64,
}

/// Arguments of [`Operation::Search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchArgs {
    /// Free-text search term.
    pub term: String,
    /// Requested page.
    pub page: i64,
}

/// A navigation request against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Featured videos.
    FeaturedVideos(PageArgs),
    /// Letters the program index can be browsed by.
    ProgramLetters,
    /// Most voted videos.
    MostVotedVideos(PageArgs),
    /// Most viewed videos.
    MostViewedVideos(PageArgs),
    /// Programs by letter.
    Programs(ProgramsArgs),
    /// Videos of a program.
    Videos(VideosArgs),
    /// Resolve the media URL of a video.
    PlayVideo(PlayVideoArgs),
    /// Free-text video search.
    Search(SearchArgs),
}

impl Operation {
    /// Short name, used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FeaturedVideos(_) => "featured_videos",
            Self::ProgramLetters => "program_letters",
            Self::MostVotedVideos(_) => "voted_videos",
            Self::MostViewedVideos(_) => "viewed_videos",
            Self::Programs(_) => "programs",
            Self::Videos(_) => "videos",
            Self::PlayVideo(_) => "play_video",
            Self::Search(_) => "search",
        }
    }
}

/// One page of a listing with its navigation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on the page.
    pub items: Vec<T>,
    /// Page index, `None` when nothing was fetched.
    pub page_index: Option<u32>,
    /// Whether a next page exists, `None` when unknown.
    pub has_next: Option<bool>,
    /// Whether a previous page exists, `None` when unknown.
    pub has_previous: Option<bool>,
}

impl<T> Page<T> {
    fn from_search(items: Vec<T>, paging: &PagedSearch) -> Self {
        Self {
            items,
            page_index: paging.page_index(),
            has_next: paging.has_next_page(),
            has_previous: paging.has_previous_page(),
        }
    }
}

/// Result of an [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// Browse letters.
    Letters(Vec<char>),
    /// Programs.
    Programs(Page<Program>),
    /// Videos, newest first.
    Videos {
        /// The page.
        page: Page<Video>,
        /// Whether titles should carry the subtitle (see [`Video::display_title`]).
        show_subtitle: bool,
    },
    /// Playable media URL.
    Playable(String),
}

/// Runs an operation.
///
/// # Errors
///
/// Propagates search and link resolution errors. Program listings surface
/// `NoResultsFound`; video listings turn it into an empty page.
#[instrument(skip_all, fields(operation = operation.name()))]
pub async fn run(api: &(impl LocalAlacartaApi + Sync), operation: Operation) -> Result<Listing> {
    match operation {
        Operation::ProgramLetters => Ok(Listing::Letters(valid_letters().to_vec())),
        Operation::Programs(args) => {
            let mut search = ProgramSearch::new(&args.letter, args.archive)?;
            let items = search.get_page(api, args.page).await?;
            tracing::debug!(count = items.len(), "Programs fetched");
            Ok(Listing::Programs(Page::from_search(items, search.paging())))
        }
        Operation::FeaturedVideos(args) => {
            videos(api, VideoSearchKind::Featured, args.page, true).await
        }
        Operation::MostVotedVideos(args) => {
            videos(api, VideoSearchKind::MostVoted, args.page, true).await
        }
        Operation::MostViewedVideos(args) => {
            videos(api, VideoSearchKind::MostViewed, args.page, true).await
        }
        Operation::Videos(args) => {
            videos(api, VideoSearchKind::ByProgram(args.program_id), args.page, false).await
        }
        Operation::Search(args) => {
            videos(api, VideoSearchKind::Text(args.term), args.page, false).await
        }
        Operation::PlayVideo(args) => VideoLink::new(args.video_id)
            .resolve_url(api)
            .await
            .map(Listing::Playable),
    }
}

async fn videos(
    api: &(impl LocalAlacartaApi + Sync),
    kind: VideoSearchKind,
    page: i64,
    show_subtitle: bool,
) -> Result<Listing> {
    let mut search = VideoSearch::new(kind);
    let mut items = search.get_page(api, page).await?;
    tracing::debug!(count = items.len(), "Videos fetched");
    sort_newest_first(&mut items);
    Ok(Listing::Videos {
        page: Page::from_search(items, search.paging()),
        show_subtitle,
    })
}
