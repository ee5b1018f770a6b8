//! TV3 "a la carta" web service client module.
//!
//! Calls the broadcaster's XML web service at `tv3.cat`, caches raw responses
//! on disk and turns listings into program and video records.

mod api;
mod cache;
mod client;
mod error;
mod operation;
mod params;
mod search;
mod types;
mod video_link;
pub(crate) mod xml;

#[allow(clippy::module_name_repetitions)]
pub use api::{AlacartaApi, LocalAlacartaApi};
pub use cache::{CacheConfig, ResponseCache};
pub use client::{AlacartaClient, AlacartaClientBuilder, NO_RESULTS_SENTINEL, WS_BASE_URL};
pub use error::{AlacartaError, Result};
pub use operation::{
    Listing, Operation, Page, PageArgs, PlayVideoArgs, ProgramsArgs, SearchArgs, VideosArgs, run,
};
pub use params::{ParamValue, QueryParams, WebServiceRequest};
pub use search::{
    PAGE_ITEMS, PagedSearch, ProgramSearch, VALID_LETTERS, VideoSearch, VideoSearchKind,
    valid_letters,
};
pub use types::{Program, Video, sort_newest_first};
pub use video_link::{StreamVariant, VideoLink};
pub use xml::{XmlDocument, XmlElement};
