//! `AlacartaApi` trait definition.
#![allow(clippy::future_not_send)]

use super::error::Result;
use super::params::WebServiceRequest;
use super::xml::XmlDocument;

/// TV3 web service trait.
///
/// Abstracts request execution so searches and link resolution can run
/// against a mock in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(AlacartaApi: Send)]
pub trait LocalAlacartaApi {
    /// Executes a request and returns the parsed response.
    ///
    /// `cacheable` lets the implementation serve the response from its disk
    /// cache when caching is enabled.
    ///
    /// # Errors
    ///
    /// - `Connection` if the HTTP request fails.
    /// - `NoResultsFound` if the service returns its "no results" sentinel.
    /// - `Service` for any other failure.
    async fn execute(&self, request: &WebServiceRequest, cacheable: bool) -> Result<XmlDocument>;
}
