//! Client library for the TV3 "a la carta" video-on-demand catalog.
//!
//! Provides the web service client, its disk response cache and the
//! program/video listings built on top of it.

/// TV3 web service client.
pub mod tv3;
