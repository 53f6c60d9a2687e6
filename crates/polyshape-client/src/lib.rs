//! Polyshape Client - HTTP resource controllers for the content API
//!
//! One generic controller, [`CollectionClient`], serves both collections:
//!
//! - [`PublicationsClient`] - `<api_root>/publications/`
//! - [`ProjectsClient`] - `<api_root>/projects/`
//!
//! # Overview
//!
//! The controllers handle bearer authentication, request building, lenient
//! response decoding and error extraction. They implement
//! [`polyshape_core::actions::CollectionApi`], which the list actions drive.

pub mod collection;

pub use collection::{CollectionClient, ProjectsClient, PublicationsClient};
