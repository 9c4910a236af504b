//! URL handling module for Page-Ripple
//!
//! This module provides URL normalization, validation, resolution, domain
//! comparison and allowed-domain matching. The normalized string form is the
//! identity key used by the frontier, the link extractor and the results.

mod domain;
mod matcher;
mod normalize;

pub use domain::{extract_domain, same_domain, same_host};
pub use matcher::{is_allowed_domain, matches_wildcard};
pub use normalize::{is_valid_url, normalize_to_url, normalize_url, resolve_url};

pub(crate) use normalize::parse_absolute;
