//! URL handling module for Wiki-Cartographer
//!
//! This module provides URL canonicalization, domain extraction, allowed-domain
//! matching and the link classifier that decides which hrefs are followed.

mod classifier;
mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use classifier::{LinkClassifier, LinkKind};
pub use domain::{domain_of, extract_domain};
pub use matcher::{matches_any, matches_domain};
pub use normalize::{canonicalize_url, resolve_href};
