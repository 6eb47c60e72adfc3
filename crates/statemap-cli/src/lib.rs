//! statemap-cli
//! ============
//!
//! Command-line interface for the `statemap-core` choropleth library.
//!
//! This crate primarily provides a binary (`statemap`). We include a small
//! library target so that docs.rs renders a documentation page and shows this
//! overview.
//!
//! Quick start
//! -----------
//!
//! ```text
//! statemap --help
//! statemap -b us-10m.v1.json --cases covid_confirmed_usafacts.csv render -o cases.svg
//! statemap -c map.json summary -m deaths -p 2021
//! statemap -c map.json periods -m cases
//! ```
//!
//! A config file is plain JSON; every field is optional:
//!
//! ```text
//! {
//!   "render":  { "width": 960, "height": 600, "scheme": "reds" },
//!   "sources": { "boundary": "us-10m.v1.json.gz",
//!                "vaccination": "https://example.org/vaccinations.csv" }
//! }
//! ```
//!
//! For programmatic access use [`statemap-core`] directly.
#![cfg_attr(docsrs, feature(doc_cfg))]

// This library target intentionally exposes no API; the binary is the primary
// deliverable.
