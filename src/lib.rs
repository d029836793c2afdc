//! # Warta
//!
//! A content compiler for a static organization website. Authors write news
//! records as JSON files and drop gallery photos into category folders; warta
//! turns them into HTML pages, share banners, and the JSON indices the site's
//! client-side scripts read.
//!
//! # Architecture: Three-Phase Build
//!
//! ```text
//! 1. Records    berita/data/*.json    →  berita/<slug>/index.html + banner PNGs
//! 2. Galleries  assets/img/galeri/*/  →  galeri/*.html + manifest.json
//! 3. Indices    output tree           →  news-index.json + pages-index.json
//! ```
//!
//! Every phase re-derives its output from what is on disk. Nothing is merged
//! into a previous artifact, so running the build twice on unchanged input
//! produces identical files, and deleting a record removes it from the index on
//! the next run.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `warta.toml` loading, merging onto stock defaults, validation, resolved [`config::Site`] paths |
//! | [`naming`] | Slugs, asset path normalization, the `<category>-NN.ext` gallery filename grammar |
//! | [`text`] | Escaping, tag stripping, entity decoding, excerpt truncation |
//! | [`record`] | Record loading and normalization into [`record::ContentRecord`] |
//! | [`render`] | Typed news template binding and call-to-action insertion |
//! | [`banner`] | Share banner rendering behind the [`banner::BannerRenderer`] trait |
//! | [`gallery`] | Photo discovery, cover selection, gallery pages and manifest |
//! | [`scrape`] | Title, description, and link extraction from static pages |
//! | [`index`] | News index and cross-category pages index |
//! | [`check`] | Post-build site validation |
//! | [`pipeline`] | Phase orchestration and batch reports |
//! | [`types`] | Types serialized into the JSON artifacts |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Typed Templates
//!
//! The news template is parsed once into literal text and named slots. An
//! unknown `{{slot}}`, a missing title slot, or a missing body marker is an
//! error when the template loads, not an unreplaced placeholder in a published
//! page. All record text is HTML-escaped on the way in.
//!
//! ## Rendering Never Touches Indices
//!
//! [`pipeline::Pipeline::render_record`] writes one page and its banner and
//! returns. Rebuilding the indices is a separate, explicit call. The CLI's
//! single-record command composes the two and treats an index failure as a
//! warning, since the page itself was already written.
//!
//! ## Blocked Galleries
//!
//! A category folder holding a file that breaks the naming contract is not
//! published at all: its page is removed and it is left out of the landing
//! page and manifest until the filenames are fixed.

pub mod banner;
pub mod check;
pub mod config;
pub mod gallery;
pub mod index;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod scrape;
pub mod text;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
