//! Build orchestration.
//!
//! A full build runs three phases in order, each re-deriving its output from
//! disk:
//!
//! ```text
//! 1. Records    berita/data/*.json  →  berita/<slug>/index.html + banners
//! 2. Galleries  assets/img/galeri/  →  galeri/*.html + manifest.json
//! 3. Indices    output tree         →  news-index.json + pages-index.json
//! ```
//!
//! Rendering a record never touches the indices. Callers that render a single
//! record and want the indices current call [`Pipeline::refresh_indices`]
//! afterwards; that step is fail-soft so an index problem never fails a record
//! that was already written.
//!
//! In [`BuildMode::Report`] a failing record is counted and the phase carries
//! on; in [`BuildMode::FailFast`] the first failing record or gallery category
//! aborts the build.

use crate::banner::{BannerError, BannerRenderer, PlainBanner, write_banner};
use crate::config::Site;
use crate::gallery::{BuildMode, GalleryError, GalleryReport, build_galleries};
use crate::index::{
    IndexError, NewsIndexReport, PagesIndexReport, build_news_index, build_pages_index,
};
use crate::record::{RecordFileError, load_record, record_files};
use crate::render::{NewsTemplate, RenderError, TemplateError, write_page};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Record(#[from] RecordFileError),
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Banner error: {0}")]
    Banner(#[from] BannerError),
    #[error("Gallery error: {0}")]
    Gallery(#[from] GalleryError),
    #[error("Index error: {0}")]
    Index(#[from] IndexError),
}

/// The build phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Records,
    Galleries,
    Indices,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Records => "records",
            Phase::Galleries => "galleries",
            Phase::Indices => "indices",
        };
        f.write_str(name)
    }
}

/// One record written to the output tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRecord {
    pub slug: String,
    pub page: PathBuf,
    pub banner: Option<PathBuf>,
    pub undated: bool,
}

/// A record that could not be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordsReport {
    pub rendered: Vec<RenderedRecord>,
    pub failed: Vec<RecordFailure>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexReport {
    pub news: NewsIndexReport,
    pub pages: PagesIndexReport,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub records: RecordsReport,
    pub galleries: GalleryReport,
    pub indices: IndexReport,
}

impl BuildReport {
    /// Failed records plus blocked gallery categories.
    pub fn failures(&self) -> usize {
        self.records.failed.len() + self.galleries.blocked.len()
    }
}

/// A site plus the loaded template and banner renderer.
pub struct Pipeline {
    site: Site,
    template: NewsTemplate,
    banner: Option<Box<dyn BannerRenderer>>,
}

impl Pipeline {
    /// Load the news template and, if banners are enabled, the banner renderer.
    pub fn new(site: Site) -> Result<Self, PipelineError> {
        let template = NewsTemplate::load(&site)?;
        let banner: Option<Box<dyn BannerRenderer>> = if site.config.banner.enabled {
            Some(Box::new(PlainBanner::from_site(&site)?))
        } else {
            None
        };
        Ok(Self::with_parts(site, template, banner))
    }

    pub fn with_parts(
        site: Site,
        template: NewsTemplate,
        banner: Option<Box<dyn BannerRenderer>>,
    ) -> Self {
        Self {
            site,
            template,
            banner,
        }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Validate, render, and write one record file (page and banner).
    pub fn render_record(&self, path: &Path) -> Result<RenderedRecord, PipelineError> {
        let record = load_record(path, &self.site.config)?;
        let banner = match &self.banner {
            Some(renderer) => Some(write_banner(
                &self.site,
                renderer.as_ref(),
                &record.banner_url,
                &record.title,
                &record.subtitle,
            )?),
            None => None,
        };
        let page = write_page(&self.site, &self.template, &record)?;
        Ok(RenderedRecord {
            slug: record.slug,
            page,
            banner,
            undated: record.date.is_none(),
        })
    }

    /// Render every record file; failures are collected unless `mode` is fail-fast.
    pub fn render_records(&self, mode: BuildMode) -> Result<RecordsReport, PipelineError> {
        let mut report = RecordsReport::default();
        for path in record_files(&self.site.records_dir())? {
            match self.render_record(&path) {
                Ok(rendered) => report.rendered.push(rendered),
                Err(e) if mode == BuildMode::FailFast => return Err(e),
                Err(e) => {
                    tracing::warn!(file = %path.display(), "record failed: {e}");
                    report.failed.push(RecordFailure {
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    pub fn render_galleries(&self, mode: BuildMode) -> Result<GalleryReport, PipelineError> {
        Ok(build_galleries(&self.site, mode)?)
    }

    pub fn rebuild_indices(&self) -> Result<IndexReport, PipelineError> {
        rebuild_indices(&self.site)
    }

    /// [`rebuild_indices`](Self::rebuild_indices), logging instead of failing.
    pub fn refresh_indices(&self) -> Option<IndexReport> {
        match self.rebuild_indices() {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!("index rebuild failed: {e}");
                None
            }
        }
    }

    /// Run all three phases.
    pub fn build_all(&self, mode: BuildMode) -> Result<BuildReport, PipelineError> {
        tracing::info!(phase = %Phase::Records, "starting phase");
        let records = self.render_records(mode)?;
        tracing::info!(phase = %Phase::Galleries, "starting phase");
        let galleries = self.render_galleries(mode)?;
        tracing::info!(phase = %Phase::Indices, "starting phase");
        let indices = self.rebuild_indices()?;
        Ok(BuildReport {
            records,
            galleries,
            indices,
        })
    }
}

/// Rewrite both indices from current disk state.
pub fn rebuild_indices(site: &Site) -> Result<IndexReport, PipelineError> {
    Ok(IndexReport {
        news: build_news_index(site)?,
        pages: build_pages_index(site)?,
    })
}
