//! # Pagefire
//!
//! A small static page builder on top of the Tera templating engine.
//!
//! Templates live under a template root (conventionally `templates/`). Every
//! file whose name has an extension and does not start with `_` (partials) or
//! `.` (hidden files) is rendered and written under the output root with its
//! extension replaced by `.html`, mirroring the template's relative location.
//!
//! ## Features
//!
//! - **Full rebuilds:** every pass re-renders every template, no caching.
//! - **Per-template contexts:** register a generator for a template path, or
//!   bind the rows of a CSV file to a variable.
//! - **Watch mode:** rebuild whenever anything under the template root changes.
//!
//! ## Quickstart
//!
//! ```rust,no_run
//! use pagefire::Site;
//! use tera::Context;
//!
//! fn main() -> pagefire::Result<()> {
//!   let site = Site::builder("templates")
//!     .output_root("public")
//!     .add_global("site_name", "My Site")
//!     .register_csv("people.html", "people", "data/people.csv")
//!     .register_context("index.html", || {
//!       let mut context = Context::new();
//!       context.insert("title", "Home");
//!       Ok(context)
//!     })
//!     .build()?;
//!
//!   let report = site.build()?;
//!   println!("{} page(s) written", report.len());
//!   Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;

pub use crate::config::SiteConfig;
pub use crate::core::app::{BuildReport, Site, SiteBuilder};
pub use crate::core::context::{ContextGenerator, ContextRegistry};
pub use crate::core::data::{Record, load_csv};
pub use crate::core::discover::{Template, TemplateWalk, find_templates, should_render};
pub use crate::core::reload::{ChangeNotifier, SiteWatch, WatchOptions, WatchState, WatchSummary, watch};
pub use crate::core::render::render_template;
pub use crate::error::{BoxError, PagefireError, Result};
