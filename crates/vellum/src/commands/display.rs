//! `vellum display` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use vellum_config::CliSettings;
use vellum_display::{CachingDisplayer, DisplayParameters, SecurityContext};
use vellum_tree::IdGenerator;

use super::Session;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the display command.
#[derive(Args)]
pub(crate) struct DisplayArgs {
    /// Document reference, e.g. `Guide.Install` or `main:Guide.Install`.
    reference: String,

    /// Render only the section introduced by this heading id.
    #[arg(long)]
    section: Option<String>,

    /// Locale to resolve translations for (default: configured locale).
    #[arg(short, long)]
    locale: Option<String>,

    /// Render the translation for the locale instead of the default content.
    #[arg(long)]
    translated: bool,

    /// Skip the transformation pass.
    #[arg(long)]
    no_transform: bool,

    /// Make heading and image ids unique.
    #[arg(long)]
    unique_ids: bool,

    /// Render the document as the current document.
    #[arg(long)]
    isolated: bool,

    /// Documentation source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Disable the render cache.
    #[arg(long)]
    no_cache: bool,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

impl DisplayArgs {
    /// Execute the display command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, loading or rendering fails.
    pub(crate) fn execute(self, config: Option<&Path>, output: &Output) -> Result<(), CliError> {
        let settings = CliSettings {
            source_dir: self.source_dir.clone(),
            cache_enabled: self.no_cache.then_some(false),
            ..CliSettings::default()
        };
        let session = Session::open(config, &settings)?;
        let document = session.document(&self.reference)?;
        let mut ctx = session.context(self.locale.as_deref());

        let params = self.parameters();
        let cache = session.cache();
        let displayer = CachingDisplayer::new(session.displayer().clone(), cache.as_ref());
        // Render with the rights of the document's author when it records one.
        let tree = match SecurityContext::of_author(&document) {
            Some(security) => {
                displayer.display_with_security(&mut ctx, &document, &params, security)?
            }
            None => displayer.display(&mut ctx, &document, &params)?,
        };

        let json = if self.pretty {
            serde_json::to_string_pretty(&tree)?
        } else {
            serde_json::to_string(&tree)?
        };
        output.result(&json);
        Ok(())
    }

    fn parameters(&self) -> DisplayParameters {
        let mut params = DisplayParameters::default()
            .with_content_translated(self.translated)
            .with_content_transformed(!self.no_transform)
            .with_execution_context_isolated(self.isolated);
        if let Some(section) = &self.section {
            params = params.with_section(section.clone());
        }
        if self.unique_ids {
            params = params.with_id_generator(IdGenerator::new());
        }
        params
    }
}
