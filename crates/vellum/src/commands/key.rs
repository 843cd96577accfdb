//! `vellum key` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use vellum_config::CliSettings;
use vellum_display::DisplayParameters;

use super::Session;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the key command.
#[derive(Args)]
pub(crate) struct KeyArgs {
    /// Document reference, e.g. `Guide.Install` or `main:Guide.Install`.
    reference: String,

    /// Section the render is restricted to.
    #[arg(long)]
    section: Option<String>,

    /// Documentation source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,
}

impl KeyArgs {
    /// Execute the key command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or loading fails.
    pub(crate) fn execute(self, config: Option<&Path>, output: &Output) -> Result<(), CliError> {
        let settings = CliSettings {
            source_dir: self.source_dir,
            ..CliSettings::default()
        };
        let session = Session::open(config, &settings)?;
        let document = session.document(&self.reference)?;
        let ctx = session.context(None);

        let mut params = DisplayParameters::default();
        if let Some(section) = self.section {
            params = params.with_section(section);
        }

        match session.displayer().build_render_key(&ctx, &document, &params) {
            Some(key) => output.result(&key.to_string()),
            None => {
                output.result("no key");
                output.note("Document allows neither deferred rendering nor caching");
            }
        }
        Ok(())
    }
}
