//! `vellum title` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use vellum_config::CliSettings;
use vellum_display::DisplayParameters;

use super::Session;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the title command.
#[derive(Args)]
pub(crate) struct TitleArgs {
    /// Document reference, e.g. `Guide.Install` or `main:Guide.Install`.
    reference: String,

    /// Fall back to the first heading when the title field is blank.
    #[arg(long)]
    from_heading: bool,

    /// Documentation source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,
}

impl TitleArgs {
    /// Execute the title command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or loading fails.
    pub(crate) fn execute(self, config: Option<&Path>, output: &Output) -> Result<(), CliError> {
        let settings = CliSettings {
            source_dir: self.source_dir,
            title_from_heading: self.from_heading.then_some(true),
            ..CliSettings::default()
        };
        let session = Session::open(config, &settings)?;
        let document = session.document(&self.reference)?;
        let mut ctx = session.context(None);

        let title = session
            .displayer()
            .display(&mut ctx, &document, &DisplayParameters::title())?;
        output.result(&title.plain_text());
        Ok(())
    }
}
