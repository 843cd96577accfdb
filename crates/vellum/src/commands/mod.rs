//! CLI command implementations.

pub(crate) mod display;
pub(crate) mod key;
pub(crate) mod title;

use std::path::Path;
use std::sync::Arc;

use vellum_cache::{Cache, FileCache, NullCache};
use vellum_config::{CliSettings, Config};
use vellum_display::{Displayer, IdentityTransformer, LiteralEvaluator, RenderContext};
use vellum_store::{Document, DocumentReference, DocumentStore, FsStore};

use crate::error::CliError;

pub(crate) use display::DisplayArgs;
pub(crate) use key::KeyArgs;
pub(crate) use title::TitleArgs;

/// Configuration and displayer shared by every command.
pub(crate) struct Session {
    config: Config,
    displayer: Displayer,
}

impl Session {
    /// Load configuration and build a displayer over the source directory.
    pub(crate) fn open(
        config_path: Option<&Path>,
        settings: &CliSettings,
    ) -> Result<Self, CliError> {
        let config = Config::load(config_path, Some(settings))?;
        tracing::info!(
            source_dir = %config.docs_resolved.source_dir.display(),
            wiki = %config.docs_resolved.wiki,
            "Loaded configuration"
        );

        let store = Arc::new(FsStore::new(
            config.docs_resolved.source_dir.clone(),
            config.docs_resolved.wiki.clone(),
        ));
        let displayer = Displayer::new(
            store,
            Arc::new(IdentityTransformer),
            Arc::new(LiteralEvaluator),
        )
        .with_settings(config.display.clone());

        Ok(Self { config, displayer })
    }

    pub(crate) fn displayer(&self) -> &Displayer {
        &self.displayer
    }

    /// Load the document identified by `reference`, relative to the
    /// configured wiki.
    pub(crate) fn document(&self, reference: &str) -> Result<Arc<Document>, CliError> {
        let reference = DocumentReference::parse(reference, &self.config.docs_resolved.wiki)?;
        Ok(self.displayer.store().get_document(&reference)?)
    }

    /// Context of a new request for `locale`, or the default locale.
    pub(crate) fn context(&self, locale: Option<&str>) -> RenderContext {
        let locale = locale.unwrap_or(&self.config.docs_resolved.default_locale);
        RenderContext::new(self.config.docs_resolved.wiki.clone(), locale)
    }

    /// Render cache per configuration.
    pub(crate) fn cache(&self) -> Box<dyn Cache> {
        let cache = &self.config.cache_resolved;
        if cache.enabled {
            Box::new(FileCache::new(cache.dir.clone(), &cache.version))
        } else {
            Box::new(NullCache)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    fn workspace() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("vellum.toml"),
            "[docs]\nsource_dir = \"pages\"\nwiki = \"handbook\"\ndefault_locale = \"de\"\n\n[cache]\nenabled = false\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("pages/Guide")).unwrap();
        fs::write(dir.path().join("pages/Guide/Install.md"), "# Setup\n\nRun it.").unwrap();
        dir
    }

    #[test]
    fn test_session_loads_relative_reference() {
        let dir = workspace();
        let session =
            Session::open(Some(&dir.path().join("vellum.toml")), &CliSettings::default()).unwrap();

        let document = session.document("Guide.Install").unwrap();

        assert_eq!(document.reference().to_string(), "handbook:Guide.Install");
        assert_eq!(document.content(), "# Setup\n\nRun it.");
    }

    #[test]
    fn test_session_context_uses_configured_defaults() {
        let dir = workspace();
        let session =
            Session::open(Some(&dir.path().join("vellum.toml")), &CliSettings::default()).unwrap();

        let ctx = session.context(None);
        assert_eq!(ctx.current_wiki, "handbook");
        assert_eq!(ctx.locale, "de");
        assert_eq!(session.context(Some("fr")).locale, "fr");
    }

    #[test]
    fn test_session_missing_document() {
        let dir = workspace();
        let session =
            Session::open(Some(&dir.path().join("vellum.toml")), &CliSettings::default()).unwrap();

        assert!(matches!(
            session.document("Guide.Missing"),
            Err(CliError::Store(_))
        ));
    }

    #[test]
    fn test_session_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let result = Session::open(Some(&dir.path().join("nope.toml")), &CliSettings::default());
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
