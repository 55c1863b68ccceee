use std::path::Path;

use super::engine::{EngineResolver, ModuleEngineResolver};
use super::environment::{Environment, SystemEnvironment};
use super::error::{ConfigError, Result};
use super::loader::{ConfigFileLoader, FsConfigLoader, LoadedConfig};
use super::resolver::ConfigResolver;
use super::theme::{CssThemeLoader, FsThemeSetLoader, ThemeLoader, ThemeSetLoader};
use super::types::RawArguments;
use super::validation::absolutize;

/// Wires a [`ConfigResolver`] to its collaborators. Every collaborator has a
/// filesystem-backed default that can be swapped out.
pub struct ResolverBuilder {
    args: RawArguments,
    env: Box<dyn Environment>,
    loader: Box<dyn ConfigFileLoader>,
    themes: Box<dyn ThemeLoader>,
    theme_sets: Box<dyn ThemeSetLoader>,
    engines: Box<dyn EngineResolver>,
}

impl ResolverBuilder {
    pub fn new(args: RawArguments) -> Self {
        Self {
            args,
            env: Box::new(SystemEnvironment),
            loader: Box::new(FsConfigLoader::default()),
            themes: Box::new(CssThemeLoader),
            theme_sets: Box::new(FsThemeSetLoader::new(CssThemeLoader)),
            engines: Box::new(ModuleEngineResolver),
        }
    }

    /// Loads the configuration file once; everything else happens in
    /// [`ConfigResolver::resolve`].
    pub async fn build(self) -> Result<ConfigResolver> {
        let cwd = self.env.current_dir()?;
        let source = load_source(&self.args, &cwd, self.loader.as_ref()).await?;
        let (config_path, config_dir, file) = match source {
            Some(loaded) => {
                let dir = loaded.base_dir().to_path_buf();
                (Some(loaded.filepath), Some(dir), loaded.config)
            }
            None => (None, None, Default::default()),
        };

        Ok(ConfigResolver {
            args: self.args,
            file,
            config_path,
            config_dir,
            cwd,
            env: self.env,
            themes: self.themes,
            theme_sets: self.theme_sets,
            engines: self.engines,
        })
    }
}

/// Collaborator overrides for tests.
#[cfg(test)]
impl ResolverBuilder {
    pub fn with_environment(mut self, env: impl Environment + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    pub fn with_config_loader(mut self, loader: impl ConfigFileLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_theme_loader(mut self, loader: impl ThemeLoader + 'static) -> Self {
        self.themes = Box::new(loader);
        self
    }

    pub fn with_theme_set_loader(mut self, loader: impl ThemeSetLoader + 'static) -> Self {
        self.theme_sets = Box::new(loader);
        self
    }

    pub fn with_engine_resolver(mut self, engines: impl EngineResolver + 'static) -> Self {
        self.engines = Box::new(engines);
        self
    }
}

async fn load_source(
    args: &RawArguments,
    cwd: &Path,
    loader: &dyn ConfigFileLoader,
) -> Result<Option<LoadedConfig>> {
    if args.no_config_file {
        tracing::debug!("Configuration file lookup disabled");
        return Ok(None);
    }

    let Some(explicit) = &args.config_file else {
        return loader.search(cwd).await;
    };

    let path = absolutize(cwd, explicit);
    match loader.load(&path).await? {
        Some(loaded) => Ok(Some(loaded)),
        None => Err(ConfigError::not_found("Configuration file was not found").at(&path)),
    }
}
