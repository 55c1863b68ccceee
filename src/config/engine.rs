use std::path::Path;

use async_trait::async_trait;

use super::constants::DEFAULT_ENGINE;
use super::error::{ConfigError, Result};
use super::types::{EngineHandle, EngineSource};
use super::validation::absolutize;

/// Turns an engine identifier into something the conversion pipeline can load.
#[async_trait]
pub trait EngineResolver: Send + Sync {
    /// `base` anchors relative module paths.
    async fn resolve(&self, id: &str, base: &Path) -> Result<EngineHandle>;
}

/// Accepts the built-in engine or a module file on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct ModuleEngineResolver;

#[async_trait]
impl EngineResolver for ModuleEngineResolver {
    async fn resolve(&self, id: &str, base: &Path) -> Result<EngineHandle> {
        if id == DEFAULT_ENGINE {
            return Ok(EngineHandle {
                id: id.to_string(),
                source: EngineSource::Builtin,
            });
        }

        let path = absolutize(base, Path::new(id));
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(EngineHandle {
                id: id.to_string(),
                source: EngineSource::Module(path),
            }),
            _ => Err(ConfigError::not_found(format!("Engine '{id}' could not be found")).at(&path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::error::ErrorKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn builtin_and_module_engines() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("engine.wasm"), b"\0asm").unwrap();

        let builtin = ModuleEngineResolver.resolve("builtin", tmp.path()).await.unwrap();
        assert_eq!(builtin.source, EngineSource::Builtin);

        let module = ModuleEngineResolver.resolve("./engine.wasm", tmp.path()).await.unwrap();
        assert_eq!(module.source, EngineSource::Module(tmp.path().join("engine.wasm")));

        let err = ModuleEngineResolver.resolve("missing-engine", tmp.path()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
