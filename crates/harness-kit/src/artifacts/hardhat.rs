//! Hardhat `artifacts/` directory reader.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::artifacts::{split_qualified_name, ArtifactStore, ContractArtifact};
use crate::errors::ArtifactError;

const BUILD_INFO_DIR: &str = "build-info";

/// Reads compiled artifacts from a hardhat artifacts tree:
/// `<artifacts-dir>/<sourceName>/<ContractName>.json`. The `build-info/`
/// directory and the `*.dbg.json` companion files are never consulted.
#[derive(Clone, Debug)]
pub struct HardhatArtifactStore {
    artifacts_dir: PathBuf,
}

impl HardhatArtifactStore {
    pub fn new(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self { artifacts_dir: artifacts_dir.into() }
    }

    fn read_blocking(&self, contract_name: &str) -> Result<ContractArtifact, ArtifactError> {
        let (source, bare) = split_qualified_name(contract_name);
        if let Some(source) = source {
            let mut path = self.artifacts_dir.clone();
            path.push(source);
            path.push(format!("{}.json", bare));
            if !path.is_file() {
                return Err(ArtifactError::NotFound(contract_name.to_string()));
            }
            return parse_artifact_file(&path);
        }

        let mut found = vec![];
        collect_artifact_files(&self.artifacts_dir, bare, &mut found)?;
        found.sort();

        match found.as_slice() {
            [] => Err(ArtifactError::NotFound(contract_name.to_string())),
            [path] => parse_artifact_file(path),
            paths => Err(ArtifactError::Ambiguous {
                name: contract_name.to_string(),
                candidates: paths
                    .iter()
                    .map(|path| self.qualified_name_for(path))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Derives `"<sourceName>:<ContractName>"` from an artifact path inside
    /// the store.
    fn qualified_name_for(&self, artifact_path: &Path) -> String {
        let source = artifact_path
            .parent()
            .and_then(|dir| dir.strip_prefix(&self.artifacts_dir).ok())
            .map(|rel| rel.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        let contract = artifact_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        format!("{}:{}", source, contract)
    }
}

impl ArtifactStore for HardhatArtifactStore {
    fn read_artifact<'a>(
        &'a self,
        contract_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ContractArtifact, ArtifactError>> + Send + 'a>> {
        Box::pin(async move { self.read_blocking(contract_name) })
    }
}

fn collect_artifact_files(
    dir: &Path,
    contract_name: &str,
    found: &mut Vec<PathBuf>,
) -> Result<(), ArtifactError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ArtifactError::Io {
        path: dir.display().to_string(),
        message: e.to_string(),
    })?;
    let target = format!("{}.json", contract_name);
    for entry in entries {
        let entry = entry.map_err(|e| ArtifactError::Io {
            path: dir.display().to_string(),
            message: e.to_string(),
        })?;
        let path = entry.path();
        if path.is_dir() {
            if path.file_name().map_or(false, |name| name == BUILD_INFO_DIR) {
                continue;
            }
            collect_artifact_files(&path, contract_name, found)?;
        } else if path.file_name().map_or(false, |name| name == target.as_str()) {
            found.push(path);
        }
    }
    Ok(())
}

fn parse_artifact_file(path: &Path) -> Result<ContractArtifact, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|e| ArtifactError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| ArtifactError::Malformed {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn artifact_json(source_name: &str, contract_name: &str) -> String {
        json!({
            "_format": "hh-sol-artifact-1",
            "contractName": contract_name,
            "sourceName": source_name,
            "abi": [],
            "bytecode": "0x6080",
            "deployedBytecode": "0x6080",
            "linkReferences": {},
            "deployedLinkReferences": {}
        })
        .to_string()
    }

    fn write_artifact(root: &Path, source_name: &str, contract_name: &str) {
        let dir = root.join(source_name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(format!("{}.json", contract_name)),
            artifact_json(source_name, contract_name),
        )
        .unwrap();
        std::fs::write(dir.join(format!("{}.dbg.json", contract_name)), "{\"buildInfo\":\"x\"}")
            .unwrap();
    }

    fn fixture() -> (TempDir, HardhatArtifactStore) {
        let dir = TempDir::new().unwrap();
        write_artifact(dir.path(), "contracts/Vault.sol", "Vault");
        write_artifact(dir.path(), "contracts/math/SafeMath.sol", "SafeMath");
        let build_info = dir.path().join(BUILD_INFO_DIR);
        std::fs::create_dir_all(&build_info).unwrap();
        std::fs::write(build_info.join("Vault.json"), "{}").unwrap();
        let store = HardhatArtifactStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_read_artifact_by_bare_name() {
        let (_dir, store) = fixture();
        let artifact = store.read_artifact("Vault").await.unwrap();
        assert_eq!(artifact.contract_name, "Vault");
        assert_eq!(artifact.source_name, "contracts/Vault.sol");
    }

    #[tokio::test]
    async fn test_read_artifact_by_qualified_name() {
        let (_dir, store) = fixture();
        let artifact =
            store.read_artifact("contracts/math/SafeMath.sol:SafeMath").await.unwrap();
        assert_eq!(artifact.contract_name, "SafeMath");
        assert!(matches!(
            store.read_artifact("contracts/Vault.sol:SafeMath").await.unwrap_err(),
            ArtifactError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_build_info_ignored_and_missing_reported() {
        let (_dir, store) = fixture();
        // `build-info/Vault.json` must not shadow the real artifact lookup.
        let artifact = store.read_artifact("Vault").await.unwrap();
        assert_eq!(artifact.source_name, "contracts/Vault.sol");
        assert!(matches!(
            store.read_artifact("Treasury").await.unwrap_err(),
            ArtifactError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_ambiguous_name_candidates() {
        let (dir, store) = fixture();
        write_artifact(dir.path(), "contracts/legacy/Vault.sol", "Vault");

        let err = store.read_artifact("Vault").await.unwrap_err();
        match err {
            ArtifactError::Ambiguous { candidates, .. } => {
                assert!(candidates.contains("contracts/Vault.sol:Vault"));
                assert!(candidates.contains("contracts/legacy/Vault.sol:Vault"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let artifact = store.read_artifact("contracts/legacy/Vault.sol:Vault").await.unwrap();
        assert_eq!(artifact.source_name, "contracts/legacy/Vault.sol");
    }

    #[tokio::test]
    async fn test_malformed_artifact_error() {
        let dir = TempDir::new().unwrap();
        let contract_dir = dir.path().join("contracts/Broken.sol");
        std::fs::create_dir_all(&contract_dir).unwrap();
        std::fs::write(contract_dir.join("Broken.json"), "not json").unwrap();

        let store = HardhatArtifactStore::new(dir.path());
        assert!(matches!(
            store.read_artifact("Broken").await.unwrap_err(),
            ArtifactError::Malformed { .. }
        ));
    }
}
