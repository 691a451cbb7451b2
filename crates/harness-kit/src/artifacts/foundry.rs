//! Foundry `out/` directory reader.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use foundry_compilers_artifacts_solc::Metadata;
use serde_json::Value as JsonValue;

use crate::artifacts::{
    split_qualified_name, ArtifactStore, ContractArtifact, LinkReferences,
};
use crate::errors::ArtifactError;

/// The compiled output JSON forge writes under `out/<File>.sol/<Contract>.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundryCompiledOutput {
    pub abi: Vec<JsonValue>,
    pub bytecode: BytecodeData,
    #[serde(default)]
    pub deployed_bytecode: Option<BytecodeData>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BytecodeData {
    pub object: String,
    #[serde(default)]
    pub link_references: LinkReferences,
}

impl FoundryCompiledOutput {
    /// Flattens foundry's nested output shape into the hardhat artifact
    /// model. The source name comes from the compilation target in the
    /// embedded metadata; `fallback_source` covers outputs compiled without
    /// metadata.
    pub fn into_artifact(self, contract_name: &str, fallback_source: &str) -> ContractArtifact {
        let source_name = self
            .metadata
            .as_ref()
            .and_then(|metadata| {
                metadata
                    .settings
                    .compilation_target
                    .iter()
                    .find(|(_, target)| target.as_str() == contract_name)
                    .map(|(source, _)| source.clone())
            })
            .unwrap_or_else(|| fallback_source.to_string());

        let (deployed_bytecode, deployed_link_references) = match self.deployed_bytecode {
            Some(deployed) => (Some(deployed.object), deployed.link_references),
            None => (None, LinkReferences::default()),
        };

        ContractArtifact {
            contract_name: contract_name.to_string(),
            source_name,
            abi: self.abi,
            bytecode: self.bytecode.object,
            deployed_bytecode,
            link_references: self.bytecode.link_references,
            deployed_link_references,
        }
    }
}

/// Reads compiled artifacts from a foundry `out/` tree, keyed by the source
/// file name: `out/<File>.sol/<Contract>.json`.
#[derive(Clone, Debug)]
pub struct FoundryArtifactStore {
    out_dir: PathBuf,
}

impl FoundryArtifactStore {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into() }
    }

    fn read_blocking(&self, contract_name: &str) -> Result<ContractArtifact, ArtifactError> {
        let (source, bare) = split_qualified_name(contract_name);
        if let Some(source) = source {
            // Foundry keys its output by source file name, so a qualified
            // `src/Vault.sol:Vault` lookup lands in `out/Vault.sol/`.
            let Some(file_name) = Path::new(source).file_name() else {
                return Err(ArtifactError::NotFound(contract_name.to_string()));
            };
            let path = self.out_dir.join(file_name).join(format!("{}.json", bare));
            if !path.is_file() {
                return Err(ArtifactError::NotFound(contract_name.to_string()));
            }
            let fallback = file_name.to_string_lossy();
            return Ok(parse_output_file(&path)?.into_artifact(bare, &fallback));
        }

        let mut found = self.scan_for(bare)?;
        found.sort();

        match found.as_slice() {
            [] => Err(ArtifactError::NotFound(contract_name.to_string())),
            [path] => {
                let fallback = source_dir_name(path);
                Ok(parse_output_file(path)?.into_artifact(bare, &fallback))
            }
            paths => Err(ArtifactError::Ambiguous {
                name: contract_name.to_string(),
                candidates: paths
                    .iter()
                    .map(|path| format!("{}:{}", source_dir_name(path), bare))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    fn scan_for(&self, contract_name: &str) -> Result<Vec<PathBuf>, ArtifactError> {
        let entries = std::fs::read_dir(&self.out_dir).map_err(|e| ArtifactError::Io {
            path: self.out_dir.display().to_string(),
            message: e.to_string(),
        })?;
        let mut found = vec![];
        for entry in entries {
            let entry = entry.map_err(|e| ArtifactError::Io {
                path: self.out_dir.display().to_string(),
                message: e.to_string(),
            })?;
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            let candidate = dir.join(format!("{}.json", contract_name));
            if candidate.is_file() {
                found.push(candidate);
            }
        }
        Ok(found)
    }
}

impl ArtifactStore for FoundryArtifactStore {
    fn read_artifact<'a>(
        &'a self,
        contract_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ContractArtifact, ArtifactError>> + Send + 'a>> {
        Box::pin(async move { self.read_blocking(contract_name) })
    }
}

fn source_dir_name(artifact_path: &Path) -> String {
    artifact_path
        .parent()
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn parse_output_file(path: &Path) -> Result<FoundryCompiledOutput, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|e| ArtifactError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| ArtifactError::Malformed {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
