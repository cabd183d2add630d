// Build step: turns a contract into deployable program descriptors
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::{CompletionPolicy, Contract, MethodDescriptor, StateSchema};
use crate::primitives::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramKind {
    Approval,
    ClearState,
}

impl ProgramKind {
    fn file_suffix(self) -> &'static str {
        match self {
            ProgramKind::Approval => "approval",
            ProgramKind::ClearState => "clear",
        }
    }
}

/// Everything a deployer needs to know about one program
#[derive(Debug, Clone, Serialize)]
pub struct CompiledProgram {
    pub contract: &'static str,
    pub kind: ProgramKind,
    pub avm_version: u8,
    pub global_schema: StateSchema,
    pub local_schema: StateSchema,
    pub methods: Vec<MethodDescriptor>,
    pub completion_policy: CompletionPolicy,
    /// Hex SHA-256 over the fields above
    pub digest: String,
}

impl CompiledProgram {
    fn new(contract: &dyn Contract, kind: ProgramKind) -> Result<Self> {
        let methods = match kind {
            ProgramKind::Approval => contract.methods(),
            ProgramKind::ClearState => Vec::new(),
        };

        let mut program = Self {
            contract: contract.name(),
            kind,
            avm_version: contract.avm_version(),
            global_schema: contract.global_schema(),
            local_schema: contract.local_schema(),
            methods,
            completion_policy: contract.completion_policy(),
            digest: String::new(),
        };
        program.digest = hex::encode(Sha256::digest(serde_json::to_vec(&program)?));
        Ok(program)
    }

    pub fn file_name(&self) -> String {
        format!("{}_{}.json", self.contract, self.kind.file_suffix())
    }

    /// Leading digest characters, for log lines
    pub fn short_digest(&self) -> &str {
        self.digest.get(..16).unwrap_or(&self.digest)
    }

    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        info!("Wrote {} ({})", path.display(), self.short_digest());
        Ok(path)
    }
}

pub struct ContractCompiler;

impl ContractCompiler {
    pub fn approval(contract: &dyn Contract) -> Result<CompiledProgram> {
        CompiledProgram::new(contract, ProgramKind::Approval)
    }

    pub fn clear_state(contract: &dyn Contract) -> Result<CompiledProgram> {
        CompiledProgram::new(contract, ProgramKind::ClearState)
    }

    /// Write both programs of every contract into `dir`
    pub fn build_all(contracts: &[Arc<dyn Contract>], dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(contracts.len() * 2);
        for contract in contracts {
            written.push(Self::approval(contract.as_ref())?.write_to(dir)?);
            written.push(Self::clear_state(contract.as_ref())?.write_to(dir)?);
        }
        info!("Built {} programs into {}", written.len(), dir.display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContractsConfig;
    use crate::smart_contracts::{registry, Marketplace};

    #[test]
    fn test_descriptor_fields() {
        let program = ContractCompiler::approval(&Marketplace::new()).unwrap();
        assert_eq!(program.contract, "marketplace");
        assert_eq!(program.avm_version, 8);
        assert_eq!(program.methods.len(), 3);
        assert_eq!(program.digest.len(), 64);
        assert_eq!(program.file_name(), "marketplace_approval.json");

        let clear = ContractCompiler::clear_state(&Marketplace::new()).unwrap();
        assert!(clear.methods.is_empty());
        assert_ne!(clear.digest, program.digest);
        assert_eq!(clear.file_name(), "marketplace_clear.json");
    }

    #[test]
    fn test_short_digest_tolerates_hand_built_descriptors() {
        let mut program = ContractCompiler::approval(&Marketplace::new()).unwrap();
        assert_eq!(program.short_digest(), &program.digest[..16]);

        program.digest = "abc".to_string();
        assert_eq!(program.short_digest(), "abc");

        let dir = tempfile::tempdir().unwrap();
        assert!(program.write_to(dir.path()).is_ok());
    }

    #[test]
    fn test_build_all_writes_two_files_per_contract() {
        let dir = tempfile::tempdir().unwrap();
        let contracts = registry(&ContractsConfig::default());
        let written = ContractCompiler::build_all(&contracts, dir.path()).unwrap();
        assert_eq!(written.len(), contracts.len() * 2);

        let raw = std::fs::read_to_string(dir.path().join("lending_escrow_approval.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["kind"], "approval");
        assert_eq!(json["local_schema"]["num_uints"], 2);
        assert_eq!(json["completion_policy"]["delete"], false);
    }
}
