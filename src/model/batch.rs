//! WriteBatch - Multi-document writes committed all-or-nothing.

use super::{document_key, encode_model, Model, ModelError};

/// Version requirement a document must meet for a batch to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// No requirement.
    Any,
    /// The document must not exist.
    Absent,
    /// The document must exist at exactly this version.
    Version(u64),
}

impl Precondition {
    /// Precondition matching a document observed at `version` (0 = absent).
    pub fn observed(version: u64) -> Self {
        if version == 0 {
            Precondition::Absent
        } else {
            Precondition::Version(version)
        }
    }

    /// Check the precondition against the current version (0 = absent).
    pub fn holds(&self, actual: u64) -> bool {
        match self {
            Precondition::Any => true,
            Precondition::Absent => actual == 0,
            Precondition::Version(expected) => *expected == actual,
        }
    }

    /// The version this precondition expects, for conflict reporting.
    pub fn expected(&self) -> u64 {
        match self {
            Precondition::Any | Precondition::Absent => 0,
            Precondition::Version(v) => *v,
        }
    }
}

/// A single staged write. `bytes == None` deletes the document.
#[derive(Debug, Clone)]
pub struct WriteOp {
    pub collection: String,
    pub id: String,
    pub precondition: Precondition,
    pub bytes: Option<Vec<u8>>,
}

impl WriteOp {
    pub fn key(&self) -> String {
        document_key(&self.collection, &self.id)
    }
}

/// A document that was read but not written; it must be unchanged at commit.
#[derive(Debug, Clone)]
pub struct ReadCheck {
    pub collection: String,
    pub id: String,
    pub version: u64,
}

impl ReadCheck {
    pub fn key(&self) -> String {
        document_key(&self.collection, &self.id)
    }
}

/// Builder for an atomic multi-document commit.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<WriteOp>,
    checks: Vec<ReadCheck>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an upsert of `model` guarded by `precondition`.
    pub fn put<M: Model>(
        &mut self,
        model: &M,
        precondition: Precondition,
    ) -> Result<&mut Self, ModelError> {
        let bytes = encode_model(model)?;
        self.writes.push(WriteOp {
            collection: M::COLLECTION.to_string(),
            id: model.id().to_string(),
            precondition,
            bytes: Some(bytes),
        });
        Ok(self)
    }

    /// Stage a delete guarded by `precondition`.
    pub fn delete<M: Model>(&mut self, id: &str, precondition: Precondition) -> &mut Self {
        self.writes.push(WriteOp {
            collection: M::COLLECTION.to_string(),
            id: id.to_string(),
            precondition,
            bytes: None,
        });
        self
    }

    /// Require a document to still be at `version` when the batch commits.
    pub fn check(&mut self, collection: &str, id: &str, version: u64) -> &mut Self {
        self.checks.push(ReadCheck {
            collection: collection.to_string(),
            id: id.to_string(),
            version,
        });
        self
    }

    pub fn writes(&self) -> &[WriteOp] {
        &self.writes
    }

    pub fn checks(&self) -> &[ReadCheck] {
        &self.checks
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn into_parts(self) -> (Vec<WriteOp>, Vec<ReadCheck>) {
        (self.writes, self.checks)
    }
}
