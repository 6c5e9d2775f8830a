use sha2::{Digest, Sha256};

use medq_core::RecordId;
use medq_core::models::{DocumentSignature, Response};
use medq_store::Store;

use crate::error::WorkflowError;
use crate::serializer::{ResponseDocument, generate_serializer};

/// Seals a serialized document.
pub trait DocumentSigner {
    fn algorithm(&self) -> &str;

    /// Digest of the document bytes, hex encoded.
    fn digest(&self, document: &[u8]) -> String;

    fn sign(&self, document: &ResponseDocument) -> Result<DocumentSignature, WorkflowError> {
        let bytes = serde_json::to_vec(document)?;
        Ok(DocumentSignature {
            algorithm: self.algorithm().to_string(),
            digest: self.digest(&bytes),
            signed_at: jiff::Timestamp::now(),
        })
    }
}

/// SHA-256 over the compact JSON serialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Signer;

impl DocumentSigner for Sha256Signer {
    fn algorithm(&self) -> &str {
        "sha256"
    }

    fn digest(&self, document: &[u8]) -> String {
        hex::encode(Sha256::digest(document))
    }
}

/// Sign the current serialization of a response and store the signature.
pub(crate) fn sign_document(
    store: &mut Store,
    signer: &dyn DocumentSigner,
    response_id: RecordId,
) -> Result<DocumentSignature, WorkflowError> {
    let document = generate_serializer(store, response_id)?;
    let signature = signer.sign(&document)?;
    store.get_mut::<Response>(response_id)?.signature = Some(signature.clone());
    tracing::debug!(response_id = %response_id, digest = %signature.digest, "response signed");
    Ok(signature)
}

/// Recompute the digest of a response and compare it with the stored one.
/// Unsigned responses, or ones signed with another algorithm, do not verify.
pub fn verify_signature(
    store: &Store,
    signer: &dyn DocumentSigner,
    response_id: RecordId,
) -> Result<bool, WorkflowError> {
    let response = store.get::<Response>(response_id)?;
    let Some(signature) = &response.signature else {
        return Ok(false);
    };
    if signature.algorithm != signer.algorithm() {
        return Ok(false);
    }
    let document = generate_serializer(store, response_id)?;
    let bytes = serde_json::to_vec(&document)?;
    Ok(signer.digest(&bytes) == signature.digest)
}
