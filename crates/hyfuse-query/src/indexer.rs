//! Populating a vector index from a corpus.

use serde_json::Value;
use tracing::info;

use hyfuse_core::{Corpus, Document, Embedder, HyfuseError, Metadata, Result, VectorIndex, VectorPoint};

/// Embed every document in batches and upsert it into the index.
///
/// Each payload is the document metadata plus `id` (string form),
/// `full_text` and `source`, so dense hits carry everything needed for
/// display without a corpus lookup. Returns the number of points written.
pub async fn index_corpus<E, V>(
    corpus: &Corpus,
    embedder: &E,
    index: &V,
    batch_size: usize,
    source: &str,
) -> Result<usize>
where
    E: Embedder + ?Sized,
    V: VectorIndex + ?Sized,
{
    let batch_size = batch_size.max(1);
    let mut total = 0;

    for batch in corpus.documents().chunks(batch_size) {
        let texts: Vec<&str> = batch.iter().map(|doc| doc.text.as_str()).collect();
        let vectors = embedder.encode_many(&texts).await?;
        if vectors.len() != batch.len() {
            return Err(HyfuseError::embedding(format!(
                "Expected {} embeddings, got {}",
                batch.len(),
                vectors.len()
            )));
        }

        let points = batch
            .iter()
            .zip(vectors)
            .map(|(doc, vector)| VectorPoint {
                id: doc.id.clone(),
                vector,
                payload: payload_for(doc, source),
            })
            .collect();

        index.upsert(points).await?;
        total += batch.len();
        info!("Upserted {} documents...", total);
    }

    Ok(total)
}

fn payload_for(doc: &Document, source: &str) -> Metadata {
    let mut payload = doc.metadata.clone();
    payload.insert("id".to_string(), Value::String(doc.id.to_string()));
    payload.insert("full_text".to_string(), Value::String(doc.text.clone()));
    payload.insert("source".to_string(), Value::String(source.to_string()));
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyfuse_core::DocId;
    use serde_json::json;

    #[test]
    fn test_payload_for() {
        let mut metadata = Metadata::new();
        metadata.insert("component".to_string(), json!("EXTERIOR LIGHTING"));
        let doc = Document::new(11666886i64, "Low beams too bright").with_metadata(metadata);

        let payload = payload_for(&doc, "nhtsa_complaints");
        assert_eq!(payload["id"], "11666886");
        assert_eq!(payload["full_text"], "Low beams too bright");
        assert_eq!(payload["source"], "nhtsa_complaints");
        assert_eq!(payload["component"], "EXTERIOR LIGHTING");
        assert_eq!(doc.id, DocId::Int(11666886));
    }
}
