//! Knowledge Base Tests
//!
//! Rebuild idempotence and atomicity (including readers and rebuilders
//! racing on sled), and retrieval behaviour with and without an embedding
//! backend, over both store implementations.

use std::collections::BTreeSet;
use std::sync::Arc;

use surge_ops::config::SurgeOpsConfig;
use surge_ops::llm::{FailingEmbedder, HashingEmbedder};
use surge_ops::storage::{InMemoryStore, RecordStore, SledStore};
use surge_ops::types::{Berth, BerthStatus, ChunkKind, Vessel, YardBlock};
use surge_ops::{KnowledgeBaseBuilder, SurgePipeline};

const DIM: usize = 64;

fn seed(store: &dyn RecordStore) {
    let now = chrono::Utc::now();
    store.save_yard_block(&YardBlock::new("A1", 100, 97)).unwrap();
    store.save_yard_block(&YardBlock::new("B1", 100, 40)).unwrap();
    store.save_berth(&Berth::new("Q1", BerthStatus::Occupied)).unwrap();
    store.save_berth(&Berth::new("Q2", BerthStatus::Available)).unwrap();
    store
        .save_vessel(&Vessel::new("Maersk Elba", now + chrono::Duration::hours(3), 1200))
        .unwrap();
}

fn keys(store: &dyn RecordStore) -> BTreeSet<(ChunkKind, String)> {
    store
        .knowledge_chunks()
        .unwrap()
        .into_iter()
        .map(|c| (c.kind, c.source_key))
        .collect()
}

fn hashing_pipeline(store: Arc<dyn RecordStore>) -> SurgePipeline {
    let mut config = SurgeOpsConfig::default();
    config.knowledge.embedding_dim = DIM;
    SurgePipeline::new(store, &config, None, Some(Arc::new(HashingEmbedder::new(DIM))))
}

#[tokio::test]
async fn rebuild_twice_is_idempotent_on_sled() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SledStore::open(dir.path().join("db")).unwrap());
    seed(store.as_ref());
    let pipeline = hashing_pipeline(store.clone());

    let first = pipeline.rebuild_knowledge_base().await.unwrap();
    let first_keys = keys(store.as_ref());
    let second = pipeline.rebuild_knowledge_base().await.unwrap();
    let second_keys = keys(store.as_ref());

    // 1 vessel + 2 blocks + 2 berths + kpi
    assert_eq!(first, 6);
    assert_eq!(first, second);
    assert_eq!(first_keys, second_keys);
    assert_eq!(store.knowledge_chunks().unwrap().len(), 6);
    assert!(first_keys.contains(&(ChunkKind::Kpi, "dashboard".to_string())));
}

#[tokio::test]
async fn embeddings_have_configured_dimension() {
    let store = Arc::new(InMemoryStore::new());
    seed(store.as_ref());
    KnowledgeBaseBuilder::new(store.clone(), Some(Arc::new(HashingEmbedder::new(20))), DIM)
        .rebuild()
        .await
        .unwrap();

    for chunk in store.knowledge_chunks().unwrap() {
        assert_eq!(chunk.embedding.unwrap().len(), DIM);
    }
}

#[tokio::test]
async fn failed_embedding_leaves_prior_generation_on_sled() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SledStore::open(dir.path().join("db")).unwrap());
    seed(store.as_ref());
    hashing_pipeline(store.clone()).rebuild_knowledge_base().await.unwrap();
    let before = store.knowledge_chunks().unwrap();

    store.save_berth(&Berth::new("Q3", BerthStatus::Maintenance)).unwrap();
    let active = KnowledgeBaseBuilder::new(store.clone(), Some(Arc::new(FailingEmbedder)), DIM)
        .rebuild()
        .await
        .unwrap();

    assert_eq!(active, before.len());
    let after = store.knowledge_chunks().unwrap();
    assert_eq!(after.len(), before.len());
    assert!(!after.iter().any(|c| c.source_key == "Q3"));
}

#[tokio::test]
async fn retrieval_without_backend_is_empty() {
    let store = Arc::new(InMemoryStore::new());
    seed(store.as_ref());
    let pipeline = SurgePipeline::new(store, &SurgeOpsConfig::default(), None, None);
    pipeline.rebuild_knowledge_base().await.unwrap();

    assert!(pipeline.retrieve_similar("anything", 5).await.is_empty());
}

#[tokio::test]
async fn retrieval_ranks_matching_statement_first() {
    let store = Arc::new(InMemoryStore::new());
    seed(store.as_ref());
    let pipeline = hashing_pipeline(store);
    pipeline.rebuild_knowledge_base().await.unwrap();

    let hits = pipeline.retrieve_similar("Berth Q2 is currently available.", 3).await;
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].chunk.source_key, "Q2");
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));

    assert!(pipeline.retrieve_similar("Berth Q2", 0).await.is_empty());
    assert_eq!(pipeline.retrieve_similar("yard", 100).await.len(), 6);
}

fn assert_readers_see_whole_generations(store: Arc<dyn RecordStore>) {
    seed(store.as_ref());
    let pipeline = hashing_pipeline(store.clone());
    let expected = tokio_test::block_on(pipeline.rebuild_knowledge_base()).unwrap();

    let reader = {
        let store = store.clone();
        std::thread::spawn(move || {
            for _ in 0..2_000 {
                let len = store.knowledge_chunks().unwrap().len();
                assert_eq!(len, expected);
            }
        })
    };

    for _ in 0..50 {
        tokio_test::block_on(pipeline.rebuild_knowledge_base()).unwrap();
    }
    reader.join().unwrap();
}

#[test]
fn readers_never_observe_a_partial_generation() {
    assert_readers_see_whole_generations(Arc::new(InMemoryStore::new()));
}

#[test]
fn readers_never_observe_a_partial_generation_on_sled() {
    let dir = tempfile::tempdir().unwrap();
    assert_readers_see_whole_generations(Arc::new(SledStore::open(dir.path().join("db")).unwrap()));
}

#[test]
fn concurrent_rebuilds_on_sled_keep_one_whole_generation() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SledStore::open(dir.path().join("db")).unwrap());
    seed(store.as_ref());
    let expected = tokio_test::block_on(hashing_pipeline(store.clone()).rebuild_knowledge_base()).unwrap();

    let rebuilders: Vec<_> = (0..3)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || {
                let pipeline = hashing_pipeline(store);
                for _ in 0..20 {
                    tokio_test::block_on(pipeline.rebuild_knowledge_base()).unwrap();
                }
            })
        })
        .collect();
    for _ in 0..500 {
        assert_eq!(store.knowledge_chunks().unwrap().len(), expected);
    }
    for handle in rebuilders {
        handle.join().unwrap();
    }

    assert_eq!(keys(store.as_ref()).len(), expected);
}
