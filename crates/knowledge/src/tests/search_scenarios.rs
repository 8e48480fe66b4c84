//! End-to-end search scenarios with the default trigram provider.

use crate::embeddings::{EmbeddingConfig, EmbeddingEngine};
use crate::ingest::{default_documents, load_or_default};
use crate::service::SearchService;
use crate::store::DocumentStore;
use corpsearch_core::AppError;
use std::collections::HashSet;
use std::sync::Arc;

async fn service(store: DocumentStore) -> SearchService {
    let engine = Arc::new(EmbeddingEngine::new(EmbeddingConfig::default()));
    SearchService::start(Arc::new(store), engine).await.unwrap()
}

async fn default_service() -> SearchService {
    let store = DocumentStore::new();
    load_or_default(&store, None).await.unwrap();
    service(store).await
}

#[tokio::test]
async fn test_vacation_query_finds_vacation_rule() {
    let store = DocumentStore::new();
    store
        .append(
            "Отпуск",
            "HR",
            "Для оформления отпуска подайте заявление за 2 недели",
        )
        .await
        .unwrap();
    let service = service(store).await;

    let results = service
        .search("когда подавать заявление на отпуск", 3)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document.id, 1);
    assert!(results[0].score > 0.3, "score was {}", results[0].score);
}

#[tokio::test]
async fn test_empty_store_returns_nothing() {
    let service = service(DocumentStore::new()).await;

    for k in [0, 1, 3, 100] {
        assert!(service.search("test", k).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_k_bounds() {
    let service = default_service().await;

    assert!(service.search("пропуск", 0).await.unwrap().is_empty());
    assert!(matches!(
        service.search("пропуск", -1).await,
        Err(AppError::InvalidArgument(_))
    ));
}

#[tokio::test]
async fn test_salary_query_ranks_salary_rule_first() {
    let service = default_service().await;

    let results = service
        .search("Выплата зарплаты и аванс", 3)
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].document.title, "Выплата зарплаты");
    assert_eq!(results[0].document.category, "Бухгалтерия");
}

#[tokio::test]
async fn test_large_k_returns_every_document_once_sorted() {
    let service = default_service().await;

    let results = service.search("пропуск в офис", 50).await.unwrap();

    assert_eq!(results.len(), 8);
    let ids: HashSet<u64> = results.iter().map(|r| r.document.id).collect();
    assert_eq!(ids.len(), 8);
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn test_document_matches_itself() {
    let service = default_service().await;

    for doc in default_documents() {
        let results = service.search(&doc.content, 1).await.unwrap();
        assert_eq!(results[0].document.content, doc.content);
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }
}

#[tokio::test]
async fn test_appended_document_is_searchable() {
    let service = default_service().await;
    service.search("отпуск", 3).await.unwrap();

    let id = service
        .append(
            "Парковка",
            "Офис",
            "Парковочные места для сотрудников выдаются через ресепшн",
        )
        .await
        .unwrap();
    assert_eq!(id, 9);

    let results = service.search("парковочные места", 1).await.unwrap();
    assert_eq!(results[0].document.id, 9);

    let stats = service.stats().await;
    assert_eq!(stats.indexed, 9);
    let last = stats.last_sync.unwrap().stats;
    assert_eq!(last.embedded, 1);
    assert_eq!(last.reused, 8);
}

#[tokio::test]
async fn test_repeated_search_reuses_embeddings() {
    let service = default_service().await;

    service.search("VPN", 3).await.unwrap();
    service.search("VPN", 3).await.unwrap();

    let last = service.stats().await.last_sync.unwrap().stats;
    assert_eq!(last.embedded, 0);
    assert_eq!(last.provider_calls, 0);
    assert_eq!(last.reused, 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_searches_and_appends() {
    let service = Arc::new(default_service().await);

    let mut handles = Vec::new();
    for i in 0..8 {
        let appender = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            appender
                .append(format!("Правило {}", i), "General", format!("правило номер {}", i))
                .await
                .map(|_| ())
        }));

        let searcher = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            searcher.search("почта на телефоне", 3).await.map(|results| {
                assert!(results.len() <= 3);
            })
        }));
    }

    for outcome in futures::future::join_all(handles).await {
        outcome.unwrap().unwrap();
    }

    let ids: Vec<u64> = service.list().await.iter().map(|d| d.id).collect();
    assert_eq!(ids, (1..=16).collect::<Vec<_>>());

    service.search("правило", 1).await.unwrap();
    assert_eq!(service.stats().await.indexed, 16);
}
