//! Polling cycle and delivery against a mock ingestion API

use async_trait::async_trait;
use inbox_triage::classifier::Classifier;
use inbox_triage::config::IngestConfig;
use inbox_triage::ingest::{DeliveryOutcome, DeliveryStatus, IngestClient, MISSING_ID};
use inbox_triage::mail::MailSource;
use inbox_triage::poller::{spawn_poller, CycleSummary, Pipeline};
use inbox_triage::{InboundMessage, Result, TriageError};
use mockito::Matcher;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory mailbox recording which ids were marked read
#[derive(Default)]
struct MemorySource {
    messages: Vec<InboundMessage>,
    marked: Mutex<Vec<String>>,
    fetches: AtomicUsize,
    fail_fetch: bool,
    fail_first_fetch: bool,
}

impl MemorySource {
    fn with(messages: Vec<InboundMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    fn marked(&self) -> Vec<String> {
        self.marked.lock().unwrap().clone()
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailSource for MemorySource {
    async fn fetch_messages(&self) -> Result<Vec<InboundMessage>> {
        let attempt = self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch || (self.fail_first_fetch && attempt == 0) {
            return Err(TriageError::Mailbox("connection refused".to_string()));
        }
        Ok(self.messages.clone())
    }

    async fn mark_read(&self, ids: &[String]) -> Result<()> {
        self.marked.lock().unwrap().extend_from_slice(ids);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

fn ingest_client(url: String) -> IngestClient {
    IngestClient::new(IngestConfig {
        url,
        timeout_ms: 2000,
    })
    .unwrap()
}

#[tokio::test]
async fn test_send_posts_normalized_payload() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/emails")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "id": "42",
            "subject": "TCC - Defesa de monografia agendada",
            "body": "Banca definida para sexta",
            "category": "TCC / Projeto Final",
            "date": "2025-11-16T13:30:39.000Z"
        })))
        .with_status(201)
        .create_async()
        .await;

    let message = InboundMessage::new("42", "TCC - Defesa de monografia agendada")
        .with_snippet("Banca definida para sexta")
        .with_date("Sun, 16 Nov 2025 10:30:39 -0300");
    let classified = Classifier::default().classify_all(&[message]);

    let client = ingest_client(format!("{}/api/v1/emails", server.url()));
    let outcome = client.send(&classified[0]).await.unwrap();

    assert_eq!(outcome, DeliveryOutcome::Delivered);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_success_status_is_rejection_not_error() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/emails")
        .with_status(422)
        .with_body("invalid payload")
        .create_async()
        .await;

    let classified = Classifier::default().classify_all(&[InboundMessage::new("1", "x")]);
    let client = ingest_client(format!("{}/api/v1/emails", server.url()));

    match client.send(&classified[0]).await {
        Ok(DeliveryOutcome::Rejected { status, body }) => {
            assert_eq!(status.as_u16(), 422);
            assert_eq!(body, "invalid payload");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_transport_failure_surfaces_as_error() {
    // Nothing listens on port 1
    let client = ingest_client("http://127.0.0.1:1/api/v1/emails".to_string());
    let classified = Classifier::default().classify_all(&[InboundMessage::new("1", "x")]);

    assert!(client.send(&classified[0]).await.is_err());

    let report = client.send_batch(&classified).await;
    assert!(matches!(report.status("1"), Some(DeliveryStatus::Failed(_))));
}

#[tokio::test]
async fn test_batch_continues_after_failure() {
    let mut server = mockito::Server::new_async().await;
    let accepted = server
        .mock("POST", "/api/v1/emails")
        .match_body(Matcher::PartialJson(json!({"id": "1"})))
        .with_status(200)
        .create_async()
        .await;
    let refused = server
        .mock("POST", "/api/v1/emails")
        .match_body(Matcher::PartialJson(json!({"id": "2"})))
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;
    let unnamed = server
        .mock("POST", "/api/v1/emails")
        .match_body(Matcher::PartialJson(json!({"id": ""})))
        .with_status(200)
        .create_async()
        .await;

    let classified = Classifier::default().classify_all(&[
        InboundMessage::new("1", "Palestra"),
        InboundMessage::new("2", "Vaga de estágio"),
        InboundMessage::new("", "Aula cancelada"),
    ]);
    let client = ingest_client(format!("{}/api/v1/emails", server.url()));

    let report = client.send_batch(&classified).await;

    let ids: Vec<&str> = report.results.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", MISSING_ID]);
    assert_eq!(report.status("1"), Some(&DeliveryStatus::Delivered));
    assert!(matches!(report.status("2"), Some(DeliveryStatus::Rejected(s)) if s.as_u16() == 500));
    assert_eq!(report.status(MISSING_ID), Some(&DeliveryStatus::Delivered));
    assert_eq!(report.delivered(), 2);

    accepted.assert_async().await;
    refused.assert_async().await;
    unnamed.assert_async().await;
}

#[tokio::test]
async fn test_cycle_marks_only_delivered_messages() {
    let mut server = mockito::Server::new_async().await;
    let _accepted = server
        .mock("POST", "/api/v1/emails")
        .match_body(Matcher::PartialJson(
            json!({"id": "10", "category": "Eventos / Palestras / Workshops"}),
        ))
        .with_status(201)
        .create_async()
        .await;
    let _unavailable = server
        .mock("POST", "/api/v1/emails")
        .match_body(Matcher::PartialJson(json!({"id": "11"})))
        .with_status(503)
        .create_async()
        .await;

    let source = Arc::new(MemorySource::with(vec![
        InboundMessage::new("10", "Workshop de Rust"),
        InboundMessage::new("11", "Resultado do edital"),
    ]));

    let pipeline = Pipeline {
        source: source.clone(),
        classifier: Arc::new(Classifier::default()),
        ingest: Arc::new(ingest_client(format!("{}/api/v1/emails", server.url()))),
        mark_read: true,
    };

    let summary = pipeline.run_cycle().await.unwrap();

    assert_eq!(
        summary,
        CycleSummary {
            fetched: 2,
            delivered: 1,
            failed: 1
        }
    );
    assert_eq!(source.marked(), vec!["10"]);
}

#[tokio::test]
async fn test_cycle_without_mark_read() {
    let mut server = mockito::Server::new_async().await;
    let _accepted = server
        .mock("POST", "/api/v1/emails")
        .with_status(200)
        .create_async()
        .await;

    let source = Arc::new(MemorySource::with(vec![InboundMessage::new("5", "Prova")]));
    let pipeline = Pipeline {
        source: source.clone(),
        classifier: Arc::new(Classifier::default()),
        ingest: Arc::new(ingest_client(format!("{}/api/v1/emails", server.url()))),
        mark_read: false,
    };

    let summary = pipeline.run_cycle().await.unwrap();
    assert_eq!(summary.delivered, 1);
    assert!(source.marked().is_empty());
}

#[tokio::test]
async fn test_empty_mailbox_skips_delivery() {
    let source = Arc::new(MemorySource::default());
    let pipeline = Pipeline {
        source,
        classifier: Arc::new(Classifier::default()),
        // Would fail if anything were sent
        ingest: Arc::new(ingest_client("http://127.0.0.1:1/api/v1/emails".to_string())),
        mark_read: true,
    };

    assert_eq!(pipeline.run_cycle().await.unwrap(), CycleSummary::default());
}

#[tokio::test]
async fn test_fetch_failure_is_reported() {
    let source = Arc::new(MemorySource {
        fail_fetch: true,
        ..Default::default()
    });
    let pipeline = Pipeline {
        source,
        classifier: Arc::new(Classifier::default()),
        ingest: Arc::new(ingest_client("http://127.0.0.1:1/api/v1/emails".to_string())),
        mark_read: true,
    };

    assert!(matches!(
        pipeline.run_cycle().await,
        Err(TriageError::Mailbox(_))
    ));
}

#[tokio::test]
async fn test_poller_keeps_running_after_failed_cycle() {
    let source = Arc::new(MemorySource {
        fail_first_fetch: true,
        ..Default::default()
    });
    let pipeline = Pipeline {
        source: source.clone(),
        classifier: Arc::new(Classifier::default()),
        ingest: Arc::new(ingest_client("http://127.0.0.1:1/api/v1/emails".to_string())),
        mark_read: true,
    };

    let handle = spawn_poller(pipeline, Duration::from_millis(10));

    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while source.fetches() < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    handle.abort();
    assert!(waited.is_ok(), "poller stopped after {} fetches", source.fetches());
    // The loop only ends through abort, never on its own
    assert!(handle.await.unwrap_err().is_cancelled());
}
