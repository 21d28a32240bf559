use std::collections::HashSet;

use contracts::domain::a001_call_log::aggregate::{CallLogDto, CallLogRecord};
use sea_orm::DbErr;
use serde_json::Value;
use thiserror::Error;

use super::repository::CallLogStore;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid data format. Expected an array of logs.")]
    InvalidFormat,

    #[error("log #{index}: {reason}")]
    Validation { index: usize, reason: String },

    #[error(transparent)]
    Storage(#[from] DbErr),
}

/// Итог приёма пачки записей
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub received: usize,
    pub inserted: usize,
}

/// Принять пачку записей от устройства и сохранить только новые.
///
/// Записи считаются одинаковыми, если совпадает пара (phoneNumber, dateTime);
/// остальные поля не сравниваются. Повторы внутри самой пачки тоже
/// отбрасываются, побеждает первая запись.
pub async fn ingest(store: &CallLogStore, body: Value) -> Result<IngestOutcome, IngestError> {
    let Value::Array(items) = body else {
        return Err(IngestError::InvalidFormat);
    };
    let received = items.len();

    let candidates = validate_all(items)?;
    let candidates = dedup_within_batch(candidates);

    let pairs: Vec<(String, String)> = candidates.iter().map(CallLogRecord::key_pair).collect();
    let existing: HashSet<(String, String)> = store
        .find_matching_any(&pairs)
        .await?
        .into_iter()
        .map(|log| (log.phone_number, log.date_time))
        .collect();

    let new_logs: Vec<CallLogRecord> = candidates
        .into_iter()
        .filter(|log| !existing.contains(&log.key_pair()))
        .collect();

    // Запись, вставленная параллельным запросом после проверки, пропускается хранилищем
    let inserted = if new_logs.is_empty() {
        0
    } else {
        store.insert_many(&new_logs).await? as usize
    };

    if inserted == 0 {
        tracing::info!("Received {} logs. No new logs to insert.", received);
        return Ok(IngestOutcome {
            received,
            inserted: 0,
        });
    }

    tracing::info!(
        "Received {} logs. Inserted {} new logs.",
        received,
        inserted
    );

    Ok(IngestOutcome { received, inserted })
}

/// Все записи, новые сверху
pub async fn list_all(store: &CallLogStore) -> Result<Vec<CallLogRecord>, IngestError> {
    Ok(store.list_sorted_by_date_time_desc().await?)
}

fn validate_all(items: Vec<Value>) -> Result<Vec<CallLogRecord>, IngestError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let dto: CallLogDto = serde_json::from_value(item).map_err(|e| {
                IngestError::Validation {
                    index,
                    reason: e.to_string(),
                }
            })?;
            dto.validate()
                .map_err(|reason| IngestError::Validation { index, reason })
        })
        .collect()
}

fn dedup_within_batch(records: Vec<CallLogRecord>) -> Vec<CallLogRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(r.key_pair()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a001_call_log::repository::tests::memory_store;
    use serde_json::json;

    fn log(phone: &str, date_time: &str) -> Value {
        json!({
            "phoneNumber": phone,
            "dateTime": date_time,
            "duration": 30,
            "type": "incoming"
        })
    }

    #[tokio::test]
    async fn test_ingest_is_idempotent() {
        let store = memory_store().await;
        let batch = json!([
            log("555", "2024-01-01T10:00:00Z"),
            log("556", "2024-01-01T11:00:00Z")
        ]);

        let first = ingest(&store, batch.clone()).await.unwrap();
        assert_eq!(first, IngestOutcome { received: 2, inserted: 2 });

        let second = ingest(&store, batch).await.unwrap();
        assert_eq!(second, IngestOutcome { received: 2, inserted: 0 });
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_identity_is_key_based() {
        let store = memory_store().await;
        ingest(&store, json!([log("555", "2024-01-01T10:00:00Z")]))
            .await
            .unwrap();

        let changed = json!([{
            "phoneNumber": "555",
            "dateTime": "2024-01-01T10:00:00Z",
            "duration": 999,
            "name": "Someone Else",
            "type": "outgoing"
        }]);
        let outcome = ingest(&store, changed).await.unwrap();
        assert_eq!(outcome.inserted, 0);

        let all = list_all(&store).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].duration, 30.0);
        assert_eq!(all[0].call_type, "incoming");
    }

    #[tokio::test]
    async fn test_mixed_batch_inserts_only_new() {
        let store = memory_store().await;
        ingest(&store, json!([log("555", "2024-01-01T10:00:00Z")]))
            .await
            .unwrap();

        let outcome = ingest(
            &store,
            json!([
                log("555", "2024-01-01T10:00:00Z"),
                log("777", "2024-01-02T10:00:00Z")
            ]),
        )
        .await
        .unwrap();
        assert_eq!(outcome, IngestOutcome { received: 2, inserted: 1 });
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicates_within_batch_inserted_once() {
        let store = memory_store().await;
        let outcome = ingest(
            &store,
            json!([
                log("555", "2024-01-01T10:00:00Z"),
                log("555", "2024-01-01T10:00:00Z")
            ]),
        )
        .await
        .unwrap();
        assert_eq!(outcome, IngestOutcome { received: 2, inserted: 1 });
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_separator_inside_key_fields_keeps_records_apart() {
        let store = memory_store().await;
        let outcome = ingest(&store, json!([log("a|b", "c"), log("a", "b|c")]))
            .await
            .unwrap();
        assert_eq!(outcome, IngestOutcome { received: 2, inserted: 2 });

        // повтор с уже сохранённым ключом не мешает соседней записи
        let outcome = ingest(
            &store,
            json!([log("a|b", "c"), log("a", "b|c"), log("a|b|c", "")]),
        )
        .await
        .unwrap();
        assert_eq!(outcome, IngestOutcome { received: 3, inserted: 1 });
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let store = memory_store().await;
        let outcome = ingest(&store, json!([])).await.unwrap();
        assert_eq!(outcome, IngestOutcome { received: 0, inserted: 0 });
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_non_array_rejected() {
        let store = memory_store().await;
        for body in [
            json!({"phoneNumber": "555"}),
            json!("logs"),
            json!(42),
            Value::Null,
        ] {
            let err = ingest(&store, body).await.unwrap_err();
            assert!(matches!(err, IngestError::InvalidFormat));
        }
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_record_rejects_whole_batch() {
        let store = memory_store().await;
        let err = ingest(
            &store,
            json!([
                log("555", "2024-01-01T10:00:00Z"),
                {"phoneNumber": "556", "duration": 3, "type": "missed"}
            ]),
        )
        .await
        .unwrap_err();

        match err {
            IngestError::Validation { index, reason } => {
                assert_eq!(index, 1);
                assert!(reason.contains("dateTime"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_non_object_item_is_validation_error() {
        let store = memory_store().await;
        let err = ingest(&store, json!(["555"])).await.unwrap_err();
        assert!(matches!(err, IngestError::Validation { index: 0, .. }));
    }

    #[tokio::test]
    async fn test_list_all_sorted_desc() {
        let store = memory_store().await;
        ingest(
            &store,
            json!([
                log("1", "2024-01-02T00:00:00Z"),
                log("2", "2024-01-03T00:00:00Z"),
                log("3", "2024-01-01T00:00:00Z"),
                log("4", "2024-01-03T00:00:00Z")
            ]),
        )
        .await
        .unwrap();

        let all = list_all(&store).await.unwrap();
        assert_eq!(all.len(), 4);
        for pair in all.windows(2) {
            assert!(pair[0].date_time >= pair[1].date_time);
        }
    }
}
