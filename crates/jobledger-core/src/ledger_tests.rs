use super::*;
use std::sync::Arc;
use crate::parameters::JobParameter;

#[tokio::test]
async fn test_empty_ledger() {
    let ledger = MemoryLedger::new();
    assert_eq!(ledger.id(), "memory");
    assert_eq!(ledger.execution_count().await.unwrap(), 0);
    assert!(ledger.last_execution("job").await.unwrap().is_none());
    assert!(ledger.job_names().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_record_start() {
    let ledger = MemoryLedger::new();
    let params = JobParameters::new().with_string("file", "in.csv");

    let id = ledger.record_start("import", &params).await.unwrap();
    let execution = ledger.get_execution(id).await.unwrap().unwrap();

    assert_eq!(execution.job_name, "import");
    assert_eq!(execution.status, ExecutionStatus::Starting);
    assert_eq!(execution.parameters, params);
    assert!(execution.end_time.is_none());
}

#[tokio::test]
async fn test_ids_strictly_increase() {
    let ledger = MemoryLedger::new();
    let params = JobParameters::new();

    let mut previous = 0;
    for _ in 0..5 {
        let id = ledger.record_start("job", &params).await.unwrap();
        assert!(id > previous);
        previous = id;
    }
}

#[tokio::test]
async fn test_update_status() {
    let ledger = MemoryLedger::new();
    let id = ledger.record_start("job", &JobParameters::new()).await.unwrap();

    ledger.update_status(id, ExecutionStatus::Started).await.unwrap();
    let done = ledger.update_status(id, ExecutionStatus::Completed).await.unwrap();

    assert_eq!(done.status, ExecutionStatus::Completed);
    assert!(done.end_time.is_some());
    let stored = ledger.get_execution(id).await.unwrap().unwrap();
    assert_eq!(stored, done);
}

#[tokio::test]
async fn test_update_unknown_id() {
    let ledger = MemoryLedger::new();
    let result = ledger.update_status(42, ExecutionStatus::Started).await;
    assert!(matches!(result, Err(LedgerError::NotFound(42))));
}

#[tokio::test]
async fn test_update_rejects_invalid_transition() {
    let ledger = MemoryLedger::new();
    let id = ledger.record_start("job", &JobParameters::new()).await.unwrap();
    ledger
        .update_status_with_message(id, ExecutionStatus::Failed, Some("bad input".to_string()))
        .await
        .unwrap();

    let result = ledger.update_status(id, ExecutionStatus::Completed).await;
    assert!(matches!(result, Err(LedgerError::InvalidTransition { .. })));

    let stored = ledger.get_execution(id).await.unwrap().unwrap();
    assert_eq!(stored.status, ExecutionStatus::Failed);
    assert_eq!(stored.exit_message.as_deref(), Some("bad input"));
}

#[tokio::test]
async fn test_last_execution_tracks_highest_id() {
    let ledger = MemoryLedger::new();
    let params = JobParameters::new();

    for _ in 0..4 {
        let id = ledger.record_start("job", &params).await.unwrap();
        ledger.record_start("other", &params).await.unwrap();
        let last = ledger.last_execution("job").await.unwrap().unwrap();
        assert_eq!(last.id, id);
    }
}

#[tokio::test]
async fn test_last_execution_for_parameters() {
    let ledger = MemoryLedger::new();
    let day1 = JobParameters::new().with_string("day", "1");
    let day2 = JobParameters::new().with_string("day", "2");

    let first = ledger.record_start("job", &day1).await.unwrap();
    let second = ledger.record_start("job", &day2).await.unwrap();

    let last_day1 = ledger.last_execution_for("job", &day1).await.unwrap().unwrap();
    assert_eq!(last_day1.id, first);
    let last_any = ledger.last_execution("job").await.unwrap().unwrap();
    assert_eq!(last_any.id, second);
    assert!(
        ledger
            .last_execution_for("job", &JobParameters::new())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_executions_newest_first() {
    let ledger = MemoryLedger::new();
    let params = JobParameters::new();
    let a = ledger.record_start("job", &params).await.unwrap();
    ledger.record_start("other", &params).await.unwrap();
    let b = ledger.record_start("job", &params).await.unwrap();

    let ids: Vec<_> = ledger
        .executions("job")
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![b, a]);
    assert_eq!(ledger.job_names().await.unwrap(), vec!["job", "other"]);
    assert_eq!(ledger.execution_count().await.unwrap(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_record_start_unique_ids() {
    let ledger = Arc::new(MemoryLedger::new());

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger
                    .record_start(&format!("job-{}", i), &JobParameters::new())
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut ids: Vec<ExecutionId> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 32);
}

#[tokio::test]
async fn test_try_record_start_rejects_running_identity() {
    let ledger = MemoryLedger::new();
    let params = JobParameters::new().with_string("day", "mon");

    let first = ledger.try_record_start("job", &params).await.unwrap();
    let err = ledger.try_record_start("job", &params).await.unwrap_err();
    assert!(matches!(err, LedgerError::AlreadyRunning(id) if id == first));

    // Other parameters are another identity.
    let other = JobParameters::new().with_string("day", "tue");
    assert!(ledger.try_record_start("job", &other).await.is_ok());

    ledger.update_status(first, ExecutionStatus::Failed).await.unwrap();
    let second = ledger.try_record_start("job", &params).await.unwrap();
    assert!(second > first);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_try_record_start_admits_one() {
    let ledger = Arc::new(MemoryLedger::new());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move {
                ledger.try_record_start("job", &JobParameters::new()).await
            })
        })
        .collect();

    let results: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, LedgerError::AlreadyRunning(_))));
    assert_eq!(ledger.execution_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_non_finite_parameter_never_recorded() {
    let ledger = MemoryLedger::new();
    let params = JobParameters::new().with("ratio", JobParameter::Double(f64::NAN));

    let err = ledger.record_start("job", &params).await.unwrap_err();
    assert!(matches!(err, LedgerError::NonFiniteParameter(_)));
    assert_eq!(ledger.execution_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_recent_executions() {
    let ledger = MemoryLedger::new();
    let params = JobParameters::new();
    for name in ["a", "b", "a", "b", "a"] {
        ledger.record_start(name, &params).await.unwrap();
    }

    let all = ledger.recent_executions(None, 3).await.unwrap();
    let ids: Vec<_> = all.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![5, 4, 3]);

    let only_a = ledger.recent_executions(Some("a"), 10).await.unwrap();
    let ids: Vec<_> = only_a.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![5, 3, 1]);
}
