mod common;

use chrono::{Duration, Local, NaiveDate, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

use common::{seed, shared, FlakyStore, GatedStore};
use test_case_tagger::error::{EraseError, ReaderError, StoreError};
use test_case_tagger::models::NewRecord;
use test_case_tagger::services::{LoadOutcome, ReaderPhase};
use test_case_tagger::{
    DateFilter, HistoryEraser, HistoryReader, HistoryStore, JsonFileHistoryStore,
    MemoryHistoryStore, UserId,
};

#[tokio::test]
async fn test_paging_visits_every_record_once_newest_first() {
    for (count, page_size) in [(0, 5), (1, 5), (5, 5), (12, 5), (13, 4), (7, 1)] {
        let (_, store) = shared(MemoryHistoryStore::new());
        let user = UserId::from("u1");
        let seeded = seed(store.as_ref(), &user, count).await;

        let reader = HistoryReader::new(store, page_size);
        let mut page_sizes = Vec::new();
        let mut outcome = assert_ok!(reader.load_first_page(&user, None).await);
        loop {
            match outcome {
                LoadOutcome::Applied { fetched, has_more } => {
                    page_sizes.push(fetched);
                    if !has_more {
                        break;
                    }
                }
                other => panic!("unexpected outcome {:?}", other),
            }
            outcome = assert_ok!(reader.load_more().await);
        }

        let records = reader.records();
        assert_eq!(records.len(), count, "count={} page_size={}", count, page_size);
        let ids: HashSet<_> = records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), count);
        assert!(records
            .windows(2)
            .all(|w| w[0].created_at > w[1].created_at));

        let expected: Vec<_> = seeded.iter().rev().map(|r| r.id.clone()).collect();
        let actual: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(actual, expected);

        // 除最后一页外每页都是满的
        if let Some((_, full)) = page_sizes.split_last() {
            assert!(full.iter().all(|&n| n == page_size));
        }
    }
}

#[tokio::test]
async fn test_twelve_records_in_pages_of_five() {
    let (_, store) = shared(MemoryHistoryStore::new());
    let user = UserId::from("u1");
    seed(store.as_ref(), &user, 12).await;
    let reader = HistoryReader::new(store, 5);

    assert_eq!(
        reader.load_first_page(&user, None).await.unwrap(),
        LoadOutcome::Applied {
            fetched: 5,
            has_more: true
        }
    );
    assert_eq!(
        reader.load_more().await.unwrap(),
        LoadOutcome::Applied {
            fetched: 5,
            has_more: true
        }
    );
    assert_eq!(
        reader.load_more().await.unwrap(),
        LoadOutcome::Applied {
            fetched: 2,
            has_more: false
        }
    );
    assert_eq!(reader.load_more().await.unwrap(), LoadOutcome::NoMore);
    assert_eq!(reader.records().len(), 12);
}

#[tokio::test]
async fn test_exact_multiple_ends_with_an_empty_page() {
    let (_, store) = shared(MemoryHistoryStore::new());
    let user = UserId::from("u1");
    seed(store.as_ref(), &user, 10).await;
    let reader = HistoryReader::new(store, 5);

    reader.load_first_page(&user, None).await.unwrap();
    reader.load_more().await.unwrap();
    assert!(reader.has_more());
    assert_eq!(
        reader.load_more().await.unwrap(),
        LoadOutcome::Applied {
            fetched: 0,
            has_more: false
        }
    );
    assert_eq!(reader.records().len(), 10);
}

#[tokio::test]
async fn test_users_do_not_see_each_other() {
    let (_, store) = shared(MemoryHistoryStore::new());
    let alice = UserId::from("alice");
    let bob = UserId::from("bob");
    seed(store.as_ref(), &alice, 3).await;
    seed(store.as_ref(), &bob, 2).await;

    let reader = HistoryReader::new(store, 5);
    let records = reader.load_all(&bob, None).await.unwrap();
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_date_filter_pages_only_that_day() {
    let memory = MemoryHistoryStore::new();
    let user = UserId::from("u1");
    let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    let noon = Local
        .from_local_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
        .earliest()
        .unwrap()
        .with_timezone(&Utc);

    for i in 0..7 {
        memory.insert_at(
            &user,
            NewRecord {
                text: format!("same day case {}", i),
                prediction: "Functional".into(),
            },
            noon + Duration::minutes(i),
        );
    }
    memory.insert_at(
        &user,
        NewRecord {
            text: "previous day case".into(),
            prediction: "Security".into(),
        },
        noon - Duration::days(1),
    );
    memory.insert_at(
        &user,
        NewRecord {
            text: "next day case".into(),
            prediction: "Security".into(),
        },
        noon + Duration::days(1),
    );

    let (_, store) = shared(memory);
    let reader = HistoryReader::new(store, 3);
    let filter = DateFilter::for_local_day(day).unwrap();
    let records = reader.load_all(&user, Some(filter)).await.unwrap();

    assert_eq!(records.len(), 7);
    assert!(records.iter().all(|r| filter.contains(r.created_at)));
    assert!(records.iter().all(|r| r.text.starts_with("same day")));
}

#[tokio::test]
async fn test_filter_change_rejects_old_cursor() {
    let (_, store) = shared(MemoryHistoryStore::new());
    let user = UserId::from("u1");
    seed(store.as_ref(), &user, 8).await;
    let reader = HistoryReader::new(store, 5);

    reader.load_first_page(&user, None).await.unwrap();
    let today = DateFilter::for_local_day(Local::now().date_naive()).unwrap();
    reader.set_filter(Some(today));

    let err = assert_err!(reader.load_more().await);
    assert_eq!(err, ReaderError::StaleCursor);

    // 重新加载第一页之后恢复正常
    reader.load_first_page(&user, Some(today)).await.unwrap();
    assert_ok!(reader.load_more().await);
    assert_eq!(reader.records().len(), 8);
}

#[tokio::test]
async fn test_filter_round_trip_requires_new_first_page() {
    let (_, store) = shared(MemoryHistoryStore::new());
    let user = UserId::from("u1");
    seed(store.as_ref(), &user, 12).await;
    let reader = HistoryReader::new(store, 5);

    reader.load_first_page(&user, None).await.unwrap();
    reader.load_more().await.unwrap();
    assert_eq!(reader.records().len(), 10);

    let today = DateFilter::for_local_day(Local::now().date_naive()).unwrap();
    reader.set_filter(Some(today));
    reader.set_filter(None);

    let err = assert_err!(reader.load_more().await);
    assert_eq!(err, ReaderError::StaleCursor);
    assert!(reader.records().is_empty());
    assert!(reader.cursor().is_none());

    reader.load_first_page(&user, None).await.unwrap();
    assert_eq!(reader.records().len(), 5);
}

#[tokio::test]
async fn test_setting_same_filter_keeps_cursor() {
    let (_, store) = shared(MemoryHistoryStore::new());
    let user = UserId::from("u1");
    seed(store.as_ref(), &user, 8).await;
    let reader = HistoryReader::new(store, 5);

    reader.load_first_page(&user, None).await.unwrap();
    reader.set_filter(None);
    assert_ok!(reader.load_more().await);
    assert_eq!(reader.records().len(), 8);
}

#[tokio::test]
async fn test_store_rejects_cursor_from_another_scope() {
    let (_, store) = shared(MemoryHistoryStore::new());
    let user = UserId::from("u1");
    seed(store.as_ref(), &user, 8).await;
    let reader = HistoryReader::new(store.clone(), 5);
    reader.load_first_page(&user, None).await.unwrap();
    let cursor = reader.cursor().unwrap();

    let other_scope = test_case_tagger::models::PageQuery {
        filter: Some(DateFilter::for_local_day(Local::now().date_naive()).unwrap()),
        page_size: 5,
        after: Some(cursor),
    };
    let err = assert_err!(store.query_page(&user, &other_scope).await);
    assert!(matches!(err, StoreError::QueryFailure { .. }));
}

#[tokio::test]
async fn test_load_more_while_loading_is_busy() {
    let (gated, store) = shared(GatedStore::new());
    let user = UserId::from("u1");
    seed(store.as_ref(), &user, 3).await;
    let reader = Arc::new(HistoryReader::new(store, 5));

    let first = {
        let reader = reader.clone();
        let user = user.clone();
        tokio::spawn(async move { reader.load_first_page(&user, None).await })
    };
    gated.wait_for_waiters(1).await;
    assert_eq!(reader.phase(), ReaderPhase::Loading);

    let err = assert_err!(reader.load_more().await);
    assert_eq!(err, ReaderError::Busy);

    gated.release(1);
    let outcome = first.await.unwrap().unwrap();
    assert_eq!(
        outcome,
        LoadOutcome::Applied {
            fetched: 3,
            has_more: false
        }
    );
    assert_eq!(reader.phase(), ReaderPhase::Loaded);
}

#[tokio::test]
async fn test_newer_first_page_supersedes_older_response() {
    let (gated, store) = shared(GatedStore::new());
    let user = UserId::from("u1");
    seed(store.as_ref(), &user, 4).await;
    let reader = Arc::new(HistoryReader::new(store, 5));

    let old = {
        let reader = reader.clone();
        let user = user.clone();
        tokio::spawn(async move { reader.load_first_page(&user, None).await })
    };
    gated.wait_for_waiters(1).await;

    let today = DateFilter::for_local_day(Local::now().date_naive()).unwrap();
    let new = {
        let reader = reader.clone();
        let user = user.clone();
        tokio::spawn(async move { reader.load_first_page(&user, Some(today)).await })
    };
    gated.wait_for_waiters(2).await;

    gated.release(2);
    assert_eq!(old.await.unwrap().unwrap(), LoadOutcome::Superseded);
    assert_eq!(
        new.await.unwrap().unwrap(),
        LoadOutcome::Applied {
            fetched: 4,
            has_more: false
        }
    );
    assert_eq!(reader.records().len(), 4);
}

#[tokio::test]
async fn test_in_flight_response_is_dropped_after_filter_change() {
    let (gated, store) = shared(GatedStore::new());
    let user = UserId::from("u1");
    seed(store.as_ref(), &user, 4).await;
    let reader = Arc::new(HistoryReader::new(store, 5));

    let pending = {
        let reader = reader.clone();
        let user = user.clone();
        tokio::spawn(async move { reader.load_first_page(&user, None).await })
    };
    gated.wait_for_waiters(1).await;

    let today = DateFilter::for_local_day(Local::now().date_naive()).unwrap();
    reader.set_filter(Some(today));
    gated.release(1);

    assert_eq!(pending.await.unwrap().unwrap(), LoadOutcome::Superseded);
    assert!(reader.records().is_empty());
}

#[tokio::test]
async fn test_failed_query_keeps_loaded_state() {
    let (flaky, store) = shared(FlakyStore::new());
    let user = UserId::from("u1");
    seed(store.as_ref(), &user, 8).await;
    let reader = HistoryReader::new(store, 5);

    reader.load_first_page(&user, None).await.unwrap();
    let cursor_before = reader.cursor();

    flaky.set_fail_queries(true);
    let err = assert_err!(reader.load_more().await);
    assert!(matches!(
        err,
        ReaderError::Store(StoreError::QueryFailure { .. })
    ));
    assert_eq!(reader.records().len(), 5);
    assert_eq!(reader.cursor(), cursor_before);
    assert_eq!(reader.phase(), ReaderPhase::Loaded);

    // 重试同一个游标
    flaky.set_fail_queries(false);
    assert_ok!(reader.load_more().await);
    assert_eq!(reader.records().len(), 8);
    assert_eq!(flaky.query_calls(), 3);
}

#[tokio::test]
async fn test_erase_all_is_idempotent_and_clears_reader() {
    let (_, store) = shared(MemoryHistoryStore::new());
    let user = UserId::from("u1");
    let other = UserId::from("u2");
    seed(store.as_ref(), &user, 6).await;
    seed(store.as_ref(), &other, 2).await;

    let reader = HistoryReader::new(store.clone(), 5);
    reader.load_first_page(&user, None).await.unwrap();
    let eraser = HistoryEraser::new(store.clone());

    assert_eq!(eraser.erase_all(&user, Some(&reader)).await.unwrap(), 6);
    assert!(reader.records().is_empty());
    assert!(!reader.has_more());
    assert!(store.list_all(&user).await.unwrap().is_empty());
    assert_eq!(store.list_all(&other).await.unwrap().len(), 2);

    assert_eq!(eraser.erase_all(&user, Some(&reader)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_partial_erase_names_the_survivors() {
    let (flaky, store) = shared(FlakyStore::new());
    let user = UserId::from("u1");
    let seeded = seed(store.as_ref(), &user, 4).await;
    flaky.fail_delete_of(&seeded[1].id);
    flaky.fail_delete_of(&seeded[3].id);

    let reader = HistoryReader::new(store.clone(), 5);
    reader.load_first_page(&user, None).await.unwrap();
    let eraser = HistoryEraser::new(store.clone());

    let err = assert_err!(eraser.erase_all(&user, Some(&reader)).await);
    match err {
        EraseError::PartialEraseFailure {
            mut failed_ids,
            deleted,
        } => {
            failed_ids.sort();
            let mut expected = vec![seeded[1].id.clone(), seeded[3].id.clone()];
            expected.sort();
            assert_eq!(failed_ids, expected);
            assert_eq!(deleted, 2);
        }
        other => panic!("unexpected error {:?}", other),
    }

    // 读取器没有被清空，剩余记录仍在存储中
    assert_eq!(reader.records().len(), 4);
    assert_eq!(store.list_all(&user).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_erase_reports_query_failure_without_deleting() {
    let (flaky, store) = shared(FlakyStore::new());
    let user = UserId::from("u1");
    seed(store.as_ref(), &user, 3).await;
    flaky.set_fail_queries(true);

    let eraser = HistoryEraser::new(store);
    let err = assert_err!(eraser.erase_all(&user, None).await);
    assert!(matches!(err, EraseError::Query(_)));
    assert_eq!(flaky.inner.count(&user), 3);
}

#[tokio::test]
async fn test_file_store_pages_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    let user = UserId::from("u1");

    {
        let store = JsonFileHistoryStore::open(&path).await.unwrap();
        seed(&store, &user, 7).await;
    }

    let (_, store) = shared(JsonFileHistoryStore::open(&path).await.unwrap());
    let reader = HistoryReader::new(store, 5);
    let records = reader.load_all(&user, None).await.unwrap();
    assert_eq!(records.len(), 7);
    assert!(records
        .windows(2)
        .all(|w| w[0].created_at > w[1].created_at));
}
