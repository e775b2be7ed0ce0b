//! End-to-end behavior of indexing and searching through the service,
//! against an on-disk index.

use chrono::{DateTime, Duration, Utc};
use docsearch::{
    DocSearchError, IndexEntry, SearchConfig, SearchFilters, SearchPage, SearchParams, SearchRequest,
    SearchService,
};
use tempfile::TempDir;

fn open_service(dir: &TempDir) -> SearchService {
    let mut config = SearchConfig::default();
    config.index_dir = dir.path().join("index");
    config.outbox_path = dir.path().join("outbox.sqlite");
    config.writer_heap_bytes = 15_000_000;
    SearchService::open(config).unwrap()
}

fn ids(page: &SearchPage) -> Vec<i64> {
    page.items.iter().map(|h| h.doc_id).collect()
}

fn search(service: &SearchService, query: &str) -> SearchPage {
    service.search(&SearchRequest::new(query).with_page(0, 100)).unwrap()
}

#[test]
fn test_upsert_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);
    let entry = IndexEntry::new(1, "the same words twice", "md").with_tags([3]);

    service.upsert(entry.clone());
    let once = search(&service, "words");

    service.upsert(entry);
    let twice = search(&service, "words");

    assert_eq!(once, twice);
    assert_eq!(twice.total, 1);
    assert_eq!(service.stats().unwrap().num_docs, 1);
}

#[test]
fn test_upsert_replaces_old_content() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);

    service.upsert(IndexEntry::new(1, "original zebra text", "md"));
    service.upsert(IndexEntry::new(1, "rewritten giraffe text", "md"));

    assert!(search(&service, "zebra").items.is_empty());
    assert_eq!(ids(&search(&service, "giraffe")), vec![1]);
}

#[test]
fn test_delete_then_search() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);

    service.upsert(IndexEntry::new(1, "ephemeral note", "md"));
    service.upsert(IndexEntry::new(2, "ephemeral draft", "md"));
    service.delete(1);
    service.delete(12345);

    assert_eq!(ids(&search(&service, "ephemeral")), vec![2]);
    assert!(service.get(1).unwrap().is_none());
    assert_eq!(service.pending().unwrap(), 0);
}

#[test]
fn test_file_type_filter_only_returns_that_type() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);
    for i in 0..20 {
        let file_type = if i % 2 == 0 { "md" } else { "pdf" };
        service.upsert(IndexEntry::new(i, format!("budget line {}", i), file_type));
    }

    for query in ["budget", "line", "budget line"] {
        let request = SearchRequest::new(query)
            .with_page(0, 100)
            .with_filters(SearchFilters::default().file_type("pdf"));
        let page = service.search(&request).unwrap();
        assert_eq!(page.total, 10);
        assert!(page.items.iter().all(|h| h.file_type == "pdf"));
    }
}

#[test]
fn test_tag_filter_any_of() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);
    service.upsert(IndexEntry::new(1, "tagged document", "md").with_tags([1, 2]));

    let with_tags = |tags: Vec<i64>| {
        SearchRequest::new("tagged").with_filters(SearchFilters::default().tags(tags))
    };

    assert_eq!(ids(&service.search(&with_tags(vec![2, 3])).unwrap()), vec![1]);
    assert!(service.search(&with_tags(vec![5])).unwrap().items.is_empty());
}

#[test]
fn test_date_bounds_are_inclusive() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);
    // Index precision is microseconds
    let t = DateTime::from_timestamp_micros(Utc::now().timestamp_micros()).unwrap();
    service.upsert(IndexEntry::new(1, "dated entry", "md").with_created_at(t));

    let bounded = SearchRequest::new("dated")
        .with_filters(SearchFilters::default().created_from(t).created_to(t));
    assert_eq!(ids(&service.search(&bounded).unwrap()), vec![1]);

    let after = SearchRequest::new("dated")
        .with_filters(SearchFilters::default().created_from(t + Duration::microseconds(1)));
    assert!(service.search(&after).unwrap().items.is_empty());
}

#[test]
fn test_pagination_is_stable() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);
    for i in 0..40 {
        let body = format!("{} padding {}", "alpha ".repeat((i % 5 + 1) as usize), i);
        service.upsert(IndexEntry::new(i, body, "md"));
    }

    let full = service
        .search(&SearchRequest::new("alpha").with_page(0, 100))
        .unwrap();
    let page = service
        .search(&SearchRequest::new("alpha").with_page(5, 5))
        .unwrap();

    assert_eq!(ids(&page), ids(&full)[5..10].to_vec());
    assert_eq!(page.total, full.total);
}

#[test]
fn test_pagination_is_stable_with_tied_scores_beyond_window() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);
    // More equal-score matches than a (5, 5) window holds, inserted against id order
    for id in (1..=150).rev() {
        service.upsert(IndexEntry::new(id, "same words", "md"));
    }

    let full = service
        .search(&SearchRequest::new("same").with_page(0, 100))
        .unwrap();
    let page = service
        .search(&SearchRequest::new("same").with_page(5, 5))
        .unwrap();

    assert_eq!(ids(&page), ids(&full)[5..10].to_vec());
    assert_eq!(ids(&page), vec![6, 7, 8, 9, 10]);
}

#[test]
fn test_huge_skip_returns_empty_page() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);
    service.upsert(IndexEntry::new(1, "needle", "md"));

    let page = service
        .search(&SearchRequest::new("needle").with_page(1_000_000_000_000, 5))
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 1);

    let mut params = SearchParams::new("needle");
    params.skip = usize::MAX;
    let response = service.search_params(params).unwrap();
    assert!(response.items.is_empty());
}

#[test]
fn test_highlight_marks_query_term() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);
    service.upsert(IndexEntry::new(1, "well, hello there", "md"));

    let page = search(&service, "hello");
    assert!(page.items[0].highlight.contains("<mark>hello</mark>"));
}

#[test]
fn test_cjk_sub_phrase_search_and_highlight() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);
    service.upsert(IndexEntry::new(1, "我们正在开发全文搜索引擎", "md"));
    service.upsert(IndexEntry::new(2, "unrelated english text", "md"));

    let page = search(&service, "搜索");
    assert_eq!(ids(&page), vec![1]);
    assert_eq!(page.items[0].highlight, "我们正在开发全文<mark>搜索</mark>引擎");
}

#[test]
fn test_combined_filters_scenario() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);
    let now = Utc::now();

    service.upsert(
        IndexEntry::new(1, "hello world", "md")
            .with_folder(Some(10))
            .with_tags([1])
            .with_created_at(now),
    );
    service.upsert(
        IndexEntry::new(2, "hello again", "pdf")
            .with_tags([2])
            .with_created_at(now - Duration::days(2)),
    );
    service.upsert(
        IndexEntry::new(3, "goodbye world", "md")
            .with_folder(Some(10))
            .with_tags([1])
            .with_created_at(now),
    );

    let request = SearchRequest::new("hello").with_filters(
        SearchFilters::default()
            .file_type("md")
            .folder(10)
            .tags([1])
            .created_from(now - Duration::days(1)),
    );
    let page = service.search(&request).unwrap();

    assert_eq!(ids(&page), vec![1]);
    assert_eq!(page.total, 1);
}

#[test]
fn test_unmatched_tag_filter_scenario() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);
    service.upsert(IndexEntry::new(1, "hello", "md").with_tags([1]));

    let mut params = SearchParams::new("hello");
    params.tag_ids = Some("42,43".to_string());
    let response = service.search_params(params).unwrap();

    assert_eq!(response.total, 0);
    assert!(response.items.is_empty());
}

#[test]
fn test_unavailable_backend_scenario() {
    let dir = TempDir::new().unwrap();
    let mut config = SearchConfig::default();
    config.index_dir = dir.path().join("index");
    config.outbox_path = dir.path().join("outbox.sqlite");
    config.search_enabled = false;
    let service = SearchService::open(config).unwrap();

    service.upsert(IndexEntry::new(1, "hello", "md"));
    service.delete(1);

    let err = service.search(&SearchRequest::new("hello")).unwrap_err();
    assert!(matches!(err, DocSearchError::SearchUnavailable(_)));
    assert!(!dir.path().join("index").exists());
}

#[test]
fn test_invalid_caller_input_rejected_before_engine() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);

    let err = service.search_params(SearchParams::new("   ")).unwrap_err();
    assert!(matches!(err, DocSearchError::InvalidQuery(_)));

    let mut params = SearchParams::new("hello");
    params.tag_ids = Some("1,x".into());
    let err = service.search_params(params).unwrap_err();
    assert!(matches!(err, DocSearchError::InvalidFilterValue(_)));
}
