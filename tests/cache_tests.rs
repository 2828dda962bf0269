//! Integration tests for the response cache.

use std::time::Duration;

use pretty_assertions::assert_eq;

use assist_gemini::cache::{request_cache_key, ResponseCache};
use assist_gemini::types::{ChatMessage, ChatRequest, ChatResponse};
use assist_gemini::CacheConfig;

fn response(text: &str) -> ChatResponse {
    ChatResponse {
        text: text.to_string(),
        model: "gemini-1.5-flash".to_string(),
        usage: None,
        finish_reason: None,
    }
}

#[test]
fn test_set_then_get_round_trip() {
    let cache = ResponseCache::new(CacheConfig {
        ttl: Duration::from_secs(60),
        max_size: 8,
    });
    let request = ChatRequest::user_message("gemini-1.5-flash", "what is ownership?");
    let key = request_cache_key(&request);

    cache.insert(key, response("a move semantics story"));
    let hit = cache.get(key).unwrap();
    assert_eq!(hit.text, "a move semantics story");
}

#[test]
fn test_entry_expires_after_ttl() {
    let cache = ResponseCache::new(CacheConfig {
        ttl: Duration::from_millis(15),
        max_size: 8,
    });
    cache.insert(1, response("short-lived"));

    assert!(cache.get(1).is_some());
    std::thread::sleep(Duration::from_millis(25));
    assert!(cache.get(1).is_none());
}

#[test]
fn test_capacity_eviction_is_lru() {
    let cache = ResponseCache::new(CacheConfig {
        ttl: Duration::from_secs(60),
        max_size: 2,
    });
    cache.insert(1, response("one"));
    cache.insert(2, response("two"));

    // Refresh 1; inserting 3 must evict 2.
    let _ = cache.get(1);
    cache.insert(3, response("three"));

    assert!(cache.get(1).is_some());
    assert!(cache.get(2).is_none());
    assert!(cache.get(3).is_some());
}

#[test]
fn test_identical_turns_share_a_key() {
    let a = ChatRequest {
        model: "gemini-1.5-flash".into(),
        messages: vec![
            ChatMessage::user("explain lifetimes"),
            ChatMessage::assistant("they bound borrows"),
            ChatMessage::user("more detail please"),
        ],
        temperature: Some(0.4),
        max_tokens: Some(512),
        top_p: None,
        top_k: None,
        system_instruction: Some("be brief".into()),
        stream: false,
    };
    let b = a.clone();

    assert_eq!(request_cache_key(&a), request_cache_key(&b));
}

#[test]
fn test_key_excludes_the_stream_flag() {
    // The stream flag is delivery, not semantics; a streaming and a
    // non-streaming rendition of the same turn share a key (streaming
    // calls simply never consult the cache).
    let mut a = ChatRequest::user_message("gemini-1.5-flash", "hello");
    let mut b = a.clone();
    a.stream = false;
    b.stream = true;

    assert_eq!(request_cache_key(&a), request_cache_key(&b));
}

#[test]
fn test_key_varies_with_sampling_params() {
    let base = ChatRequest::user_message("gemini-1.5-flash", "hello");

    let mut hotter = base.clone();
    hotter.temperature = Some(1.0);
    assert_ne!(request_cache_key(&base), request_cache_key(&hotter));

    let mut capped = base.clone();
    capped.max_tokens = Some(64);
    assert_ne!(request_cache_key(&base), request_cache_key(&capped));
}

#[test]
fn test_stats_track_hits_misses_evictions() {
    let cache = ResponseCache::new(CacheConfig {
        ttl: Duration::from_secs(60),
        max_size: 1,
    });

    cache.insert(1, response("one"));
    let _ = cache.get(1); // hit
    let _ = cache.get(9); // miss
    cache.insert(2, response("two")); // evicts 1

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.evictions, 1);
    assert_eq!(stats.len, 1);
    assert_eq!(stats.max_size, 1);
}
