//! Tests for the scrobble client.
//!
//! These tests use mock servers to verify client behavior without
//! requiring a real server connection.

use aria_core::{AriaError, ScrobbleReport, ScrobbleSink, ScrobbleType, TrackId};
use aria_server_client::{ScrobbleClient, ScrobbleEndpointConfig, ServerClientError};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn report(scrobble_type: ScrobbleType) -> ScrobbleReport {
    ScrobbleReport {
        song_id: TrackId::new("song-1"),
        player_name: "aria".to_string(),
        timestamp: 1_700_000_000_000,
        scrobble_type,
        played_duration: 11_000,
    }
}

// =============================================================================
// Client Creation Tests
// =============================================================================

mod client_creation {
    use super::*;

    #[test]
    fn test_valid_https_url() {
        let client = ScrobbleClient::new(ScrobbleEndpointConfig::new("https://example.com/"));
        assert_eq!(
            client.unwrap().endpoint(),
            "https://example.com/api/scrobble"
        );
    }

    #[test]
    fn test_empty_url_rejected() {
        match ScrobbleClient::new(ScrobbleEndpointConfig::new("")) {
            Err(ServerClientError::InvalidUrl(msg)) => assert!(msg.contains("empty")),
            other => panic!("Expected InvalidUrl error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let result = ScrobbleClient::new(ScrobbleEndpointConfig::new("ftp://example.com"));
        assert!(matches!(result, Err(ServerClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_with_token() {
        let config = ScrobbleEndpointConfig::with_token("https://example.com", "tok");
        assert_eq!(config.access_token.as_deref(), Some("tok"));
        assert_eq!(config.timeout_secs, 10);
    }
}

// =============================================================================
// Submission Tests
// =============================================================================

mod submission {
    use super::*;

    #[tokio::test]
    async fn test_posts_report_with_wire_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/scrobble"))
            .and(body_json(json!({
                "songId": "song-1",
                "playerName": "aria",
                "timestamp": 1_700_000_000_000_i64,
                "scrobbleType": "nowPlaying",
                "playedDuration": 11_000,
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = ScrobbleClient::new(ScrobbleEndpointConfig::new(server.uri())).unwrap();
        client
            .submit_report(&report(ScrobbleType::NowPlaying))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/scrobble"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            ScrobbleClient::new(ScrobbleEndpointConfig::with_token(server.uri(), "secret")).unwrap();
        client.submit_report(&report(ScrobbleType::Played)).await.unwrap();
    }

    #[tokio::test]
    async fn test_server_error_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "db down"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = ScrobbleClient::new(ScrobbleEndpointConfig::new(server.uri())).unwrap();
        match client.submit_report(&report(ScrobbleType::Played)).await {
            Err(ServerClientError::ServerError { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "db down");
            }
            other => panic!("Expected ServerError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let client = ScrobbleClient::new(ScrobbleEndpointConfig::new(server.uri())).unwrap();
        let result = client.submit_report(&report(ScrobbleType::Played)).await;
        assert!(matches!(result, Err(ServerClientError::AuthFailed(msg)) if msg == "bad token"));
    }

    #[tokio::test]
    async fn test_rate_limit_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
            .mount(&server)
            .await;

        let client = ScrobbleClient::new(ScrobbleEndpointConfig::new(server.uri())).unwrap();
        let result = client.submit_report(&report(ScrobbleType::Played)).await;
        assert!(matches!(
            result,
            Err(ServerClientError::RateLimited {
                retry_after_secs: 30
            })
        ));
    }

    #[tokio::test]
    async fn test_no_retry_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = ScrobbleClient::new(ScrobbleEndpointConfig::new(server.uri())).unwrap();
        assert!(client.submit_report(&report(ScrobbleType::Played)).await.is_err());
    }
}

// =============================================================================
// Sink Seam Tests
// =============================================================================

mod sink {
    use super::*;

    #[tokio::test]
    async fn test_sink_maps_errors_to_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = ScrobbleClient::new(ScrobbleEndpointConfig::new(server.uri())).unwrap();
        let sink: &dyn ScrobbleSink = &client;
        let result = sink.submit(&report(ScrobbleType::NowPlaying)).await;
        assert!(matches!(result, Err(AriaError::Network(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        // Nothing listens on port 9 (discard) in the test environment
        let client =
            ScrobbleClient::new(ScrobbleEndpointConfig::new("http://127.0.0.1:9")).unwrap();
        let result = client.submit_report(&report(ScrobbleType::Played)).await;
        assert!(matches!(
            result,
            Err(ServerClientError::ServerUnreachable(_) | ServerClientError::Request(_))
        ));
    }
}
