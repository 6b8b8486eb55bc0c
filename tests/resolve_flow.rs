//! End-to-end stream resolution against a mock first-party API and a mock
//! delivery platform.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use playkey::config::{ApiConfig, ProviderConfig, ServiceConfig};
use playkey::stream::ManifestKind;
use playkey::{Category, KeyType, PlayError, SessionClient, StreamProvider, StreamResolver};

fn resolver(server: &MockServer) -> StreamResolver {
    let config = ServiceConfig {
        api: ApiConfig {
            base_url: server.uri(),
            api_key: "k-1".into(),
            ..ApiConfig::default()
        },
        provider: ProviderConfig {
            session_url: format!("{}/mcp/video/{{video_id}}", server.uri()),
            mcp_id: "mcp-7".into(),
            ..ProviderConfig::default()
        },
        ..ServiceConfig::default()
    };
    let client = SessionClient::new(&config.http, None).unwrap();
    StreamResolver::new(&config, client)
}

fn video_config(category_fields: serde_json::Value) -> serde_json::Value {
    let mut config = json!({
        "title": "Pilot",
        "streams": [
            {"type": "clear-hls", "url": "https://cdn.test/clear.m3u8"},
            {"type": "anvato", "video_id": "v-9", "access_key": "ak", "token": "stk"}
        ]
    });
    if let (Some(target), Some(extra)) = (config.as_object_mut(), category_fields.as_object()) {
        for (k, v) in extra {
            target.insert(k.clone(), v.clone());
        }
    }
    config
}

async fn mount_config(server: &MockServer, category: &str, id: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/{category}/{id}/videoconfig")))
        .and(header("x-api-key", "k-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_session(server: &MockServer, embed_path: &str, expected_calls: u64) {
    let body = format!(
        r#"anvatoVideoJSONLoaded({{"published_urls":[{{"embed_url":"{}{embed_path}","license_url":"L1"}}]}})"#,
        server.uri()
    );
    Mock::given(method("POST"))
        .and(path("/mcp/video/v-9"))
        .and(query_param("anvack", "ak"))
        .and(query_param("rtyp", "fp"))
        .and(body_partial_json(json!({
            "api": {"anvstk2": "stk"},
            "content": {"mcp_video_id": "v-9", "mcp_id": "mcp-7"}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "cdn_auth=t1; Path=/")
                .set_body_string(body),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_manifest(server: &MockServer, embed_path: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(embed_path))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn episode_resolves_through_xml_location() {
    let server = MockServer::start().await;
    mount_config(
        &server,
        "episodes",
        "ep-123",
        video_config(json!({"program": {"title": "The Show"}, "duration": 1805})),
    )
    .await;
    mount_session(&server, "/embed/u1", 1).await;
    mount_manifest(
        &server,
        "/embed/u1",
        ResponseTemplate::new(200)
            .set_body_string("<MPD><Location>https://cdn.test/final.mpd</Location></MPD>"),
    )
    .await;

    let stream = resolver(&server)
        .resolve(Category::Episodes, "ep-123")
        .await
        .unwrap();

    assert_eq!(stream.program_title.as_deref(), Some("The Show"));
    assert_eq!(stream.title, "Pilot");
    assert_eq!(stream.duration_seconds, Some(1805));
    assert_eq!(stream.manifest_url, "https://cdn.test/final.mpd");
    assert_eq!(stream.license_url, "L1");
    assert_eq!(stream.manifest_kind(), ManifestKind::Dash);
    assert_eq!(
        stream.license_key(KeyType::R, &[], None).unwrap(),
        "L1||R{SSM}|"
    );
}

#[tokio::test]
async fn movie_resolves_through_master_playlist() {
    let server = MockServer::start().await;
    mount_config(
        &server,
        "movies",
        "m-1",
        video_config(json!({"program": {"title": "ignored"}, "duration": "5400"})),
    )
    .await;
    mount_session(&server, "/embed/u2", 1).await;
    mount_manifest(
        &server,
        "/embed/u2",
        ResponseTemplate::new(200).set_body_json(json!({"master_m3u8": "https://cdn.test/final.m3u8"})),
    )
    .await;

    let stream = resolver(&server).resolve(Category::Movies, "m-1").await.unwrap();

    assert_eq!(stream.program_title, None);
    assert_eq!(stream.duration_seconds, Some(5400));
    assert_eq!(stream.manifest_url, "https://cdn.test/final.m3u8");
    assert_eq!(stream.manifest_kind(), ManifestKind::Hls);
}

#[tokio::test]
async fn channel_keeps_final_manifest_and_cookies() {
    let server = MockServer::start().await;
    mount_config(&server, "channels", "ch-1", video_config(json!({"duration": 60}))).await;
    mount_session(&server, "/live/ch.m3u8", 1).await;
    mount_manifest(
        &server,
        "/live/ch.m3u8",
        ResponseTemplate::new(200).set_body_string("#EXTM3U\n#EXT-X-VERSION:3\n"),
    )
    .await;

    let stream = resolver(&server)
        .resolve(Category::Channels, "ch-1")
        .await
        .unwrap();

    assert_eq!(stream.manifest_url, format!("{}/live/ch.m3u8", server.uri()));
    assert_eq!(stream.duration_seconds, None);
    assert_eq!(stream.session_cookies.as_deref(), Some("cdn_auth=t1"));
}

#[tokio::test]
async fn missing_provider_stops_before_session() {
    let server = MockServer::start().await;
    mount_config(
        &server,
        "episodes",
        "ep-123",
        json!({"title": "Pilot", "streams": [{"type": "clear-hls"}]}),
    )
    .await;
    mount_session(&server, "/embed/u1", 0).await;

    let result = resolver(&server).resolve(Category::Episodes, "ep-123").await;
    match result {
        Err(PlayError::Protocol(detail)) => assert_eq!(detail, "no handleable stream"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn forbidden_config_is_geoblocked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/movies/m-1/videoconfig"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = resolver(&server).resolve(Category::Movies, "m-1").await;
    assert!(matches!(result, Err(PlayError::Geoblocked)));
}

#[tokio::test]
async fn missing_session_is_unavailable() {
    let server = MockServer::start().await;
    mount_config(&server, "movies", "m-1", video_config(json!({}))).await;
    Mock::given(method("POST"))
        .and(path("/mcp/video/v-9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = resolver(&server).resolve(Category::Movies, "m-1").await;
    assert!(matches!(result, Err(PlayError::Unavailable)));
}

#[tokio::test]
async fn geo_flag_in_session_body_is_geoblocked() {
    let server = MockServer::start().await;
    mount_config(&server, "movies", "m-1", video_config(json!({}))).await;
    Mock::given(method("POST"))
        .and(path("/mcp/video/v-9"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"anvatoVideoJSONLoaded({"published_urls":[],"error":"Content is geo-restricted"})"#,
        ))
        .mount(&server)
        .await;

    let result = resolver(&server).resolve(Category::Movies, "m-1").await;
    assert!(matches!(result, Err(PlayError::Geoblocked)));
}

#[tokio::test]
async fn manifest_server_error_is_protocol_error() {
    let server = MockServer::start().await;
    mount_config(&server, "movies", "m-1", video_config(json!({}))).await;
    mount_session(&server, "/embed/u3", 1).await;
    mount_manifest(&server, "/embed/u3", ResponseTemplate::new(502)).await;

    let result = resolver(&server).resolve(Category::Movies, "m-1").await;
    match result {
        Err(PlayError::Protocol(detail)) => assert_eq!(detail, "manifest returned HTTP 502"),
        other => panic!("unexpected: {other:?}"),
    }
}
