//! Unit tests for registry client

use super::*;
use crate::resource::{
    FindPackageByIdResource, PackageMetadataResource, PackageSearchResource, SearchFilter,
};
use nuget_core::types::{PackageIdentity, TargetFramework, Version};

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_options() -> ClientOptions {
    ClientOptions {
        retry: RetryConfig {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        },
        ..ClientOptions::default()
    }
}

fn client_for(server: &MockServer) -> RegistryClient {
    RegistryClient::with_options(&format!("{}/v3/index.json", server.uri()), fast_options()).unwrap()
}

async fn mount_service_index(server: &MockServer) {
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path("/v3/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "3.0.0",
            "resources": [
                { "@id": format!("{uri}/reg/"), "@type": "RegistrationsBaseUrl/3.6.0" },
                { "@id": format!("{uri}/flat/"), "@type": "PackageBaseAddress/3.0.0" },
                { "@id": format!("{uri}/query"), "@type": "SearchQueryService/3.5.0" }
            ]
        })))
        .mount(server)
        .await;
}

fn catalog_entry(id: &str, version: &str) -> serde_json::Value {
    json!({
        "id": id,
        "version": version,
        "authors": "Byte Development",
        "dependencyGroups": [
            {
                "targetFramework": ".NETStandard2.0",
                "dependencies": [ { "id": "ByteDev.Encoding", "range": "[1.0.0, )" } ]
            }
        ]
    })
}

#[tokio::test]
async fn test_registry_client_creation() {
    let client = RegistryClient::new().unwrap();
    assert_eq!(client.source().as_str(), NUGET_ORG_V3);
    assert_eq!(client.retry_config.max_retries, 3);
}

#[tokio::test]
async fn test_registry_client_with_auth() {
    let auth = AuthConfig {
        token: Some("test-token".to_string()),
        ..AuthConfig::default()
    };

    let client = RegistryClient::with_auth(NUGET_ORG_V3, auth).unwrap();
    assert_eq!(client.source().as_str(), NUGET_ORG_V3);
}

#[tokio::test]
async fn test_invalid_source_is_config_error() {
    let result = RegistryClient::with_source("not a url");
    assert!(matches!(result, Err(NugetError::Config { .. })));
}

#[tokio::test]
async fn test_retry_config_default() {
    let config = RetryConfig::default();
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.initial_delay, Duration::from_millis(100));
    assert_eq!(config.max_delay, Duration::from_secs(10));
    assert_eq!(config.multiplier, 2.0);
}

#[tokio::test]
async fn test_service_index_is_fetched_once() {
    let server = MockServer::start().await;
    let uri = server.uri();
    Mock::given(method("GET"))
        .and(path("/v3/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "3.0.0",
            "resources": [ { "@id": format!("{uri}/flat/"), "@type": "PackageBaseAddress/3.0.0" } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();

    let first = client.find_by_id_resource(&cancel).await.unwrap();
    let second = client.clone().find_by_id_resource(&cancel).await.unwrap();
    assert_eq!(first.base_url(), format!("{uri}/flat"));
    assert_eq!(second.base_url(), first.base_url());
}

#[tokio::test]
async fn test_missing_resource_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "3.0.0",
            "resources": []
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.search_resource(&CancellationToken::new()).await;
    assert!(matches!(result, Err(NugetError::Protocol { .. })));
}

#[tokio::test]
async fn test_unsupported_service_index_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "2.0.0",
            "resources": []
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.service_index(&CancellationToken::new()).await;
    assert!(matches!(result, Err(NugetError::Protocol { .. })));
}

#[tokio::test]
async fn test_get_metadata_with_inline_and_remote_pages() {
    let server = MockServer::start().await;
    mount_service_index(&server).await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/reg/bytedev.crypto/index.json"))
        .and(header("Cache-Control", "no-cache"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "items": [
                {
                    "@id": format!("{uri}/reg/bytedev.crypto/index.json#page/1.0.0/4.0.0"),
                    "lower": "1.0.0",
                    "upper": "4.0.0",
                    "items": [
                        { "catalogEntry": catalog_entry("ByteDev.Crypto", "1.0.0") },
                        { "catalogEntry": catalog_entry("ByteDev.Crypto", "4.0.0-beta") }
                    ]
                },
                {
                    "@id": format!("{uri}/reg/bytedev.crypto/page/5.0.0/5.0.2.json"),
                    "lower": "5.0.0",
                    "upper": "5.0.2"
                }
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/reg/bytedev.crypto/page/5.0.0/5.0.2.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@id": format!("{uri}/reg/bytedev.crypto/page/5.0.0/5.0.2.json"),
            "lower": "5.0.0",
            "upper": "5.0.2",
            "items": [ { "catalogEntry": catalog_entry("ByteDev.Crypto", "5.0.2") } ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    let resource = client.metadata_resource(&cancel).await.unwrap();
    let cache = SourceCacheContext::for_request();

    let all = resource
        .get_metadata("ByteDev.Crypto", true, true, &cache, &cancel)
        .await
        .unwrap();
    let versions: Vec<String> = all.iter().map(|m| m.version().to_string()).collect();
    assert_eq!(versions, vec!["1.0.0", "4.0.0-beta", "5.0.2"]);

    let stable = resource
        .get_metadata("ByteDev.Crypto", false, true, &cache, &cancel)
        .await
        .unwrap();
    assert_eq!(stable.len(), 2);

    let latest = &all[2];
    assert_eq!(latest.authors, vec!["Byte Development"]);
    let standard = TargetFramework::standard("2.0").unwrap();
    assert_eq!(latest.dependency_groups_for(&standard).count(), 1);
}

#[tokio::test]
async fn test_get_metadata_unknown_id_is_empty() {
    let server = MockServer::start().await;
    mount_service_index(&server).await;

    Mock::given(method("GET"))
        .and(path("/reg/notexist/index.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    let resource = client.metadata_resource(&cancel).await.unwrap();

    let result = resource
        .get_metadata("NotExist", true, true, &SourceCacheContext::for_request(), &cancel)
        .await
        .unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_get_metadata_for_identity_skips_unrelated_pages() {
    let server = MockServer::start().await;
    mount_service_index(&server).await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/reg/moq/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "items": [
                {
                    "@id": format!("{uri}/reg/moq/page/1.0.0/3.0.0.json"),
                    "lower": "1.0.0",
                    "upper": "3.0.0"
                },
                {
                    "@id": format!("{uri}/reg/moq/index.json#page/4.0.0/4.14.5"),
                    "lower": "4.0.0",
                    "upper": "4.14.5",
                    "items": [ { "catalogEntry": catalog_entry("Moq", "4.14.5") } ]
                }
            ]
        })))
        .mount(&server)
        .await;

    // The first page must never be requested for 4.14.5
    Mock::given(method("GET"))
        .and(path("/reg/moq/page/1.0.0/3.0.0.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    let resource = client.metadata_resource(&cancel).await.unwrap();
    let cache = SourceCacheContext::for_request();

    let found = resource
        .get_metadata_for(&PackageIdentity::parse("Moq", "4.14.5").unwrap(), &cache, &cancel)
        .await
        .unwrap();
    assert_eq!(found.unwrap().identity.to_string(), "Moq.4.14.5");

    let missing = resource
        .get_metadata_for(&PackageIdentity::parse("Moq", "4.14.6").unwrap(), &cache, &cancel)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_versions_and_existence() {
    let server = MockServer::start().await;
    mount_service_index(&server).await;

    Mock::given(method("GET"))
        .and(path("/flat/bytedev.dotnet/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "versions": ["1.0.0", "2.3.0", "2.3.1", "not-a-version"]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flat/notexist/index.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    let resource = client.find_by_id_resource(&cancel).await.unwrap();
    let cache = SourceCacheContext::for_request();

    let versions = resource
        .get_all_versions("ByteDev.DotNet", &cache, &cancel)
        .await
        .unwrap();
    assert_eq!(versions.len(), 3);

    assert!(resource
        .does_package_exist("ByteDev.DotNet", &Version::new(2, 3, 1), &cache, &cancel)
        .await
        .unwrap());
    assert!(!resource
        .does_package_exist("ByteDev.DotNet", &Version::new(9, 0, 0), &cache, &cancel)
        .await
        .unwrap());
    assert!(resource
        .get_all_versions("NotExist", &cache, &cancel)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_copy_nupkg_streams_archive() {
    let server = MockServer::start().await;
    mount_service_index(&server).await;

    let archive: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
    Mock::given(method("GET"))
        .and(path("/flat/bytedev.testing.nunit/1.1.0/bytedev.testing.nunit.1.1.0.nupkg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive.clone()))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    let resource = client.find_by_id_resource(&cancel).await.unwrap();

    let mut buffer = Vec::new();
    resource
        .copy_nupkg_to_writer(
            "ByteDev.Testing.NUnit",
            &Version::new(1, 1, 0),
            &mut buffer,
            &SourceCacheContext::for_request(),
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(buffer, archive);
}

#[tokio::test]
async fn test_copy_nupkg_missing_writes_nothing() {
    let server = MockServer::start().await;
    mount_service_index(&server).await;

    Mock::given(method("GET"))
        .and(path("/flat/notexist/1.1.0/notexist.1.1.0.nupkg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    let resource = client.find_by_id_resource(&cancel).await.unwrap();

    let mut buffer = Vec::new();
    resource
        .copy_nupkg_to_writer(
            "NotExist",
            &Version::new(1, 1, 0),
            &mut buffer,
            &SourceCacheContext::for_request(),
            &cancel,
        )
        .await
        .unwrap();
    assert!(buffer.is_empty());
}

#[tokio::test]
async fn test_search_forwards_paging_and_prerelease() {
    let server = MockServer::start().await;
    mount_service_index(&server).await;

    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("q", "bytedev"))
        .and(query_param("skip", "10"))
        .and(query_param("take", "5"))
        .and(query_param("prerelease", "true"))
        .and(query_param("semVerLevel", "2.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalHits": 2,
            "data": [
                { "id": "ByteDev.Strings", "version": "4.1.0", "authors": ["Byte Development"] },
                { "id": "ByteDev.Crypto", "version": "5.0.2", "authors": "Byte Development" }
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    let resource = client.search_resource(&cancel).await.unwrap();

    let results = resource
        .search("bytedev", SearchFilter::new(true), 10, 5, &cancel)
        .await
        .unwrap();
    let ids: Vec<&str> = results.iter().map(|m| m.id()).collect();
    assert_eq!(ids, vec!["ByteDev.Strings", "ByteDev.Crypto"]);
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    mount_service_index(&server).await;

    Mock::given(method("GET"))
        .and(path("/flat/flaky/index.json"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flat/flaky/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "versions": ["1.0.0"] })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    let resource = client.find_by_id_resource(&cancel).await.unwrap();

    let versions = resource
        .get_all_versions("Flaky", &SourceCacheContext::for_request(), &cancel)
        .await
        .unwrap();
    assert_eq!(versions, vec![Version::new(1, 0, 0)]);
}

#[tokio::test]
async fn test_retries_give_up_with_network_error() {
    let server = MockServer::start().await;
    mount_service_index(&server).await;

    Mock::given(method("GET"))
        .and(path("/flat/down/index.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    let resource = client.find_by_id_resource(&cancel).await.unwrap();

    let result = resource
        .get_all_versions("Down", &SourceCacheContext::for_request(), &cancel)
        .await;
    assert!(matches!(result, Err(NugetError::Network { .. })));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    mount_service_index(&server).await;

    Mock::given(method("GET"))
        .and(path("/flat/forbidden/index.json"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flat/garbled/index.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    let resource = client.find_by_id_resource(&cancel).await.unwrap();
    let cache = SourceCacheContext::for_request();

    let forbidden = resource.get_all_versions("Forbidden", &cache, &cancel).await;
    assert!(matches!(forbidden, Err(NugetError::Protocol { .. })));

    let garbled = resource.get_all_versions("Garbled", &cache, &cancel).await;
    assert!(matches!(garbled, Err(NugetError::Protocol { .. })));
}

#[tokio::test]
async fn test_cancelled_token_stops_before_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = client.metadata_resource(&cancel).await;
    assert!(matches!(result, Err(NugetError::Cancelled)));
}

#[tokio::test]
async fn test_cancellation_interrupts_slow_request() {
    let server = MockServer::start().await;
    mount_service_index(&server).await;

    Mock::given(method("GET"))
        .and(path("/flat/slow/index.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "versions": ["1.0.0"] }))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cancel = CancellationToken::new();
    let resource = client.find_by_id_resource(&cancel).await.unwrap();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = resource
        .get_all_versions("Slow", &SourceCacheContext::for_request(), &cancel)
        .await;
    assert!(matches!(result, Err(NugetError::Cancelled)));
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/index.json"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "3.0.0",
            "resources": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = RegistryClient::with_options(
        &format!("{}/v3/index.json", server.uri()),
        ClientOptions {
            auth: Some(AuthConfig {
                token: Some("secret".to_string()),
                ..AuthConfig::default()
            }),
            ..fast_options()
        },
    )
    .unwrap();

    let index = client.service_index(&CancellationToken::new()).await.unwrap();
    assert!(index.resources.is_empty());
}
