use std::time::Duration;

use profile_cache::history::identity_by_name;
use profile_cache::{
    CacheConfig, HttpResolver, LocalResolver, Lookup, Profile,
    ProfileManager, ProfileQuery, ProfileResolver, ResolveError,
    ResolvedIdentity,
};
use serde_json::json;
use tempdir::TempDir;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NOTCH: &str = "069a79f4-44e9-4726-a5be-fca90e38aaf5";
const NOTCH_SIMPLE: &str = "069a79f444e94726a5befca90e38aaf5";

fn notch_id() -> Uuid {
    Uuid::parse_str(NOTCH).unwrap()
}

fn resolver(uri: &str) -> HttpResolver {
    HttpResolver::new(uri, "minecraft", Duration::from_secs(2)).unwrap()
}

// The blocking client must not live on an async worker thread.
async fn resolve(uri: String, query: ProfileQuery) -> Lookup {
    tokio::task::spawn_blocking(move || resolver(&uri).resolve(&query))
        .await
        .unwrap()
}

async fn mount_notch(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/users/profiles/minecraft/Notch"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": NOTCH_SIMPLE, "name": "Notch" })),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/user/profiles/{}/names", NOTCH_SIMPLE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "Notch_old" },
            { "name": "Notch", "changedToAt": 1423045892000i64 }
        ])))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn resolves_by_name() {
    let server = MockServer::start().await;
    mount_notch(&server).await;

    let profile = resolve(server.uri(), ProfileQuery::Name("Notch".into()))
        .await
        .unwrap();
    assert_eq!(profile.id, notch_id());
    assert_eq!(profile.name, "Notch");
}

#[tokio::test(flavor = "multi_thread")]
async fn resolves_by_identifier_to_latest_name() {
    let server = MockServer::start().await;
    mount_notch(&server).await;

    let profile = resolve(server.uri(), ProfileQuery::Id(notch_id()))
        .await
        .unwrap();
    assert_eq!(profile, Profile::new(notch_id(), "Notch"));
    assert_eq!(profile.name, "Notch");
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_identities_are_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/profiles/minecraft/nobody"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/profiles/minecraft/blank"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    for name in ["nobody", "blank", "unmounted"] {
        let result = resolve(server.uri(), ProfileQuery::Name(name.into()))
            .await;
        assert!(
            result.as_ref().unwrap_err().is_not_found(),
            "{}: {:?}",
            name,
            result
        );
    }

    let history = resolve(server.uri(), ProfileQuery::Id(Uuid::nil())).await;
    assert!(history.unwrap_err().is_not_found());
}

#[tokio::test(flavor = "multi_thread")]
async fn garbage_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/profiles/minecraft/garbage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/profiles/minecraft/badid"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "xyz", "name": "badid" })),
        )
        .mount(&server)
        .await;

    for name in ["garbage", "badid"] {
        let result =
            resolve(server.uri(), ProfileQuery::Name(name.into())).await;
        assert!(matches!(result, Err(ResolveError::MalformedResponse(_))));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn server_errors_and_dead_hosts_are_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let throttled =
        resolve(server.uri(), ProfileQuery::Name("Notch".into())).await;
    assert!(matches!(throttled, Err(ResolveError::Unreachable(_))));

    let dead = resolve(
        "http://127.0.0.1:1".to_owned(),
        ProfileQuery::Name("Notch".into()),
    )
    .await;
    assert!(matches!(dead, Err(ResolveError::Unreachable(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn name_history_of_current_holder() {
    let server = MockServer::start().await;
    mount_notch(&server).await;

    let uri = server.uri();
    let identity: ResolvedIdentity = tokio::task::spawn_blocking(move || {
        identity_by_name(&resolver(&uri), "Notch")
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(identity.id, notch_id());
    assert_eq!(identity.names.len(), 2);
    assert_eq!(identity.names[0].changed_to_at, None);
    assert_eq!(identity.current_name(), Some("Notch"));
}

#[tokio::test(flavor = "multi_thread")]
async fn local_source_is_consulted_before_the_service() {
    let server = MockServer::start().await;
    mount_notch(&server).await;

    let uri = server.uri();
    let (session_hit, remote_hit, requests) =
        tokio::task::spawn_blocking(move || {
            let dir = TempDir::new("local_first").unwrap();
            let config = CacheConfig {
                cache_file: dir.path().join("cache.json"),
                api_base_url: uri,
                ..CacheConfig::default()
            };
            let local: LocalResolver =
                [Profile::new(Uuid::from_u128(1), "Steve")]
                    .into_iter()
                    .collect();
            let manager =
                ProfileManager::with_local_source(&config, local).unwrap();

            (
                manager.get_by_name("steve"),
                manager.get_by_string(NOTCH_SIMPLE),
                manager.cache().len(),
            )
        })
        .await
        .unwrap();

    assert_eq!(session_hit.unwrap().id, Uuid::from_u128(1));
    assert_eq!(remote_hit.unwrap().name, "Notch");
    assert_eq!(requests, 2);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
}
