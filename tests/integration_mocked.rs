/// Integration tests with a mocked hosted backend
/// Tests the REST profile store and the complete migration run without hitting the real service
use client_profile_migrator::migrator::{MigrationOptions, Migrator, RunMode};
use client_profile_migrator::models::ExtractedProfile;
use client_profile_migrator::rest_client::RestProfileStore;
use client_profile_migrator::sink::{InsertOutcome, ProfileSink};
use client_profile_migrator::transform::transform_client_profile;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERVICE_KEY: &str = "test_service_key";

/// Helper function to create a store pointing at the mock server
fn create_test_store(server: &MockServer) -> RestProfileStore {
    RestProfileStore::new(
        server.uri(),
        SERVICE_KEY.to_string(),
        Duration::from_secs(5),
    )
    .expect("client should build")
}

fn acme_profile() -> ExtractedProfile {
    ExtractedProfile {
        company_name: "Acme".to_string(),
        website: Some("https://acme.test".to_string()),
        duns_number: None,
        industry: None,
        organisation_type: None,
        country: Some("US".to_string()),
        postal_code: Some("10001".to_string()),
        address1: None,
        address2: None,
        address3: None,
        phone: Some("555-1111".to_string()),
    }
}

async fn mount_user(server: &MockServer, email: &str, user_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", format!("eq.{}", email)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "id": user_id }])),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_user_lookup_found() {
    let mock_server = MockServer::start().await;
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("select", "id"))
        .and(query_param("email", "eq.ops+billing@acme.test"))
        .and(header("apikey", SERVICE_KEY))
        .and(header("Authorization", format!("Bearer {}", SERVICE_KEY).as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "id": user_id }])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = create_test_store(&mock_server);
    let result = store.find_user_id("ops+billing@acme.test").await.unwrap();

    assert_eq!(result, Some(user_id));
}

#[tokio::test]
async fn test_user_lookup_not_found() {
    let mock_server = MockServer::start().await;

    // Empty array = not found
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let store = create_test_store(&mock_server);
    let result = store.find_user_id("nobody@acme.test").await.unwrap();

    assert_eq!(result, None);
}

#[tokio::test]
async fn test_user_lookup_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let store = create_test_store(&mock_server);
    let err = store.find_user_id("ops@acme.test").await.unwrap_err();

    assert!(err.to_string().contains("500"));
    assert!(err.to_string().contains("boom"));
}

#[tokio::test]
async fn test_insert_profile_success() {
    let mock_server = MockServer::start().await;
    let user_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/client_profiles"))
        .and(header("Prefer", "return=representation"))
        .and(body_partial_json(serde_json::json!({
            "user_id": user_id,
            "company_name": "Acme",
            "phone": "555-1111",
            "description": null,
            "logo_url": null
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(serde_json::json!([{ "user_id": user_id, "company_name": "Acme" }])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = create_test_store(&mock_server);
    let row = transform_client_profile(user_id, &acme_profile());
    let outcome = store.insert_profile(&row).await.unwrap();

    assert_eq!(outcome, InsertOutcome::Inserted);
}

#[tokio::test]
async fn test_insert_profile_duplicate_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/client_profiles"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "code": "23505",
            "details": "Key (user_id) already exists.",
            "hint": null,
            "message": "duplicate key value violates unique constraint \"client_profiles_user_id_key\""
        })))
        .mount(&mock_server)
        .await;

    let store = create_test_store(&mock_server);
    let row = transform_client_profile(Uuid::new_v4(), &acme_profile());
    let outcome = store.insert_profile(&row).await.unwrap();

    assert_eq!(outcome, InsertOutcome::AlreadyExists);
}

#[tokio::test]
async fn test_insert_profile_other_conflict_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/client_profiles"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "code": "23503",
            "message": "insert or update on table \"client_profiles\" violates foreign key constraint"
        })))
        .mount(&mock_server)
        .await;

    let store = create_test_store(&mock_server);
    let row = transform_client_profile(Uuid::new_v4(), &acme_profile());
    let err = store.insert_profile(&row).await.unwrap_err();

    assert!(err.to_string().contains("foreign key"));
}

#[tokio::test]
async fn test_insert_profile_no_data_returned() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/client_profiles"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let store = create_test_store(&mock_server);
    let row = transform_client_profile(Uuid::new_v4(), &acme_profile());
    let outcome = store.insert_profile(&row).await.unwrap();

    assert_eq!(outcome, InsertOutcome::NoDataReturned);
}

const EXPORT: &str = r#"Id,EmailAddress,FirstName,PublicData,PrivateData,ProtectedData
10,plain@acme.test,Pat,"{""displayName"": ""Pat""}",,
11,ops@acme.test,Ops,"{""companyProfile"": {""companyName"": ""Acme""}, ""address"": {""city"": ""New York"", ""country"": ""US""}}","{""phoneNumber"": ""555-1111""}","{""phoneNumber"": ""555-2222""}"
12,dupe@acme.test,Dee,"{""companyProfile"": {""companyName"": ""Dupe Inc""}}",not json,
13,ghost@acme.test,Gus,"{""companyProfile"": {""companyName"": ""Ghost Co""}}",,
"#;

#[tokio::test]
async fn test_batch_migration_end_to_end() {
    let mock_server = MockServer::start().await;
    let ops_id = Uuid::new_v4();
    let dupe_id = Uuid::new_v4();

    mount_user(&mock_server, "ops@acme.test", ops_id).await;
    mount_user(&mock_server, "dupe@acme.test", dupe_id).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.ghost@acme.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/client_profiles"))
        .and(body_partial_json(serde_json::json!({
            "user_id": ops_id,
            "company_name": "Acme",
            "address2": "New York",
            "address3": "New York",
            "country": "US",
            "phone": "555-1111"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([{ "user_id": ops_id }])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/client_profiles"))
        .and(body_partial_json(serde_json::json!({ "user_id": dupe_id })))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"client_profiles_user_id_key\""
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = create_test_store(&mock_server);
    let mut migrator = Migrator::new(
        &store,
        MigrationOptions {
            mode: RunMode::Batch { limit: None },
            dry_run: false,
        },
    );
    migrator.run_reader(EXPORT.as_bytes()).await.unwrap();

    let stats = migrator.into_stats();
    assert_eq!(stats.total_records, 4);
    assert_eq!(stats.clients_found, 3);
    assert_eq!(stats.profiles_inserted, 1);
    assert_eq!(stats.duplicates_skipped, 1);
    assert_eq!(stats.users_not_found, 1);
    assert_eq!(stats.malformed_sources, 1);
    assert!(stats.errors.is_empty(), "unexpected errors: {:?}", stats.errors);
}

#[tokio::test]
async fn test_insert_failure_is_recorded_and_run_continues() {
    let mock_server = MockServer::start().await;
    mount_user(&mock_server, "ops@acme.test", Uuid::new_v4()).await;
    mount_user(&mock_server, "dupe@acme.test", Uuid::new_v4()).await;
    mount_user(&mock_server, "ghost@acme.test", Uuid::new_v4()).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/client_profiles"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let store = create_test_store(&mock_server);
    let mut migrator = Migrator::new(
        &store,
        MigrationOptions {
            mode: RunMode::Batch { limit: None },
            dry_run: false,
        },
    );
    migrator.run_reader(EXPORT.as_bytes()).await.unwrap();

    let stats = migrator.into_stats();
    assert_eq!(stats.profiles_inserted, 0);
    assert_eq!(stats.errors.len(), 3);
    assert!(stats.errors[0].starts_with("Error inserting client profile for user"));
    assert!(stats.errors[0].contains("database unavailable"));
}

#[tokio::test]
async fn test_single_record_mode_stops_after_first_insert() {
    let mock_server = MockServer::start().await;
    mount_user(&mock_server, "ops@acme.test", Uuid::new_v4()).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/client_profiles"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([{}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = create_test_store(&mock_server);
    let mut migrator = Migrator::new(&store, MigrationOptions::default());
    migrator.run_reader(EXPORT.as_bytes()).await.unwrap();

    let stats = migrator.into_stats();
    assert_eq!(stats.total_records, 2);
    assert_eq!(stats.profiles_inserted, 1);
}

#[tokio::test]
async fn test_dry_run_sends_no_inserts() {
    let mock_server = MockServer::start().await;
    mount_user(&mock_server, "ops@acme.test", Uuid::new_v4()).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/client_profiles"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([{}])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let store = create_test_store(&mock_server);
    let mut migrator = Migrator::new(
        &store,
        MigrationOptions {
            mode: RunMode::SingleRecord,
            dry_run: true,
        },
    );
    migrator.run_reader(EXPORT.as_bytes()).await.unwrap();

    assert_eq!(migrator.stats().dry_run_previews, 1);
}
