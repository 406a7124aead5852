use calorie_track::config::Config;
use calorie_track::error::Error;
use calorie_track::remote::ObjectStore;
use calorie_track::storage::FileOptions;
use calorie_track::CalorieTrack;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn app_for(server: &MockServer) -> CalorieTrack {
    CalorieTrack::new(Config::new(&server.uri(), "anon-key").unwrap()).unwrap()
}

#[tokio::test]
async fn upload_posts_to_object_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/avatars/u-1714564800000.png"))
        .and(header("x-upsert", "false"))
        .and(header("apikey", "anon-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "Key": "avatars/u-1714564800000.png" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    let response = app
        .storage()
        .from("avatars")
        .upload(
            "u-1714564800000.png",
            vec![0x89, 0x50, 0x4e, 0x47],
            FileOptions::new().with_content_type("image/png"),
        )
        .await
        .unwrap();

    assert_eq!(response.key, "avatars/u-1714564800000.png");
}

#[tokio::test]
async fn upload_conflict_is_a_storage_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/avatars/taken.png"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "statusCode": "409",
            "error": "Duplicate",
            "message": "The resource already exists"
        })))
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    let err = app
        .storage()
        .upload("avatars", "taken.png", vec![1], "image/png", false)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Storage(ref msg) if msg.contains("409")));
}

#[tokio::test]
async fn upsert_flag_is_forwarded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/avatars/me.png"))
        .and(header("x-upsert", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "avatars/me.png" })))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    app.storage()
        .upload("avatars", "me.png", vec![1], "image/png", true)
        .await
        .unwrap();
}

#[test]
fn public_url_has_no_trailing_slash_issues() {
    let config = Config::new("https://xyz.supabase.co/", "anon-key").unwrap();
    let app = CalorieTrack::new(config).unwrap();

    assert_eq!(
        app.storage().public_url("avatars", "u-1.png"),
        "https://xyz.supabase.co/storage/v1/object/public/avatars/u-1.png"
    );
}
