use calorie_track::auth::{Session, User};
use calorie_track::config::Config;
use calorie_track::error::Error;
use calorie_track::postgrest::Filter;
use calorie_track::remote::RemoteStore;
use calorie_track::CalorieTrack;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn app_for(server: &MockServer) -> CalorieTrack {
    CalorieTrack::new(Config::new(&server.uri(), "anon-key").unwrap()).unwrap()
}

fn signed_in(app: &CalorieTrack, id: Uuid) {
    let user = User {
        id,
        email: Some("a@example.com".to_string()),
        phone: None,
        role: None,
        created_at: None,
        updated_at: None,
    };
    app.auth()
        .set_session(Session::new("user-token".to_string(), "refresh".to_string(), user, 3600));
}

#[tokio::test]
async fn select_many_sends_filters_and_anon_key() {
    let server = MockServer::start().await;
    let user = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/meals"))
        .and(query_param("select", "*"))
        .and(query_param("user_id", format!("eq.{}", user)))
        .and(header("apikey", "anon-key"))
        .and(header("Authorization", "Bearer anon-key"))
        .and(header("Accept-Profile", "public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": Uuid::new_v4(), "user_id": user, "name": "Breakfast", "icon": "🍳" },
            { "id": Uuid::new_v4(), "user_id": user, "name": "Lunch", "icon": null }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    let rows = app
        .db()
        .select_many("meals", &Filter::new().eq("user_id", user))
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].get("name").and_then(Value::as_str), Some("Lunch"));
}

#[tokio::test]
async fn session_token_is_used_as_bearer() {
    let server = MockServer::start().await;
    let user = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/food_entries"))
        .and(query_param("entry_date", "eq.2024-05-01"))
        .and(header("Authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    signed_in(&app, user);
    let filter = Filter::new().eq("user_id", user).eq("entry_date", "2024-05-01");
    let rows = app.db().select_many("food_entries", &filter).await.unwrap();

    assert!(rows.is_empty());
}

#[tokio::test]
async fn select_one_requests_single_object() {
    let server = MockServer::start().await;
    let user = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", format!("eq.{}", user)))
        .and(header("Accept", "application/vnd.pgrst.object+json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": user, "username": "x", "calorie_goal": 2000 })),
        )
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    let row = app
        .db()
        .select_one("profiles", &Filter::new().eq("id", user))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(row["calorie_goal"], json!(2000));
}

#[tokio::test]
async fn select_one_maps_no_rows_to_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(406).set_body_json(json!({
            "code": "PGRST116",
            "details": "The result contains 0 rows",
            "hint": null,
            "message": "JSON object requested, multiple (or no) rows returned"
        })))
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    let row = app
        .db()
        .select_one("profiles", &Filter::new().eq("id", Uuid::new_v4()))
        .await
        .unwrap();

    assert!(row.is_none());
}

#[tokio::test]
async fn insert_returns_representation() {
    let server = MockServer::start().await;
    let (user, meal, id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let rows = json!([{
        "meal_id": meal,
        "user_id": user,
        "name": "Apple",
        "calories": 95,
        "entry_date": "2024-05-01"
    }]);

    Mock::given(method("POST"))
        .and(path("/rest/v1/food_entries"))
        .and(header("Prefer", "return=representation"))
        .and(header("Content-Profile", "public"))
        .and(body_json(&rows))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": id,
            "meal_id": meal,
            "user_id": user,
            "name": "Apple",
            "calories": 95,
            "entry_date": "2024-05-01"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    let inserted = app.db().insert("food_entries", rows).await.unwrap();

    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0]["id"], json!(id));
}

#[tokio::test]
async fn upsert_merges_duplicates() {
    let server = MockServer::start().await;
    let user = Uuid::new_v4();
    let row = json!({ "id": user, "username": "y", "calorie_goal": 1800 });

    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .and(header("Prefer", "resolution=merge-duplicates,return=minimal"))
        .and(body_json(&row))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    app.db().upsert("profiles", row).await.unwrap();
}

#[tokio::test]
async fn api_errors_keep_details() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/food_entries"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "code": "42501",
            "message": "new row violates row-level security policy for table \"food_entries\"",
            "details": null,
            "hint": null
        })))
        .mount(&server)
        .await;

    let app = app_for(&server).await;
    let err = app
        .db()
        .insert("food_entries", json!([{ "name": "Apple" }]))
        .await
        .unwrap_err();

    match err {
        Error::Database { details, status } => {
            assert_eq!(status.as_u16(), 403);
            assert_eq!(details.code.as_deref(), Some("42501"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}
