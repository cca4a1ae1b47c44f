use async_trait::async_trait;
use channel_analyst::db;
use channel_analyst::error::FetchError;
use channel_analyst::models::{JobStatus, VideoRecord};
use channel_analyst::services::analyzer::Analyzer;
use channel_analyst::services::youtube::VideoSource;
use channel_analyst::{build_rocket, AppState};
use chrono::{DateTime, Utc};
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::{Client, LocalResponse};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Channel id -> uploads; unknown channels have none.
struct StaticVideos(HashMap<String, Vec<VideoRecord>>);

#[async_trait]
impl VideoSource for StaticVideos {
    async fn videos_since(
        &self,
        channel_id: &str,
        _since: DateTime<Utc>,
    ) -> Result<Vec<VideoRecord>, FetchError> {
        Ok(self.0.get(channel_id).cloned().unwrap_or_default())
    }
}

struct CannedAnalysis(&'static str);

#[async_trait]
impl Analyzer for CannedAnalysis {
    async fn analyze(&self, _prompt: &str, _videos: &[VideoRecord]) -> String {
        self.0.to_string()
    }
}

const ANALYSIS: &str = "El tema de mayor preocupación es la inflación.";

async fn client() -> Client {
    let videos = HashMap::from([(
        "UCabc".to_string(),
        vec![VideoRecord::new("a1", "La inflación sube", 1000)],
    )]);

    let pool = db::connect("sqlite::memory:").await.unwrap();
    let state = AppState::new(
        pool,
        Arc::new(StaticVideos(videos)),
        Arc::new(CannedAnalysis(ANALYSIS)),
        2,
    );
    Client::tracked(build_rocket(state)).await.unwrap()
}

fn location(response: &LocalResponse<'_>) -> String {
    response.headers().get_one("Location").unwrap().to_string()
}

async fn add_channel<'c>(client: &'c Client, name: &str, id: &str) -> LocalResponse<'c> {
    client
        .post("/canales")
        .header(ContentType::Form)
        .body(format!("channel_name={name}&channel_id={id}&category=Noticias"))
        .dispatch()
        .await
}

async fn channel_count(client: &Client) -> usize {
    let response = client.get("/api/canales").dispatch().await;
    let channels: Vec<Value> = response.into_json().await.unwrap();
    channels.len()
}

/// Polls the status endpoint until the job leaves `pending`.
async fn wait_for_terminal(client: &Client, job_id: &str) -> Value {
    for _ in 0..100 {
        let response = client.get(format!("/status/{job_id}")).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.unwrap();
        if body["status"] != "pending" {
            return body;
        }
        assert!(body["result"].is_null());
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job {job_id} never finished");
}

async fn start_job(client: &Client, channel_id: &str) -> String {
    let response = client.get(format!("/analizar/{channel_id}")).dispatch().await;
    assert_eq!(response.status(), Status::SeeOther);
    let target = location(&response);
    target.strip_prefix("/resultado/").unwrap().to_string()
}

#[rocket::async_test]
async fn index_lists_added_channels() {
    let client = client().await;
    let response = add_channel(&client, "Foo", "UCabc").await;
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), "/");

    let page = client.get("/").dispatch().await;
    assert_eq!(page.status(), Status::Ok);
    let html = page.into_string().await.unwrap();
    assert!(html.contains("Foo"));
    assert!(html.contains("/analizar/UCabc"));
    assert!(html.contains("añadido con éxito"));
}

#[rocket::async_test]
async fn duplicate_channel_is_reported_and_not_added() {
    let client = client().await;
    add_channel(&client, "Foo", "UCabc").await;
    let response = add_channel(&client, "Foo", "UCabc").await;
    assert_eq!(response.status(), Status::SeeOther);

    let html = client.get("/").dispatch().await.into_string().await.unwrap();
    assert!(html.contains("Ese ID de canal ya existe"));
    assert_eq!(channel_count(&client).await, 1);
}

#[rocket::async_test]
async fn deleting_channels() {
    let client = client().await;
    add_channel(&client, "Foo", "UCabc").await;

    let missing = client.post("/canales/UCnope/borrar").dispatch().await;
    assert_eq!(missing.status(), Status::SeeOther);
    let html = client.get("/").dispatch().await.into_string().await.unwrap();
    assert!(html.contains("No se encontró ningún canal con el ID &#39;UCnope&#39;"));
    assert_eq!(channel_count(&client).await, 1);

    client.post("/canales/UCabc/borrar").dispatch().await;
    let html = client.get("/").dispatch().await.into_string().await.unwrap();
    assert!(html.contains("borrado con éxito"));
    assert_eq!(channel_count(&client).await, 0);
}

#[rocket::async_test]
async fn job_without_videos_fails_with_message() {
    let client = client().await;
    let job_id = start_job(&client, "UC123").await;

    let body = wait_for_terminal(&client, &job_id).await;
    assert_eq!(
        body,
        serde_json::json!({
            "status": "failed",
            "result": "No se encontraron videos recientes para el canal UC123."
        })
    );
}

#[rocket::async_test]
async fn job_completes_and_archives_videos() {
    let client = client().await;
    add_channel(&client, "Foo", "UCabc").await;
    let job_id = start_job(&client, "UCabc").await;

    let result_page = client.get(format!("/resultado/{job_id}")).dispatch().await;
    assert_eq!(result_page.status(), Status::Ok);

    let body = wait_for_terminal(&client, &job_id).await;
    assert_eq!(body["status"], JobStatus::Completed.as_str());
    assert_eq!(body["result"], ANALYSIS);

    let download = client.get(format!("/descargar/{job_id}")).dispatch().await;
    assert_eq!(download.status(), Status::Ok);
    assert_eq!(download.content_type(), Some(ContentType::JSON));
    let disposition = download
        .headers()
        .get_one("Content-Disposition")
        .unwrap()
        .to_string();
    assert_eq!(disposition, format!("attachment; filename=videos_{job_id}.json"));
    let videos: Vec<VideoRecord> = download.into_json().await.unwrap();
    assert_eq!(videos[0].title, "La inflación sube");

    let history = client.get("/historial").dispatch().await.into_string().await.unwrap();
    assert!(history.contains("Foo"));
    assert!(history.contains(ANALYSIS));
}

#[rocket::async_test]
async fn download_without_archive_redirects_to_history() {
    let client = client().await;
    let job_id = start_job(&client, "UC123").await;
    wait_for_terminal(&client, &job_id).await;

    let response = client.get(format!("/descargar/{job_id}")).dispatch().await;
    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(location(&response), "/historial");

    let history = client.get("/historial").dispatch().await.into_string().await.unwrap();
    assert!(history.contains("No hay datos JSON guardados"));
}

#[rocket::async_test]
async fn unknown_job_status_is_not_found() {
    let client = client().await;
    let response = client.get("/status/does-not-exist").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body, serde_json::json!({"status": "not_found"}));
}

#[rocket::async_test]
async fn history_is_newest_first() {
    let client = client().await;
    add_channel(&client, "Foo", "UCabc").await;
    add_channel(&client, "Bar", "UCbar").await;

    let first = start_job(&client, "UCabc").await;
    wait_for_terminal(&client, &first).await;
    let second = start_job(&client, "UCbar").await;
    wait_for_terminal(&client, &second).await;

    let html = client.get("/historial").dispatch().await.into_string().await.unwrap();
    let newer = html.find(&format!("/resultado/{second}")).unwrap();
    let older = html.find(&format!("/resultado/{first}")).unwrap();
    assert!(newer < older);
}
