use crate::error::FetchError;
use crate::models::VideoRecord;
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use log::{error, info};
use reqwest::Client;
use serde::Deserialize;

/// How far back "recent" reaches.
pub const RECENT_WINDOW_DAYS: i64 = 3;

/// YouTube caps both `maxResults` and the `id` list of `videos` at 50.
const MAX_RESULTS: usize = 50;

#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Uploads of `channel_id` published after `since`, in discovery order.
    async fn videos_since(
        &self,
        channel_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<VideoRecord>, FetchError>;

    async fn recent_videos(&self, channel_id: &str) -> Result<Vec<VideoRecord>, FetchError> {
        self.videos_since(channel_id, window_start(Utc::now())).await
    }
}

pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(RECENT_WINDOW_DAYS)
}

/// `publishedAfter` wants RFC 3339 with a literal `Z`.
pub fn published_after(since: DateTime<Utc>) -> String {
    since.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPage {
    #[serde(default)]
    items: Vec<SearchItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct VideoListPage {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    #[serde(default)]
    statistics: VideoStatistics,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
}

impl From<VideoItem> for VideoRecord {
    fn from(item: VideoItem) -> Self {
        let views = item
            .statistics
            .view_count
            .as_deref()
            .and_then(|count| count.parse().ok())
            .unwrap_or(0);
        VideoRecord::new(&item.id, item.snippet.title, views)
    }
}

/// YouTube Data API v3 client.
#[derive(Clone)]
pub struct YouTubeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get<T>(
        &self,
        channel_id: &str,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let http = |source| FetchError::Http {
            channel_id: channel_id.to_string(),
            source,
        };

        let response = self
            .client
            .get(format!("{}/{endpoint}", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(http)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                channel_id: channel_id.to_string(),
                status: status.as_u16(),
                message: api_error_message(&message),
            });
        }

        response.json::<T>().await.map_err(http)
    }

    // Documentation: https://developers.google.com/youtube/v3/docs/search/list
    async fn search_video_ids(
        &self,
        channel_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<String>, FetchError> {
        let published_after = published_after(since);
        let max_results = MAX_RESULTS.to_string();
        let mut video_ids = Vec::new();
        let mut next_page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("part", "id"),
                ("channelId", channel_id),
                ("publishedAfter", published_after.as_str()),
                ("type", "video"),
                ("order", "date"),
                ("maxResults", max_results.as_str()),
            ];
            if let Some(token) = &next_page_token {
                query.push(("pageToken", token.as_str()));
            }

            let page: SearchPage = self.get(channel_id, "search", &query).await?;
            video_ids.extend(page.items.into_iter().filter_map(|item| item.id.video_id));

            match page.next_page_token {
                Some(token) if !token.is_empty() => next_page_token = Some(token),
                _ => break,
            }
        }

        Ok(video_ids)
    }

    async fn fetch_videos(
        &self,
        channel_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<VideoRecord>, FetchError> {
        let video_ids = self.search_video_ids(channel_id, since).await?;
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.video_details(channel_id, &video_ids).await
    }

    // Documentation: https://developers.google.com/youtube/v3/docs/videos/list
    async fn video_details(
        &self,
        channel_id: &str,
        video_ids: &[String],
    ) -> Result<Vec<VideoRecord>, FetchError> {
        let mut videos = Vec::with_capacity(video_ids.len());
        for batch in video_ids.chunks(MAX_RESULTS) {
            let ids = batch.join(",");
            let page: VideoListPage = self
                .get(
                    channel_id,
                    "videos",
                    &[("part", "snippet,statistics"), ("id", ids.as_str())],
                )
                .await?;
            videos.extend(page.items.into_iter().map(VideoRecord::from));
        }
        Ok(videos)
    }
}

#[async_trait]
impl VideoSource for YouTubeClient {
    async fn videos_since(
        &self,
        channel_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<VideoRecord>, FetchError> {
        let result = self.fetch_videos(channel_id, since).await;
        match &result {
            Ok(videos) => info!("Found {} recent videos for {channel_id}", videos.len()),
            Err(e) => error!("{e}"),
        }
        result
    }
}

/// Pulls `error.message` out of a Google API error body, else returns it as is.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}
