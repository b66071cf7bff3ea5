//! HTTP client for the hosted events table (PostgREST dialect).

use std::time::Duration;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use chrono_tz::Tz;
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::EVENTS_TABLE;
use crate::error::{ChalkboardError, ChalkboardResult};
use crate::event::{Event, EventDraft, EventKind, Recurrence};
use crate::store::EventStore;
use crate::window::Window;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to `{url}/rest/v1/events`.
pub struct RestStore {
    http: reqwest::Client,
    table_url: Url,
    api_key: String,
    access_token: Option<String>,
}

/// Error body returned by the store.
#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
    #[serde(default)]
    hint: Option<String>,
}

/// PATCH body. The owner is never rewritten; `updated_at` is stamped here.
#[derive(Serialize)]
struct UpdateRow<'a> {
    title: &'a str,
    description: Option<&'a str>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    color: &'a str,
    all_day: bool,
    event_type: Option<EventKind>,
    client_id: Option<&'a str>,
    recurrence: Option<Recurrence>,
    recurrence_end: Option<NaiveDate>,
    updated_at: DateTime<Utc>,
}

impl<'a> UpdateRow<'a> {
    fn new(draft: &'a EventDraft, now: DateTime<Utc>) -> Self {
        UpdateRow {
            title: &draft.title,
            description: draft.description.as_deref(),
            start_time: draft.start,
            end_time: draft.end,
            color: &draft.color,
            all_day: draft.all_day,
            event_type: draft.kind,
            client_id: draft.client_id.as_deref(),
            recurrence: draft.recurrence,
            recurrence_end: draft.recurrence_end,
            updated_at: now,
        }
    }
}

fn instant(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Query for rows starting inside the window.
fn window_query(user_id: &str, window: &Window) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        ("user_id", format!("eq.{user_id}")),
        ("start_time", format!("gte.{}", instant(window.start))),
        ("start_time", format!("lte.{}", instant(window.end))),
        ("order", "start_time.asc".to_string()),
    ]
}

/// Query for recurring rows that began earlier and may still reach the window.
fn series_query(user_id: &str, window: &Window, tz: &Tz) -> Vec<(&'static str, String)> {
    let first_day = window.first_day(tz).format("%Y-%m-%d");
    vec![
        ("select", "*".to_string()),
        ("user_id", format!("eq.{user_id}")),
        ("recurrence", "not.is.null".to_string()),
        ("start_time", format!("lt.{}", instant(window.start))),
        (
            "or",
            format!("(recurrence_end.is.null,recurrence_end.gte.{first_day})"),
        ),
        ("order", "start_time.asc".to_string()),
    ]
}

impl RestStore {
    /// `url` is the project root, e.g. `https://abc.supabase.co`.
    pub fn new(url: &str, api_key: &str, access_token: Option<&str>) -> ChalkboardResult<Self> {
        if api_key.trim().is_empty() {
            return Err(ChalkboardError::Config("store api_key is empty".into()));
        }

        let mut base = Url::parse(url)
            .map_err(|e| ChalkboardError::Config(format!("invalid store url '{url}': {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let table_url = base
            .join(&format!("rest/v1/{EVENTS_TABLE}"))
            .map_err(|e| ChalkboardError::Config(format!("invalid store url '{url}': {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(RestStore {
            http,
            table_url,
            api_key: api_key.to_string(),
            access_token: access_token.map(str::to_string),
        })
    }

    pub fn table_url(&self) -> &Url {
        &self.table_url
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        self.http
            .request(method, self.table_url.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    fn returning(&self, method: Method) -> RequestBuilder {
        self.request(method)
            .header("Prefer", "return=representation")
    }

    async fn rows(resp: Response) -> ChalkboardResult<Vec<Event>> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(ErrorResponse { message, hint: Some(hint) }) => format!("{message} ({hint})"),
                Ok(ErrorResponse { message, hint: None }) => message,
                Err(_) if body.is_empty() => status.to_string(),
                Err(_) => body,
            };
            return Err(ChalkboardError::Store(format!("{status}: {message}")));
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| ChalkboardError::Serialization(e.to_string()))
    }

    async fn single(resp: Response, id: &str) -> ChalkboardResult<Event> {
        Self::rows(resp)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ChalkboardError::EventNotFound(id.to_string()))
    }
}

impl EventStore for RestStore {
    #[tracing::instrument(skip(self, window), fields(start = %window.start, end = %window.end))]
    async fn fetch_window(&self, user_id: &str, window: &Window) -> ChalkboardResult<Vec<Event>> {
        let resp = self
            .request(Method::GET)
            .query(&window_query(user_id, window))
            .send()
            .await?;
        let rows = Self::rows(resp).await?;
        tracing::debug!(count = rows.len(), "Fetched window");
        Ok(rows)
    }

    #[tracing::instrument(skip(self, window, tz), fields(start = %window.start))]
    async fn fetch_series_before(
        &self,
        user_id: &str,
        window: &Window,
        tz: &Tz,
    ) -> ChalkboardResult<Vec<Event>> {
        let resp = self
            .request(Method::GET)
            .query(&series_query(user_id, window, tz))
            .send()
            .await?;
        Self::rows(resp).await
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_event(&self, id: &str) -> ChalkboardResult<Event> {
        let resp = self
            .request(Method::GET)
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))])
            .send()
            .await?;
        Self::single(resp, id).await
    }

    #[tracing::instrument(skip(self, draft), fields(user_id = %draft.user_id))]
    async fn insert(&self, draft: &EventDraft) -> ChalkboardResult<Event> {
        let resp = self.returning(Method::POST).json(draft).send().await?;
        Self::single(resp, "<new>").await
    }

    #[tracing::instrument(skip(self, draft))]
    async fn update(&self, id: &str, draft: &EventDraft) -> ChalkboardResult<Event> {
        let resp = self
            .returning(Method::PATCH)
            .query(&[("id", format!("eq.{id}"))])
            .json(&UpdateRow::new(draft, Utc::now()))
            .send()
            .await?;
        Self::single(resp, id).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: &str) -> ChalkboardResult<()> {
        let resp = self
            .returning(Method::DELETE)
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;
        Self::single(resp, id).await.map(|_| ())
    }
}
