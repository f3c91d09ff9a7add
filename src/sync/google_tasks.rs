use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::domain::task::Task;

const TASKS_URL: &str = "https://tasks.googleapis.com/tasks/v1/lists/@default/tasks";

/// Best-effort mirror of board tasks into Google Tasks. Without a token every
/// call is a logged no-op, and failures never reach the caller: the board is
/// the source of truth and the mirror is allowed to drift.
pub struct GoogleTasksClient {
    http: reqwest::Client,
    token: Option<String>,
}

impl GoogleTasksClient {
    pub fn new(token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    pub async fn insert_task(&self, task: &Task) {
        let Some(token) = &self.token else {
            debug!("google tasks sync disabled; skipping insert");
            return;
        };
        let mut body = json!({ "title": task.title });
        if let Some(notes) = &task.description {
            body["notes"] = json!(notes);
        }
        if let Some(due) = task.due_date {
            body["due"] = json!(due.to_rfc3339());
        }

        let result = self
            .http
            .post(TASKS_URL)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                debug!(title = %task.title, "task mirrored to google tasks");
            }
            Ok(response) => {
                warn!(title = %task.title, status = %response.status(), "google tasks insert rejected");
            }
            Err(err) => {
                warn!(title = %task.title, %err, "google tasks insert failed");
            }
        }
    }

    pub async fn complete_task(&self, title: &str) {
        let Some(token) = &self.token else {
            debug!("google tasks sync disabled; skipping complete");
            return;
        };
        let Some(remote_id) = self.find_by_title(token, title).await else {
            warn!(%title, "no matching google task to complete");
            return;
        };

        let url = format!("{}/{}", TASKS_URL, remote_id);
        let result = self
            .http
            .patch(&url)
            .bearer_auth(token)
            .json(&json!({ "status": "completed" }))
            .send()
            .await;
        if let Err(err) = result {
            warn!(%title, %err, "google tasks complete failed");
        }
    }

    pub async fn delete_task(&self, title: &str) {
        let Some(token) = &self.token else {
            debug!("google tasks sync disabled; skipping delete");
            return;
        };
        let Some(remote_id) = self.find_by_title(token, title).await else {
            return;
        };

        let url = format!("{}/{}", TASKS_URL, remote_id);
        if let Err(err) = self.http.delete(&url).bearer_auth(token).send().await {
            warn!(%title, %err, "google tasks delete failed");
        }
    }

    /// Remote ids are not tracked locally; lookups go by title.
    async fn find_by_title(&self, token: &str, title: &str) -> Option<String> {
        let response = match self.http.get(TASKS_URL).bearer_auth(token).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, "google tasks list failed");
                return None;
            }
        };
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                warn!(%err, "google tasks list returned malformed json");
                return None;
            }
        };

        body.get("items")?
            .as_array()?
            .iter()
            .find(|item| item.get("title").and_then(Value::as_str) == Some(title))
            .and_then(|item| item.get("id").and_then(Value::as_str))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_client_is_a_no_op() {
        let client = GoogleTasksClient::new(None);
        assert!(!client.is_enabled());

        // No token: none of these should attempt the network.
        let task = Task::new("offline", "Today");
        client.insert_task(&task).await;
        client.complete_task("offline").await;
        client.delete_task("offline").await;
    }

    #[test]
    fn test_enabled_with_token() {
        let client = GoogleTasksClient::new(Some("ya29.token".into()));
        assert!(client.is_enabled());
    }
}
