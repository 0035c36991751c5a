//! HttpRemoteGateway - IRemoteGateway over the StudyTrack backend
//!
//! - `sync_push` → `POST /api/sync` with a [`SyncRequest`] body
//! - `fetch_all` → `GET /api/data` returning a [`DataSnapshot`]
//!
//! Bodies pass through unchanged: grades arrive as ciphertext and are
//! decrypted by the sync engine, not here.

use anyhow::Context;
use tracing::{debug, info};

use studytrack_core::domain::DataSnapshot;
use studytrack_core::ports::{IRemoteGateway, SyncRequest, SyncResponse};

use crate::ApiClient;

const SYNC_PATH: &str = "/api/sync";
const DATA_PATH: &str = "/api/data";

/// Remote gateway backed by [`ApiClient`]
#[derive(Debug, Clone)]
pub struct HttpRemoteGateway {
    client: ApiClient,
}

impl HttpRemoteGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl IRemoteGateway for HttpRemoteGateway {
    async fn sync_push(&self, request: &SyncRequest) -> anyhow::Result<SyncResponse> {
        debug!(
            assignments = request.assignments.len(),
            courses = request.courses.len(),
            study_sessions = request.study_sessions.len(),
            deleted = request.deleted_ids.len(),
            "Pushing sync request"
        );

        let response: SyncResponse = self
            .client
            .post_json(SYNC_PATH, request)
            .await
            .context("POST /api/sync failed")?;

        info!(last_sync = %response.last_sync, "Sync push acknowledged");
        Ok(response)
    }

    async fn fetch_all(&self) -> anyhow::Result<DataSnapshot> {
        let snapshot: DataSnapshot = self
            .client
            .get_json(DATA_PATH)
            .await
            .context("GET /api/data failed")?;

        debug!(
            assignments = snapshot.assignments.len(),
            courses = snapshot.courses.len(),
            study_sessions = snapshot.study_sessions.len(),
            "Fetched remote snapshot"
        );
        Ok(snapshot)
    }
}
