//! Integration tests for studytrack-api
//!
//! Uses wiremock to simulate the StudyTrack backend and verifies the
//! end-to-end behavior of ApiClient and HttpRemoteGateway.

mod common;

mod test_fetch_all;
mod test_sync_push;
