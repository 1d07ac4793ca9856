use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use super::AdminState;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub config_version: String,
    pub reloads: u64,
    pub document_bytes: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        config_version: state.versions.get().to_string(),
        reloads: state.live.reloads(),
        document_bytes: state.live.document_bytes(),
    })
}

pub async fn get_config(State(state): State<AdminState>) -> Json<Value> {
    Json(state.live.document().as_ref().clone())
}
