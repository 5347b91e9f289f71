//! Template overlay command

use crate::commands::capture::SessionState;
use crate::template::{TemplateClient, TemplatePoint};
use tauri::State;

/// Fetch the reference path for a sign
#[tauri::command]
pub async fn fetch_template(
    state: State<'_, SessionState>,
    sign: String,
) -> Result<Vec<TemplatePoint>, String> {
    let client = TemplateClient::new(state.transport.clone(), state.config.template_endpoint());
    client.fetch(&sign).await.map_err(|e| {
        tracing::warn!("Template request for {} failed: {}", sign, e);
        e.to_string()
    })
}
