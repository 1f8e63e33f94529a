//! Concurrent upload dispatch with a single-consumer fragment sink.
//!
//! One spawned task per selected report kind; the dispatch loop never waits
//! for a response before issuing the next request. Tasks push their fragment
//! through a channel whose sole consumer appends to the view, so appends are
//! serialized in arrival order.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::view::{Fragment, ReportView};
use crate::{Config, ReportKind, SelectedFile, UploadError, UploadEvent, UploadStats};

/// Upload `file` once per selected kind and collect the responses.
///
/// The view is cleared exactly once, after the file precondition check and
/// before the first request goes out. Each request runs as an independent
/// task; a failing request is reduced to a failure fragment and never affects
/// its siblings. An empty `kinds` slice is a valid no-op: the view is still
/// cleared and zero requests are issued.
///
/// Cancelling the token abandons still-pending requests; they produce no
/// fragment.
pub async fn dispatch_uploads(
    file: Option<SelectedFile>,
    kinds: &[ReportKind],
    config: &Config,
    view: &mut ReportView,
    progress: impl Fn(UploadEvent) + Send + Sync + 'static,
    cancel: CancellationToken,
) -> Result<UploadStats, UploadError> {
    let file = Arc::new(file.ok_or(UploadError::NoFile)?);

    view.clear();

    let mut stats = UploadStats {
        requested: kinds.len(),
        ..UploadStats::default()
    };
    if kinds.is_empty() {
        return Ok(stats);
    }

    let mut builder = reqwest::Client::builder();
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build()?;

    let progress: Arc<dyn Fn(UploadEvent) + Send + Sync> = Arc::new(progress);
    let (frag_tx, frag_rx) = async_channel::unbounded::<Fragment>();
    let total = kinds.len();

    for (index, kind) in kinds.iter().copied().enumerate() {
        let client = client.clone();
        let file = file.clone();
        let base_url = config.base_url.clone();
        let tx = frag_tx.clone();
        let progress = progress.clone();
        let cancel = cancel.clone();

        tokio::spawn(async move {
            progress(UploadEvent::Dispatched { kind, index, total });

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                outcome = post_upload(&client, &base_url, &file, kind) => outcome,
            };

            let fragment = match outcome {
                Ok(body) => Fragment::Report { report: kind, body },
                Err(err) => {
                    log::error!("{} upload failed: {err}", kind.endpoint());
                    Fragment::Failure {
                        report: kind,
                        message: err.to_string(),
                    }
                }
            };
            let _ = tx.send(fragment).await;
        });
    }
    // The collector below owns the only receiver; dropping our sender clone
    // lets the loop end once every task has settled or been cancelled.
    drop(frag_tx);

    while let Ok(fragment) = frag_rx.recv().await {
        if fragment.is_failure() {
            stats.failed += 1;
        } else {
            stats.succeeded += 1;
        }
        progress(UploadEvent::Settled {
            fragment: fragment.clone(),
        });
        view.push(fragment);
    }

    Ok(stats)
}

/// POST the file as a multipart body and parse the response as JSON.
///
/// The status code is deliberately not inspected: any body that parses as
/// JSON counts as a report, matching the upload form this replaces.
async fn post_upload(
    client: &reqwest::Client,
    base_url: &str,
    file: &SelectedFile,
    kind: ReportKind,
) -> Result<serde_json::Value, reqwest::Error> {
    let part = reqwest::multipart::Part::bytes(file.data.clone()).file_name(file.name.clone());
    let form = reqwest::multipart::Form::new().part("file", part);

    let response = client
        .post(format!("{}{}", base_url, kind.endpoint()))
        .multipart(form)
        .send()
        .await?;
    response.json::<serde_json::Value>().await
}
