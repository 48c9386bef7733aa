use std::sync::{mpsc, Arc};
use std::thread;

use clip_logging::{clip_info, clip_warn};
use serde_json::Value;

use crate::download::{dated_filename, DownloadPayload, Downloader};
use crate::notify::Notifier;
use crate::{ConvertError, ConvertReply, ConvertService, FailureKind};

/// Everything a dispatched message may need. Shared by the router and the
/// context-menu handlers; all seams are trait objects so tests substitute
/// them freely.
#[derive(Clone)]
pub struct RouterDeps {
    pub converter: Arc<dyn ConvertService>,
    pub downloader: Arc<dyn Downloader>,
    pub notifier: Arc<dyn Notifier>,
    /// Calendar-date stamp for download filenames, injected for determinism.
    pub date_stamp: Arc<dyn Fn() -> String + Send + Sync>,
}

/// At-most-one reply per request. Resolving consumes the responder; one that
/// is dropped unanswered logs a warning so dangling waits cannot hide.
pub struct Responder {
    tx: Option<mpsc::Sender<ConvertReply>>,
}

impl Responder {
    fn new(tx: mpsc::Sender<ConvertReply>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn resolve(mut self, reply: ConvertReply) {
        if let Some(tx) = self.tx.take() {
            // A sender gone away simply abandons the result.
            let _ = tx.send(reply);
        }
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if self.tx.is_some() {
            clip_warn!("request dropped without a reply");
        }
    }
}

struct Envelope {
    payload: Value,
    responder: Option<Responder>,
}

/// Single message-handling entry point shared by every sender. Commands flow
/// over a channel into a dedicated thread owning the async runtime; each
/// inbound message is handled on its own task, so independently initiated
/// flows race without ordering guarantees between them.
#[derive(Clone)]
pub struct RouterHandle {
    msg_tx: mpsc::Sender<Envelope>,
}

impl RouterHandle {
    pub fn new(deps: RouterDeps) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel::<Envelope>();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(envelope) = msg_rx.recv() {
                let deps = deps.clone();
                runtime.spawn(async move {
                    dispatch(envelope, deps).await;
                });
            }
        });

        Self { msg_tx }
    }

    /// Sends a request and returns the channel its single reply arrives on.
    pub fn request(&self, payload: Value) -> mpsc::Receiver<ConvertReply> {
        let (reply_tx, reply_rx) = mpsc::channel();
        let _ = self.msg_tx.send(Envelope {
            payload,
            responder: Some(Responder::new(reply_tx)),
        });
        reply_rx
    }

    /// Fire-and-forget send: the outcome is a download or a notification.
    pub fn submit(&self, payload: Value) {
        let _ = self.msg_tx.send(Envelope {
            payload,
            responder: None,
        });
    }
}

#[derive(Debug)]
enum Request {
    Convert { html: String },
    ConvertSelectedRegions { html: String, title: String },
}

async fn dispatch(envelope: Envelope, deps: RouterDeps) {
    match parse_request(&envelope.payload) {
        Ok(Request::Convert { html }) => {
            clip_info!("convert request, {} bytes of markup", html.len());
            let reply = match deps.converter.convert(&html).await {
                Ok(markdown) => ConvertReply::converted(markdown),
                Err(error) => ConvertReply::failed(error),
            };
            match envelope.responder {
                Some(responder) => responder.resolve(reply),
                None => clip_warn!("convert request arrived without a reply channel"),
            }
        }
        Ok(Request::ConvertSelectedRegions { html, title }) => {
            clip_info!(
                "region conversion request, {} bytes of markup, title \"{title}\"",
                html.len()
            );
            // No caller is waiting on this path.
            convert_and_download(&deps, &html, &title).await;
        }
        Err(error) => {
            clip_warn!("rejected message: {error}");
            match envelope.responder {
                // An explicit failure reply; senders never wait forever.
                Some(responder) => responder.resolve(ConvertReply::failed(error)),
                None => deps.notifier.notify("Clipdown", &error.to_string()),
            }
        }
    }
}

/// Shared tail of the reply-less flows: convert, then download on success or
/// notify on failure.
pub(crate) async fn convert_and_download(deps: &RouterDeps, html: &str, title: &str) {
    match deps.converter.convert(html).await {
        Ok(markdown) => {
            let filename = dated_filename(&(deps.date_stamp)(), Some(title));
            let payload = DownloadPayload::markdown(&markdown, filename);
            match deps.downloader.download(&payload) {
                Ok(path) => clip_info!("markdown saved to {}", path.display()),
                Err(err) => deps
                    .notifier
                    .notify("Clipdown download failed", &err.to_string()),
            }
        }
        Err(error) => deps
            .notifier
            .notify("Clipdown conversion failed", &error.to_string()),
    }
}

fn parse_request(payload: &Value) -> Result<Request, ConvertError> {
    let action = payload
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| ConvertError::new(FailureKind::Protocol, "message has no action field"))?;
    match action {
        "convert" => Ok(Request::Convert {
            html: required_string(payload, "html")?,
        }),
        "convertSelectedRegions" => Ok(Request::ConvertSelectedRegions {
            html: required_string(payload, "html")?,
            title: payload
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }),
        other => Err(ConvertError::new(
            FailureKind::UnsupportedAction,
            format!("unsupported action \"{other}\""),
        )),
    }
}

fn required_string(payload: &Value, field: &str) -> Result<String, ConvertError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ConvertError::new(
                FailureKind::Protocol,
                format!("missing or empty \"{field}\" field"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_rejects_unknown_action() {
        let err = parse_request(&json!({"action": "transmogrify"})).unwrap_err();
        assert_eq!(err.kind, FailureKind::UnsupportedAction);
        assert!(err.message.contains("transmogrify"));
    }

    #[test]
    fn parse_rejects_missing_markup() {
        let err = parse_request(&json!({"action": "convert"})).unwrap_err();
        assert_eq!(err.kind, FailureKind::Protocol);

        let err = parse_request(&json!({"action": "convert", "html": "   "})).unwrap_err();
        assert_eq!(err.kind, FailureKind::Protocol);
    }

    #[test]
    fn parse_accepts_region_request_without_title() {
        let request =
            parse_request(&json!({"action": "convertSelectedRegions", "html": "<p>x</p>"}))
                .unwrap();
        match request {
            Request::ConvertSelectedRegions { title, .. } => assert_eq!(title, ""),
            _ => panic!("wrong variant"),
        }
    }
}
