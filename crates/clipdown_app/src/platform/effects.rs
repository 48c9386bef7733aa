use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;

use chrono::Local;
use clip_logging::clip_warn;
use clipdown_core::{CapturedPage, ConvertFailure, Effect, FailureKind, Msg};
use clipdown_engine::{
    dated_filename, ConvertReply, DownloadPayload, Downloader, FileDownloader, RouterHandle,
};
use clipdown_page::{capture_page, PageDocument};
use serde_json::json;

/// Carries the core's effects out against the page and the background
/// router, feeding the outcomes back as messages.
pub struct EffectRunner {
    router: RouterHandle,
    downloader: FileDownloader,
    page: Arc<PageDocument>,
    msg_tx: mpsc::Sender<Msg>,
}

impl EffectRunner {
    pub fn new(
        router: RouterHandle,
        out_dir: PathBuf,
        page: Arc<PageDocument>,
        msg_tx: mpsc::Sender<Msg>,
    ) -> Self {
        Self {
            router,
            downloader: FileDownloader::new(out_dir),
            page,
            msg_tx,
        }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::CapturePage => {
                    let page = capture_page(&self.page).map(|captured| CapturedPage {
                        html: captured.html,
                        size_bytes: captured.size_bytes,
                        title: captured.title,
                    });
                    let _ = self.msg_tx.send(Msg::CaptureFinished { page });
                }
                Effect::RequestConversion { html } => {
                    let reply_rx = self
                        .router
                        .request(json!({ "action": "convert", "html": html }));
                    let msg_tx = self.msg_tx.clone();
                    // The reply channel blocks until the router resolves the
                    // responder; park the wait off the update loop.
                    thread::spawn(move || {
                        let result = match reply_rx.recv() {
                            Ok(reply) => map_reply(reply),
                            Err(_) => {
                                clip_warn!("background router dropped the request");
                                Err(ConvertFailure::new(
                                    FailureKind::Protocol,
                                    "background router went away",
                                ))
                            }
                        };
                        let _ = msg_tx.send(Msg::ConversionFinished { result });
                    });
                }
                Effect::PackageMarkdown { markdown, title } => {
                    let date = Local::now().format("%Y-%m-%d").to_string();
                    let payload =
                        DownloadPayload::markdown(&markdown, dated_filename(&date, Some(&title)));
                    let result = self
                        .downloader
                        .download(&payload)
                        .map(|path| path.display().to_string())
                        .map_err(|err| err.to_string());
                    let _ = self.msg_tx.send(Msg::DownloadFinished { result });
                }
            }
        }
    }
}

/// Deserialization boundary: the router's wire reply becomes the core's
/// failure taxonomy.
fn map_reply(reply: ConvertReply) -> Result<String, ConvertFailure> {
    if reply.success {
        match reply.markdown.filter(|md| !md.trim().is_empty()) {
            Some(markdown) => Ok(markdown),
            None => Err(ConvertFailure::new(
                FailureKind::Protocol,
                "success reply carried no markdown",
            )),
        }
    } else {
        match reply.error {
            Some(error) => Err(map_error(error)),
            None => Err(ConvertFailure::new(
                FailureKind::Protocol,
                "failure reply carried no error",
            )),
        }
    }
}

fn map_error(error: clipdown_engine::ConvertError) -> ConvertFailure {
    let kind = match error.kind {
        clipdown_engine::FailureKind::Capture => FailureKind::Capture,
        clipdown_engine::FailureKind::Connect => FailureKind::Connect,
        clipdown_engine::FailureKind::Network => FailureKind::Network,
        clipdown_engine::FailureKind::Timeout => FailureKind::Timeout,
        clipdown_engine::FailureKind::Server { status } => FailureKind::Server(status),
        clipdown_engine::FailureKind::EmptyResponse => FailureKind::EmptyResponse,
        clipdown_engine::FailureKind::Protocol => FailureKind::Protocol,
        clipdown_engine::FailureKind::UnsupportedAction => FailureKind::UnsupportedAction,
    };
    ConvertFailure::new(kind, error.message)
}

#[cfg(test)]
mod tests {
    use super::{map_error, map_reply};
    use clipdown_core::FailureKind;
    use clipdown_engine::{ConvertError, ConvertReply};

    #[test]
    fn successful_reply_yields_markdown() {
        let result = map_reply(ConvertReply::converted("# hi".to_string()));
        assert_eq!(result, Ok("# hi".to_string()));
    }

    #[test]
    fn blank_markdown_in_a_success_reply_is_a_protocol_failure() {
        let reply = ConvertReply {
            success: true,
            markdown: Some("   ".to_string()),
            error: None,
        };
        assert_eq!(map_reply(reply).unwrap_err().kind, FailureKind::Protocol);
    }

    #[test]
    fn engine_kinds_map_onto_core_kinds() {
        let error = ConvertError::new(
            clipdown_engine::FailureKind::Server { status: 413 },
            "too large",
        );
        let failure = map_error(error);
        assert_eq!(failure.kind, FailureKind::Server(413));
        assert_eq!(failure.message, "too large");
    }
}
