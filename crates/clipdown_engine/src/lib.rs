//! Clipdown engine: background orchestrator for conversion and download.
mod convert;
mod download;
mod menu;
mod notify;
mod router;
mod types;

pub use convert::{ConvertService, ConvertSettings, RemoteConverter, CLIENT_VERSION_HEADER};
pub use download::{
    dated_filename, DownloadError, DownloadPayload, Downloader, FileDownloader, MAX_TITLE_CHARS,
};
pub use menu::{
    registrations, MenuAction, MenuContext, MenuEvent, MenuHandler, MenuRegistration, PageAgent,
};
pub use notify::{LogNotifier, Notifier};
pub use router::{Responder, RouterDeps, RouterHandle};
pub use types::{CapturedDocument, ConvertError, ConvertReply, FailureKind};
