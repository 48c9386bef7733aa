use clip_logging::clip_warn;

/// System-notification seam for flows with no waiting caller (region and
/// context-menu conversions).
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str);
}

/// Default notifier: surfaces notifications through the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        clip_warn!("[notification] {title}: {body}");
    }
}
