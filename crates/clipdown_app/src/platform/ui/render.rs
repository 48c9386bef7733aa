use clipdown_core::{AppViewModel, Severity, StepStatus};

/// Projects the view model onto terminal lines, one per indicator.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    for step in &view.steps {
        let mark = match step.status {
            StepStatus::Completed => "[x]",
            StepStatus::Active => "[>]",
            StepStatus::Pending => "[ ]",
        };
        lines.push(format!("{mark} {}", step.label));
    }
    if let Some(info) = &view.page_info {
        lines.push(format!("Page: {} ({})", info.title, info.size_text));
    }
    if let Some(status) = &view.status {
        let prefix = match status.severity {
            Severity::Success => "ok",
            Severity::Warning => "warn",
            Severity::Error => "error",
        };
        lines.push(format!("{prefix}: {}", status.text));
    }
    lines
}

pub fn print(view: &AppViewModel) {
    println!();
    for line in render(view) {
        println!("{line}");
    }
}
