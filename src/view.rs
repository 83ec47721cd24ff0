use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Rendering surface for a poller session. Each method is one UI event.
pub trait JobView {
    /// Enables or disables the form inputs and the download/clear actions.
    fn set_form_enabled(&mut self, enabled: bool);
    fn set_progress_visible(&mut self, visible: bool);
    /// The busy spinner.
    fn set_busy(&mut self, busy: bool);
    fn set_cancel_visible(&mut self, visible: bool);
    fn set_job_id(&mut self, job_id: &str);
    /// Percent as reported by the server; not clamped.
    fn set_progress(&mut self, percent: f64);
    fn set_status_text(&mut self, text: &str);
    fn show_download_link(&mut self, url: &str);
    fn hide_download_link(&mut self);
    /// Blocking notification.
    fn alert(&mut self, message: &str);
    fn clear_fields(&mut self);
}

/// Terminal rendering with an indicatif bar.
pub struct TerminalView {
    pb: ProgressBar,
}

impl TerminalView {
    pub fn new() -> Self {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} {bar:40} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
        Self { pb }
    }
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl JobView for TerminalView {
    fn set_form_enabled(&mut self, enabled: bool) {
        tracing::debug!(enabled, "form");
    }

    fn set_progress_visible(&mut self, visible: bool) {
        if visible {
            self.pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
            self.pb.reset();
        } else {
            self.pb.finish_and_clear();
        }
    }

    fn set_busy(&mut self, busy: bool) {
        if busy {
            self.pb.enable_steady_tick(Duration::from_millis(120));
        } else {
            self.pb.disable_steady_tick();
            self.pb.tick();
        }
    }

    fn set_cancel_visible(&mut self, visible: bool) {
        if visible {
            self.pb.println("Press Ctrl-C to cancel");
        }
    }

    fn set_job_id(&mut self, job_id: &str) {
        self.pb.suspend(|| println!("Job: {}", job_id));
    }

    fn set_progress(&mut self, percent: f64) {
        self.pb.set_position(percent.clamp(0.0, 100.0) as u64);
    }

    fn set_status_text(&mut self, text: &str) {
        self.pb.set_message(text.to_string());
    }

    fn show_download_link(&mut self, url: &str) {
        self.pb.suspend(|| println!("Download CSV: {}", url));
    }

    fn hide_download_link(&mut self) {}

    fn alert(&mut self, message: &str) {
        self.pb.suspend(|| eprintln!("{}", message));
    }

    fn clear_fields(&mut self) {}
}
