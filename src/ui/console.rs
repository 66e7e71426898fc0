use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::{Phase, Ui};

/// Line-oriented UI: a single indicatif bar for the current phase, with
/// messages routed through `tracing`
#[derive(Default)]
pub struct ConsoleUi {
    bar: Option<ProgressBar>,
}

impl ConsoleUi {
    pub fn new() -> Self {
        Self::default()
    }

    fn bar(&mut self, total: u64) -> &ProgressBar {
        self.bar.get_or_insert_with(|| {
            let pb = ProgressBar::new(total);
            let style = ProgressStyle::default_bar()
                .template("{msg:24} [{bar:40.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-");
            pb.set_style(style);
            pb
        })
    }
}

impl Ui for ConsoleUi {
    fn set_phase(&mut self, phase: Phase) {
        self.clear_progress();
        info!("{}", phase);
    }

    fn set_info(&mut self, info: impl Into<String>) {
        info!("{}", info.into());
    }

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        let label: String = label.into();
        let pb = self.bar(total);
        pb.set_length(total);
        pb.set_position(current);
        pb.set_message(label);
    }

    fn clear_progress(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.finish_and_clear();
        }
    }

    fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        match &self.bar {
            Some(pb) => pb.suspend(|| info!("{}", message)),
            None => info!("{}", message),
        }
    }
}

impl Drop for ConsoleUi {
    fn drop(&mut self) {
        self.clear_progress();
    }
}
