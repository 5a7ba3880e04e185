//! Console rendering of acquisition progress.

use std::sync::{Arc, Mutex};

use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::Lazy;

use apkforge_progress::{ProgressFn, ProgressStage, ProgressUnit};

const BYTES_STYLE: &str =
    "{msg} {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const COUNT_STYLE: &str = "{msg} {wide_bar:.cyan/blue} {pos}/{len}";
const PB_CHARS: &str = "█▓▒░  ";

static BYTES_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(BYTES_STYLE)
        .ok()
        .map(|s| s.progress_chars(PB_CHARS))
});

static COUNT_TEMPLATE: Lazy<Option<ProgressStyle>> = Lazy::new(|| {
    ProgressStyle::with_template(COUNT_STYLE)
        .ok()
        .map(|s| s.progress_chars(PB_CHARS))
});

/// Observer that renders one `indicatif` bar per phase. `Reset` closes
/// the previous bar and opens a fresh one, so a download followed by an
/// extraction shows as two bars. Never requests cancellation.
pub fn console_progress() -> ProgressFn {
    let bar: Arc<Mutex<Option<ProgressBar>>> = Arc::new(Mutex::new(None));
    Arc::new(move |event| {
        let Ok(mut slot) = bar.lock() else {
            return true;
        };
        match event.stage {
            ProgressStage::Start | ProgressStage::Reset => {
                if let Some(old) = slot.take() {
                    old.finish();
                }
                let pb = match event.total {
                    Some(total) => ProgressBar::new(total),
                    None => ProgressBar::no_length(),
                };
                let template = match event.unit {
                    ProgressUnit::Bytes => BYTES_TEMPLATE.as_ref(),
                    ProgressUnit::Generic => COUNT_TEMPLATE.as_ref(),
                };
                if let Some(style) = template {
                    pb.set_style(style.clone());
                }
                pb.set_message(event.description.clone());
                *slot = Some(pb);
            }
            ProgressStage::Progress => {
                if let Some(pb) = slot.as_ref() {
                    if let Some(total) = event.total {
                        pb.set_length(total);
                    }
                    pb.inc(event.delta);
                }
            }
            ProgressStage::Stop => {
                if let Some(pb) = slot.take() {
                    pb.finish();
                }
            }
        }
        true
    })
}
