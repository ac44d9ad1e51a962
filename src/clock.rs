use std::{thread, time::Duration};

use eframe::egui;

#[must_use]
pub fn clock_text(time_format: &str) -> String {
    chrono::Local::now().format(time_format).to_string()
}

/// wakes the ui once a second so the clock text stays current even when nothing else repaints.
/// `request_repaint` is the only thing touched from this thread
pub fn spawn_tick(ctx: egui::Context) {
    let spawned = thread::Builder::new()
        .name("clock tick".to_string())
        .spawn(move || loop {
            thread::sleep(Duration::from_secs(1));
            ctx.request_repaint();
        });
    if let Err(e) = spawned {
        log::warn!("couldn't start clock tick, the clock will only update on input: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_chrono_syntax() {
        let text = clock_text("%H:%M");
        assert_eq!(text.len(), 5);
        assert_eq!(text.as_bytes()[2], b':');
        assert_eq!(text.chars().filter(char::is_ascii_digit).count(), 4);
    }
}
