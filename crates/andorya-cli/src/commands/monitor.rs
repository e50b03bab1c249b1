use andorya_core::Window;

use crate::tui::app::{App, MonitorConfig};

pub fn run(
    interval_secs: f64,
    window: &str,
    points: usize,
    synthetic: bool,
    proc_root: &str,
    sys_root: &str,
) {
    let window = super::parse_window(window, "window");
    let config = MonitorConfig {
        interval: super::parse_interval(interval_secs),
        window,
        points,
        retention: retention_for(window),
        synthetic,
        paths: super::host_paths(proc_root, sys_root),
        ..MonitorConfig::default()
    };
    let mut app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}

/// Keep a day of history, or more when the first window asks for it.
fn retention_for(window: Window) -> Window {
    if window.minutes() > Window::Day.minutes() {
        window
    } else {
        Window::Day
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_covers_initial_window() {
        assert_eq!(retention_for(Window::Hour), Window::Day);
        assert_eq!(retention_for(Window::Week), Window::Week);
        assert_eq!(retention_for(Window::Minutes(3 * 1440)), Window::Minutes(3 * 1440));
    }
}
