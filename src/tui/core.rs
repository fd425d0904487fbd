use std::time::Duration;

/// Scroll position of a log pane. While `follow` is set the view sticks to the
/// newest line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LogViewport {
    offset: usize,
    follow: bool,
}

impl Default for LogViewport {
    fn default() -> Self {
        Self {
            offset: 0,
            follow: true,
        }
    }
}

impl LogViewport {
    pub(crate) fn follow(&self) -> bool {
        self.follow
    }

    /// First visible line for `total` lines in a pane `height` rows tall.
    pub(crate) fn resolve(&self, total: usize, height: usize) -> usize {
        let max = max_offset(total, height);
        if self.follow {
            max
        } else {
            self.offset.min(max)
        }
    }

    pub(crate) fn scroll_up(&mut self, lines: usize, total: usize, height: usize) {
        let current = self.resolve(total, height);
        self.follow = false;
        self.offset = current.saturating_sub(lines);
    }

    pub(crate) fn scroll_down(&mut self, lines: usize, total: usize, height: usize) {
        let max = max_offset(total, height);
        let next = self.resolve(total, height).saturating_add(lines);
        if next >= max {
            self.jump_to_end();
        } else {
            self.offset = next;
        }
    }

    pub(crate) fn jump_to_start(&mut self) {
        self.follow = false;
        self.offset = 0;
    }

    pub(crate) fn jump_to_end(&mut self) {
        self.follow = true;
        self.offset = 0;
    }

    pub(crate) fn toggle_follow(&mut self, total: usize, height: usize) {
        if self.follow {
            self.offset = self.resolve(total, height);
            self.follow = false;
        } else {
            self.jump_to_end();
        }
    }
}

pub(crate) fn max_offset(total: usize, height: usize) -> usize {
    total.saturating_sub(height.max(1))
}

pub(crate) fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h{minutes:02}m{secs:02}s")
    } else if minutes > 0 {
        format!("{minutes}m{secs:02}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_elapsed_uses_compact_human_time() {
        assert_eq!(format_elapsed(Duration::from_secs(9)), "9s");
        assert_eq!(format_elapsed(Duration::from_secs(65)), "1m05s");
        assert_eq!(format_elapsed(Duration::from_secs(3665)), "1h01m05s");
    }

    #[test]
    fn following_view_tracks_the_end() {
        let view = LogViewport::default();
        assert_eq!(view.resolve(100, 10), 90);
        assert_eq!(view.resolve(5, 10), 0);
    }

    #[test]
    fn scrolling_up_detaches_and_scrolling_back_down_reattaches() {
        let mut view = LogViewport::default();
        view.scroll_up(5, 100, 10);
        assert!(!view.follow());
        assert_eq!(view.resolve(100, 10), 85);
        // New output does not move a detached view.
        assert_eq!(view.resolve(120, 10), 85);
        view.scroll_down(50, 120, 10);
        assert!(view.follow());
        assert_eq!(view.resolve(120, 10), 110);
    }

    #[test]
    fn toggle_follow_freezes_current_position() {
        let mut view = LogViewport::default();
        view.toggle_follow(40, 10);
        assert_eq!(view.resolve(60, 10), 30);
        view.toggle_follow(60, 10);
        assert_eq!(view.resolve(60, 10), 50);
        view.jump_to_start();
        assert_eq!(view.resolve(60, 10), 0);
    }
}
