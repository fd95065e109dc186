use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

/// Next pending key press, or `None` if the terminal has nothing queued.
/// Never blocks, so background results keep flowing between frames.
pub fn next_key_event() -> color_eyre::Result<Option<KeyEvent>> {
    while event::poll(Duration::ZERO)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(Some(key));
            }
        }
    }
    Ok(None)
}
