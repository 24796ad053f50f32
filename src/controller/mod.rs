//! Input source: turns touchpad gestures into relay frames
//!
//! [`Touchpad`] is a pure state machine. Gesture methods return the frame to send, if any; the
//! caller owns the connection. Nothing is emitted while disconnected or while the pad has no
//! area.

pub mod bot;

use crate::relay::clean_name;
use crate::ws::protocol::{ClientMsg, Point};

/// Two taps closer than this slash
pub const DOUBLE_TAP_MS: u64 = 300;

#[derive(Debug, Default)]
pub struct Touchpad {
    width: f64,
    height: f64,
    cursor_x: f64,
    cursor_y: f64,
    dragging: bool,
    connected: bool,
    name: String,
    last_tap_ms: Option<u64>,
}

impl Touchpad {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connection came up. Returns the stored name to announce, if any.
    pub fn on_connect(&mut self) -> Option<ClientMsg> {
        self.connected = true;
        self.name_frame()
    }

    pub fn on_disconnect(&mut self) {
        self.connected = false;
    }

    /// Store a trimmed, truncated name. Returns the frame announcing it when connected and
    /// non-empty.
    pub fn save_name(&mut self, raw: &str) -> Option<ClientMsg> {
        self.name = clean_name(raw).unwrap_or_default();
        self.name_frame()
    }

    fn name_frame(&self) -> Option<ClientMsg> {
        if !self.connected || self.name.is_empty() {
            return None;
        }
        Some(ClientMsg::SetName {
            name: self.name.clone(),
        })
    }

    /// Finger down at pad-local coordinates
    pub fn press(&mut self, x: f64, y: f64) -> Option<ClientMsg> {
        self.dragging = true;
        self.move_cursor(x, y)
    }

    /// Finger moved; ignored unless pressed
    pub fn drag(&mut self, x: f64, y: f64) -> Option<ClientMsg> {
        if !self.dragging {
            return None;
        }
        self.move_cursor(x, y)
    }

    /// Finger up: slash where the cursor is
    pub fn release(&mut self) -> Option<ClientMsg> {
        self.dragging = false;
        self.normalized().map(ClientMsg::Slash)
    }

    /// A tap at `now_ms`. The second of two taps within [`DOUBLE_TAP_MS`] slashes.
    pub fn tap(&mut self, now_ms: u64) -> Option<ClientMsg> {
        let double = self
            .last_tap_ms
            .is_some_and(|last| now_ms.saturating_sub(last) < DOUBLE_TAP_MS);
        self.last_tap_ms = Some(now_ms);
        if double {
            self.normalized().map(ClientMsg::Slash)
        } else {
            None
        }
    }

    fn move_cursor(&mut self, x: f64, y: f64) -> Option<ClientMsg> {
        self.cursor_x = x;
        self.cursor_y = y;
        self.normalized().map(ClientMsg::Aim)
    }

    /// Cursor in 0..=1 on both axes, or `None` when nothing may be emitted
    pub fn normalized(&self) -> Option<Point> {
        if !self.connected || self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Point {
            x: (self.cursor_x / self.width).clamp(0.0, 1.0),
            y: (self.cursor_y / self.height).clamp(0.0, 1.0),
        })
    }
}
