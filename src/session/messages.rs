//! Status tags written at the start of every session output line.

use crate::cli::output::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    StartEnd,
    Run,
    Pass,
    Fail,
}

impl Message {
    pub const fn tag(self) -> &'static str {
        match self {
            Message::StartEnd => "[========]",
            Message::Run => "[  RUN   ]",
            Message::Pass => "[  PASS  ]",
            Message::Fail => "[  FAIL  ]",
        }
    }

    /// Colour the tag is normally printed in.
    pub const fn color(self) -> Color {
        match self {
            Message::Fail => Color::Red,
            _ => Color::Green,
        }
    }
}
