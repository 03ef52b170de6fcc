//! Handles all user-facing output for the runner.
//!
//! Everything the library prints goes through an [`OutputSink`]: status
//! lines, assertion diagnostics and the session summary. Colour and cursor
//! control are sink capabilities too, so a sink decides how (or whether) to
//! render them. [`Printer`] layers the run configuration's colour switch on
//! top of a sink and is what the session and the assertion recorder share.

// ============================================================================
// OUTPUT SINKS: OutputBuffer, SharedOutput, StdoutSink and NullSink
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use termcolor::{Buffer, ColorChoice, ColorSpec, StandardStream, WriteColor};

pub use termcolor::Color;

/// Moves the cursor to the start of the previous line.
pub const CURSOR_UP: &str = "\x1b[1A";

/// Destination for formatted runner output.
pub trait OutputSink {
    fn emit(&mut self, text: &str);
    fn set_color(&mut self, color: Color);
    fn reset_color(&mut self);
    fn cursor_up(&mut self);
}

fn foreground(color: Color) -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color)).set_reset(false);
    spec
}

/// OutputBuffer: collects output, ANSI codes included, for tests or
/// programmatic capture.
pub struct OutputBuffer {
    buffer: Buffer,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self {
            buffer: Buffer::ansi(),
        }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.buffer.as_slice()).unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for OutputBuffer {
    fn emit(&mut self, text: &str) {
        let _ = self.buffer.write_all(text.as_bytes());
    }

    fn set_color(&mut self, color: Color) {
        let _ = self.buffer.set_color(&foreground(color));
    }

    fn reset_color(&mut self) {
        let _ = self.buffer.reset();
    }

    fn cursor_up(&mut self) {
        self.emit(CURSOR_UP);
    }
}

/// An [`OutputBuffer`] that can be handed to a printer while the caller keeps
/// a handle to read it back.
#[derive(Clone, Default)]
pub struct SharedOutput(pub Rc<RefCell<OutputBuffer>>);

impl SharedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> String {
        self.0.borrow().as_str().to_owned()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl OutputSink for SharedOutput {
    fn emit(&mut self, text: &str) {
        self.0.borrow_mut().emit(text);
    }

    fn set_color(&mut self, color: Color) {
        self.0.borrow_mut().set_color(color);
    }

    fn reset_color(&mut self) {
        self.0.borrow_mut().reset_color();
    }

    fn cursor_up(&mut self) {
        self.0.borrow_mut().cursor_up();
    }
}

/// StdoutSink: writes to stdout, unbuffered, for the CLI and default session.
pub struct StdoutSink {
    stream: StandardStream,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            stream: StandardStream::stdout(ColorChoice::Always),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for StdoutSink {
    fn emit(&mut self, text: &str) {
        let _ = self.stream.write_all(text.as_bytes());
        let _ = self.stream.flush();
    }

    fn set_color(&mut self, color: Color) {
        let _ = self.stream.set_color(&foreground(color));
    }

    fn reset_color(&mut self) {
        let _ = self.stream.reset();
    }

    fn cursor_up(&mut self) {
        self.emit(CURSOR_UP);
    }
}

// A sink that drops everything.
pub struct NullSink;

impl OutputSink for NullSink {
    fn emit(&mut self, _text: &str) {}
    fn set_color(&mut self, _color: Color) {}
    fn reset_color(&mut self) {}
    fn cursor_up(&mut self) {}
}

// ============================================================================
// PRINTER
// ============================================================================

/// A sink plus the colour switch from the run configuration.
pub struct Printer {
    sink: Box<dyn OutputSink>,
    color: bool,
}

/// The printer as shared between a session and the assertion recorder.
pub type SharedPrinter = Rc<RefCell<Printer>>;

impl Printer {
    pub fn new(sink: Box<dyn OutputSink>) -> Self {
        Self { sink, color: true }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(StdoutSink::new()))
    }

    /// A printer writing into `output`.
    pub fn capture(output: &SharedOutput) -> Self {
        Self::new(Box::new(output.clone()))
    }

    pub fn null() -> Self {
        Self::new(Box::new(NullSink))
    }

    pub fn shared(self) -> SharedPrinter {
        Rc::new(RefCell::new(self))
    }

    pub fn set_color_enabled(&mut self, enabled: bool) {
        self.color = enabled;
    }

    pub fn color_enabled(&self) -> bool {
        self.color
    }

    pub fn write(&mut self, text: &str) -> &mut Self {
        self.sink.emit(text);
        self
    }

    /// Renders any displayable value: integers, characters, strings, or a
    /// [`Pointer`].
    pub fn write_value<T: fmt::Display + ?Sized>(&mut self, value: &T) -> &mut Self {
        self.sink.emit(&value.to_string());
        self
    }

    /// Writes `text` wrapped in `color` when colours are enabled.
    pub fn print_in_color(&mut self, text: &str, color: Color) -> &mut Self {
        if self.color {
            self.sink.set_color(color);
        }
        self.sink.emit(text);
        if self.color {
            self.sink.reset_color();
        }
        self
    }

    pub fn cursor_up(&mut self) -> &mut Self {
        self.sink.cursor_up();
        self
    }

    /// Swaps in a new sink, returning the previous one.
    pub fn replace_sink(&mut self, sink: Box<dyn OutputSink>) -> Box<dyn OutputSink> {
        std::mem::replace(&mut self.sink, sink)
    }
}

/// Displays a raw pointer as hex, or `NULL`.
pub struct Pointer<T: ?Sized>(pub *const T);

impl<T: ?Sized> fmt::Display for Pointer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_null() {
            f.write_str("NULL")
        } else {
            write!(f, "{:p}", self.0)
        }
    }
}
