use core::fmt;

use alloc::vec::Vec;

/// Console output for a `monitor` command, delivered to GDB as `O<hex>`
/// packets.
///
/// Every completed line is sent as soon as it is written, so a long running
/// command (a mass erase, a rescan of the debug port) shows progress while it
/// runs. A trailing partial line is sent when the `ConsoleOutput` is dropped.
///
/// Write to it with the [`output!`](crate::output) and
/// [`outputln!`](crate::outputln) macros.
pub struct ConsoleOutput<'a> {
    line: Vec<u8>,
    send: &'a mut dyn FnMut(&[u8]),
}

impl fmt::Write for ConsoleOutput<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for chunk in s.as_bytes().split_inclusive(|b| *b == b'\n') {
            self.line.extend_from_slice(chunk);
            if chunk.ends_with(b"\n") {
                self.send_line();
            }
        }
        Ok(())
    }
}

impl<'a> ConsoleOutput<'a> {
    pub(crate) fn new(send: &'a mut dyn FnMut(&[u8])) -> ConsoleOutput<'a> {
        ConsoleOutput {
            line: Vec::new(),
            send,
        }
    }

    fn send_line(&mut self) {
        if !self.line.is_empty() {
            (self.send)(&self.line);
            self.line.clear();
        }
    }
}

impl Drop for ConsoleOutput<'_> {
    fn drop(&mut self) {
        self.send_line()
    }
}

/// Send formatted data to the GDB client console.
///
/// The first argument must be a [`ConsoleOutput`].
#[macro_export]
macro_rules! output {
    ($console_output:expr, $($args:tt)*) => {{
        use core::fmt::Write;
        let _ = write!($console_output, $($args)*);
    }};
}

/// Send formatted data to the GDB client console, with a newline appended.
///
/// The first argument must be a [`ConsoleOutput`].
#[macro_export]
macro_rules! outputln {
    ($console_output:expr) => {{
        use core::fmt::Write;
        let _ = writeln!($console_output);
    }};
    ($console_output:expr, $($args:tt)*) => {{
        use core::fmt::Write;
        let _ = writeln!($console_output, $($args)*);
    }};
}
