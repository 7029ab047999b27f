//! Small platform helpers that don't belong to any one pipeline stage.

/// Queries the terminal width of `stream`, used by the shell to wrap and
/// indent long status messages. Returns `None` off a terminal (piped
/// output, non-Unix targets) — callers fall back to unwrapped output.
#[cfg(unix)]
#[must_use]
pub fn terminal_width(stream: atty::Stream) -> Option<usize> {
    let fd = match stream {
        atty::Stream::Stdout => libc::STDOUT_FILENO,
        atty::Stream::Stderr => libc::STDERR_FILENO,
        _ => return None,
    };

    unsafe {
        let mut size: libc::winsize = std::mem::zeroed();
        if libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) == 0 && size.ws_col > 0 {
            Some(size.ws_col as usize)
        } else {
            None
        }
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn terminal_width(_stream: atty::Stream) -> Option<usize> { None }

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn non_terminal_stream_variant_returns_none() {
        // `atty::Stream::Stdin` is never queried for width by the shell;
        // exercised here only to confirm the fallback arm doesn't panic.
        assert_eq!(terminal_width(atty::Stream::Stdin), None);
    }
}
