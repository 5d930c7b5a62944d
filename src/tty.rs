//! Controlling-terminal ownership
//!
//! Opens `/dev/tty` read/write, snapshots the termios state, and switches
//! the terminal into raw mode. Restoration runs on every exit path: `Drop`
//! restores even when the frame loop unwinds. The reader task polls the
//! tty together with an internal wakeup pipe (for `stop`) and a pipe fed
//! by the SIGWINCH handler.

use crate::event::Winsize;
use crate::{log_warn, Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::mem::MaybeUninit;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};

/// The controlling terminal in raw mode
pub struct Tty {
    file: File,
    original: libc::termios,
    restored: AtomicBool,
}

impl std::fmt::Debug for Tty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tty")
            .field("fd", &self.file.as_raw_fd())
            .field("restored", &self.restored)
            .finish()
    }
}

impl Tty {
    /// Open the controlling terminal and enter raw mode
    pub fn open() -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/tty")
            .map_err(|e| Error::Terminal(format!("cannot open /dev/tty: {}", e)))?;

        let fd = file.as_raw_fd();
        let original = tcgetattr(fd)?;

        let mut raw = original;
        // No canonical input, echo, signals, or flow control; 8-bit chars;
        // reads return as soon as one byte arrives
        raw.c_iflag &= !(libc::IGNBRK
            | libc::BRKINT
            | libc::PARMRK
            | libc::ISTRIP
            | libc::INLCR
            | libc::IGNCR
            | libc::ICRNL
            | libc::IXON);
        raw.c_oflag &= !libc::OPOST;
        raw.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
        raw.c_cflag &= !(libc::CSIZE | libc::PARENB);
        raw.c_cflag |= libc::CS8;
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        tcsetattr(fd, &raw)?;

        Ok(Self {
            file,
            original,
            restored: AtomicBool::new(false),
        })
    }

    /// The raw file descriptor, for the poll set
    pub fn raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    /// Restore the saved termios state (idempotent)
    pub fn restore(&self) {
        if self.restored.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = tcsetattr(self.file.as_raw_fd(), &self.original) {
            log_warn!("failed to restore termios: {}", e);
        }
    }

    /// Query the current window size
    pub fn winsize(&self) -> io::Result<Winsize> {
        let mut ws = MaybeUninit::<libc::winsize>::uninit();
        // TIOCGWINSZ fills the struct on success
        let rc = unsafe { libc::ioctl(self.file.as_raw_fd(), libc::TIOCGWINSZ, ws.as_mut_ptr()) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        let ws = unsafe { ws.assume_init() };
        Ok(Winsize {
            cols: ws.ws_col,
            rows: ws.ws_row,
            pixel_width: ws.ws_xpixel,
            pixel_height: ws.ws_ypixel,
        })
    }

    /// Read available input bytes
    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        (&self.file).read(buf)
    }

    /// Write output bytes
    pub fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        (&self.file).write_all(buf)
    }
}

impl io::Write for &Tty {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&self.file).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&self.file).flush()
    }
}

impl Drop for Tty {
    fn drop(&mut self) {
        self.restore();
    }
}

fn tcgetattr(fd: RawFd) -> Result<libc::termios> {
    let mut termios = MaybeUninit::<libc::termios>::uninit();
    let rc = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if rc != 0 {
        return Err(Error::Terminal(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    Ok(unsafe { termios.assume_init() })
}

fn tcsetattr(fd: RawFd, termios: &libc::termios) -> Result<()> {
    // TCSAFLUSH discards unread input from the old mode
    let rc = unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, termios) };
    if rc != 0 {
        return Err(Error::Terminal(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    Ok(())
}

/// A self-pipe used to interrupt a blocked poll
#[derive(Debug)]
pub struct Wakeup {
    read: OwnedFd,
    write: OwnedFd,
}

impl Wakeup {
    /// Create the pipe pair, non-blocking on both ends
    pub fn new() -> io::Result<Self> {
        let mut fds = [0 as RawFd; 2];
        let rc = unsafe {
            libc::pipe2(
                fds.as_mut_ptr(),
                libc::O_CLOEXEC | libc::O_NONBLOCK,
            )
        };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        // Both descriptors are fresh and owned exclusively here
        let (read, write) = unsafe {
            use std::os::fd::FromRawFd;
            (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1]))
        };
        Ok(Self { read, write })
    }

    /// The read end, for the poll set
    pub fn read_fd(&self) -> RawFd {
        self.read.as_raw_fd()
    }

    /// Split into owned (read, write) ends
    ///
    /// Used for the SIGWINCH pipe, whose write end is handed to the signal
    /// handler registration.
    pub fn into_split(self) -> (OwnedFd, OwnedFd) {
        (self.read, self.write)
    }

    /// Write one byte; a full pipe already guarantees a wakeup
    pub fn wake(&self) {
        let buf = [0u8];
        let _ = unsafe { libc::write(self.write.as_raw_fd(), buf.as_ptr().cast(), 1) };
    }

    /// Drain any pending wakeup bytes
    pub fn drain(&self) {
        let mut buf = [0u8; 64];
        loop {
            let n = unsafe {
                libc::read(self.read.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len())
            };
            if n <= 0 {
                break;
            }
        }
    }
}

/// What a poll round observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollReady {
    /// The tty has input bytes
    Input,
    /// The window-change pipe fired
    Winch,
    /// The wakeup pipe fired: the reader should quit
    Quit,
}

/// Block until the tty, the winch pipe, or the wakeup pipe is readable
///
/// The wakeup pipe wins ties so `stop` always terminates the reader
/// promptly.
pub fn poll_ready(tty_fd: RawFd, wakeup_fd: RawFd, winch_fd: RawFd) -> io::Result<PollReady> {
    let mut fds = [
        libc::pollfd {
            fd: wakeup_fd,
            events: libc::POLLIN,
            revents: 0,
        },
        libc::pollfd {
            fd: winch_fd,
            events: libc::POLLIN,
            revents: 0,
        },
        libc::pollfd {
            fd: tty_fd,
            events: libc::POLLIN,
            revents: 0,
        },
    ];

    loop {
        let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if fds[0].revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0 {
            return Ok(PollReady::Quit);
        }
        if fds[1].revents & libc::POLLIN != 0 {
            return Ok(PollReady::Winch);
        }
        if fds[2].revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0 {
            return Ok(PollReady::Input);
        }
    }
}
