//! The reader task
//!
//! Owns the thread that blocks in `poll` over the tty, the wakeup pipe,
//! and the SIGWINCH pipe. It is the sole producer of the event queue:
//! parser output is interned through the grapheme cache, capability
//! discoveries are written to the shared flags, pixel mouse coordinates
//! are converted to cells, and everything is pushed in arrival order.

use super::cache::GraphemeCache;
use super::parser::Parser;
use super::queue::{Drain, EventQueue};
use super::{Event, MouseEvent, Winsize};
use crate::caps::Capabilities;
use crate::tty::{poll_ready, PollReady, Tty, Wakeup};
use crate::{log_debug, log_error, Error, Result};
use std::os::fd::{AsRawFd, OwnedFd};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Default bound of the event queue; sized for input bursts (a large
/// paste arrives as many small events)
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Read buffer size; a read that fills it signals that more input is
/// probably pending, which defers a trailing lone ESC
const SCRATCH_LEN: usize = 4096;

/// Connects the tty reader thread to the UI thread
pub struct EventReader {
    queue: Arc<EventQueue<Event>>,
    wakeup: Arc<Wakeup>,
    handle: Option<JoinHandle<()>>,
}

impl EventReader {
    /// Spawn the reader thread
    ///
    /// Registers the SIGWINCH pipe, then blocks in poll until `stop`.
    pub fn start(tty: Arc<Tty>, caps: Arc<Capabilities>) -> Result<Self> {
        let queue = Arc::new(EventQueue::new(DEFAULT_QUEUE_CAPACITY));
        let wakeup = Arc::new(Wakeup::new()?);
        let (winch_read, winch_write) = Wakeup::new()?.into_split();
        signal_hook::low_level::pipe::register(libc::SIGWINCH, winch_write)
            .map_err(|e| Error::Terminal(format!("SIGWINCH registration failed: {}", e)))?;

        let handle = {
            let queue = Arc::clone(&queue);
            let wakeup = Arc::clone(&wakeup);
            std::thread::Builder::new()
                .name("weft-reader".into())
                .spawn(move || run_reader(tty, queue, caps, wakeup, winch_read))
                .map_err(Error::Io)?
        };

        Ok(Self {
            queue,
            wakeup,
            handle: Some(handle),
        })
    }

    /// The shared event queue
    pub fn queue(&self) -> &Arc<EventQueue<Event>> {
        &self.queue
    }

    /// Enqueue an application-generated event (`Init`, `Winsize`, user
    /// events)
    pub fn post(&self, event: Event) {
        self.queue.push(event);
    }

    /// Pop one event if any is queued
    pub fn try_event(&self) -> Option<Event> {
        self.queue.try_pop()
    }

    /// Drain the whole queue under one lock acquisition
    pub fn drain(&self) -> Drain<'_, Event> {
        self.queue.drain()
    }

    /// Signal the reader thread and wait for it to exit
    pub fn stop(&mut self) {
        self.wakeup.wake();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log_error!("reader thread panicked");
            }
        }
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_reader(
    tty: Arc<Tty>,
    queue: Arc<EventQueue<Event>>,
    caps: Arc<Capabilities>,
    wakeup: Arc<Wakeup>,
    winch_read: OwnedFd,
) {
    let mut parser = Parser::new();
    let mut cache = GraphemeCache::new();
    let mut carried: Vec<u8> = Vec::new();
    let mut scratch = [0u8; SCRATCH_LEN];
    let mut winsize = tty.winsize().unwrap_or_default();

    log_debug!("reader started on fd {}", tty.raw_fd());

    loop {
        let ready = match poll_ready(tty.raw_fd(), wakeup.read_fd(), winch_read.as_raw_fd()) {
            Ok(ready) => ready,
            Err(e) => {
                log_error!("poll failed: {}", e);
                break;
            }
        };

        match ready {
            PollReady::Quit => break,
            PollReady::Winch => {
                drain_fd(&winch_read);
                if let Ok(ws) = tty.winsize() {
                    winsize = ws;
                    queue.push(Event::Winsize(ws));
                }
            }
            PollReady::Input => {
                let n = match tty.read(&mut scratch) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        log_error!("tty read failed: {}", e);
                        break;
                    }
                };
                let more = n == scratch.len();
                carried.extend_from_slice(&scratch[..n]);

                let mut offset = 0;
                while offset < carried.len() {
                    parser.sgr_pixels = caps.has_sgr_pixels();
                    let result = parser.parse(&carried[offset..], more, &mut cache);
                    if result.consumed == 0 {
                        // Incomplete tail: carry it into the next read
                        break;
                    }
                    offset += result.consumed;
                    if let Some(event) = result.event {
                        deliver(event, &queue, &caps, winsize);
                    }
                }
                carried.drain(..offset);
            }
        }
    }

    log_debug!("reader stopped");
}

/// Record capability discoveries, convert pixel mouse coordinates, push
fn deliver(event: Event, queue: &EventQueue<Event>, caps: &Capabilities, winsize: Winsize) {
    match &event {
        Event::CapKittyKeyboard => caps.kitty_keyboard.store(true, Ordering::Relaxed),
        Event::CapKittyGraphics => caps.kitty_graphics.store(true, Ordering::Relaxed),
        Event::CapRgb => caps.rgb.store(true, Ordering::Relaxed),
        Event::CapUnicodeWidth => caps.unicode_width.store(true, Ordering::Relaxed),
        _ => {}
    }

    let event = match event {
        Event::Mouse(mouse) if caps.has_sgr_pixels() => {
            Event::Mouse(pixels_to_cells(mouse, winsize))
        }
        other => other,
    };
    queue.push(event);
}

fn pixels_to_cells(mut mouse: MouseEvent, winsize: Winsize) -> MouseEvent {
    if winsize.cols > 0 && winsize.rows > 0 && winsize.pixel_width > 0 && winsize.pixel_height > 0 {
        let cell_w = (winsize.pixel_width / winsize.cols).max(1);
        let cell_h = (winsize.pixel_height / winsize.rows).max(1);
        mouse.col = (mouse.pixel_x / cell_w).min(winsize.cols.saturating_sub(1));
        mouse.row = (mouse.pixel_y / cell_h).min(winsize.rows.saturating_sub(1));
    }
    mouse
}

fn drain_fd(fd: &OwnedFd) {
    let mut buf = [0u8; 64];
    loop {
        let n = unsafe { libc::read(fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
        if n <= 0 {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{MouseButton, MouseEventKind, Modifiers};

    #[test]
    fn test_pixels_to_cells_conversion() {
        let winsize = Winsize {
            cols: 80,
            rows: 24,
            pixel_width: 800,
            pixel_height: 480,
        };
        let mouse = MouseEvent {
            col: 0,
            row: 0,
            pixel_x: 105,
            pixel_y: 45,
            button: MouseButton::Left,
            modifiers: Modifiers::empty(),
            kind: MouseEventKind::Press,
        };
        let converted = pixels_to_cells(mouse, winsize);
        assert_eq!((converted.col, converted.row), (10, 2));
    }

    #[test]
    fn test_pixels_to_cells_without_pixel_info() {
        let winsize = Winsize {
            cols: 80,
            rows: 24,
            pixel_width: 0,
            pixel_height: 0,
        };
        let mouse = MouseEvent {
            col: 3,
            row: 4,
            pixel_x: 0,
            pixel_y: 0,
            button: MouseButton::Left,
            modifiers: Modifiers::empty(),
            kind: MouseEventKind::Press,
        };
        // Without pixel dimensions the event passes through untouched
        assert_eq!(pixels_to_cells(mouse, winsize), mouse);
    }

    #[test]
    fn test_deliver_sets_capability_flags() {
        let queue = EventQueue::new(8);
        let caps = Capabilities::default();
        deliver(Event::CapKittyKeyboard, &queue, &caps, Winsize::default());
        deliver(Event::CapUnicodeWidth, &queue, &caps, Winsize::default());
        assert!(caps.has_kitty_keyboard());
        assert!(caps.has_unicode_width());
        // The events are still forwarded in order
        assert_eq!(queue.try_pop(), Some(Event::CapKittyKeyboard));
        assert_eq!(queue.try_pop(), Some(Event::CapUnicodeWidth));
    }
}
