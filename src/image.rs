//! Kitty graphics protocol images and placements
//!
//! The toolkit treats image data as opaque: callers hand over encoded PNG
//! bytes, transmission chunks them as base64, and the screen records where
//! placements go. Decoding and scaling happen terminal-side.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Maximum base64 payload bytes per transmit chunk
const CHUNK_SIZE: usize = 4096;

static NEXT_IMAGE_ID: AtomicU32 = AtomicU32::new(1);

/// An image registered with the terminal
///
/// Holds the encoded PNG bytes; `transmit` must run once before the image
/// can be placed.
#[derive(Debug, Clone)]
pub struct Image {
    /// Terminal-side image id
    pub id: u32,
    /// Encoded PNG data
    pub png: Arc<[u8]>,
    /// Source width in pixels, as reported by the caller
    pub pixel_width: u16,
    /// Source height in pixels, as reported by the caller
    pub pixel_height: u16,
}

impl Image {
    /// Register a new image from encoded PNG bytes
    pub fn from_png(png: impl Into<Arc<[u8]>>, pixel_width: u16, pixel_height: u16) -> Self {
        Self {
            id: NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed),
            png: png.into(),
            pixel_width,
            pixel_height,
        }
    }

    /// Number of columns the image covers given a cell pixel width
    pub fn cell_width(&self, cell_pixel_width: u16) -> u16 {
        if cell_pixel_width == 0 {
            return 0;
        }
        self.pixel_width.div_ceil(cell_pixel_width)
    }

    /// Number of rows the image covers given a cell pixel height
    pub fn cell_height(&self, cell_pixel_height: u16) -> u16 {
        if cell_pixel_height == 0 {
            return 0;
        }
        self.pixel_height.div_ceil(cell_pixel_height)
    }

    /// Emit the chunked transmit sequence (`ESC _ G … ESC \`)
    ///
    /// The base64 payload is split into chunks of at most 4096 bytes; every
    /// chunk except the last carries `m=1`.
    pub fn transmit(&self, writer: &mut impl Write) -> io::Result<()> {
        let encoded = BASE64.encode(&self.png);
        let bytes = encoded.as_bytes();
        let mut chunks = bytes.chunks(CHUNK_SIZE).peekable();
        let mut first = true;

        while let Some(chunk) = chunks.next() {
            let more = if chunks.peek().is_some() { 1 } else { 0 };
            if first {
                write!(writer, "\x1b_Ga=t,f=100,i={},m={};", self.id, more)?;
                first = false;
            } else {
                write!(writer, "\x1b_Gm={};", more)?;
            }
            writer.write_all(chunk)?;
            writer.write_all(b"\x1b\\")?;
        }
        Ok(())
    }
}

/// How a placement is scaled into its cell rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scale {
    /// Place at source size
    #[default]
    None,
    /// Scale to fit the destination rectangle, preserving aspect ratio
    Fit,
    /// Scale to fill the destination rectangle
    Fill,
}

/// A placement of a transmitted image on the screen
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// The image being placed
    pub image: Image,
    /// Destination column
    pub col: u16,
    /// Destination row
    pub row: u16,
    /// Z-index relative to text (negative draws under)
    pub z: i32,
    /// Scaling mode
    pub scale: Scale,
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Placement {
    /// Emit the placement sequence for an already-transmitted image
    ///
    /// The cursor must be at the destination cell when this runs; the diff
    /// renderer positions it.
    pub fn place(&self, writer: &mut impl Write) -> io::Result<()> {
        write!(
            writer,
            "\x1b_Ga=p,i={},p={},z={},C=1\x1b\\",
            self.image.id,
            // One placement id per (image, position) keeps repeated frames stable
            placement_id(self),
            self.z
        )
    }

    /// Emit the delete sequence for this placement
    pub fn delete(&self, writer: &mut impl Write) -> io::Result<()> {
        write!(
            writer,
            "\x1b_Ga=d,d=i,i={},p={}\x1b\\",
            self.image.id,
            placement_id(self)
        )
    }
}

fn placement_id(p: &Placement) -> u32 {
    // Stable per cell position; terminals replace placements with the same id
    ((p.col as u32) << 16) | ((p.row as u32) + 1)
}
