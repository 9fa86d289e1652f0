use core::fmt;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::{Error, Malformed, Stream};

/// Words in a default image.
pub const CAPACITY: usize = 2048;
/// First address of the handler overlay in a default image.
pub const HANDLER_OFFSET: usize = 1120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    capacity: usize,
    handler_offset: usize,
}

impl Layout {
    pub const DEFAULT: Self = Self { capacity: CAPACITY, handler_offset: HANDLER_OFFSET };

    pub fn new(capacity: usize, handler_offset: usize) -> Result<Self, Error> {
        if handler_offset > capacity {
            return Err(Error::BadLayout { capacity, handler_offset });
        }

        Ok(Self { capacity, handler_offset })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn handler_offset(&self) -> usize {
        self.handler_offset
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What to do with words that would land at or past the end of the image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Overflow {
    /// Fail the load with [`Error::CapacityExceeded`] and leave the image untouched.
    #[default]
    Reject,
    /// Keep the words that fit and count the rest as dropped.
    Truncate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Handler,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary program"),
            Self::Handler => write!(f, "handler program"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: usize,
    pub len: usize,
}

impl Region {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub role: Role,
    /// Addresses actually written.
    pub region: Region,
    /// Words past the end of the image, discarded under [`Overflow::Truncate`].
    pub dropped: usize,
    /// The token parsing stopped at, if it stopped early.
    pub truncated: Option<Malformed>,
    /// Handler words that replaced words written by the primary load.
    pub overlap: usize,
}

/// A fixed-capacity instruction-memory image.
///
/// Every slot starts at zero. The primary program is laid down from address 0,
/// the handler program from [`Layout::handler_offset`], and the whole image is
/// written out as one unsigned decimal per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    layout: Layout,
    overflow: Overflow,
    words: Box<[u32]>,
    primary_end: usize,
}

impl Image {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            overflow: Overflow::default(),
            words: vec![0; layout.capacity].into_boxed_slice(),
            primary_end: 0,
        }
    }

    pub fn overflow(mut self, overflow: Overflow) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn get(&self, addr: usize) -> Option<u32> {
        self.words.get(addr).copied()
    }

    pub fn load_primary(&mut self, source: impl AsRef<[u8]>) -> Result<LoadReport, Error> {
        self.load(Role::Primary, 0, source.as_ref())
    }

    pub fn load_handler(&mut self, source: impl AsRef<[u8]>) -> Result<LoadReport, Error> {
        self.load(Role::Handler, self.layout.handler_offset, source.as_ref())
    }

    fn load(&mut self, role: Role, start: usize, source: &[u8]) -> Result<LoadReport, Error> {
        let (stream, truncated) = Stream::decode(source);
        let room = self.words.len().saturating_sub(start);
        let words = stream.words.len();

        if words > room && self.overflow == Overflow::Reject {
            return Err(Error::CapacityExceeded { role, start, words, room });
        }

        let len = words.min(room);
        self.words[start..start + len].copy_from_slice(&stream.words[..len]);

        let overlap = match role {
            Role::Primary => {
                self.primary_end = len;
                0
            },
            Role::Handler => self.primary_end.saturating_sub(start).min(len),
        };

        Ok(LoadReport {
            role,
            region: Region { start, len },
            dropped: words - len,
            truncated,
            overlap,
        })
    }

    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        for word in self.words.iter() {
            writeln!(w, "{word}")?;
        }

        Ok(())
    }

    /// Writes the image to `path` through a temporary file in the same directory,
    /// so `path` either gets the whole image or is left as it was.
    pub fn persist(&self, path: &Path) -> Result<(), Error> {
        let unavailable = |source| Error::DestinationUnavailable { path: path.to_path_buf(), source };

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut builder = tempfile::Builder::new();
        fresh_permissions(&mut builder);
        let mut tmp = builder.tempfile_in(dir).map_err(unavailable)?;
        {
            let mut w = BufWriter::new(&mut tmp);
            self.write_to(&mut w).map_err(unavailable)?;
            w.flush().map_err(unavailable)?;
        }

        // Keep the mode of an image we're replacing.
        if let Some(meta) = fs::metadata(path).ok().filter(|m| m.is_file()) {
            tmp.as_file().set_permissions(meta.permissions()).map_err(unavailable)?;
        }

        tmp.persist(path).map_err(|e| unavailable(e.error))?;
        Ok(())
    }
}

/// New images get the usual `0o666` less umask instead of the temp file's owner-only mode.
#[cfg(unix)]
fn fresh_permissions(builder: &mut tempfile::Builder<'_, '_>) {
    use std::os::unix::fs::PermissionsExt;

    builder.permissions(fs::Permissions::from_mode(0o666));
}

#[cfg(not(unix))]
fn fresh_permissions(_: &mut tempfile::Builder<'_, '_>) {}

impl Default for Image {
    fn default() -> Self {
        Self::new(Layout::DEFAULT)
    }
}
