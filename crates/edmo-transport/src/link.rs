use std::fs::File;
use std::io::{Read, Write};

use crate::error::Result;

/// A connected duplex link to the controller. Implements Read + Write.
///
/// One reader and any number of sequential writers share the link; clone it
/// with [`Link::try_clone`] to hand the read half to a dedicated thread.
pub struct Link {
    inner: LinkInner,
}

enum LinkInner {
    Device(File),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for Link {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            LinkInner::Device(file) => file.read(buf),
            #[cfg(unix)]
            LinkInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Link {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            LinkInner::Device(file) => file.write(buf),
            #[cfg(unix)]
            LinkInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            LinkInner::Device(file) => file.flush(),
            #[cfg(unix)]
            LinkInner::Unix(stream) => stream.flush(),
        }
    }
}

impl Link {
    /// Wrap an already-open device file.
    pub fn from_file(file: File) -> Self {
        Self {
            inner: LinkInner::Device(file),
        }
    }

    /// Wrap a connected Unix domain socket stream.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: LinkInner::Unix(stream),
        }
    }

    /// A connected in-process pair, useful for emulating a controller.
    #[cfg(unix)]
    pub fn pair() -> Result<(Self, Self)> {
        let (left, right) = std::os::unix::net::UnixStream::pair()?;
        Ok((Self::from_unix(left), Self::from_unix(right)))
    }

    /// Try to clone this link (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            LinkInner::Device(file) => Ok(Self::from_file(file.try_clone()?)),
            #[cfg(unix)]
            LinkInner::Unix(stream) => Ok(Self::from_unix(stream.try_clone()?)),
        }
    }

    /// Shut down both directions so a blocked reader returns.
    ///
    /// Device files have no shutdown; a reader blocked on a tty stays blocked
    /// until the device produces data or is closed by the process.
    pub fn shutdown(&self) -> Result<()> {
        match &self.inner {
            LinkInner::Device(_) => Ok(()),
            #[cfg(unix)]
            LinkInner::Unix(stream) => match stream.shutdown(std::net::Shutdown::Both) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
                Err(err) => Err(err.into()),
            },
        }
    }

    /// Backend name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match &self.inner {
            LinkInner::Device(_) => "serial-device",
            #[cfg(unix)]
            LinkInner::Unix(_) => "unix-domain-socket",
        }
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link").field("type", &self.kind()).finish()
    }
}
