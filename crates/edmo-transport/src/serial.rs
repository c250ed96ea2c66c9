use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::link::Link;

/// Serial device (tty) backend.
pub struct SerialDevice;

impl SerialDevice {
    /// Open a serial device and switch it to raw 8N1, keeping its current speed.
    pub fn open(path: impl AsRef<Path>) -> Result<Link> {
        let path = path.as_ref();
        let file = open_device(path)?;
        configure_raw(&file, None).map_err(|source| TransportError::Configure {
            path: path.to_path_buf(),
            source,
        })?;
        info!(?path, "opened serial device");
        Ok(Link::from_file(file))
    }

    /// Open a serial device and switch it to raw 8N1 at `baud`.
    pub fn open_with_baud(path: impl AsRef<Path>, baud: u32) -> Result<Link> {
        let path = path.as_ref();
        let speed = baud_constant(baud).ok_or(TransportError::UnsupportedBaud(baud))?;
        let file = open_device(path)?;
        configure_raw(&file, Some(speed)).map_err(|source| TransportError::Configure {
            path: path.to_path_buf(),
            source,
        })?;
        info!(?path, baud, "opened serial device");
        Ok(Link::from_file(file))
    }
}

fn open_device(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NOCTTY)
        .open(path)
        .map_err(|source| TransportError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Raw 8N1 with blocking single-byte reads. `speed` of `None` keeps the
/// line's current rate.
fn configure_raw(file: &File, speed: Option<libc::speed_t>) -> std::io::Result<()> {
    let fd = file.as_raw_fd();
    let mut tio = std::mem::MaybeUninit::<libc::termios>::zeroed();

    // SAFETY: `fd` is an open descriptor owned by `file` and `tio` points to
    // writable storage large enough for a `termios`.
    if unsafe { libc::tcgetattr(fd, tio.as_mut_ptr()) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    // SAFETY: `tcgetattr` succeeded, so every field has been initialized.
    let mut tio = unsafe { tio.assume_init() };

    // SAFETY: `tio` is a valid, initialized termios value.
    unsafe { libc::cfmakeraw(&mut tio) };
    tio.c_cflag &= !(libc::CSIZE | libc::PARENB | libc::CSTOPB);
    tio.c_cflag |= libc::CS8 | libc::CLOCAL | libc::CREAD;
    tio.c_cc[libc::VMIN] = 1;
    tio.c_cc[libc::VTIME] = 0;

    if let Some(speed) = speed {
        // SAFETY: `tio` is a valid termios value and `speed` is a termios speed constant.
        let rc =
            unsafe { libc::cfsetispeed(&mut tio, speed) | libc::cfsetospeed(&mut tio, speed) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error());
        }
    }

    // SAFETY: `fd` is open and `tio` is a fully initialized termios value.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    debug!(fd, "serial line set to raw 8N1");
    Ok(())
}

/// Map a numeric baud rate to its termios constant.
pub fn baud_constant(baud: u32) -> Option<libc::speed_t> {
    let speed = match baud {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        230400 => libc::B230400,
        _ => return None,
    };
    Some(speed)
}
