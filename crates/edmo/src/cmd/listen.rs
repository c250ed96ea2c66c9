use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use edmo_frame::{FrameError, FrameReader};
use edmo_proto::decode_event;
use edmo_transport::Link;
use tracing::{debug, info};

use crate::cmd::ListenArgs;
use crate::exit::{frame_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_event, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let link = args.link.open()?;

    let running = Arc::new(AtomicBool::new(true));
    let closer = link
        .try_clone()
        .map_err(|err| transport_error("clone link failed", err))?;
    install_ctrlc_handler(Arc::clone(&running), closer)?;

    let mut reader = FrameReader::with_config(link, args.scan.frame_config());
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let frame = match reader.read_frame() {
            Ok(frame) => frame,
            Err(FrameError::ConnectionClosed) => {
                info!("link closed");
                break;
            }
            Err(_) if !running.load(Ordering::SeqCst) => break,
            Err(err) => return Err(frame_error("receive failed", err)),
        };

        let Some(event) = decode_event(&frame.unescape()) else {
            continue;
        };
        print_event(&event, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    let stats = reader.stats();
    debug!(
        printed,
        frames = stats.frames,
        discarded_bytes = stats.discarded_bytes,
        "listen finished"
    );
    Ok(SUCCESS)
}

/// Ctrl-C stops the loop. Socket links are shut down to unblock the read;
/// a serial read returns with the next byte the controller sends.
fn install_ctrlc_handler(running: Arc<AtomicBool>, closer: Link) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
        let _ = closer.shutdown();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
