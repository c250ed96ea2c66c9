use std::fs;
use std::io::Read;

use edmo_frame::FrameScanner;
use edmo_proto::decode_event;
use tracing::info;

use crate::cmd::DecodeArgs;
use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_event, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = match &args.file {
        Some(path) => fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .map_err(|err| io_error("failed reading stdin", err))?;
            buf
        }
    };

    let bytes = if args.hex {
        parse_hex(&input)?
    } else {
        input
    };

    let mut scanner = FrameScanner::with_config(&args.scan.frame_config());
    let mut events = 0usize;
    let mut framed_bytes = 0usize;
    for frame in scanner.feed(&bytes) {
        framed_bytes += frame.wire_size();
        if let Some(event) = decode_event(&frame.unescape()) {
            print_event(&event, format);
            events += 1;
        }
    }

    let stats = scanner.stats();
    info!(
        input = bytes.len(),
        mode = ?scanner.mode(),
        frames = stats.frames,
        framed_bytes,
        events,
        discarded_bytes = stats.discarded_bytes,
        overflow_resets = stats.overflow_resets,
        restarts = stats.restarts,
        pending = scanner.buffered(),
        "capture decoded"
    );

    Ok(SUCCESS)
}

fn parse_hex(input: &[u8]) -> CliResult<Vec<u8>> {
    let digits: Vec<u8> = input
        .iter()
        .copied()
        .filter(|byte| !byte.is_ascii_whitespace())
        .collect();
    hex::decode(digits).map_err(|err| CliError::new(DATA_INVALID, format!("invalid hex input: {err}")))
}
