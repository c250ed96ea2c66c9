use bytes::BytesMut;
use edmo_frame::encode_frame;
use edmo_session::Commander;

use crate::cmd::SendArgs;
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let command = args.command.to_command()?;
    let link = args.link.open()?;

    let mut commander = Commander::new(link);
    commander
        .send(&command)
        .map_err(|err| session_error("send failed", err))?;

    let mut wire = BytesMut::new();
    encode_frame(command.opcode().as_u8(), &command.to_payload(), &mut wire);
    print_frame(&command, &wire, format);

    Ok(SUCCESS)
}
