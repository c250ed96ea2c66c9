use bytes::BytesMut;
use edmo_frame::encode_frame;

use crate::cmd::EncodeArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let command = args.command.to_command()?;

    let mut wire = BytesMut::new();
    encode_frame(command.opcode().as_u8(), &command.to_payload(), &mut wire);
    print_frame(&command, &wire, format);

    Ok(SUCCESS)
}
