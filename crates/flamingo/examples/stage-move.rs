//! Send one parameterized command and print the controller's reply.
//!
//! Run against the simulator:
//!   cargo run --features cli -- mock 127.0.0.1:53717
//!
//! In another terminal:
//!   cargo run --example stage-move -- 127.0.0.1:53717 2.5

use flamingo::channel::CommandChannel;
use flamingo::frame::CommandFrame;

const STAGE_POSITION_SET: u32 = 24580;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let addr = args.next().unwrap_or_else(|| "127.0.0.1:53717".to_string());
    let position: f64 = args.next().as_deref().unwrap_or("1.0").parse()?;

    let mut channel = CommandChannel::connect(addr.as_str())?;
    eprintln!("Connected to {}", channel.peer_addr());

    // Axis 1 (Y), absolute position in millimetres.
    let frame = CommandFrame::new(STAGE_POSITION_SET)
        .with_params([1, 0, 0])
        .with_value(position);
    let response = channel.request(&frame)?;

    eprintln!(
        "Reply: command={} status={} value={} trailing={} bytes",
        response.frame.command,
        response.frame.status,
        response.frame.double_data,
        response.payload.len()
    );

    channel.disconnect();
    Ok(())
}
