//! Print a summary line for each image arriving on the live port.
//!
//! Run against the simulator:
//!   cargo run --features cli -- mock 127.0.0.1:53717 --images 5
//!
//! In another terminal:
//!   cargo run --example live-stream -- 127.0.0.1:53718

use flamingo::channel::LiveImageChannel;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:53718".to_string());

    let mut channel = LiveImageChannel::connect(addr.as_str())?;
    eprintln!("Connected to {}", channel.peer_addr());

    for image in channel.images() {
        match image {
            Ok(image) => {
                let max = image.pixels().iter().copied().max().unwrap_or(0);
                eprintln!(
                    "{}x{} planes {}..{} max={}",
                    image.width(),
                    image.height(),
                    image.header.start_index(),
                    image.header.stop_index(),
                    max
                );
            }
            Err(e) => {
                eprintln!("Stream ended: {e}");
                break;
            }
        }
    }

    Ok(())
}
