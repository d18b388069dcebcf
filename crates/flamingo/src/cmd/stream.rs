use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use flamingo_channel::{CancelHandle, ChannelError, LiveImageChannel};
use flamingo_frame::{FrameError, ImageFrame};
use tracing::{info, warn};

use crate::cmd::{parse_duration, StreamArgs};
use crate::exit::{channel_error, io_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::output::{print_image, OutputFormat};

pub fn run(args: StreamArgs, format: OutputFormat) -> CliResult<i32> {
    let mut target = args.target.target();
    if let Some(port) = args.live_port {
        target = target.with_live_port(port);
    }

    let mut config = args.target.channel_config()?;
    if let Some(idle) = &args.idle_timeout {
        config.frame.read_timeout = Some(parse_duration(idle)?);
    }

    if let Some(dir) = &args.save {
        fs::create_dir_all(dir)
            .map_err(|err| io_error(&format!("failed creating {}", dir.display()), err))?;
    }

    let mut channel = LiveImageChannel::connect_with_config(target.live_addr(), &config)
        .map_err(|err| channel_error("connect failed", err))?;

    let stopped = Arc::new(AtomicBool::new(false));
    let cancel = channel
        .cancel_handle()
        .map_err(|err| channel_error("connect failed", err))?;
    install_ctrlc_handler(stopped.clone(), cancel)?;

    let mut received = 0u64;
    loop {
        if args.count.is_some_and(|count| received >= count) {
            break;
        }

        let image = match channel.read_next_image() {
            Ok(image) => image,
            Err(_) if stopped.load(Ordering::SeqCst) => break,
            Err(ChannelError::Io(FrameError::ConnectionClosed)) => {
                info!(received, "live stream closed by controller");
                if args.count.is_some() {
                    return Err(CliError::new(
                        FAILURE,
                        format!("stream ended after {received} images"),
                    ));
                }
                break;
            }
            Err(err) if channel.is_connected() => {
                warn!(error = %err, "dropped image");
                continue;
            }
            Err(err) => return Err(channel_error("receive failed", err)),
        };

        let saved = match &args.save {
            Some(dir) => Some(save_image(dir, received, &image)?),
            None => None,
        };
        print_image(received, &image, saved.as_deref(), format);
        received += 1;
    }

    channel.disconnect();
    Ok(SUCCESS)
}

/// Writes pixels as raw little-endian `u16`, row-major, no header.
fn save_image(dir: &Path, index: u64, image: &ImageFrame) -> CliResult<PathBuf> {
    let path = dir.join(format!(
        "image_{index:06}_{}x{}.u16",
        image.width(),
        image.height()
    ));
    let bytes: Vec<u8> = image
        .pixels()
        .iter()
        .flat_map(|p| p.to_le_bytes())
        .collect();
    fs::write(&path, bytes)
        .map_err(|err| io_error(&format!("failed writing {}", path.display()), err))?;
    Ok(path)
}

fn install_ctrlc_handler(stopped: Arc<AtomicBool>, cancel: CancelHandle) -> CliResult<()> {
    ctrlc::set_handler(move || {
        stopped.store(true, Ordering::SeqCst);
        let _ = cancel.cancel();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_image_writes_little_endian_pixels() {
        let dir = std::env::temp_dir().join(format!("flamingo-save-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let image = ImageFrame::new(2, 1, vec![0x0102, 0xA0B0]).unwrap();
        let path = save_image(&dir, 3, &image).unwrap();
        assert!(path.ends_with("image_000003_2x1.u16"));
        assert_eq!(fs::read(&path).unwrap(), vec![0x02, 0x01, 0xB0, 0xA0]);

        let _ = fs::remove_dir_all(&dir);
    }
}
