use std::net::SocketAddr;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use flamingo_channel::{ChannelError, CommandSession, LiveSession, NucListener};
use flamingo_frame::{FrameError, ImageFrame};
use tracing::{debug, error, info, warn};

use crate::cmd::{parse_duration, MockArgs};
use crate::exit::{channel_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::print_mock_ready;

/// What the simulator streams to each live client.
#[derive(Debug, Clone, Copy)]
struct ImagePlan {
    count: u32,
    width: u32,
    height: u32,
    interval: Duration,
}

pub fn run(args: MockArgs) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    if args.width == 0 || args.height == 0 {
        return Err(CliError::new(USAGE, "--width and --height must be non-zero"));
    }
    let plan = ImagePlan {
        count: args.images,
        width: args.width,
        height: args.height,
        interval,
    };

    let commands =
        NucListener::bind(args.bind.as_str()).map_err(|err| channel_error("bind failed", err))?;
    let command_addr = commands.local_addr();
    let live = NucListener::bind(live_bind_addr(command_addr, args.live_port))
        .map_err(|err| channel_error("bind failed", err))?;
    let live_addr = live.local_addr();

    info!(%command_addr, %live_addr, "mock controller listening");
    print_mock_ready(command_addr, live_addr);

    let status = args.status;
    thread::Builder::new()
        .name("mock-command".to_string())
        .spawn(move || serve_commands(&commands, status))
        .map_err(|err| CliError::new(INTERNAL, format!("thread spawn failed: {err}")))?;
    thread::Builder::new()
        .name("mock-live".to_string())
        .spawn(move || serve_images(&live, plan))
        .map_err(|err| CliError::new(INTERNAL, format!("thread spawn failed: {err}")))?;

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;
    let _ = rx.recv();

    info!("mock controller stopped");
    Ok(SUCCESS)
}

fn live_bind_addr(command_addr: SocketAddr, live_port: Option<u16>) -> SocketAddr {
    let port = match (live_port, command_addr.port()) {
        (Some(port), _) => port,
        (None, 0) => 0,
        (None, port) => port.saturating_add(1),
    };
    SocketAddr::new(command_addr.ip(), port)
}

fn serve_commands(listener: &NucListener, status: i32) {
    loop {
        match listener.accept_command() {
            Ok(session) => acknowledge_commands(session, status),
            Err(err) => {
                error!(error = %err, "command accept failed");
                return;
            }
        }
    }
}

/// Reply to every frame with the same frame, `status` filled in and no
/// trailing bytes.
fn acknowledge_commands(mut session: CommandSession, status: i32) {
    let peer = session.peer_addr();
    loop {
        let request = match session.recv() {
            Ok(request) => request,
            Err(ChannelError::Io(FrameError::ConnectionClosed)) => {
                debug!(%peer, "command client disconnected");
                return;
            }
            Err(err) => {
                warn!(%peer, error = %err, "dropping command client");
                return;
            }
        };

        info!(
            %peer,
            command = request.frame.command,
            params = ?request.frame.int_data,
            value = request.frame.double_data,
            payload = request.payload.len(),
            "mock received command"
        );

        let ack = request.frame.with_status(status).with_additional_bytes(0);
        if let Err(err) = session.reply(&ack, &[]) {
            warn!(%peer, error = %err, "reply failed");
            return;
        }
    }
}

fn serve_images(listener: &NucListener, plan: ImagePlan) {
    loop {
        match listener.accept_live() {
            Ok(session) => stream_images(session, plan),
            Err(err) => {
                error!(error = %err, "live accept failed");
                return;
            }
        }
    }
}

fn stream_images(mut session: LiveSession, plan: ImagePlan) {
    let peer = session.peer_addr();
    for plane in 0..plan.count {
        let sent = synthetic_image(plan.width, plan.height, plane)
            .map_err(ChannelError::Rejected)
            .and_then(|image| session.send_image(&image));
        if let Err(err) = sent {
            warn!(%peer, error = %err, "live client went away");
            return;
        }
        thread::sleep(plan.interval);
    }
    info!(%peer, images = session.images_sent(), "live stream complete");
    session.close();
}

/// Diagonal ramp, shifted by `plane` so consecutive images differ.
fn synthetic_image(width: u32, height: u32, plane: u32) -> Result<ImageFrame, FrameError> {
    let pixels = (0..height)
        .flat_map(|row| (0..width).map(move |col| ((row + col + plane * 16) % 4096) as u16))
        .collect();
    Ok(ImageFrame::new(width, height, pixels)?.with_planes(plane, plane))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_port_follows_command_port() {
        let addr: SocketAddr = "127.0.0.1:53717".parse().unwrap();
        assert_eq!(live_bind_addr(addr, None).port(), 53718);
        assert_eq!(live_bind_addr(addr, Some(9000)).port(), 9000);

        let any: SocketAddr = "127.0.0.1:0".parse().unwrap();
        assert_eq!(live_bind_addr(any, None).port(), 0);
    }

    #[test]
    fn synthetic_images_are_well_formed() {
        let image = synthetic_image(5, 3, 2).unwrap();
        assert_eq!(image.header.payload_size(), 5 * 3 * 2);
        assert_eq!(image.pixel(0, 0), Some(32));
        assert_eq!(image.pixel(2, 4), Some(38));
        assert_eq!(image.header.start_index(), 2);
    }
}
