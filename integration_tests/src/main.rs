//! Integration tests for the SP-CM-STM field node.
//!
//! Run after flashing the firmware, with the host link wired to a USB
//! serial adapter.

mod device;
mod protocol;

use clap::Parser;
use colored::Colorize;

use device::{resolve_port, DeviceClient};
use protocol::{MessageType, LONG_FRAME_SIZE, SHORT_FRAME_SIZE};
use tests::{print_results, run_all_tests, Session};

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Integration tests for the SP-CM-STM field node")]
struct Args {
    /// Serial port for the node (use "auto" to auto-detect)
    #[arg(short, long, default_value = "auto")]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value = "9600")]
    baud: u32,

    /// Firmware was built with 4-byte reports
    #[arg(long)]
    short_report: bool,

    /// Wait for the identification frame sent at power-up
    #[arg(long)]
    expect_id: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let port = resolve_port(&args.port)?;

    println!("{}", "SP-CM-STM Integration Tests".bold());
    println!("Port: {}", port);
    println!("Baud: {}", args.baud);
    println!();

    println!("Connecting to node...");
    let mut device = DeviceClient::new(&port, args.baud)?;

    if args.expect_id {
        println!("Power-cycle the node now");
        device.set_timeout(std::time::Duration::from_secs(30));
        let id = device.read_reply(SHORT_FRAME_SIZE)?;
        if id.message_type != Some(MessageType::IdPacket) {
            anyhow::bail!("Expected identification frame, got {:?}", id);
        }
        println!("Identification payload: {:02x?}", id.payload);
        device.set_timeout(std::time::Duration::from_secs(2));
    } else {
        device.clear_buffer()?;
    }
    println!("{}", "Connected!".green());

    println!("\nRunning tests...\n");

    let report_len = if args.short_report {
        SHORT_FRAME_SIZE
    } else {
        LONG_FRAME_SIZE
    };
    let mut session = Session { device, report_len };
    let results = run_all_tests(&mut session);
    print_results(&results);

    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
