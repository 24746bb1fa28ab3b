//! `wintab-probe`: dump what the tablet driver reports, then watch packets arrive.
//!
//! Set `RUST_LOG=wintab_access=debug` for driver chatter.

use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use wintab_access::{
    axis::Valuator,
    cursor::{Buttons, CursorId, CSR_TYPE_GENERAL_PENERASER, CSR_TYPE_GENERAL_PENTIP},
    tablet::DeviceId,
    virtual_tablet::{VirtualCursor, VirtualDevice, VirtualTablet},
    Builder, Manager, Packet,
};

#[derive(Parser)]
#[command(version, about = "Inspect Wintab tablets, cursors, and packets")]
struct Args {
    /// Use a scripted in-memory tablet instead of the real driver.
    #[arg(long = "virtual", global = true)]
    use_virtual: bool,
    /// Library to try before `Wintab32.dll`.
    #[arg(long, global = true)]
    library: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List devices with their valuator ranges.
    Devices,
    /// List every cursor of every device.
    Cursors,
    /// Open every device and print packets as they arrive.
    Poll {
        /// Stop after this many packets.
        #[arg(long, default_value_t = 100)]
        count: usize,
        /// Stop after this many seconds without reaching `count`.
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut builder = Builder::new();
    if let Some(library) = args.library {
        builder = builder.library(library);
    }
    let demo = args.use_virtual.then(demo_tablet);
    let mut manager = match &demo {
        Some((tablet, _)) => builder.build_virtual(tablet.clone()),
        None => build_driver(builder)?,
    };

    match args.command {
        Command::Devices => devices(&mut manager),
        Command::Cursors => cursors(&mut manager),
        Command::Poll { count, timeout } => poll(
            &mut manager,
            demo.as_ref(),
            count,
            Duration::from_secs(timeout),
        ),
    }
}

#[cfg(wintab)]
fn build_driver(builder: Builder) -> anyhow::Result<Manager> {
    // Safety: the console's foreground window outlives this short-lived process.
    unsafe { builder.build_foreground() }.context("failed to connect to the Wintab driver")
}
#[cfg(not(wintab))]
fn build_driver(_builder: Builder) -> anyhow::Result<Manager> {
    anyhow::bail!("Wintab is unavailable on this platform, try --virtual")
}

/// Open every device, returning their cells.
fn open_all(manager: &mut Manager) -> anyhow::Result<Vec<usize>> {
    manager
        .devices()?
        .into_iter()
        .map(|device| {
            manager
                .open(device.id)
                .with_context(|| format!("failed to open {} ({})", device.id, device.name))
        })
        .collect()
}

fn devices(manager: &mut Manager) -> anyhow::Result<()> {
    let devices = manager.devices()?;
    if devices.is_empty() {
        println!("No devices.");
        return Ok(());
    }
    for cell in open_all(manager)? {
        let access = manager.access(cell)?;
        let name = devices
            .iter()
            .find(|device| device.id == access.device())
            .map_or("", |device| device.name.as_str());
        println!("{} {name}", access.device());
        for valuator in Valuator::iter() {
            match access.valuator_range(valuator) {
                Ok(range) => println!("\t{:<8} {}..={}", valuator.as_ref(), range.min, range.max),
                Err(_) => println!("\t{:<8} unsupported", valuator.as_ref()),
            }
        }
    }
    Ok(())
}

fn cursors(manager: &mut Manager) -> anyhow::Result<()> {
    for cell in open_all(manager)? {
        let access = manager.access(cell)?;
        println!("{}", access.device());
        for cursor in access.cursors() {
            match manager.cursor_info(cursor) {
                Ok(info) => println!(
                    "\t{:>3} {:<10} {:<24} physical {:<10} {}",
                    cursor.0,
                    info.cursor_type.as_ref(),
                    info.name,
                    info.physical_id
                        .map_or_else(|| "?".to_owned(), |id| format!("{id:#x}")),
                    if info.active { "active" } else { "" },
                ),
                Err(error) => println!("\t{:>3} {error}", cursor.0),
            }
        }
    }
    Ok(())
}

fn poll(
    manager: &mut Manager,
    demo: Option<&(VirtualTablet, DeviceId)>,
    count: usize,
    timeout: Duration,
) -> anyhow::Result<()> {
    let cells = open_all(manager)?;
    anyhow::ensure!(!cells.is_empty(), "no devices to poll");

    let start = Instant::now();
    let mut seen = 0;
    let mut step = 0;
    while seen < count && start.elapsed() < timeout {
        if let Some((tablet, device)) = demo {
            tablet.push(*device, demo_packet(step));
            step += 1;
        }
        for access in manager.accesses_mut() {
            access.drain(|access| {
                let [x, y, pressure, _] = *access.valuator_values().as_array();
                println!(
                    "{} cursor {:>2} x {x:>6} y {y:>6} pressure {pressure:>5} buttons {:#06b}",
                    access.device(),
                    access.cursor().0,
                    access.buttons().bits(),
                );
                seen += 1;
            });
        }
        // The driver queues packets for us, no need to spin.
        std::thread::sleep(Duration::from_millis(5));
    }
    if seen < count {
        println!("Timed out after {seen} packets.");
    }
    Ok(())
}

/// One pen with an eraser.
fn demo_tablet() -> (VirtualTablet, DeviceId) {
    let tablet = VirtualTablet::new();
    let device = tablet.add_device(
        VirtualDevice::new("Virtual Tablet")
            .valuator(Valuator::X, 0..=15200)
            .valuator(Valuator::Y, 0..=9500)
            .valuator(Valuator::Pressure, 0..=1023)
            .cursor(
                VirtualCursor::new("Pen", CSR_TYPE_GENERAL_PENTIP | 0x0802)
                    .physical_id(0x00C0_FFEE)
                    .active(true),
            )
            .cursor(
                VirtualCursor::new("Eraser", CSR_TYPE_GENERAL_PENERASER | 0x080A)
                    .physical_id(0x00C0_FFEE),
            ),
    );
    (tablet, device)
}

/// A diagonal stroke with pressure ramping up and down, repeating every 64 steps.
fn demo_packet(step: i32) -> Packet {
    let t = step % 64;
    Packet {
        cursor: CursorId(0),
        buttons: Buttons::PRIMARY,
        x: 2000 + t * 150,
        y: 1500 + t * 90,
        pressure: 1023 - (t - 32).abs() * 31,
        size: None,
    }
}
