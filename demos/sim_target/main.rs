use std::net::{TcpListener, TcpStream};

use probestub::outputln;
use probestub::registry::{TargetDescriptor, TargetRegistry};
use probestub::stub::ProbeStub;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error>>;

mod chip;

fn wait_for_gdb(port: u16) -> DynResult<TcpStream> {
    let sockaddr = format!("127.0.0.1:{}", port);
    eprintln!("Waiting for a GDB connection on {:?}...", sockaddr);

    let sock = TcpListener::bind(sockaddr)?;
    let (stream, addr) = sock.accept()?;
    eprintln!("Debugger connected from {}", addr);

    Ok(stream)
}

/// What a probe would find after scanning its debug port.
fn scan(registry: &mut TargetRegistry) {
    let mut desc = TargetDescriptor::new("simulated STM32F1", Box::new(chip::SimChip::new()))
        .with_core("M3");
    desc.add_ram(chip::RAM_START, chip::RAM_LEN);
    desc.add_flash(chip::flash_region());
    registry.add(desc);
}

fn main() -> DynResult<()> {
    pretty_env_logger::init();

    let mut registry = TargetRegistry::new();
    scan(&mut registry);

    loop {
        let conn = wait_for_gdb(9001)?;

        let mut pktbuf = [0; 4096];
        let mut stub = ProbeStub::builder(conn)
            .with_packet_buffer(&mut pktbuf)
            .monitor_handler(|registry, session, cmd, mut out| match cmd {
                b"targets" => {
                    for (n, desc) in registry.iter() {
                        let marker = if Some(desc.id()) == session.current() {
                            '*'
                        } else {
                            ' '
                        };
                        outputln!(out, "{}{:>3} {}", marker, n, desc);
                    }
                    Some(true)
                }
                b"swdp_scan" => {
                    registry.destroy_all(session);
                    scan(registry);
                    outputln!(out, "found {} target(s)", registry.len());
                    Some(true)
                }
                _ => None,
            })
            .build()?;

        let err = stub.run_blocking(&mut registry);
        eprintln!("GDB session ended: {}", err);
    }
}
