use std::env;
use std::time::Duration;

use ttyport::prelude::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    for arg in env::args().skip(1) {
        println!("opening port: {:?}", arg);

        let options = ttyport::OpenOptions {
            port_name: arg,
            baud_rate: 9600,
            minimum_read_size: 1,
            inter_character_timeout: 0,
            ..Default::default()
        };
        let mut port = ttyport::open(&options).unwrap();

        interact(&mut port).unwrap();
    }
}

fn interact<T: SerialPort>(port: &mut T) -> ttyport::Result<()> {
    port.reset_input_buffer()?;
    port.set_timeout(Duration::from_secs(1));

    let mut buf: Vec<u8> = (0..255).collect();

    println!("writing bytes");
    port.write_all(&buf[..])?;

    println!("{} bytes waiting", port.in_waiting()?);

    println!("reading bytes");
    let n = port.read(&mut buf[..])?;
    println!("read {} bytes", n);

    port.close()
}
