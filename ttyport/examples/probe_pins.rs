use std::env;
use std::thread;
use std::time::Duration;

use ttyport::prelude::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    for arg in env::args().skip(1) {
        let mut port = ttyport::open(&ttyport::OpenOptions::new(arg.as_str())).unwrap();
        println!("opened device {:?}", arg);
        probe_pins(&mut port).unwrap();
    }
}

fn probe_pins<T: SerialPort>(port: &mut T) -> ttyport::Result<()> {
    port.set_rts(false)?;
    port.set_dtr(false)?;

    let mut rts = false;
    let mut dtr = false;
    let mut toggle = true;

    loop {
        thread::sleep(Duration::from_secs(1));

        if toggle {
            rts = !rts;
            port.set_rts(rts)?;
        } else {
            dtr = !dtr;
            port.set_dtr(dtr)?;
        }

        println!(
            "RTS={:5?} DTR={:5?} CTS={:5?} DSR={:5?} RI={:5?} CD={:?}",
            port.rts()?,
            port.dtr()?,
            port.read_cts()?,
            port.read_dsr()?,
            port.read_ri()?,
            port.read_cd()?
        );

        toggle = !toggle;
    }
}
