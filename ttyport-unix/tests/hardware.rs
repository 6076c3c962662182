//! Tests against a real serial adapter, named by `TTYPORT_TEST_DEVICE`.
//!
//! Run with `TTYPORT_TEST_DEVICE=/dev/ttyUSB0 cargo test -- --ignored`.

mod common;

use std::env;

use serial_test::serial;
use ttyport_core::prelude::*;
use ttyport_unix::TTYPort;

fn device() -> TTYPort {
    let path = env::var("TTYPORT_TEST_DEVICE").expect("TTYPORT_TEST_DEVICE is not set");
    TTYPort::open(&common::options(&path)).unwrap()
}

#[test]
#[ignore]
#[serial]
fn dtr_round_trips() {
    let mut port = device();

    port.set_dtr(true).unwrap();
    assert!(port.dtr().unwrap());

    port.set_dtr(false).unwrap();
    assert!(!port.dtr().unwrap());
}

#[test]
#[ignore]
#[serial]
fn rts_round_trips() {
    let mut port = device();

    port.set_rts(true).unwrap();
    assert!(port.rts().unwrap());

    port.set_rts(false).unwrap();
    assert!(!port.rts().unwrap());
}

#[test]
#[ignore]
#[serial]
fn input_lines_can_be_read() {
    let port = device();

    port.read_cts().unwrap();
    port.read_dsr().unwrap();
    port.read_ri().unwrap();
    port.read_cd().unwrap();
}

#[test]
#[ignore]
#[serial]
fn arbitrary_rate_opens() {
    let path = env::var("TTYPORT_TEST_DEVICE").expect("TTYPORT_TEST_DEVICE is not set");
    let options = ttyport_core::OpenOptions {
        baud_rate: 250_000,
        ..common::options(&path)
    };

    let mut port = TTYPort::open(&options).unwrap();
    port.close().unwrap();
}
