//! Background serial reader lifecycle.
//!
//! Verifies that:
//! - bytes from the source reach the link in order
//! - a full queue counts overruns instead of blocking the reader
//! - dropping the pump never hangs, even while the reader is blocked

use std::io::{Cursor, ErrorKind, Read};
use std::time::{Duration, Instant};

use diffdrive_core::{CommandLink, LinkParams, SerialPump};
use diffdrive_traits::SerialRx;

fn wait_finished(pump: &SerialPump) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !pump.is_finished() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(pump.is_finished(), "pump thread did not exit on EOF");
}

#[test]
fn bytes_flow_into_command_link() {
    let pump = SerialPump::spawn(Cursor::new(b"1,100,2,40#".to_vec()), 256);
    wait_finished(&pump);
    let mut link = CommandLink::new(pump.receiver(), &LinkParams::default(), 0);
    link.poll(0).unwrap();
    let cmd = link.latest();
    assert_eq!((cmd.left.rpm, cmd.right.rpm), (100, 40));
    assert_eq!(pump.overruns(), 0);
}

#[test]
fn full_queue_counts_overruns() {
    let pump = SerialPump::spawn(Cursor::new(vec![b'x'; 100]), 4);
    wait_finished(&pump);
    assert_eq!(pump.overruns(), 96);
    let mut rx = pump.receiver();
    let mut n = 0;
    while rx.read_byte().unwrap().is_some() {
        n += 1;
    }
    assert_eq!(n, 4);
}

#[test]
fn empty_queue_reads_none() {
    let pump = SerialPump::spawn(Cursor::new(Vec::new()), 8);
    wait_finished(&pump);
    assert_eq!(pump.receiver().read_byte().unwrap(), None);
}

/// A source that never yields data, like an idle serial port with a read timeout.
struct IdlePort;

impl Read for IdlePort {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        std::thread::sleep(Duration::from_millis(20));
        Err(ErrorKind::TimedOut.into())
    }
}

#[test]
fn drop_is_prompt_while_reader_is_idle() {
    let pump = SerialPump::spawn(IdlePort, 8);
    std::thread::sleep(Duration::from_millis(30));
    assert!(!pump.is_finished());
    let start = Instant::now();
    drop(pump);
    assert!(start.elapsed() < Duration::from_millis(200));
}

#[test]
fn pumps_can_be_created_and_dropped_repeatedly() {
    for _ in 0..10 {
        let pump = SerialPump::spawn(IdlePort, 8);
        std::thread::sleep(Duration::from_millis(5));
        drop(pump);
    }
}
