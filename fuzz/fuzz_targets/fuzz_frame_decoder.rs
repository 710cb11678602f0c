#![no_main]
use diffdrive_core::{CommandLink, Frame, LinkParams};
use diffdrive_core::mocks::ScriptedSerial;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let params = LinkParams::default();
    let serial = ScriptedSerial::new();
    serial.push_str(&String::from_utf8_lossy(data));
    let mut link = CommandLink::new(serial.clone(), &params, 0);
    let mut now_ms = 0;
    while serial.remaining() > 0 {
        now_ms += 1;
        if let Ok(Some(Frame::Valid(cmd))) = link.poll(now_ms) {
            assert!(cmd.left.rpm <= params.max_rpm && cmd.right.rpm <= params.max_rpm);
            assert!(cmd.left.direction.code() <= 2 && cmd.right.direction.code() <= 2);
        }
    }
});
