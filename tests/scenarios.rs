use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use tuxctl::device::protocol::{
    ACK, BIOC_EVENT, BIOC_ON, DECIMAL_POINT, LED_ENABLE_ALL, LED_SET, LED_USR, RESET, SEGMENTS,
};
use tuxctl::device::{Command, ControlError, Controller, LedRequest};
use tuxctl::transport::{Transport, TransportError};

/// Records every delivered buffer; can be told to refuse sends
#[derive(Default)]
struct Wire {
    sent: Mutex<Vec<Vec<u8>>>,
    refuse: AtomicBool,
}

impl Wire {
    fn drain(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    fn refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

impl Transport for Wire {
    fn deliver(&self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.sent.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }
}

fn setup() -> (Arc<Wire>, Controller<Arc<Wire>>) {
    let wire = Arc::new(Wire::default());
    let controller = Controller::new(wire.clone());
    controller.init();
    wire.drain();
    (wire, controller)
}

#[test]
fn button_report_fully_replaces_previous_snapshot() {
    let (_wire, ctl) = setup();

    for arg1 in 0..16u8 {
        for arg2 in 0..16u8 {
            ctl.handle_packet(BIOC_EVENT, 0x8F, 0x8F);
            ctl.handle_packet(BIOC_EVENT, 0x80 | arg1, 0x80 | arg2);

            let buttons = ctl.buttons();
            assert_eq!(buttons.start, arg1 & 1 != 0);
            assert_eq!(buttons.a, arg1 & 2 != 0);
            assert_eq!(buttons.b, arg1 & 4 != 0);
            assert_eq!(buttons.c, arg1 & 8 != 0);
            assert_eq!(buttons.up, arg2 & 1 != 0);
            assert_eq!(buttons.left, arg2 & 2 != 0);
            assert_eq!(buttons.down, arg2 & 4 != 0);
            assert_eq!(buttons.right, arg2 & 8 != 0);
            assert_eq!(ctl.read_buttons().count_zeros(), (arg1.count_ones() + arg2.count_ones()));
        }
    }
}

#[test]
fn init_set_then_reset_restores_same_frame() {
    let (wire, ctl) = setup();

    ctl.set_leds(LedRequest::new(0b0011, 0b0001, [0xA, 0x5, 0, 0]))
        .unwrap();

    let sent = wire.drain();
    assert_eq!(sent.len(), 1);
    let frame = sent[0].clone();
    assert_eq!(
        frame,
        vec![
            LED_SET,
            LED_ENABLE_ALL,
            SEGMENTS[0xA] | DECIMAL_POINT,
            SEGMENTS[0x5],
            0x00,
            0x00
        ]
    );

    ctl.handle_packet(RESET, 0x80, 0x80);
    assert_eq!(wire.drain(), vec![vec![BIOC_ON], vec![LED_USR], frame]);
}

#[test]
fn reset_right_after_init_restores_blank_display() {
    let (wire, ctl) = setup();

    ctl.handle_packet(RESET, 0x80, 0x80);
    assert_eq!(
        wire.drain(),
        vec![
            vec![BIOC_ON],
            vec![LED_USR],
            vec![LED_SET, LED_ENABLE_ALL, 0, 0, 0, 0]
        ]
    );
}

#[test]
fn busy_link_sends_nothing_until_acknowledged() {
    let (wire, ctl) = setup();

    wire.refuse(true);
    ctl.set_leds(LedRequest::from_value(0x1111)).unwrap();
    assert!(ctl.is_link_busy());
    wire.refuse(false);

    let request = LedRequest::from_value(0x2222);
    assert_eq!(ctl.set_leds(request), Err(ControlError::LinkBusy));
    assert!(wire.drain().is_empty());

    ctl.handle_packet(ACK, 0x80, 0x80);
    assert_eq!(ctl.set_leds(request), Ok(()));
    assert_eq!(wire.drain(), vec![request.encode().as_bytes().to_vec()]);
}

#[test]
fn failed_send_is_not_replayed_on_reset() {
    let (wire, ctl) = setup();
    let good = LedRequest::from_value(0xC0DE);
    ctl.set_leds(good).unwrap();

    wire.refuse(true);
    ctl.set_leds(LedRequest::from_value(0xDEAD)).unwrap();
    wire.refuse(false);
    wire.drain();

    ctl.handle_packet(RESET, 0x80, 0x80);
    let sent = wire.drain();
    assert_eq!(sent.last(), Some(&good.encode().as_bytes().to_vec()));
}

#[test]
fn command_surface_matches_operations() {
    let (wire, ctl) = setup();

    let command = Command::from_code(0x10, 0x000F_0042).unwrap();
    ctl.execute(command, None).unwrap();
    assert_eq!(
        wire.drain(),
        vec![LedRequest::from_value(0x0042).encode().as_bytes().to_vec()]
    );

    ctl.handle_packet(BIOC_EVENT, 0x84, 0x80);
    let mut mask = 0;
    ctl.execute(Command::from_code(0x12, 0).unwrap(), Some(&mut mask))
        .unwrap();
    assert_eq!(mask, 0xFB);

    assert_eq!(
        ctl.execute(Command::ReadButtons, None),
        Err(ControlError::InvalidArgument)
    );
    assert_eq!(
        Command::from_code(0x11, 0),
        Err(ControlError::InvalidArgument)
    );
}

#[test]
fn concurrent_readers_never_see_torn_snapshot() {
    let (_wire, ctl) = setup();
    let ctl = Arc::new(ctl);

    let writer = {
        let ctl = ctl.clone();
        std::thread::spawn(move || {
            for i in 0..2000 {
                if i % 2 == 0 {
                    ctl.handle_packet(BIOC_EVENT, 0x8F, 0x8F);
                } else {
                    ctl.handle_packet(BIOC_EVENT, 0x80, 0x80);
                }
            }
        })
    };

    for _ in 0..2000 {
        let mask = ctl.read_buttons();
        assert!(mask == 0x00 || mask == 0xFF, "torn mask {:08b}", mask);
    }
    writer.join().unwrap();
}

/// Holds up delivery of one chosen frame so another caller can race it
struct SlowWire {
    sent: Mutex<Vec<Vec<u8>>>,
    slow_frame: Vec<u8>,
    entered: Mutex<Option<mpsc::Sender<()>>>,
}

impl Transport for SlowWire {
    fn deliver(&self, bytes: &[u8]) -> Result<(), TransportError> {
        if bytes == self.slow_frame.as_slice() {
            if let Some(entered) = self.entered.lock().unwrap().take() {
                entered.send(()).unwrap();
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        self.sent.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }
}

#[test]
fn stored_frame_is_last_frame_on_wire_when_senders_race() {
    let first = LedRequest::from_value(0x1111);
    let second = LedRequest::from_value(0x2222);
    let (entered_tx, entered_rx) = mpsc::channel();

    let wire = Arc::new(SlowWire {
        sent: Mutex::new(Vec::new()),
        slow_frame: first.encode().as_bytes().to_vec(),
        entered: Mutex::new(Some(entered_tx)),
    });
    let ctl = Arc::new(Controller::new(wire.clone()));

    let slow = {
        let ctl = ctl.clone();
        std::thread::spawn(move || ctl.set_leds(first))
    };
    entered_rx.recv().unwrap();

    let fast = {
        let ctl = ctl.clone();
        std::thread::spawn(move || ctl.set_leds(second))
    };

    assert_eq!(slow.join().unwrap(), Ok(()));
    assert_eq!(fast.join().unwrap(), Ok(()));

    let last_on_wire = wire.sent.lock().unwrap().last().cloned().unwrap();
    assert_eq!(last_on_wire, second.encode().as_bytes().to_vec());
    assert_eq!(ctl.state().display().as_bytes().to_vec(), last_on_wire);

    ctl.handle_packet(RESET, 0x80, 0x80);
    let restored = wire.sent.lock().unwrap().last().cloned().unwrap();
    assert_eq!(restored, last_on_wire);
}
