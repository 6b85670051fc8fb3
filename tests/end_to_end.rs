//! Full refreshes through the endpoints, decoded from the raw bus and pin traffic

use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};
use std::vec::Vec;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;
use embedded_hal::spi::SpiBus;
use embedded_io::{Read, Seek, SeekFrom, Write};
use epd_g1::mux::CONTROL_MINOR;
use epd_g1::{
    Builder, BusyWait, Clock, Color, Command, DeviceMux, DutyCyclePwm, Endpoint, EpdDevice,
    Error, FixedTemperature, Frame, Interface, LineEncoder, LineSelect, Panel, PanelModel,
    Registry, Stage,
};

#[derive(Debug, Clone, PartialEq)]
enum Wire {
    Cs(bool),
    Bytes(Vec<u8>),
    Pin(&'static str, bool),
    Pwm(u16),
}

/// Wire traffic shared by every recording peripheral
#[derive(Clone, Default)]
struct Log(Arc<Mutex<Vec<Wire>>>);

impl Log {
    fn lock(&self) -> MutexGuard<'_, Vec<Wire>> {
        self.0.lock().unwrap()
    }
}

struct RecordingSpi {
    log: Log,
}

impl embedded_hal::spi::ErrorType for RecordingSpi {
    type Error = Infallible;
}

impl SpiBus for RecordingSpi {
    fn read(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
        Ok(())
    }
    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        self.log.lock().push(Wire::Bytes(words.to_vec()));
        Ok(())
    }
    fn transfer(&mut self, _read: &mut [u8], _write: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }
    fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> {
        Ok(())
    }
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

struct RecordingPin {
    name: &'static str,
    log: Log,
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.record(false);
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.record(true);
        Ok(())
    }
}

impl RecordingPin {
    fn record(&self, high: bool) {
        self.log.lock().push(if self.name == "cs" {
            Wire::Cs(high)
        } else {
            Wire::Pin(self.name, high)
        });
    }
}

/// Never busy
struct IdleBusy;

impl ErrorType for IdleBusy {
    type Error = Infallible;
}

impl InputPin for IdleBusy {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

struct RecordingPwm {
    log: Log,
}

impl embedded_hal::pwm::ErrorType for RecordingPwm {
    type Error = Infallible;
}

impl SetDutyCycle for RecordingPwm {
    fn max_duty_cycle(&self) -> u16 {
        1000
    }
    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.log.lock().push(Wire::Pwm(duty));
        Ok(())
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Jumps one second on every read
struct SecondTicks(u64);

impl Clock for SecondTicks {
    fn now_ms(&mut self) -> u64 {
        let now = self.0;
        self.0 += 1_000;
        now
    }
}

type TestPanel = Panel<
    CriticalSectionRawMutex,
    Interface<
        RecordingSpi,
        RecordingPin,
        RecordingPin,
        RecordingPin,
        RecordingPin,
        RecordingPin,
        IdleBusy,
    >,
    DutyCyclePwm<RecordingPwm>,
    FixedTemperature,
    SecondTicks,
    NoDelay,
>;

fn attach(log: &Log) -> TestPanel {
    let pin = |name| RecordingPin {
        name,
        log: log.clone(),
    };
    let interface = Interface::new(
        RecordingSpi { log: log.clone() },
        pin("cs"),
        pin("panel_on"),
        pin("reset"),
        pin("border"),
        pin("discharge"),
        IdleBusy,
    );
    let config = Builder::new()
        .model(PanelModel::Epd1in44)
        .busy_wait(BusyWait::Polls(10_000))
        .build()
        .unwrap();
    Panel::attach(
        &config,
        interface,
        DutyCyclePwm::new(RecordingPwm { log: log.clone() }),
        FixedTemperature(45_000),
        SecondTicks(0),
        NoDelay,
    )
    .unwrap()
}

#[derive(Debug, Clone, PartialEq)]
enum Decoded {
    Command(u8, Vec<u8>),
    LineData(Vec<u8>),
}

/// Bytes sent during each chip select assertion
fn selections(log: &[Wire]) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let mut current: Option<Vec<u8>> = None;
    for wire in log {
        match wire {
            Wire::Cs(false) => current = Some(Vec::new()),
            Wire::Cs(true) => out.extend(current.take()),
            Wire::Bytes(bytes) => {
                if let Some(current) = current.as_mut() {
                    current.extend_from_slice(bytes);
                }
            }
            _ => {}
        }
    }
    out
}

/// Pair `[0x70, reg]` selections with the following `[0x72, ..]` selection
fn decode(log: &[Wire]) -> Vec<Decoded> {
    let selections = selections(log);
    let mut out = Vec::new();
    let mut iter = selections.iter();
    while let Some(index) = iter.next() {
        assert_eq!(index.len(), 2, "register selection {:02x?}", index);
        assert_eq!(index[0], 0x70);
        let data = iter.next().unwrap();
        assert_eq!(data[0], 0x72);
        let payload = data[1..].to_vec();
        out.push(if index[1] == 0x0a {
            Decoded::LineData(payload)
        } else {
            Decoded::Command(index[1], payload)
        });
    }
    out
}

fn command(command: Command) -> Decoded {
    Decoded::Command(command.register(), command.payload().to_vec())
}

fn pins(log: &[Wire]) -> Vec<(&'static str, bool)> {
    log.iter()
        .filter_map(|wire| match wire {
            Wire::Pin(name, high) => Some((*name, *high)),
            _ => None,
        })
        .collect()
}

/// Lines sent for one refresh: one pass per drawing stage, then power off
fn expected_lines(displayed: &Frame, staged: &Frame) -> Vec<Vec<u8>> {
    let encoder = LineEncoder::new(PanelModel::Epd1in44);
    let mut buf = vec![0u8; encoder.encoded_len(staged)];
    let mut lines = Vec::new();
    let mut encode = |frame: &Frame, stage: Stage, line: LineSelect| {
        let len = encoder.encode(frame, stage, line, &mut buf).unwrap();
        lines.push(buf[..len].to_vec());
    };
    for stage in Stage::DRAWING {
        let frame = if stage.reads_displayed() {
            displayed
        } else {
            staged
        };
        for line in 0..frame.lines() {
            encode(frame, stage, LineSelect::Line(line));
        }
    }
    for line in 0..staged.lines() {
        encode(staged, Stage::PowerOff, LineSelect::Line(line));
    }
    encode(staged, Stage::PowerOff, LineSelect::Dummy);
    lines
}

#[test]
fn test_attach_drives_lines_low() {
    let log = Log::default();
    let _panel = attach(&log);
    assert_eq!(
        *log.lock(),
        vec![
            Wire::Pwm(0),
            Wire::Pin("panel_on", false),
            Wire::Pin("reset", false),
            Wire::Pin("border", false),
            Wire::Pin("discharge", false),
        ]
    );
}

#[test]
fn test_write_refresh_on_the_wire() {
    let log = Log::default();
    let panel = attach(&log);
    let registry: Registry<'_, CriticalSectionRawMutex> = Registry::new();
    registry.register(&panel).unwrap();
    let mux = DeviceMux::new(&registry);

    let mut staged = Frame::for_model(PanelModel::Epd1in44).unwrap();
    staged.set_pixel(0, 0, Color::Black);
    staged.set_pixel(40, 77, Color::Black);
    staged.set_pixel(95, 127, Color::Black);
    let mut displayed = staged.clone();
    displayed.fill(Color::Black);

    let mut framebuffer = mux.open_framebuffer(0).unwrap();
    framebuffer.write_all(staged.as_bytes()).unwrap();
    log.lock().clear();

    assert_eq!(mux.control_write(b"W0\n"), Ok(3));

    let log = log.lock();
    let decoded = decode(&log);

    let init = [
        Command::ChannelSelect1in44,
        Command::DcFrequency,
        Command::OscillatorOn,
        Command::AdcDisable,
        Command::VcomLevel,
        Command::GateSourceLevel1in44,
        Command::LatchOn,
        Command::LatchOff,
        Command::ChargePumpPositiveOn,
        Command::ChargePumpNegativeOn,
        Command::ChargePumpVcomOn,
        Command::OutputDisable,
    ];
    let init: Vec<Decoded> = init.into_iter().map(command).collect();
    assert_eq!(decoded[..init.len()], init[..]);

    let lines = expected_lines(&displayed, &staged);
    let body = &decoded[init.len()..init.len() + 3 * lines.len()];
    for (triple, line) in body.chunks(3).zip(&lines) {
        assert_eq!(triple[0], command(Command::GateSourceLevel1in44));
        assert_eq!(triple[1], Decoded::LineData(line.clone()));
        assert_eq!(triple[2], command(Command::OutputEnable));
    }

    let teardown = [
        Command::LatchOn,
        Command::OutputOff,
        Command::ChargePumpVcomOff,
        Command::ChargePumpNegativeOff,
        Command::GateDischarge1,
        Command::ChargePumpPositiveOff,
        Command::OscillatorOff,
        Command::GateDischarge2,
        Command::GateDischarge3,
        Command::GateDischarge0,
    ];
    let teardown: Vec<Decoded> = teardown.into_iter().map(command).collect();
    assert_eq!(decoded[init.len() + 3 * lines.len()..], teardown[..]);

    assert_eq!(
        pins(&log),
        vec![
            ("panel_on", true),
            ("border", true),
            ("reset", true),
            ("reset", false),
            ("reset", true),
            ("border", false),
            ("border", true),
            ("border", false),
            ("reset", false),
            ("panel_on", false),
            ("discharge", true),
            ("discharge", false),
        ]
    );
    assert_eq!(log.iter().filter(|wire| matches!(wire, Wire::Pwm(_))).count(), 2);
    assert_eq!(log.last(), Some(&Wire::Pin("discharge", false)));
}

#[test]
fn test_clear_then_black() {
    let log = Log::default();
    let panel = attach(&log);
    let registry: Registry<'_, CriticalSectionRawMutex> = Registry::new();
    registry.register(&panel).unwrap();
    let mux = DeviceMux::new(&registry);

    assert_eq!(mux.control_write(b"C0"), Ok(2));
    panel
        .with_displayed_frame(|frame| assert!(frame.as_bytes().iter().all(|&b| b == 0x00)))
        .unwrap();

    let Ok(Endpoint::Control(mut control)) = mux.open(CONTROL_MINOR) else {
        unreachable!("control endpoint");
    };
    assert_eq!(control.write(b"B0"), Ok(2));
    panel
        .with_displayed_frame(|frame| assert!(frame.as_bytes().iter().all(|&b| b == 0xFF)))
        .unwrap();
    assert_eq!(panel.stage_time_ms(), Ok(336));
}

#[test]
fn test_control_rejects() {
    let log = Log::default();
    let panel = attach(&log);
    let registry: Registry<'_, CriticalSectionRawMutex> = Registry::new();
    registry.register(&panel).unwrap();
    let mux = DeviceMux::new(&registry);
    log.lock().clear();

    assert_eq!(mux.control_write(b"B3"), Err(Error::NoSuchDevice));
    assert_eq!(mux.control_write(b"Z0"), Err(Error::InvalidArgument));
    assert_eq!(mux.control_write(b"C"), Err(Error::InvalidArgument));
    assert_eq!(mux.control_write(b"0C"), Err(Error::InvalidArgument));
    assert!(log.lock().is_empty());
}

#[test]
fn test_framebuffer_endpoint() {
    let log = Log::default();
    let panel = attach(&log);
    let registry: Registry<'_, CriticalSectionRawMutex> = Registry::new();
    registry.register(&panel).unwrap();
    let mux = DeviceMux::new(&registry);

    let Ok(Endpoint::Framebuffer(mut framebuffer)) = mux.open(1) else {
        unreachable!("framebuffer endpoint");
    };
    let size = framebuffer.len();
    assert_eq!(size, 96 * 16);

    framebuffer.seek(SeekFrom::Start(16)).unwrap();
    assert_eq!(framebuffer.write(&[0x80, 0x01]), Ok(2));
    panel
        .with_staged_frame(|frame| {
            assert_eq!(frame.pixel(1, 7), Some(Color::Black));
            assert_eq!(frame.pixel(1, 8), Some(Color::Black));
            assert_eq!(frame.pixel(1, 0), Some(Color::White));
            assert_eq!(frame.pixel(1, 15), Some(Color::White));
        })
        .unwrap();

    framebuffer.seek(SeekFrom::End(-1)).unwrap();
    assert_eq!(
        framebuffer.write(&[1, 2]),
        Err(Error::MessageTooLarge {
            end: size + 1,
            capacity: size
        })
    );

    framebuffer.seek(SeekFrom::Start(0)).unwrap();
    let mut image = vec![0u8; size + 8];
    assert_eq!(framebuffer.read(&mut image), Ok(size));
    assert_eq!(&image[16..18], &[0x80, 0x01]);
    assert_eq!(framebuffer.read(&mut image), Ok(0));

    assert!(matches!(mux.open(2), Err(Error::NoSuchDevice)));
}

#[test]
fn test_framebuffer_round_trip_lengths() {
    let log = Log::default();
    let panel = attach(&log);
    let registry: Registry<'_, CriticalSectionRawMutex> = Registry::new();
    registry.register(&panel).unwrap();
    let mux = DeviceMux::new(&registry);
    let mut framebuffer = mux.open_framebuffer(0).unwrap();
    let size = framebuffer.len();

    for len in [0, 1, 16, size - 1, size] {
        let image: Vec<u8> = (0..len)
            .map(|i| (i as u8).wrapping_mul(7).wrapping_add(len as u8))
            .collect();
        framebuffer.seek(SeekFrom::Start(0)).unwrap();
        framebuffer.write_all(&image).unwrap();
        assert_eq!(framebuffer.position(), len as u64);

        framebuffer.seek(SeekFrom::Start(0)).unwrap();
        let mut back = vec![0u8; len];
        framebuffer.read_exact(&mut back).unwrap();
        assert_eq!(back, image, "length {len}");
    }
}

#[test]
fn test_empty_write_past_end_is_rejected() {
    let log = Log::default();
    let panel = attach(&log);
    let registry: Registry<'_, CriticalSectionRawMutex> = Registry::new();
    registry.register(&panel).unwrap();
    let mux = DeviceMux::new(&registry);
    let mut framebuffer = mux.open_framebuffer(0).unwrap();
    let size = framebuffer.len();

    framebuffer.seek(SeekFrom::Start(size as u64)).unwrap();
    assert_eq!(framebuffer.write(&[]), Ok(0));

    framebuffer.seek(SeekFrom::Start(size as u64 + 5)).unwrap();
    assert_eq!(
        framebuffer.write(&[]),
        Err(Error::MessageTooLarge {
            end: size + 5,
            capacity: size
        })
    );
    assert_eq!(framebuffer.position(), size as u64 + 5);
}

#[test]
fn test_endpoints_shared_across_threads() {
    fn assert_sync<T: Sync>() {}
    assert_sync::<TestPanel>();
    assert_sync::<Registry<'static, CriticalSectionRawMutex>>();
    assert_sync::<DeviceMux<'static, 'static, CriticalSectionRawMutex>>();
    assert_sync::<epd_g1::FramebufferHandle<'static>>();

    let log = Log::default();
    let panel = attach(&log);
    let registry: Registry<'_, CriticalSectionRawMutex> = Registry::new();
    registry.register(&panel).unwrap();
    let mux = DeviceMux::new(&registry);
    let size = panel.framebuffer_len();

    std::thread::scope(|scope| {
        let refreshes = scope.spawn(|| {
            for _ in 0..3 {
                assert_eq!(mux.control_write(b"W0"), Ok(2));
            }
        });
        let copies = scope.spawn(|| {
            let mut framebuffer = mux.open_framebuffer(0).unwrap();
            let mut back = vec![0u8; size];
            for round in 0..20u8 {
                let image = vec![round; size];
                framebuffer.seek(SeekFrom::Start(0)).unwrap();
                framebuffer.write_all(&image).unwrap();
                framebuffer.seek(SeekFrom::Start(0)).unwrap();
                framebuffer.read_exact(&mut back).unwrap();
                assert_eq!(back, image);
            }
        });
        refreshes.join().unwrap();
        copies.join().unwrap();
    });

    panel
        .with_staged_frame(|frame| assert!(frame.as_bytes().iter().all(|&b| b == 19)))
        .unwrap();
}

#[test]
fn test_single_panel_registration() {
    let log = Log::default();
    let first = attach(&log);
    let second = attach(&log);
    let registry: Registry<'_, CriticalSectionRawMutex> = Registry::new();

    registry.register(&first).unwrap();
    assert_eq!(registry.register(&second), Err(Error::AlreadyRegistered));

    registry.unregister(&first);
    assert!(matches!(registry.lookup(0), Err(Error::NoSuchDevice)));
    assert_eq!(
        DeviceMux::new(&registry).control_write(b"C0"),
        Err(Error::NoSuchDevice)
    );

    registry.register(&second).unwrap();
    assert_eq!(registry.lookup(0).map(|device| device.id()), Ok(0));
}

#[test]
fn test_release_returns_peripherals() {
    let log = Log::default();
    let panel = attach(&log);
    log.lock().clear();

    let (interface, pwm, thermal, _clock, _delay) = panel.release();
    assert_eq!(thermal, FixedTemperature(45_000));
    assert_eq!(*log.lock(), vec![Wire::Pwm(0)]);

    let (_spi, _cs, _panel_on, _reset, _border, _discharge, _busy) = interface.release();
    let _pwm = pwm.release();
}
