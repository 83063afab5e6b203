use super::*;
use crate::config::{Node, Value};
use crate::event::{Edge, EventKind, Outcome, Recovery, Source};
use crate::testing::{MockBus, MockDelay, MockPin, Recorder};
use futures::executor::block_on;

type Dev = Iqs7219<MockBus, MockPin, MockDelay>;

const PROX: [Node; 2] = [
  Node::new("event-prox").with_props(&[("azoteq,thresh", Value::U32(500)), ("azoteq,lta-track", Value::Flag)]),
  Node::new("event-touch").with_props(&[("azoteq,trigger-disable", Value::Flag)]),
];

const NODES: [Node; 4] = [
  Node::new("cycle-0").with_props(&[("azoteq,channel-select", Value::U32(1))]),
  Node::new("sense-mode-self").with_props(&[("azoteq,vref-half", Value::Flag), ("azoteq,max-counts", Value::U32(2))]),
  Node::new("ati-1").with_props(&[("azoteq,ati-comp-div", Value::U32(9))]),
  Node::new("channel-0")
    .with_props(&[("azoteq,rx-enable", Value::Array(&[0, 3])), ("azoteq,tx-enable", Value::Array(&[8]))])
    .with_children(&PROX),
];

const ROOT: Node = Node::new("iqs7219")
  .with_props(&[("azoteq,power-mode", Value::U32(1)), ("azoteq,rate-np-ms", Value::U32(100))])
  .with_children(&NODES);

fn bus(minor: u16) -> MockBus {
  MockBus::new(AddrWidth::U8).with_words(PROD_NUM, &[PROD_NUM_A, 1, minor]).with_word(COMMS_SETUP, 0x0400)
}

fn init(config: &Node) -> Dev {
  let mut dev = Iqs7219::new(bus(25), MockPin::asserted(), MockDelay::default(), 0x74);
  block_on(dev.initialize(config)).expect("initialize");
  dev
}

fn service(dev: &mut Dev, timestamp: u64, sink: &mut Recorder) -> Outcome {
  block_on(dev.service(timestamp, sink)).expect("service")
}

#[test]
fn initialize_writes_the_parsed_image() {
  let dev = init(&ROOT);
  let bus = &dev.bus.i2c;

  assert_eq!(dev.version().product, PROD_NUM_A);
  assert_eq!(dev.interface(), Interface::Event);

  assert_eq!(bus.word(0x8A), 0x0100);
  assert_eq!(bus.word(0x8C), (CAP_SETUP_VREF_HALF | 2) << 8);
  assert_eq!(bus.word(0x28), 9);

  assert_eq!(bus.word(0xA0), 1 << 4);
  assert_eq!(bus.word(0xA3), 0x0900);
  assert_eq!(bus.word(0xA4), 0x0100);
  assert_eq!(bus.word(0x97), 500);
  assert_eq!(bus.word(0x85), 100);

  // ack reset, image, redo ATI, event mode
  assert_eq!(bus.written_words(SYS_SETUP), [0x0011, 0x0010, 0x0004, 0x0050]);

  // hold around both image transfers, then prox and ATI events unmasked
  assert_eq!(bus.written_words(COMMS_SETUP), [0x0500, 0x0400, 0x0500, 0x040A]);
}

#[test]
fn older_firmware_leaves_comms_setup_alone() {
  let mut dev = Iqs7219::new(bus(24), MockPin::asserted(), MockDelay::default(), 0x74);
  block_on(dev.initialize(&ROOT)).expect("initialize");

  assert!(dev.bus.i2c.written_words(COMMS_SETUP).is_empty());
}

#[test]
fn unknown_product_is_rejected() {
  let bus = MockBus::new(AddrWidth::U8).with_word(PROD_NUM, 323);
  let mut dev = Iqs7219::new(bus, MockPin::asserted(), MockDelay::default(), 0x74);

  assert_eq!(block_on(dev.initialize(&ROOT)), Err(Error::InvalidProduct(323)));
}

#[test]
fn reset_line_is_pulsed() {
  let mut dev = Iqs7219::with_reset(bus(25), MockPin::asserted(), MockPin::asserted(), MockDelay::default(), 0x74);
  block_on(dev.initialize(&ROOT)).expect("initialize");

  let (_, _, _, reset) = dev.free();
  assert_eq!(reset.expect("reset pin").driven(), [true, false]);
}

#[test]
fn proximity_edges_follow_the_flags() {
  let mut dev = init(&ROOT);
  let mut sink = Recorder::default();

  // touch is trigger-disabled and channel 1 has no events
  dev.bus.i2c.set_word(0x11, (1 << 1) | (1 << 2) | (1 << 5));
  assert_eq!(service(&mut dev, 3, &mut sink), Outcome::Ready);

  dev.bus.i2c.set_word(0x11, 0);
  service(&mut dev, 4, &mut sink);

  let ch = Source::Channel(0);
  assert_eq!(sink.edges(), [(ch, EventKind::Proximity, Edge::Rising), (ch, EventKind::Proximity, Edge::Falling)]);
  assert_eq!(sink.events[1].timestamp, 4);
  assert!(sink.samples.is_empty());
}

#[test]
fn disabled_channels_stay_quiet() {
  let mut dev = init(&ROOT);
  let mut sink = Recorder::default();

  block_on(dev.set_event_enable(0, false)).expect("disable");
  assert!(!dev.event_enabled(0));
  assert_eq!(dev.bus.i2c.written_words(COMMS_SETUP).last(), Some(&(0x0400 | EVENT_MASK_ATI)));

  dev.bus.i2c.set_word(0x11, 1 << 1);
  service(&mut dev, 0, &mut sink);
  assert!(sink.events.is_empty());

  assert_eq!(block_on(dev.set_event_enable(2, true)), Err(Error::Unsupported));
}

#[test]
fn trigger_publishes_selected_scans_on_change() {
  let mut dev = init(&ROOT);
  let mut sink = Recorder::default();

  block_on(dev.set_trigger(true)).expect("trigger");
  dev.set_scan(1, Scan::Raw).expect("scan");

  dev.bus.i2c.set_word(0x12, 80);
  dev.bus.i2c.set_word(0x13, 100);
  dev.bus.i2c.set_word(0x1B, 1234);

  service(&mut dev, 1, &mut sink);
  assert!(sink.samples.is_empty());

  dev.bus.i2c.set_word(0x11, 1 << 1);
  service(&mut dev, 2, &mut sink);
  assert_eq!(sink.samples, [(2, 0, 20), (2, 1, 1234)]);
}

#[test]
fn streaming_publishes_every_frame() {
  const STREAMING: Node = Node::new("iqs7219").with_props(&[("azoteq,streaming-comms", Value::Flag)]);

  let mut dev = init(&STREAMING);
  let mut sink = Recorder::default();

  assert_eq!(dev.bus.i2c.written_words(SYS_SETUP).last(), Some(&0x0000));

  block_on(dev.set_trigger(true)).expect("trigger");
  service(&mut dev, 1, &mut sink);
  service(&mut dev, 2, &mut sink);

  assert_eq!(sink.samples.len(), 4);
  assert_eq!(sink.syncs, 2);
}

#[test]
fn read_returns_fresh_values() {
  let mut dev = init(&ROOT);
  let mut sink = Recorder::default();

  dev.bus.i2c.set_word(0x11, 0x0023);
  dev.bus.i2c.set_word(0x12, 80);
  dev.bus.i2c.set_word(0x13, 100);
  dev.bus.i2c.set_word(0x16, 0x5678);
  dev.bus.i2c.set_word(0x17, 0x0001);

  assert_eq!(block_on(dev.read(0, Scan::Delta, 0, &mut sink)), Ok(20));
  assert_eq!(block_on(dev.read(0, Scan::Variance, 0, &mut sink)), Ok(0x0001_5678));
  assert_eq!(block_on(dev.read(1, Scan::Flags, 0, &mut sink)), Ok(2));
  assert_eq!(block_on(dev.read(2, Scan::Raw, 0, &mut sink)), Err(Error::Unsupported));

  let readings = dev.readings(0).expect("channel 0");
  assert_eq!((readings.filtered, readings.lta, readings.flags), (80, 100, 3));
}

#[test]
fn device_reset_is_reinitialized() {
  let mut dev = init(&ROOT);
  let mut sink = Recorder::default();

  dev.bus.i2c.set_word(SYS_STATUS, 1 << 11);
  assert_eq!(service(&mut dev, 0, &mut sink), Outcome::Retry(Recovery::Reset));

  let acks = dev.bus.i2c.written_words(SYS_SETUP).iter().filter(|w| *w & 1 != 0).count();
  assert_eq!(acks, 2);
}

#[test]
fn ati_status_is_recovered() {
  let mut dev = init(&ROOT);
  let mut sink = Recorder::default();

  dev.bus.i2c.push_words(SYS_STATUS, &[1 << 9]);
  assert_eq!(service(&mut dev, 0, &mut sink), Outcome::Retry(Recovery::AtiError));
  assert_eq!(dev.bus.i2c.written_words(SYS_SETUP).last(), Some(&0x0050));

  dev.bus.i2c.set_word(SYS_STATUS, 1 << 8);
  assert_eq!(service(&mut dev, 0, &mut sink), Outcome::Retry(Recovery::AtiActive));

  dev.bus.i2c.set_word(SYS_STATUS, 1 << 9);
  assert_eq!(block_on(dev.service(0, &mut sink)), Err(Error::AtiFailed(1 << 9)));
}

#[test]
fn ati_waits_out_a_quiet_rdy_line() {
  let mut dev = init(&ROOT);
  dev.bus.i2c.set_word(SYS_STATUS, 0);

  // One window for the request, then about 800 ms of silence while ATI runs.
  let mut levels = [false; 802];
  levels[0] = true;
  levels[801] = true;
  dev.bus.rdy = MockPin::script(&levels);

  assert_eq!(block_on(dev.calibrate()), Ok(Calibration::Complete { retries: 0 }));

  // One redo from initialize, one from this run, then back to event mode.
  let setups = dev.bus.i2c.written_words(SYS_SETUP);
  assert_eq!(setups.iter().filter(|w| *w & (1 << 2) != 0).count(), 2);
  assert_eq!(setups.last(), Some(&0x0050));
}

#[test]
fn sample_rate_follows_the_report_rate() {
  let mut dev = init(&ROOT);
  assert_eq!(dev.sample_rate(), 10_000_000);

  block_on(dev.set_sample_rate(50_000_000)).expect("rate");
  assert_eq!(dev.bus.i2c.word(0x85), 20);
  assert_eq!(dev.sample_rate(), 50_000_000);

  let too_slow = ConfigError::OutOfRange { name: "azoteq,rate-np-ms", value: 10_000 };
  assert_eq!(block_on(dev.set_sample_rate(100_000)), Err(Error::Config(too_slow)));

  assert!(block_on(dev.set_sample_rate(0)).is_err());
  assert!(block_on(dev.set_sample_rate(2_000_000_000)).is_err());
  assert_eq!(dev.bus.i2c.word(0x85), 20);
}

#[test]
fn gpio_routing_enters_standalone_mode() {
  const HALT: [Node; 1] = [Node::new("event-halt")
    .with_props(&[("azoteq,gpio-select", Value::U32(5)), ("drive-open-drain", Value::Flag)])];
  const CHANNELS: [Node; 1] = [Node::new("channel-1").with_children(&HALT)];
  const STANDALONE: Node = Node::new("iqs7219").with_children(&CHANNELS);

  let mut dev = init(&STANDALONE);
  let mut sink = Recorder::default();

  assert_eq!(dev.interface(), Interface::Standalone);
  assert_eq!(dev.bus.i2c.word(0xB4), (1 << 5) | GPIO_OPEN_DRAIN);
  assert_eq!(dev.bus.i2c.written_words(SYS_SETUP).last(), Some(&0x0080));

  assert_eq!(block_on(dev.service(0, &mut sink)), Err(Error::Unsupported));
}

#[test]
fn invalid_channel_settings_are_rejected() {
  const BAD_GPIO_EVENT: [Node; 1] = [Node::new("event-touch").with_props(&[("azoteq,gpio-select", Value::U32(3))])];
  const BAD_GPIO: [Node; 1] = [Node::new("channel-0").with_children(&BAD_GPIO_EVENT)];
  const BAD_MUX: [Node; 1] = [Node::new("channel-0").with_props(&[("azoteq,scan-mux", Value::U32(6))])];
  const BAD_COUNTS: [Node; 1] = [Node::new("sense-mode-proj").with_props(&[("azoteq,max-counts", Value::U32(4))])];

  let cases = [
    (Node::new("iqs7219").with_children(&BAD_GPIO), "azoteq,gpio-select", 3),
    (Node::new("iqs7219").with_children(&BAD_MUX), "azoteq,scan-mux", 6),
    (Node::new("iqs7219").with_children(&BAD_COUNTS), "azoteq,max-counts", 4),
  ];

  for (config, name, value) in cases {
    let mut dev = Iqs7219::new(bus(25), MockPin::asserted(), MockDelay::default(), 0x74);
    assert_eq!(
      block_on(dev.initialize(&config)),
      Err(Error::Config(ConfigError::OutOfRange { name, value })),
      "{name}"
    );
  }
}

#[test]
fn scan_selector_comes_from_the_configuration() {
  const MUXED: [Node; 1] = [Node::new("channel-1").with_props(&[("azoteq,scan-mux", Value::U32(2))])];
  const MUXED_ROOT: Node = Node::new("iqs7219").with_children(&MUXED);

  let dev = init(&MUXED_ROOT);
  assert_eq!(dev.scan(0), Some(Scan::Delta));
  assert_eq!(dev.scan(1), Some(Scan::Raw));
  assert_eq!(dev.scan(2), None);
}
