use super::*;
use crate::config::{ConfigError, Node, Value};
use crate::event::{Edge, EventKind, Outcome, Recovery, SliderGesture, Source};
use crate::testing::{MockBus, MockDelay, MockPin, Recorder};
use futures::executor::block_on;

type Dev = Iqs323<MockBus, MockPin, MockDelay>;

const KEYS: [Node; 2] = [
  Node::new("event-prox").with_props(&[("azoteq,thresh", Value::U32(10))]),
  Node::new("event-touch").with_props(&[
    ("azoteq,thresh", Value::U32(100)),
    ("azoteq,hyst", Value::U32(4)),
    ("azoteq,wear-select", Value::Flag),
  ]),
];

const CHANNELS: [Node; 1] = [Node::new("channel-0")
  .with_props(&[
    ("azoteq,sense-mode", Value::U32(1)),
    ("azoteq,rx-enable", Value::Array(&[0, 2])),
    ("azoteq,ati-base", Value::U32(150)),
  ])
  .with_children(&KEYS)];

const ROOT: Node = Node::new("iqs323").with_props(&[("azoteq,power-mode", Value::U32(2))]).with_children(&CHANNELS);

fn bus(prod_num: u16) -> MockBus {
  MockBus::new(AddrWidth::U8)
    .with_words(PROD_NUM, &[prod_num, 1, 2, 3, 0])
    .with_word(0x12, 0xFFFF)
    .with_word(0x19, COMMS_ERROR)
}

fn device(prod_num: u16) -> Dev {
  Iqs323::new(bus(prod_num), MockPin::asserted(), MockDelay::default(), 0x44)
}

fn init(prod_num: u16, config: &Node) -> Dev {
  let mut dev = device(prod_num);
  block_on(dev.initialize(config)).expect("initialize");
  dev
}

fn service(dev: &mut Dev, sink: &mut Recorder) -> Outcome {
  block_on(dev.service(0, sink)).expect("service")
}

#[test]
fn initialize_writes_the_parsed_image() {
  let dev = init(PROD_NUM_REL, &ROOT);
  let bus = &dev.bus.i2c;

  assert_eq!(dev.variant(), Variant::Release);
  assert_eq!(dev.version().product, PROD_NUM_REL);

  assert_eq!(bus.word(0x30), SNSR_SETUP_0_CHAN_EN);
  assert_eq!(bus.word(0x32), 0x13);
  assert_eq!(bus.word(0x33), 0x0500);
  assert_eq!(bus.word(0x34), 0x0E00);
  assert_eq!(bus.word(0x36), 0x0008);
  assert_eq!(bus.word(0x37), 150);
  assert_eq!(bus.word(0x40) & SNSR_SETUP_0_CHAN_EN, 0);

  assert_eq!(bus.word(0x61), 10);
  assert_eq!(bus.word(0x62), 0x0464);
  assert_eq!(bus.word(0xD3) & EVENT_MASK_ALL, EVENT_MASK_ATI | EVENT_MASK_PROX | EVENT_MASK_TOUCH);

  // ack reset, image, redo ATI, back to event mode
  assert_eq!(bus.written_words(SYS_SETUP), [0x0021, 0x0020, 0x0024, 0x00A0]);
}

#[test]
fn unknown_product_is_rejected() {
  let mut dev = device(1234);
  assert_eq!(block_on(dev.initialize(&ROOT)), Err(Error::InvalidProduct(1234)));
}

#[test]
fn rejected_configuration_writes_nothing() {
  const BAD_KEYS: [Node; 1] = [Node::new("event-touch").with_props(&[("azoteq,thresh", Value::U32(256))])];
  const BAD_CHANNELS: [Node; 1] =
    [Node::new("channel-0").with_props(&[("azoteq,sense-mode", Value::U32(0))]).with_children(&BAD_KEYS)];
  const BAD: Node = Node::new("iqs323").with_children(&BAD_CHANNELS);

  let mut dev = device(PROD_NUM_REL);
  assert_eq!(
    block_on(dev.initialize(&BAD)),
    Err(Error::Config(ConfigError::OutOfRange { name: "azoteq,thresh", value: 256 }))
  );
  assert!(dev.bus.i2c.writes().is_empty());
}

#[test]
fn channel_edges_follow_the_status_word() {
  let mut dev = init(PROD_NUM_REL, &ROOT);
  let mut sink = Recorder::default();

  dev.bus.i2c.set_word(SYS_STATUS, 1 << 8);
  assert_eq!(block_on(dev.service(7, &mut sink)), Ok(Outcome::Ready));

  // channel 1 has no configured events
  dev.bus.i2c.set_word(SYS_STATUS, (1 << 8) | (1 << 9) | (1 << 10));
  service(&mut dev, &mut sink);

  dev.bus.i2c.set_word(SYS_STATUS, 0);
  service(&mut dev, &mut sink);

  let ch = Source::Channel(0);
  assert_eq!(
    sink.edges(),
    [
      (ch, EventKind::Proximity, Edge::Rising),
      (ch, EventKind::Touch, Edge::Rising),
      (ch, EventKind::Proximity, Edge::Falling),
      (ch, EventKind::Touch, Edge::Falling),
    ]
  );
  assert_eq!(sink.events[0].timestamp, 7);
  assert_eq!(sink.syncs, 3);
}

#[test]
fn missing_sentinel_resets_the_device() {
  let mut dev = init(PROD_NUM_REL, &ROOT);
  let mut sink = Recorder::default();

  dev.bus.i2c.set_word(0x19, 0);
  assert_eq!(service(&mut dev, &mut sink), Outcome::Retry(Recovery::Desync));

  assert_eq!(dev.bus.rdy.driven(), [true, false, true, false]);
  assert!(sink.events.is_empty());
}

#[test]
fn device_reset_is_reinitialized() {
  let mut dev = init(PROD_NUM_REL, &ROOT);
  let mut sink = Recorder::default();

  dev.bus.i2c.set_word(SYS_STATUS, 0x0080);
  assert_eq!(service(&mut dev, &mut sink), Outcome::Retry(Recovery::Reset));

  let acks = dev.bus.i2c.written_words(SYS_SETUP).iter().filter(|w| *w & 1 != 0).count();
  assert_eq!(acks, 2);
}

#[test]
fn ati_error_recalibrates() {
  let mut dev = init(PROD_NUM_REL, &ROOT);
  let mut sink = Recorder::default();

  dev.bus.i2c.push_words(SYS_STATUS, &[0x0040, 0, 0xFFFF, 0, 0, 0, 0, 0, 0, COMMS_ERROR]);
  assert_eq!(service(&mut dev, &mut sink), Outcome::Retry(Recovery::AtiError));
  assert_eq!(dev.bus.i2c.written_words(SYS_SETUP).last(), Some(&0x00A0));
}

#[test]
fn persistent_ati_error_surfaces() {
  let mut dev = init(PROD_NUM_REL, &ROOT);
  let mut sink = Recorder::default();

  dev.bus.i2c.set_word(SYS_STATUS, 0x0040);
  assert_eq!(block_on(dev.service(0, &mut sink)), Err(Error::AtiFailed(0x0040)));
}

#[test]
fn active_ati_holds_back_events() {
  let mut dev = init(PROD_NUM_REL, &ROOT);
  let mut sink = Recorder::default();

  dev.bus.i2c.set_word(SYS_STATUS, 0x0020 | (1 << 8));
  assert_eq!(service(&mut dev, &mut sink), Outcome::Retry(Recovery::AtiActive));
  assert!(sink.events.is_empty());
}

const SLIDER_EVENTS: [Node; 3] = [Node::new("event-press"), Node::new("event-tap"), Node::new("event-swipe-pos")];

const SLIDER: [Node; 1] = [Node::new("slider")
  .with_props(&[
    ("azoteq,channel-select", Value::Array(&[0, 1, 2])),
    ("azoteq,slider-size", Value::U32(1000)),
    ("linux,axis", Value::U32(0)),
  ])
  .with_children(&SLIDER_EVENTS)];

const SLIDER_ROOT: Node = Node::new("iqs323").with_children(&SLIDER);

#[test]
fn slider_links_channels_and_gestures() {
  let dev = init(PROD_NUM_REL, &SLIDER_ROOT);
  let bus = &dev.bus.i2c;

  assert_eq!(bus.word(0x90) & SLDR_SETUP_0_CHAN_CNT, 3);
  assert_eq!(bus.word(0x93), 1000);
  assert_eq!(bus.word(0x94), 0x0007);
  assert_eq!(bus.word(0x95), 0x0552);
  assert_eq!([bus.word(0x96), bus.word(0x97), bus.word(0x98)], [0x430, 0x472, 0x4B4]);
  assert_eq!(bus.word(0xA0), 0x0003);
  assert_eq!(bus.word(0xD3) & (EVENT_MASK_SLDR | EVENT_MASK_TOUCH), EVENT_MASK_SLDR | EVENT_MASK_TOUCH);
}

#[test]
fn slider_without_size_is_rejected() {
  const SIZELESS: [Node; 1] = [Node::new("slider").with_props(&[("azoteq,channel-select", Value::Array(&[0]))])];
  const SIZELESS_ROOT: Node = Node::new("iqs323").with_children(&SIZELESS);

  let mut dev = device(PROD_NUM_REL);
  assert_eq!(
    block_on(dev.initialize(&SIZELESS_ROOT)),
    Err(Error::Config(ConfigError::Invalid { name: "azoteq,slider-size" }))
  );
}

#[test]
fn slider_reports_position_and_gestures() {
  let mut dev = init(PROD_NUM_REL, &SLIDER_ROOT);
  let mut sink = Recorder::default();

  dev.bus.i2c.set_word(0x12, 500);
  service(&mut dev, &mut sink);
  assert_eq!(dev.bus.i2c.written_words(SYS_SETUP).last(), Some(&0x0000));

  dev.bus.i2c.set_word(0x11, 0x0001);
  service(&mut dev, &mut sink);

  dev.bus.i2c.set_word(0x11, 0x0082);
  service(&mut dev, &mut sink);

  dev.bus.i2c.set_word(0x11, 0);
  dev.bus.i2c.set_word(0x12, 0xFFFF);
  service(&mut dev, &mut sink);
  assert_eq!(dev.bus.i2c.written_words(SYS_SETUP).last(), Some(&0x0080));

  let sl = |g| (Source::Slider, EventKind::Slider(g));
  let edges: std::vec::Vec<_> = sink.edges().into_iter().map(|(s, k, e)| ((s, k), e)).collect();
  assert_eq!(
    edges,
    [
      (sl(SliderGesture::Press), Edge::Rising),
      (sl(SliderGesture::Tap), Edge::Rising),
      (sl(SliderGesture::Tap), Edge::Falling),
      (sl(SliderGesture::SwipePositive), Edge::Rising),
      (sl(SliderGesture::Press), Edge::Falling),
      (sl(SliderGesture::SwipePositive), Edge::Falling),
    ]
  );

  let positions: std::vec::Vec<_> = sink.positions.iter().map(|(_, p)| *p).collect();
  assert_eq!(positions, [Some(500), Some(500), Some(500), None]);
}

#[test]
fn follower_configures_its_reference() {
  const PAIR: [Node; 2] = [
    Node::new("channel-0").with_props(&[("azoteq,sense-mode", Value::U32(0))]),
    Node::new("channel-1").with_props(&[
      ("azoteq,sense-mode", Value::U32(0)),
      ("azoteq,ref-select", Value::U32(0)),
      ("azoteq,ref-weight", Value::U32(300)),
    ]),
  ];
  const PAIR_ROOT: Node = Node::new("iqs323").with_children(&PAIR);

  let dev = init(PROD_NUM_REL, &PAIR_ROOT);

  assert_eq!(dev.image.word(Grp::Chan, 1, 0) & 0x00FF, REF_MODE_FOLLOW);
  assert_eq!(dev.image.word(Grp::Chan, 1, 3), 300);
  assert_eq!(dev.image.word(Grp::Chan, 0, 0), REF_MODE_REF | (EVENT_MASK_TOUCH | EVENT_MASK_PROX) << 10);
}

#[test]
fn reference_must_exist() {
  const LOST: [Node; 1] = [Node::new("channel-0")
    .with_props(&[("azoteq,sense-mode", Value::U32(0)), ("azoteq,ref-select", Value::U32(3))])];
  const LOST_ROOT: Node = Node::new("iqs323").with_children(&LOST);

  let mut dev = device(PROD_NUM_REL);
  assert_eq!(
    block_on(dev.initialize(&LOST_ROOT)),
    Err(Error::Config(ConfigError::OutOfRange { name: "azoteq,ref-select", value: 3 }))
  );
}

#[test]
fn movement_restricts_ultra_low_power() {
  const MOVING: [Node; 1] = [Node::new("movement").with_props(&[("azoteq,thresh", Value::U32(5))])];
  const MOV_CHANNELS: [Node; 1] =
    [Node::new("channel-0").with_props(&[("azoteq,sense-mode", Value::U32(0))]).with_children(&MOVING)];
  const MOV_ROOT: Node =
    Node::new("iqs323").with_props(&[("azoteq,power-mode", Value::U32(2))]).with_children(&MOV_CHANNELS);

  let dev = init(PROD_NUM_MOV, &MOV_ROOT);

  assert_eq!(dev.variant(), Variant::Movement);
  assert_eq!(dev.bus.i2c.word(0x30) & SNSR_SETUP_0_MOV_EN, SNSR_SETUP_0_MOV_EN);
  assert_eq!(dev.bus.i2c.word(0x64), 5);
  assert_eq!(SysSetup::from_bits(dev.image.word(Grp::Sys, 0, 0)).power_mode(), PowerMode::Low.into_bits());
}

#[test]
fn suspend_halts_and_resume_restores() {
  let mut dev = init(PROD_NUM_REL, &ROOT);

  block_on(dev.suspend()).expect("suspend");
  assert_eq!(dev.bus.i2c.written_words(SYS_SETUP).last(), Some(&0x00B0));

  block_on(dev.resume()).expect("resume");
  assert_eq!(dev.bus.i2c.written_words(SYS_SETUP).last(), Some(&0x00A0));
}

#[test]
fn suspend_gives_up_on_a_confused_device() {
  let mut dev = init(PROD_NUM_REL, &ROOT);
  dev.bus.i2c.set_word(PROD_NUM, 0);

  assert_eq!(block_on(dev.suspend()), Err(Error::InvalidProduct(0)));
}

#[test]
fn channel_info_and_wear_status() {
  let mut dev = init(PROD_NUM_REL, &ROOT);
  let mut sink = Recorder::default();

  dev.bus.i2c.set_word(SYS_STATUS, 1 << 9);
  dev.bus.i2c.set_word(0x13, 90);
  dev.bus.i2c.set_word(0x14, 100);

  let info = block_on(dev.channel_info(0, &mut sink)).expect("channel info");
  assert_eq!(
    info[0],
    Some(ChannelInfo { prox: false, touch: true, counts: 90, lta: 100, delta: 10, motion: None })
  );
  assert!(info[1].is_none());
  assert!(info[2].is_none());

  assert_eq!(block_on(dev.wear_status(0, &mut sink)), Ok(true));
  dev.bus.i2c.set_word(SYS_STATUS, 1 << 8);
  assert_eq!(block_on(dev.wear_status(0, &mut sink)), Ok(false));
}

#[test]
fn movement_status_reads_the_channel_bits() {
  let mut dev = init(PROD_NUM_MOV, &ROOT);

  dev.bus.i2c.set_word(MOV_STATUS, 0b010);
  dev.bus.i2c.set_word(MOV_STATUS + 1, COMMS_ERROR);
  assert_eq!(block_on(dev.movement_status()), Ok(true));

  dev.bus.i2c.set_word(MOV_STATUS + 1, 0);
  assert_eq!(block_on(dev.movement_status()), Err(Error::NotReady));
}
