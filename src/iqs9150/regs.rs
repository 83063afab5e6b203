use bitfield_struct::bitfield;

use crate::config::Property;
use crate::event::Gesture::*;
use crate::event::SwipeDirection::*;
use crate::event::{EventKind, Gesture, Source, TapCount};
use crate::image::GroupDescriptor;

pub(crate) const PROD_NUM: u16 = 0x1000;
pub(crate) const STATUS: u16 = 0x1018;

pub(crate) const BUF_START: u16 = 0x115C;
pub(crate) const BUF_LEN: usize = 0x14F0 - BUF_START as usize;

pub(crate) const SETTINGS_MINOR: u16 = 0x1178;
pub(crate) const SETTINGS_MAJOR: u16 = 0x1179;
pub(crate) const TIMEOUT_COMMS: u16 = 0x11B8;
pub(crate) const CONTROL: u16 = 0x11BC;
pub(crate) const CONFIG: u16 = 0x11BE;
pub(crate) const OTHER: u16 = 0x11C0;
pub(crate) const ALP_RX_ENABLE: u16 = 0x11C2;
pub(crate) const ALP_SETUP: u16 = 0x11C5;
pub(crate) const ALP_TX_ENABLE: u16 = 0x11C6;
pub(crate) const TOTAL_RX: u16 = 0x11E3;
pub(crate) const TOTAL_TX: u16 = 0x11E4;
pub(crate) const NUM_CONTACTS: u16 = 0x11E5;
pub(crate) const X_RES: u16 = 0x11E6;
pub(crate) const Y_RES: u16 = 0x11E8;
pub(crate) const ANGLE_AXIAL: u16 = 0x120C;
pub(crate) const ANGLE_SCROLL: u16 = 0x120D;
pub(crate) const RX_TX_MAP: u16 = 0x1218;

pub(crate) const ENG_START: u16 = 0x2000;
pub(crate) const ENG_LEN: usize = 6;

pub(crate) const CONFIG_EVENT_MASK: u16 = 0xFE00;
pub(crate) const CONFIG_EVENT_ATI: u16 = 1 << 11;
pub(crate) const CONFIG_EVENT_MODE: u16 = 1 << 8;
pub(crate) const CONFIG_FORCED_COMMS: u16 = 1 << 4;
pub(crate) const OTHER_SW_ENABLE: u16 = 1 << 15;
pub(crate) const ALP_SETUP_ENABLE: u8 = 1 << 7;
pub(crate) const CHARGE_MODE_LP1: u8 = 3;
/// Sign bit of the gesture travel words.
pub(crate) const TRAVEL_NEG: u16 = 1 << 15;

pub(crate) const NUM_RX: usize = 26;
pub(crate) const NUM_TX: usize = 22;
pub(crate) const MAX_TX: u32 = 45;
/// TX pin shared with RDY.
pub(crate) const RDY_TX: u32 = 44;
pub(crate) const NUM_CHANNELS: usize = 506;
pub(crate) const MAX_CONTACTS: usize = 7;
/// Status words: two travel words, four flag words and the contacts.
pub(crate) const REPORT_LEN: usize = 6 + MAX_CONTACTS * 4;

pub(crate) const COMMS_TIMEOUT_US: u32 = 100_000;
pub(crate) const START_TIMEOUT_US: u32 = 1_000_000;
pub(crate) const POLL_US: u32 = 100;
pub(crate) const RDY_SETTLE_US: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Grp {
  Settings,
}

pub(crate) static GROUPS: [GroupDescriptor<Grp>; 1] =
  [GroupDescriptor::packed(Grp::Settings, BUF_START, 1, (BUF_LEN / 2) as u16)];

/// Configuration node a property or event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Scope {
  Trackpad,
  Single,
  Double,
  Switch,
  Alp,
  /// The device node itself.
  System,
}

impl Scope {
  pub(crate) const ALL: [Scope; 6] =
    [Scope::Trackpad, Scope::Single, Scope::Double, Scope::Switch, Scope::Alp, Scope::System];

  pub(crate) const fn node(self) -> Option<&'static str> {
    match self {
      Scope::Trackpad => Some("trackpad"),
      Scope::Single => Some("gesture-single"),
      Scope::Double => Some("gesture-double"),
      Scope::Switch => Some("switch"),
      Scope::Alp => Some("alp"),
      Scope::System => None,
    }
  }

  /// Flag word of the status block carrying this scope's events.
  pub(crate) const fn status_word(self) -> usize {
    match self {
      Scope::Double => 1,
      Scope::Switch | Scope::Alp => 2,
      _ => 0,
    }
  }

  /// Register holding the per-event enable bits.
  pub(crate) const fn enable_reg(self) -> Option<u16> {
    match self {
      Scope::Single => Some(0x11F6),
      Scope::Double => Some(0x11F8),
      Scope::Switch => Some(OTHER),
      _ => None,
    }
  }

  /// CONFIG bit that lets this scope's events open a comms window.
  pub(crate) const fn event_mask(self) -> u16 {
    match self {
      Scope::Trackpad => 1 << 10,
      Scope::Single | Scope::Double => 1 << 9,
      Scope::Switch => 1 << 14,
      Scope::Alp => 1 << 12,
      Scope::System => 0,
    }
  }

  pub(crate) const fn source(self) -> Source {
    match self {
      Scope::Switch | Scope::Alp => Source::System,
      _ => Source::Trackpad,
    }
  }

  /// `true` while the sensor behind this scope is (re)calibrating.
  pub(crate) fn ati_busy(self, info: Info) -> bool {
    match self {
      Scope::Trackpad | Scope::Single | Scope::Double => info.tp_ati_error() || info.tp_ati_again(),
      Scope::Alp => info.alp_ati_error() || info.alp_ati_again(),
      Scope::Switch | Scope::System => false,
    }
  }
}

/// Sub-selector within a scope, e.g. the settings shared by every tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Key {
  None,
  /// Per-sensor words indexed by the node's `reg`.
  Span,
  Tap,
  Hold,
  Palm,
  AxialX,
  AxialY,
  Zoom,
  ScrollX,
  ScrollY,
}

impl Key {
  /// Register holding the direction tolerance of a swipe or scroll.
  pub(crate) const fn angle_reg(self) -> Option<u16> {
    match self {
      Key::AxialX | Key::AxialY => Some(ANGLE_AXIAL),
      Key::ScrollX | Key::ScrollY => Some(ANGLE_SCROLL),
      _ => None,
    }
  }

  /// Hold and palm persist while the contact stays; everything else is
  /// reported as a press immediately followed by a release.
  pub(crate) const fn is_momentary(self) -> bool {
    !matches!(self, Key::Hold | Key::Palm)
  }
}

/// Product-specific layout.
#[derive(Debug)]
pub(crate) struct Desc {
  pub(crate) prod_num: u16,
  pub(crate) num_rx: usize,
  pub(crate) num_tx: usize,
  pub(crate) min_tx: u32,
}

impl Desc {
  pub(crate) fn find(prod_num: u16) -> Option<&'static Desc> {
    DEVS.iter().find(|d| d.prod_num == prod_num)
  }
}

pub(crate) static DEVS: [Desc; 2] = [
  Desc { prod_num: 0x076A, num_rx: NUM_RX, num_tx: NUM_TX, min_tx: 0 },
  Desc { prod_num: 0x09BC, num_rx: 13, num_tx: 12, min_tx: 33 },
];

#[bitfield(u16)]
#[derive(PartialEq, Eq)]
pub(crate) struct Control {
  #[bits(5)]
  __: u8,
  pub(crate) ati_tp: bool,
  pub(crate) ati_alp: bool,
  pub(crate) ack_reset: bool,
  #[bits(3)]
  ___: u8,
  pub(crate) suspend: bool,
  #[bits(4)]
  ____: u8,
}

/// Third flag word of the status block.
#[bitfield(u16)]
#[derive(PartialEq, Eq)]
pub(crate) struct Info {
  #[bits(3)]
  pub(crate) charge_mode: u8,
  pub(crate) tp_ati_error: bool,
  pub(crate) tp_ati_again: bool,
  pub(crate) alp_ati_error: bool,
  pub(crate) alp_ati_again: bool,
  pub(crate) show_reset: bool,
  #[bits(8)]
  __: u8,
}

/// One reportable gesture, switch or ALP output.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EventDesc {
  /// Child node of the scope, or the scope node itself.
  pub(crate) name: Option<&'static str>,
  pub(crate) scope: Scope,
  pub(crate) key: Key,
  pub(crate) status: u16,
  pub(crate) enable: u16,
  /// Required travel sign for scroll directions sharing a status bit.
  pub(crate) travel: Option<u16>,
  pub(crate) kind: EventKind,
}

impl EventDesc {
  const fn gesture(name: &'static str, scope: Scope, key: Key, bit: u8, gesture: Gesture) -> Self {
    let fingers = match scope {
      Scope::Double => 2,
      _ => 1,
    };

    Self {
      name: Some(name),
      scope,
      key,
      status: 1 << bit,
      enable: 1 << bit,
      travel: None,
      kind: EventKind::Gesture { fingers, gesture },
    }
  }

  const fn travel(mut self, negative: bool) -> Self {
    self.travel = Some(if negative { TRAVEL_NEG } else { 0 });
    self
  }
}

const fn single(name: &'static str, key: Key, bit: u8, gesture: Gesture) -> EventDesc {
  EventDesc::gesture(name, Scope::Single, key, bit, gesture)
}

const fn double(name: &'static str, key: Key, bit: u8, gesture: Gesture) -> EventDesc {
  EventDesc::gesture(name, Scope::Double, key, bit, gesture)
}

pub(crate) static EVENTS: [EventDesc; 25] = [
  single("event-tap", Key::Tap, 0, Tap(TapCount::One)),
  single("event-tap-double", Key::Tap, 1, Tap(TapCount::Two)),
  single("event-tap-triple", Key::Tap, 2, Tap(TapCount::Three)),
  single("event-hold", Key::Hold, 3, PressHold),
  single("event-palm", Key::Palm, 4, Palm),
  single("event-swipe-x-pos", Key::AxialX, 8, Swipe(XPositive)),
  single("event-swipe-x-neg", Key::AxialX, 9, Swipe(XNegative)),
  single("event-swipe-y-pos", Key::AxialY, 10, Swipe(YPositive)),
  single("event-swipe-y-neg", Key::AxialY, 11, Swipe(YNegative)),
  single("event-swipe-x-pos-hold", Key::Hold, 12, SwipeHold(XPositive)),
  single("event-swipe-x-neg-hold", Key::Hold, 13, SwipeHold(XNegative)),
  single("event-swipe-y-pos-hold", Key::Hold, 14, SwipeHold(YPositive)),
  single("event-swipe-y-neg-hold", Key::Hold, 15, SwipeHold(YNegative)),
  double("event-tap", Key::Tap, 0, Tap(TapCount::One)),
  double("event-tap-double", Key::Tap, 1, Tap(TapCount::Two)),
  double("event-tap-triple", Key::Tap, 2, Tap(TapCount::Three)),
  double("event-hold", Key::Hold, 3, PressHold),
  double("event-zoom-pos", Key::Zoom, 4, ZoomIn),
  double("event-zoom-neg", Key::Zoom, 5, ZoomOut),
  double("event-scroll-y-pos", Key::ScrollY, 6, Scroll(YPositive)).travel(false),
  double("event-scroll-y-neg", Key::ScrollY, 6, Scroll(YNegative)).travel(true),
  double("event-scroll-x-pos", Key::ScrollX, 7, Scroll(XPositive)).travel(false),
  double("event-scroll-x-neg", Key::ScrollX, 7, Scroll(XNegative)).travel(true),
  EventDesc {
    name: None,
    scope: Scope::Switch,
    key: Key::Hold,
    status: 1 << 10,
    enable: OTHER_SW_ENABLE,
    travel: None,
    kind: EventKind::Switch,
  },
  EventDesc { name: None, scope: Scope::Alp, key: Key::Tap, status: 1 << 8, enable: 0, travel: None, kind: EventKind::Alp },
];

/// `azoteq,gesture-angle` in degrees to register value.
pub(crate) static GESTURE_ANGLE: [u8; 76] = [
  0x00, 0x01, 0x02, 0x03, 0x04, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0E, 0x0F, 0x10, 0x11, 0x12, 0x14, 0x15,
  0x16, 0x17, 0x19, 0x1A, 0x1B, 0x1C, 0x1E, 0x1F, 0x21, 0x22, 0x23, 0x25, 0x26, 0x28, 0x2A, 0x2B, 0x2D, 0x2E, 0x30,
  0x32, 0x34, 0x36, 0x38, 0x3A, 0x3C, 0x3E, 0x40, 0x42, 0x45, 0x47, 0x4A, 0x4C, 0x4F, 0x52, 0x55, 0x58, 0x5B, 0x5F,
  0x63, 0x66, 0x6B, 0x6F, 0x73, 0x78, 0x7E, 0x83, 0x89, 0x90, 0x97, 0x9E, 0xA7, 0xB0, 0xBA, 0xC5, 0xD1, 0xDF, 0xEF,
];

/// Trackpad arrays written from a list of values rather than one field.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ArrayDesc {
  pub(crate) name: &'static str,
  pub(crate) addr: u16,
  pub(crate) len: usize,
  /// Values are channel indices packed into a per-TX bitmap.
  pub(crate) bitmap: bool,
  pub(crate) max: u32,
}

pub(crate) static ARRAYS: [ArrayDesc; 3] = [
  ArrayDesc { name: "azoteq,channel-ignore", addr: 0x1246, len: 88, bitmap: true, max: NUM_CHANNELS as u32 - 1 },
  ArrayDesc { name: "azoteq,snap-select", addr: 0x129E, len: 88, bitmap: true, max: NUM_CHANNELS as u32 - 1 },
  ArrayDesc { name: "azoteq,trim-touch", addr: 0x12F6, len: NUM_CHANNELS, bitmap: false, max: u8::MAX as u32 },
];

/// Byte-wide fields at odd addresses live in the high half of their word.
pub(crate) static PROPS: [Property<(Scope, Key)>; 117] = [
  Property::new("azoteq,ati-comp-div", (Scope::Alp, Key::Span), 0x000, 10, 5).span(12).label("ATI compensation divider"),
  Property::new("azoteq,ati-comp-select", (Scope::Alp, Key::Span), 0x000, 0, 10).span(12).label("ATI compensation selection"),
  Property::new("azoteq,exp-settings-minor", (Scope::System, Key::None), 0x00E, 0, 8).label("exported settings minor version"),
  Property::new("azoteq,exp-settings-major", (Scope::System, Key::None), 0x00E, 8, 8).label("exported settings major version"),
  Property::new("azoteq,ati-frac-mult-fine", (Scope::Trackpad, Key::Span), 0x00F, 14, 2).label("ATI fine fractional multiplier"),
  Property::new("azoteq,ati-frac-mult-fine", (Scope::Alp, Key::Span), 0x010, 14, 2).span(12).label("ATI fine fractional multiplier"),
  Property::new("azoteq,ati-frac-div-fine", (Scope::Trackpad, Key::Span), 0x00F, 9, 5).label("ATI fine fractional divider"),
  Property::new("azoteq,ati-frac-div-fine", (Scope::Alp, Key::Span), 0x010, 9, 5).span(12).label("ATI fine fractional divider"),
  Property::new("azoteq,ati-frac-mult-coarse", (Scope::Trackpad, Key::Span), 0x00F, 5, 4).label("ATI coarse fractional multiplier"),
  Property::new("azoteq,ati-frac-mult-coarse", (Scope::Alp, Key::Span), 0x010, 5, 4).span(12).label("ATI coarse fractional multiplier"),
  Property::new("azoteq,ati-frac-div-coarse", (Scope::Trackpad, Key::Span), 0x00F, 0, 5).label("ATI coarse fractional divider"),
  Property::new("azoteq,ati-frac-div-coarse", (Scope::Alp, Key::Span), 0x010, 0, 5).span(12).label("ATI coarse fractional divider"),
  Property::new("azoteq,ati-target", (Scope::Trackpad, Key::None), 0x01D, 0, 16).label("ATI target"),
  Property::new("azoteq,ati-target", (Scope::Alp, Key::None), 0x01E, 0, 16).label("ATI target"),
  Property::new("azoteq,ati-base", (Scope::Alp, Key::None), 0x01F, 0, 16).label("ATI base"),
  Property::new("azoteq,ati-delta-neg", (Scope::Trackpad, Key::None), 0x020, 0, 16).label("ATI negative delta threshold"),
  Property::new("azoteq,ati-delta-pos", (Scope::Trackpad, Key::None), 0x021, 0, 16).label("ATI positive delta threshold"),
  Property::new("azoteq,ati-drift", (Scope::Trackpad, Key::None), 0x022, 0, 8).label("ATI drift limit"),
  Property::new("azoteq,ati-drift", (Scope::Alp, Key::None), 0x022, 8, 8).label("ATI drift limit"),
  Property::new("azoteq,rate-active-ms", (Scope::System, Key::None), 0x023, 0, 16).label("active mode report rate"),
  Property::new("azoteq,rate-touch-ms", (Scope::System, Key::None), 0x024, 0, 16).label("idle-touch mode report rate"),
  Property::new("azoteq,rate-idle-ms", (Scope::System, Key::None), 0x025, 0, 16).label("idle mode report rate"),
  Property::new("azoteq,rate-lp1-ms", (Scope::System, Key::None), 0x026, 0, 16).label("low-power mode 1 report rate"),
  Property::new("azoteq,rate-lp2-ms", (Scope::System, Key::None), 0x027, 0, 16).label("low-power mode 2 report rate"),
  Property::new("azoteq,timeout-press-ms", (Scope::System, Key::None), 0x028, 0, 16).pitch(1000).label("active mode (press) timeout"),
  Property::new("azoteq,timeout-touch-ms", (Scope::System, Key::None), 0x029, 0, 16).pitch(1000).label("idle-touch mode timeout"),
  Property::new("azoteq,timeout-idle-ms", (Scope::System, Key::None), 0x02A, 0, 16).pitch(1000).label("idle mode timeout"),
  Property::new("azoteq,timeout-lp1-ms", (Scope::System, Key::None), 0x02B, 0, 16).pitch(1000).label("low-power mode 1 timeout"),
  Property::new("azoteq,timeout-release-ms", (Scope::System, Key::None), 0x02C, 0, 16).label("active mode (release) timeout"),
  Property::new("azoteq,timeout-ati-ms", (Scope::System, Key::None), 0x02D, 0, 8).pitch(1000).max(60000).label("ATI error timeout"),
  Property::new("azoteq,rate-ref-ms", (Scope::System, Key::None), 0x02D, 8, 8).pitch(1000).max(60000).label("trackpad reference value update rate"),
  Property::new("azoteq,timeout-snap-ms", (Scope::System, Key::None), 0x02F, 0, 8).pitch(1000).label("snap timeout"),
  Property::new("azoteq,sleep-conv", (Scope::System, Key::None), 0x031, 5, 1).numeric().label("processing during conversions disable state"),
  Property::new("azoteq,ati-mode", (Scope::Alp, Key::None), 0x031, 1, 1).numeric().label("ATI mode"),
  Property::new("azoteq,sleep-mode", (Scope::System, Key::None), 0x031, 0, 1).numeric().label("sleep mode"),
  Property::new("azoteq,pin-polarity", (Scope::Switch, Key::None), 0x032, 14, 1).numeric().label("pin polarity"),
  Property::new("azoteq,fosc-trim", (Scope::System, Key::None), 0x032, 12, 2).label("sensing engine oscillator frequency trim"),
  Property::new("azoteq,fosc-freq", (Scope::System, Key::None), 0x032, 6, 2).max(3).label("main oscillator frequency"),
  Property::new("azoteq,auto-prox-lp2", (Scope::Alp, Key::None), 0x032, 5, 1).numeric().label("low-power mode 2 auto prox enable state"),
  Property::new("azoteq,auto-prox-lp1", (Scope::Alp, Key::None), 0x032, 4, 1).numeric().label("low-power mode 1 auto prox enable state"),
  Property::new("azoteq,auto-prox-cycles-lp2", (Scope::Alp, Key::None), 0x032, 2, 2).label("low-power mode 2 auto prox number of cycles"),
  Property::new("azoteq,auto-prox-cycles-lp1", (Scope::Alp, Key::None), 0x032, 0, 2).label("low-power mode 1 auto prox number of cycles"),
  Property::new("azoteq,count-filter", (Scope::Alp, Key::None), 0x034, 14, 1).numeric().label("count filter enable state"),
  Property::new("azoteq,sense-mode", (Scope::Alp, Key::None), 0x034, 13, 1).numeric().label("sensing mode"),
  Property::new("azoteq,tx-shield", (Scope::Alp, Key::None), 0x034, 12, 1).numeric().label("TX pin shield state"),
  Property::new("azoteq,touch-enter", (Scope::Trackpad, Key::None), 0x038, 0, 8).label("touch entrance factor"),
  Property::new("azoteq,touch-exit", (Scope::Trackpad, Key::None), 0x038, 8, 8).label("touch exit factor"),
  Property::new("azoteq,thresh", (Scope::Alp, Key::None), 0x039, 0, 8).label("threshold"),
  Property::new("azoteq,auto-prox-delta", (Scope::Alp, Key::None), 0x039, 8, 8).label("auto prox delta threshold"),
  Property::new("azoteq,debounce-enter", (Scope::Alp, Key::None), 0x03A, 0, 8).label("debounce entrance factor"),
  Property::new("azoteq,debounce-exit", (Scope::Alp, Key::None), 0x03A, 8, 8).label("debounce exit factor"),
  Property::new("azoteq,snap-enter", (Scope::Trackpad, Key::None), 0x03B, 0, 8).label("snap entrance factor"),
  Property::new("azoteq,snap-exit", (Scope::Trackpad, Key::None), 0x03B, 8, 8).label("snap exit factor"),
  Property::new("azoteq,counts-beta-lp1", (Scope::Alp, Key::None), 0x03C, 0, 8).label("low-power mode 1 counts beta"),
  Property::new("azoteq,lta-beta-lp1", (Scope::Alp, Key::None), 0x03C, 8, 8).label("low-power mode 1 long-term average beta"),
  Property::new("azoteq,counts-beta-lp2", (Scope::Alp, Key::None), 0x03D, 0, 8).label("low-power mode 2 counts beta"),
  Property::new("azoteq,lta-beta-lp2", (Scope::Alp, Key::None), 0x03D, 8, 8).label("low-power mode 2 long-term average beta"),
  Property::new("azoteq,conv-frac", (Scope::Trackpad, Key::None), 0x03E, 0, 8).label("conversion frequency fractional divider"),
  Property::new("azoteq,conv-frac", (Scope::Alp, Key::None), 0x03F, 8, 8).label("conversion frequency fractional divider"),
  Property::new("azoteq,conv-period-1", (Scope::Trackpad, Key::None), 0x03E, 8, 8).label("conversion period 1"),
  Property::new("azoteq,conv-period-1", (Scope::Alp, Key::None), 0x040, 0, 8).label("conversion period 1"),
  Property::new("azoteq,conv-period-2", (Scope::Trackpad, Key::None), 0x03F, 0, 8).label("conversion period 2"),
  Property::new("azoteq,conv-period-2", (Scope::Alp, Key::None), 0x040, 8, 8).label("conversion period 2"),
  Property::new("azoteq,delay-cycles", (Scope::Trackpad, Key::None), 0x041, 14, 2).label("initial cycle delay"),
  Property::new("azoteq,delay-cycles", (Scope::Alp, Key::None), 0x042, 14, 2).label("initial cycle delay"),
  Property::new("azoteq,proj-bias", (Scope::Trackpad, Key::None), 0x041, 11, 3).label("projected bias current"),
  Property::new("azoteq,proj-bias", (Scope::Alp, Key::None), 0x042, 11, 3).label("projected bias current"),
  Property::new("azoteq,max-counts", (Scope::Trackpad, Key::None), 0x041, 8, 3).max(4).label("maximum counts"),
  Property::new("azoteq,max-counts", (Scope::Alp, Key::None), 0x042, 8, 3).max(4).label("maximum counts"),
  Property::new("azoteq,samp-cap-discharge", (Scope::Trackpad, Key::None), 0x041, 7, 1).numeric().label("sample capacitor discharge voltage"),
  Property::new("azoteq,samp-cap-discharge", (Scope::Alp, Key::None), 0x042, 7, 1).numeric().label("sample capacitor discharge voltage"),
  Property::new("azoteq,rf-filter", (Scope::Trackpad, Key::None), 0x041, 6, 1).numeric().label("RF filter enable state"),
  Property::new("azoteq,rf-filter", (Scope::Alp, Key::None), 0x042, 6, 1).numeric().label("RF filter enable state"),
  Property::new("azoteq,nm-static-out", (Scope::Trackpad, Key::None), 0x041, 5, 1).numeric().label("NM static output enable state"),
  Property::new("azoteq,nm-static-out", (Scope::Alp, Key::None), 0x042, 5, 1).numeric().label("NM static output enable state"),
  Property::new("azoteq,nm-static-in", (Scope::Trackpad, Key::None), 0x041, 4, 1).numeric().label("NM static input enable state"),
  Property::new("azoteq,nm-static-in", (Scope::Alp, Key::None), 0x042, 4, 1).numeric().label("NM static input enable state"),
  Property::new("azoteq,proj-offset", (Scope::Trackpad, Key::None), 0x041, 0, 4).label("projected offset voltage"),
  Property::new("azoteq,proj-offset", (Scope::Alp, Key::None), 0x042, 0, 4).label("projected offset voltage"),
  Property::new("azoteq,area-filter", (Scope::Trackpad, Key::None), 0x043, 6, 1).numeric().label("area filter disable state"),
  Property::new("azoteq,jitter-filter", (Scope::Trackpad, Key::None), 0x043, 5, 1).numeric().label("jitter filter enable state"),
  Property::new("azoteq,iir-static", (Scope::Trackpad, Key::None), 0x043, 4, 1).numeric().label("IIR filtering method"),
  Property::new("azoteq,iir-filter", (Scope::Trackpad, Key::None), 0x043, 3, 1).numeric().label("IIR filter enable state"),
  Property::new("azoteq,num-contacts", (Scope::Trackpad, Key::None), 0x044, 8, 8).min(1).max(7).label("number of contacts"),
  Property::new("azoteq,bottom-speed", (Scope::Trackpad, Key::None), 0x047, 0, 16).label("bottom speed"),
  Property::new("azoteq,top-speed", (Scope::Trackpad, Key::None), 0x048, 0, 16).label("top speed"),
  Property::new("azoteq,bottom-beta", (Scope::Trackpad, Key::None), 0x049, 0, 8).label("bottom beta"),
  Property::new("azoteq,static-beta", (Scope::Trackpad, Key::None), 0x049, 8, 8).label("static beta"),
  Property::new("azoteq,thresh", (Scope::Trackpad, Key::None), 0x04A, 0, 8).label("threshold"),
  Property::new("azoteq,contact-split", (Scope::Trackpad, Key::None), 0x04A, 8, 8).label("contact split factor"),
  Property::new("azoteq,trim-x", (Scope::Trackpad, Key::None), 0x04B, 0, 8).label("horizontal trim width"),
  Property::new("azoteq,trim-y", (Scope::Trackpad, Key::None), 0x04B, 8, 8).label("vertical trim height"),
  Property::new("azoteq,jitter-delta", (Scope::Trackpad, Key::None), 0x04C, 0, 8).label("jitter filter delta threshold"),
  Property::new("azoteq,contact-confidence", (Scope::Trackpad, Key::None), 0x04C, 8, 8).label("contact confidence threshold"),
  Property::new("azoteq,gesture-max-ms", (Scope::Single, Key::Tap), 0x04F, 0, 16).label("maximum gesture time"),
  Property::new("azoteq,gesture-max-ms", (Scope::Double, Key::Tap), 0x04F, 0, 16).label("maximum gesture time"),
  Property::new("azoteq,gesture-mid-ms", (Scope::Single, Key::Tap), 0x050, 0, 16).label("repeated gesture time"),
  Property::new("azoteq,gesture-mid-ms", (Scope::Double, Key::Tap), 0x050, 0, 16).label("repeated gesture time"),
  Property::new("azoteq,gesture-dist", (Scope::Single, Key::Tap), 0x051, 0, 16).label("gesture distance"),
  Property::new("azoteq,gesture-dist", (Scope::Double, Key::Tap), 0x051, 0, 16).label("gesture distance"),
  Property::new("azoteq,gesture-dist", (Scope::Single, Key::Hold), 0x051, 0, 16).label("gesture distance"),
  Property::new("azoteq,gesture-dist", (Scope::Double, Key::Hold), 0x051, 0, 16).label("gesture distance"),
  Property::new("azoteq,gesture-min-ms", (Scope::Single, Key::Hold), 0x052, 0, 16).label("minimum gesture time"),
  Property::new("azoteq,gesture-min-ms", (Scope::Double, Key::Hold), 0x052, 0, 16).label("minimum gesture time"),
  Property::new("azoteq,gesture-max-ms", (Scope::Single, Key::AxialX), 0x053, 0, 16).label("maximum gesture time"),
  Property::new("azoteq,gesture-max-ms", (Scope::Single, Key::AxialY), 0x053, 0, 16).label("maximum gesture time"),
  Property::new("azoteq,gesture-dist", (Scope::Single, Key::AxialX), 0x054, 0, 16).label("gesture distance"),
  Property::new("azoteq,gesture-dist", (Scope::Single, Key::AxialY), 0x055, 0, 16).label("gesture distance"),
  Property::new("azoteq,gesture-dist-rep", (Scope::Single, Key::AxialX), 0x056, 0, 16).label("repeated gesture distance"),
  Property::new("azoteq,gesture-dist-rep", (Scope::Single, Key::AxialY), 0x057, 0, 16).label("repeated gesture distance"),
  Property::new("azoteq,gesture-dist", (Scope::Double, Key::Zoom), 0x059, 0, 16).label("gesture distance"),
  Property::new("azoteq,gesture-dist-rep", (Scope::Double, Key::Zoom), 0x05A, 0, 16).label("repeated gesture distance"),
  Property::new("azoteq,gesture-dist", (Scope::Double, Key::ScrollX), 0x05B, 0, 16).label("gesture distance"),
  Property::new("azoteq,gesture-dist", (Scope::Double, Key::ScrollY), 0x05B, 0, 16).label("gesture distance"),
  Property::new("azoteq,gesture-dist-rep", (Scope::Double, Key::ScrollX), 0x05C, 0, 16).label("repeated gesture distance"),
  Property::new("azoteq,gesture-dist-rep", (Scope::Double, Key::ScrollY), 0x05C, 0, 16).label("repeated gesture distance"),
  Property::new("azoteq,thresh", (Scope::Single, Key::Palm), 0x05D, 0, 16).max(506).label("threshold"),
];
