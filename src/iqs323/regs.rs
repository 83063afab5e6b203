use bitfield_struct::bitfield;

use crate::config::Property;
use crate::image::GroupDescriptor;

pub(crate) const PROD_NUM: u16 = 0x00;
pub(crate) const PROD_NUM_REL: u16 = 1106;
pub(crate) const PROD_NUM_MOV: u16 = 1462;

pub(crate) const SYS_STATUS: u16 = 0x10;
pub(crate) const MOV_STATUS: u16 = 0x23;
pub(crate) const SYS_SETUP: u16 = 0xC0;

pub(crate) const SNSR_SETUP_0_MOV_EN: u16 = 1 << 6;
pub(crate) const SNSR_SETUP_0_CHAN_EN: u16 = 1 << 0;
pub(crate) const SNSR_SETUP_2_SENSE_MODE: u16 = 0x003F;
pub(crate) const SNSR_SETUP_4_WAVE_PAT_1: u16 = 0xF000;
pub(crate) const SNSR_SETUP_4_WAVE_PAT_0: u16 = 0x0F00;
pub(crate) const SNSR_SETUP_5_WAVE_SEL: u16 = 0x00FF;

pub(crate) const CHAN_SETUP_0_REF_SEL: u16 = 0x00F0;
pub(crate) const CHAN_SETUP_0_REF_MODE: u16 = 0x000F;
pub(crate) const REF_MODE_FOLLOW: u16 = 1 << 0;
pub(crate) const REF_MODE_REF: u16 = 1 << 1;

pub(crate) const SLDR_SETUP_0_CHAN_CNT: u16 = 0x0007;
pub(crate) const SLDR_STATUS_BUSY: u16 = 1 << 7;
pub(crate) const SLDR_STATUS_EVENT: u16 = 1 << 6;

pub(crate) const GEN_SETUP_0_GPIO_INV: u16 = 1 << 15;
pub(crate) const GEN_SETUP_0_GPIO_SET: u16 = 0x7FFF;

pub(crate) const EVENT_MASK_ALL: u16 = 0x007F;
pub(crate) const EVENT_MASK_ATI: u16 = (1 << 6) | (1 << 4);
pub(crate) const EVENT_MASK_SLDR: u16 = 1 << 2;
pub(crate) const EVENT_MASK_TOUCH: u16 = 1 << 1;
pub(crate) const EVENT_MASK_PROX: u16 = 1 << 0;

pub(crate) const NUM_CHAN: usize = 3;
pub(crate) const MIN_REPORT_LEN: usize = 10;
pub(crate) const MAX_REPORT_LEN: usize = 22;
pub(crate) const RESET_TIMEOUT_MS: u32 = 300;
pub(crate) const COMMS_TIMEOUT_US: u32 = 100_000;
pub(crate) const RDY_SETTLE_US: u32 = 2500;

const REG_OFFSET: u16 = 0x10;

/// Bytes needed to mirror the largest variant.
pub(crate) const IMAGE_LEN: usize = 2 * (3 * 10 + 3 * 5 + 9 + 7 + 5 + 6 + 5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Grp {
  Snsr,
  Chan,
  Sldr,
  Gest,
  Filt,
  Sys,
  Gen,
  /// Configuration-only scopes without registers of their own.
  Gpio,
  Rel,
}

/// Sub-selector for properties sharing a group, e.g. one threshold per
/// channel event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Key {
  None,
  Prox,
  Touch,
  Mov,
  Tap,
  Hold,
  Axial,
}

pub(crate) type Scope = (Grp, Key);

/// Power modes of the SYS_SETUP register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum PowerMode {
  Normal = 0,
  Low = 1,
  UltraLow = 2,
  Halt = 3,
  Auto = 4,
  AutoNoUltraLow = 5,
}

impl PowerMode {
  pub(crate) const fn into_bits(self) -> u8 {
    self as _
  }

  pub(crate) const fn from_bits(bits: u8) -> Option<Self> {
    match bits {
      0 => Some(Self::Normal),
      1 => Some(Self::Low),
      2 => Some(Self::UltraLow),
      3 => Some(Self::Halt),
      4 => Some(Self::Auto),
      5 => Some(Self::AutoNoUltraLow),
      _ => None,
    }
  }
}

#[bitfield(u16)]
#[derive(PartialEq, Eq)]
pub(crate) struct SysStatus {
  #[bits(5)]
  __: u8,
  pub(crate) ati_active: bool,
  pub(crate) ati_error: bool,
  pub(crate) reset: bool,
  #[bits(6)]
  pub(crate) channels: u8,
  #[bits(2)]
  ___: u8,
}

#[bitfield(u16)]
#[derive(PartialEq, Eq)]
pub(crate) struct SysSetup {
  pub(crate) ack_reset: bool,
  __: bool,
  pub(crate) redo_ati: bool,
  ___: bool,
  #[bits(3)]
  pub(crate) power_mode: u8,
  pub(crate) event_mode: bool,
  #[bits(3)]
  pub(crate) press_timeout_disable: u8,
  #[bits(5)]
  ____: u8,
}

/// Product-specific layout.
#[derive(Debug)]
pub(crate) struct Desc {
  pub(crate) prod_num: u16,
  pub(crate) touch_link: u16,
  pub(crate) delta_links: [u16; NUM_CHAN],
  pub(crate) groups: &'static [GroupDescriptor<Grp>],
  pub(crate) release: bool,
}

impl Desc {
  pub(crate) fn find(prod_num: u16) -> Option<&'static Desc> {
    DEVS.iter().find(|d| d.prod_num == prod_num)
  }

  pub(crate) fn is_mov(&self) -> bool {
    self.prod_num == PROD_NUM_MOV
  }

  /// Rows a configuration scope spans, zero when the variant lacks it.
  pub(crate) fn rows(&self, grp: Grp) -> usize {
    match grp {
      Grp::Gpio => 1,
      Grp::Rel => self.release as usize,
      _ => self.groups.iter().find(|g| g.id == grp).map_or(0, |g| g.rows as usize),
    }
  }
}

const fn groups(chan_cols: u16) -> [GroupDescriptor<Grp>; 7] {
  [
    GroupDescriptor::strided(Grp::Snsr, 0x30, NUM_CHAN as u8, 10, REG_OFFSET),
    GroupDescriptor::strided(Grp::Chan, 0x60, NUM_CHAN as u8, chan_cols, REG_OFFSET),
    GroupDescriptor::packed(Grp::Sldr, 0x90, 1, 9),
    GroupDescriptor::packed(Grp::Gest, 0xA0, 1, 7),
    GroupDescriptor::packed(Grp::Filt, 0xB0, 1, 5),
    GroupDescriptor::packed(Grp::Sys, SYS_SETUP, 1, 6),
    GroupDescriptor::packed(Grp::Gen, 0xD0, 1, 5),
  ]
}

static REL_GROUPS: [GroupDescriptor<Grp>; 7] = groups(4);
static MOV_GROUPS: [GroupDescriptor<Grp>; 7] = groups(5);

pub(crate) static DEVS: [Desc; 2] = [
  Desc {
    prod_num: PROD_NUM_REL,
    touch_link: 0x552,
    delta_links: [0x430, 0x472, 0x4B4],
    groups: &REL_GROUPS,
    release: true,
  },
  Desc {
    prod_num: PROD_NUM_MOV,
    touch_link: 0x558,
    delta_links: [0x430, 0x474, 0x4B8],
    groups: &MOV_GROUPS,
    release: false,
  },
];

/// Event child nodes of each channel. `mask` addresses the channel's pair of
/// status bits; `enable` unmasks the matching interrupt.
pub(crate) struct EventDesc {
  pub(crate) name: &'static str,
  pub(crate) mask: u16,
  pub(crate) enable: u16,
  pub(crate) key: Key,
}

pub(crate) static KP_EVENTS: [EventDesc; 3] = [
  EventDesc { name: "event-prox", mask: EVENT_MASK_PROX, enable: EVENT_MASK_PROX, key: Key::Prox },
  EventDesc { name: "event-touch", mask: EVENT_MASK_TOUCH, enable: EVENT_MASK_TOUCH, key: Key::Touch },
  EventDesc { name: "movement", mask: 0, enable: 0, key: Key::Mov },
];

/// Slider gestures in status-bit order. A mask carrying the busy flag
/// stays set for as long as the gesture lasts; the others are momentary.
pub(crate) static SL_EVENTS: [EventDesc; 7] = [
  EventDesc { name: "event-press", mask: 0, enable: 0, key: Key::None },
  EventDesc { name: "event-tap", mask: 1 << 0, enable: 1 << 0, key: Key::Tap },
  EventDesc { name: "event-swipe-pos", mask: (1 << 1) | SLDR_STATUS_BUSY, enable: 1 << 1, key: Key::Axial },
  EventDesc { name: "event-swipe-neg", mask: (1 << 2) | SLDR_STATUS_BUSY, enable: 1 << 1, key: Key::Axial },
  EventDesc { name: "event-flick-pos", mask: 1 << 3, enable: 1 << 2, key: Key::Axial },
  EventDesc { name: "event-flick-neg", mask: 1 << 4, enable: 1 << 2, key: Key::Axial },
  EventDesc { name: "event-hold", mask: (1 << 5) | SLDR_STATUS_BUSY, enable: 1 << 3, key: Key::Hold },
];

pub(crate) const CHANNEL_NODES: [&str; NUM_CHAN] = ["channel-0", "channel-1", "channel-2"];

pub(crate) static SENSE_MODES: [u16; 4] = [0x10, 0x13, 0x1D, 0x3D];
pub(crate) static WAVE_PATTERNS: [u16; 4] = [0x0300, 0x0E00, 0, 0x0B00];
pub(crate) static RX_INACTIVES: [u16; 4] = [0x00, 0x05, 0x0A, 0x0F];

/// Pin lists folded into a bitmap within the SNSR row.
pub(crate) struct PinDesc {
  pub(crate) name: &'static str,
  pub(crate) offset: usize,
  pub(crate) shift: u8,
  pub(crate) width: u8,
  pub(crate) count: usize,
}

pub(crate) static PINS: [PinDesc; 3] = [
  PinDesc { name: "azoteq,tx-select", offset: 5, shift: 0, width: 8, count: 4 },
  PinDesc { name: "azoteq,rx-enable", offset: 3, shift: 8, width: 3, count: 3 },
  PinDesc { name: "azoteq,tx-enable", offset: 0, shift: 8, width: 4, count: 4 },
];

pub(crate) static PROPS: [Property<Scope>; 74] = [
  Property::flag("azoteq,tx-freq-fosc", (Grp::Snsr, Key::None), 0, 5),
  Property::flag("azoteq,vbias-enable", (Grp::Snsr, Key::None), 0, 4),
  Property::flag("azoteq,invert-enable", (Grp::Snsr, Key::None), 0, 3),
  Property::flag("azoteq,dual-direction", (Grp::Snsr, Key::None), 0, 2),
  Property::flag("azoteq,linearize", (Grp::Snsr, Key::None), 0, 1),
  Property::new("azoteq,conv-period", (Grp::Snsr, Key::None), 1, 8, 8).label("conversion period"),
  Property::new("azoteq,conv-frac", (Grp::Snsr, Key::None), 1, 0, 8).label("conversion frequency fractional divider"),
  Property::flag("azoteq,vref-half", (Grp::Snsr, Key::None), 2, 14),
  Property::flag("azoteq,samp-cap-double", (Grp::Snsr, Key::None), 2, 12),
  Property::new("azoteq,proj-bias", (Grp::Snsr, Key::None), 2, 8, 2).label("projected bias current"),
  Property::new("azoteq,max-counts", (Grp::Snsr, Key::None), 2, 6, 2).label("maximum counts"),
  Property::new("azoteq,sense-mode", (Grp::Snsr, Key::None), 2, 0, 6).max(3).table(&SENSE_MODES).label("sensing mode"),
  Property::flag("azoteq,tref-enable", (Grp::Snsr, Key::None), 3, 13),
  Property::flag("azoteq,iref-enable", (Grp::Snsr, Key::None), 3, 12),
  Property::flag("azoteq,dead-time-enable", (Grp::Snsr, Key::None), 3, 6),
  Property::new("azoteq,auto-mode", (Grp::Snsr, Key::None), 3, 2, 2).label("number of conversions"),
  Property::new("azoteq,wave-pattern-1", (Grp::Snsr, Key::None), 4, 12, 4).label("waveform pattern 1"),
  Property::new("azoteq,wave-pattern-0", (Grp::Snsr, Key::None), 4, 8, 4).label("waveform pattern 0"),
  Property::new("azoteq,rx-inactive", (Grp::Snsr, Key::None), 4, 0, 4).max(3).table(&RX_INACTIVES).label("inactive CRx pin termination"),
  Property::new("azoteq,iref-level", (Grp::Snsr, Key::None), 5, 12, 4).label("current reference level"),
  Property::new("azoteq,iref-trim", (Grp::Snsr, Key::None), 5, 8, 4).label("current reference trim"),
  Property::new("azoteq,ati-factor", (Grp::Snsr, Key::None), 6, 4, 12).label("ATI resolution factor"),
  Property::flag("azoteq,ati-band-tighten", (Grp::Snsr, Key::None), 6, 3).inverted(),
  Property::new("azoteq,ati-mode", (Grp::Snsr, Key::None), 6, 0, 3).max(4).label("ATI mode"),
  Property::new("azoteq,ati-base", (Grp::Snsr, Key::None), 7, 0, 16).max(16384).label("ATI base"),
  Property::new("azoteq,ati-frac-mult-fine", (Grp::Snsr, Key::None), 8, 14, 2).label("ATI fine fractional multiplier"),
  Property::new("azoteq,ati-frac-div-fine", (Grp::Snsr, Key::None), 8, 9, 5).label("ATI fine fractional divider"),
  Property::new("azoteq,ati-frac-mult-coarse", (Grp::Snsr, Key::None), 8, 5, 4).label("ATI coarse fractional multiplier"),
  Property::new("azoteq,ati-frac-div-coarse", (Grp::Snsr, Key::None), 8, 0, 5).label("ATI coarse fractional divider"),
  Property::new("azoteq,ati-comp-div", (Grp::Snsr, Key::None), 9, 11, 5).label("ATI compensation divider"),
  Property::new("azoteq,ati-comp-select", (Grp::Snsr, Key::None), 9, 0, 10).label("ATI compensation selection"),
  Property::new("azoteq,debounce-exit", (Grp::Chan, Key::Prox), 1, 12, 4).label("debounce exit factor"),
  Property::new("azoteq,debounce-enter", (Grp::Chan, Key::Prox), 1, 8, 4).label("debounce entrance factor"),
  Property::new("azoteq,thresh", (Grp::Chan, Key::Prox), 1, 0, 8).label("threshold"),
  Property::new("azoteq,thresh", (Grp::Chan, Key::Touch), 2, 0, 8).label("threshold"),
  Property::new("azoteq,hyst", (Grp::Chan, Key::Touch), 2, 8, 8).label("hysteresis"),
  Property::new("azoteq,debounce-exit", (Grp::Chan, Key::Mov), 4, 12, 4).label("debounce exit factor"),
  Property::new("azoteq,debounce-enter", (Grp::Chan, Key::Mov), 4, 8, 4).label("debounce entrance factor"),
  Property::new("azoteq,thresh", (Grp::Chan, Key::Mov), 4, 0, 8).label("threshold"),
  Property::new("azoteq,lower-cal", (Grp::Sldr, Key::None), 0, 8, 8).label("lower calibration"),
  Property::flag("azoteq,static-beta", (Grp::Sldr, Key::None), 0, 6),
  Property::new("azoteq,bottom-beta", (Grp::Sldr, Key::None), 0, 3, 3).label("bottom beta"),
  Property::new("azoteq,bottom-speed", (Grp::Sldr, Key::None), 1, 8, 8).label("bottom speed"),
  Property::new("azoteq,upper-cal", (Grp::Sldr, Key::None), 1, 0, 8).label("upper calibration"),
  Property::new("azoteq,top-speed", (Grp::Sldr, Key::None), 2, 0, 16).label("top speed"),
  Property::new("azoteq,slider-size", (Grp::Sldr, Key::None), 3, 0, 16).label("size"),
  Property::new("azoteq,gesture-min-ms", (Grp::Gest, Key::Tap), 1, 0, 16).label("minimum gesture time"),
  Property::new("azoteq,gesture-max-ms", (Grp::Gest, Key::Tap), 2, 0, 16).label("maximum gesture time"),
  Property::new("azoteq,gesture-max-ms", (Grp::Gest, Key::Axial), 3, 0, 16).label("maximum gesture time"),
  Property::new("azoteq,gesture-min-ms", (Grp::Gest, Key::Hold), 4, 0, 16).label("maximum gesture time"),
  Property::new("azoteq,gesture-dist", (Grp::Gest, Key::Tap), 5, 0, 16).label("gesture distance"),
  Property::new("azoteq,gesture-dist", (Grp::Gest, Key::Axial), 6, 0, 16).label("gesture distance"),
  Property::new("azoteq,counts-beta-lp", (Grp::Filt, Key::None), 0, 8, 8).label("low-power mode counts beta"),
  Property::new("azoteq,counts-beta-np", (Grp::Filt, Key::None), 0, 0, 8).label("normal-power mode counts beta"),
  Property::new("azoteq,lta-beta-lp", (Grp::Filt, Key::None), 1, 8, 8).label("low-power mode long-term average beta"),
  Property::new("azoteq,lta-beta-np", (Grp::Filt, Key::None), 1, 0, 8).label("normal-power mode long-term average beta"),
  Property::new("azoteq,lta-fast-beta-lp", (Grp::Filt, Key::None), 2, 8, 8).label("low-power mode long-term average fast beta"),
  Property::new("azoteq,lta-fast-beta-np", (Grp::Filt, Key::None), 2, 0, 8).label("normal-power mode long-term average fast beta"),
  Property::new("azoteq,press-lta-beta-lp", (Grp::Filt, Key::None), 3, 8, 8).label("low-power mode press long-term average beta"),
  Property::new("azoteq,press-lta-beta-np", (Grp::Filt, Key::None), 3, 0, 8).label("normal-power mode press long-term average beta"),
  Property::new("azoteq,fast-filt-band", (Grp::Filt, Key::None), 4, 0, 16).label("fast filter band"),
  Property::new("azoteq,power-mode", (Grp::Sys, Key::None), 0, 4, 3).max(5).label("power mode"),
  Property::new("azoteq,rate-np-ms", (Grp::Sys, Key::None), 1, 0, 16).max(3000).label("normal-power mode report rate"),
  Property::new("azoteq,rate-lp-ms", (Grp::Sys, Key::None), 2, 0, 16).max(3000).label("low-power mode report rate"),
  Property::new("azoteq,rate-ulp-ms", (Grp::Sys, Key::None), 3, 0, 16).max(3000).label("ultra-low-power mode report rate"),
  Property::new("azoteq,rate-halt-ms", (Grp::Sys, Key::None), 4, 0, 16).max(3000).label("halt mode report rate"),
  Property::new("azoteq,timeout-xp-ms", (Grp::Sys, Key::None), 5, 0, 16).max(65000).label("power mode timeout"),
  Property::new("azoteq,timeout-comms-ms", (Grp::Gen, Key::None), 1, 0, 16).min(2).max(230).label("communication timeout"),
  Property::new("azoteq,timeout-press-ms", (Grp::Gen, Key::Touch), 2, 8, 8).pitch(512).label("press timeout"),
  Property::new("azoteq,timeout-press-ms", (Grp::Gen, Key::Prox), 2, 0, 8).pitch(512).label("press timeout"),
  Property::new("azoteq,thresh", (Grp::Rel, Key::None), 3, 8, 8).label("threshold"),
  Property::new("azoteq,delta-delay", (Grp::Rel, Key::None), 4, 8, 8).label("delta snapshot sample delay"),
  Property::new("azoteq,delta-weight", (Grp::Rel, Key::None), 4, 0, 8).max(128).label("delta weight"),
  Property::new("azoteq,timeout-press-ms", (Grp::Gen, Key::Mov), 4, 0, 16).pitch(512).label("press timeout"),
];
