use bitfield_struct::bitfield;

use crate::config::Property;
use crate::image::GroupDescriptor;

pub(crate) const PROD_NUM: u16 = 0x00;
pub(crate) const PROD_NUM_A: u16 = 685;

pub(crate) const SYS_STATUS: u16 = 0x10;
pub(crate) const SYS_SETUP: u16 = 0x80;
pub(crate) const COMMS_SETUP: u16 = 0x8D;

pub(crate) const CAP_SETUP_VREF_HALF: u16 = 1 << 6;
pub(crate) const CAP_SETUP_SAMP_DOUBLE: u16 = 1 << 4;
pub(crate) const CAP_SETUP_COUNTS: u16 = 0x0003;

pub(crate) const EVENT_MASK_ALL: u16 = 0x001F;
pub(crate) const EVENT_MASK_ATI: u16 = 1 << 3;
pub(crate) const COMMS_HOLD: u16 = 1 << 8;

pub(crate) const GPIO_OPEN_DRAIN: u16 = 1 << 3;
pub(crate) const GPIO_ACTIVE_HIGH: u16 = 1 << 0;
/// GPIOs 1, 2 and 5 double as SDA, SCL and RDY.
pub(crate) const GPIOS: [u32; 3] = [1, 2, 5];

pub(crate) const NUM_CHAN: usize = 2;
pub(crate) const NUM_CYCLES: usize = NUM_CHAN;
pub(crate) const REPORT_LEN: usize = 12;

pub(crate) const RESET_TIMEOUT_MS: u32 = 250;
pub(crate) const COMMS_TIMEOUT_US: u32 = 100_000;
pub(crate) const RDY_SETTLE_US: u32 = 50;

pub(crate) const UHZ_PER_MS: u64 = 1_000_000_000;
pub(crate) const MAX_RATE_MS: u32 = 3000;
pub(crate) const MAX_RATE_HZ: u64 = 1000;

pub(crate) const IMAGE_LEN: usize = 2 * (NUM_CHAN * 5 + 10 + NUM_CYCLES + 1 + 2 * 3 * 5 + 2 * 13);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Grp {
  Ati,
  Sys,
  Pxs,
  Cap,
  Event0,
  Event1,
  Chan0,
  Chan1,
}

impl Grp {
  pub(crate) const fn key(self) -> Key {
    match self {
      Grp::Ati => Key::Ati,
      Grp::Sys => Key::Sys,
      Grp::Pxs => Key::Pxs,
      Grp::Cap => Key::Cap,
      Grp::Event0 | Grp::Event1 => Key::Event,
      Grp::Chan0 | Grp::Chan1 => Key::Chan,
    }
  }

  pub(crate) const fn event(ch: usize) -> Grp {
    if ch == 0 {
      Grp::Event0
    } else {
      Grp::Event1
    }
  }

  pub(crate) const fn chan(ch: usize) -> Grp {
    if ch == 0 {
      Grp::Chan0
    } else {
      Grp::Chan1
    }
  }
}

/// Register layout shared by groups of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Key {
  Ati,
  Sys,
  Pxs,
  Cap,
  Event,
  Chan,
}

/// SYS_SETUP interface modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Interface {
  Stream = 0,
  Event = 1,
  /// GPIOs drive outputs and I²C is unavailable.
  Standalone = 2,
}

impl Interface {
  pub(crate) const fn into_bits(self) -> u8 {
    self as _
  }
}

#[bitfield(u16)]
#[derive(PartialEq, Eq)]
pub(crate) struct SysStatus {
  #[bits(8)]
  __: u8,
  pub(crate) ati_active: bool,
  pub(crate) ati_error: bool,
  ___: bool,
  pub(crate) reset: bool,
  #[bits(4)]
  ____: u8,
}

#[bitfield(u16)]
#[derive(PartialEq, Eq)]
pub(crate) struct SysSetup {
  pub(crate) ack_reset: bool,
  __: bool,
  pub(crate) redo_ati: bool,
  ___: bool,
  #[bits(2)]
  pub(crate) power_mode: u8,
  #[bits(2)]
  pub(crate) intf_mode: u8,
  #[bits(8)]
  ____: u8,
}

pub(crate) static GROUPS: [GroupDescriptor<Grp>; 8] = [
  GroupDescriptor::packed(Grp::Ati, 0x20, NUM_CHAN as u8, 5),
  GroupDescriptor::packed(Grp::Sys, SYS_SETUP, 1, 10),
  GroupDescriptor::packed(Grp::Pxs, 0x8A, NUM_CYCLES as u8, 1),
  GroupDescriptor::packed(Grp::Cap, 0x8C, 1, 1),
  GroupDescriptor::packed(Grp::Event0, 0x90, PXS_EVENTS.len() as u8, 5),
  GroupDescriptor::packed(Grp::Event1, 0xB0, PXS_EVENTS.len() as u8, 5),
  GroupDescriptor::packed(Grp::Chan0, 0xA0, 1, 13),
  GroupDescriptor::packed(Grp::Chan1, 0xC0, 1, 13),
];

/// Event nodes beneath each channel, in PXS flag bit order.
pub(crate) static PXS_EVENTS: [&str; 3] = ["event-halt", "event-prox", "event-touch"];

/// Capacitance setup nodes, one byte of CAP_SETUP each.
pub(crate) static SENSE_MODES: [&str; 2] = ["sense-mode-proj", "sense-mode-self"];

pub(crate) static CHANNEL_NODES: [&str; NUM_CHAN] = ["channel-0", "channel-1"];
pub(crate) static ATI_NODES: [&str; NUM_CHAN] = ["ati-0", "ati-1"];
pub(crate) static CYCLE_NODES: [&str; NUM_CYCLES] = ["cycle-0", "cycle-1"];

pub(crate) static PROPS: [Property<Key>; 45] = [
  Property::new("azoteq,ati-frac-mult-coarse", Key::Ati, 0, 0, 4).label("ATI coarse fractional multiplier"),
  Property::new("azoteq,ati-frac-div-coarse", Key::Ati, 1, 0, 5).label("ATI coarse fractional divider"),
  Property::new("azoteq,ati-frac-div-fine", Key::Ati, 2, 0, 5).label("ATI fine fractional divider"),
  Property::new("azoteq,ati-comp-div", Key::Ati, 3, 0, 5).label("ATI compensation divider"),
  Property::new("azoteq,ati-comp-select", Key::Ati, 4, 0, 10).label("ATI compensation selection"),
  Property::new("azoteq,rate-np-segment", Key::Sys, 0, 8, 2).label("normal-power mode segment rate"),
  Property::new("azoteq,power-mode", Key::Sys, 0, 4, 2).label("power mode"),
  Property::new("azoteq,timeout-comms-ms", Key::Sys, 1, 0, 8).label("communication timeout"),
  Property::new("azoteq,timeout-ati-ms", Key::Sys, 2, 0, 16).label("ATI error timeout"),
  Property::new("azoteq,rate-ati-ms", Key::Sys, 3, 0, 16).label("ATI report rate"),
  Property::new("azoteq,timeout-np-ms", Key::Sys, 4, 0, 16).label("normal-power mode timeout"),
  Property::new("azoteq,rate-np-ms", Key::Sys, 5, 0, 16).max(MAX_RATE_MS).label("normal-power mode report rate"),
  Property::new("azoteq,timeout-lp-ms", Key::Sys, 6, 0, 16).label("low-power mode timeout"),
  Property::new("azoteq,rate-lp-ms", Key::Sys, 7, 0, 16).max(MAX_RATE_MS).label("low-power mode report rate"),
  Property::new("azoteq,timeout-ulp-ms", Key::Sys, 8, 0, 16).label("ultra-low-power mode timeout"),
  Property::new("azoteq,rate-ulp-ms", Key::Sys, 9, 0, 16).max(MAX_RATE_MS).label("ultra-low-power mode report rate"),
  Property::new("azoteq,channel-select", Key::Pxs, 0, 8, 8).label("channel selection"),
  Property::new("azoteq,sense-mode", Key::Pxs, 0, 0, 2).label("sensing mode"),
  Property::new("azoteq,proj-bias", Key::Cap, 0, 2, 2).label("projected bias current"),
  Property::new("azoteq,timeout-active-ms", Key::Event, 0, 0, 16).label("active state timeout"),
  Property::new("azoteq,hyst", Key::Event, 1, 0, 16).label("hysteresis"),
  Property::new("azoteq,thresh", Key::Event, 2, 0, 16).label("threshold"),
  Property::new("azoteq,debounce-exit", Key::Event, 3, 8, 8).label("debounce exit factor"),
  Property::new("azoteq,debounce-enter", Key::Event, 3, 0, 8).label("debounce entrance factor"),
  Property::new("azoteq,counts-beta-lp", Key::Chan, 0, 12, 4).label("low-power mode counts beta"),
  Property::new("azoteq,counts-beta-np", Key::Chan, 0, 8, 4).label("normal-power mode counts beta"),
  Property::flag("azoteq,direction-enable", Key::Chan, 0, 6),
  Property::flag("azoteq,invert-enable", Key::Chan, 0, 1),
  Property::flag("azoteq,dual-direction", Key::Chan, 0, 0),
  Property::new("azoteq,lta-fast-beta-lp", Key::Chan, 1, 12, 4).label("low-power mode long-term average fast beta"),
  Property::new("azoteq,lta-fast-beta-np", Key::Chan, 1, 8, 4).label("normal-power mode long-term average fast beta"),
  Property::new("azoteq,lta-beta-lp", Key::Chan, 1, 4, 4).label("low-power mode long-term average beta"),
  Property::new("azoteq,lta-beta-np", Key::Chan, 1, 0, 4).label("normal-power mode long-term average beta"),
  Property::new("azoteq,conv-period", Key::Chan, 2, 8, 8).label("conversion period"),
  Property::new("azoteq,conv-frac", Key::Chan, 2, 0, 8).label("conversion frequency fractional divider"),
  Property::new("azoteq,conv-scale", Key::Chan, 3, 0, 8).max(3).label("conversion frequency scaling factor"),
  Property::new("azoteq,ati-base", Key::Chan, 5, 0, 16).max(500).label("ATI base"),
  Property::new("azoteq,ati-target", Key::Chan, 6, 0, 16).max(4000).label("ATI target"),
  Property::new("azoteq,ati-band", Key::Chan, 7, 0, 16).max(1500).label("ATI band"),
  Property::new("azoteq,ati-mode", Key::Chan, 8, 0, 3).max(5).label("ATI mode"),
  Property::new("azoteq,ati-frac-div-coarse", Key::Chan, 9, 8, 5).label("ATI coarse fractional divider"),
  Property::new("azoteq,ati-frac-div-fine", Key::Chan, 9, 0, 5).label("ATI fine fractional divider"),
  Property::new("azoteq,ati-comp-select", Key::Chan, 10, 0, 10).label("ATI compensation selection"),
  Property::new("azoteq,thresh", Key::Chan, 11, 0, 16).label("threshold"),
  Property::new("azoteq,fast-filt-band", Key::Chan, 12, 0, 8).label("fast filter band"),
];
