use super::regs::*;
use super::{Channel, Iqs7219, Scan};
use crate::config::{apply, pin_mask, read_max, ConfigError, PropertySource};

impl<I, P, D, R> Iqs7219<I, P, D, R> {
  /// Fold `config` into the register image.
  pub(crate) fn parse<S>(&mut self, config: &S) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    self.intf = if config.has("azoteq,streaming-comms") { Interface::Stream } else { Interface::Event };
    self.channels = [Channel::default(); NUM_CHAN];

    // The interface mode is only entered once ATI completes.
    self.image.modify(Grp::Sys, 0, 0, |w| SysSetup::from_bits(w).with_intf_mode(0).into_bits());

    for (cycle, name) in CYCLE_NODES.iter().enumerate() {
      if let Some(node) = config.child(name) {
        apply(&PROPS, self.image.row_mut(Grp::Pxs, cycle), Grp::Pxs.key(), node)?;
      }
    }

    for (i, name) in SENSE_MODES.iter().enumerate() {
      if let Some(node) = config.child(name) {
        self.parse_cap(node, i * 8)?;
      }
    }

    apply(&PROPS, self.image.row_mut(Grp::Cap, 0), Grp::Cap.key(), config)?;

    for ch in 0..NUM_CHAN {
      if let Some(node) = config.child(ATI_NODES[ch]) {
        apply(&PROPS, self.image.row_mut(Grp::Ati, ch), Grp::Ati.key(), node)?;
      }

      if let Some(node) = config.child(CHANNEL_NODES[ch]) {
        self.parse_chan(node, ch)?;
      }
    }

    apply(&PROPS, self.image.row_mut(Grp::Sys, 0), Grp::Sys.key(), config)
  }

  /// One byte of CAP_SETUP per sensing mode.
  fn parse_cap<S>(&mut self, node: &S, shift: usize) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    for (name, bit) in [("azoteq,vref-half", CAP_SETUP_VREF_HALF), ("azoteq,samp-cap-double", CAP_SETUP_SAMP_DOUBLE)] {
      let bit = bit << shift;
      let set = node.has(name);
      self.image.modify(Grp::Cap, 0, 0, |w| if set { w | bit } else { w & !bit });
    }

    if let Some(counts) = read_max(node, "azoteq,max-counts", CAP_SETUP_COUNTS as u32)? {
      self.image.modify(Grp::Cap, 0, 0, |w| (w & !(CAP_SETUP_COUNTS << shift)) | (counts as u16) << shift);
    }

    Ok(())
  }

  fn parse_chan<S>(&mut self, node: &S, ch: usize) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    let grp = Grp::chan(ch);
    let events = Grp::event(ch);

    apply(&PROPS, self.image.row_mut(grp, 0), grp.key(), node)?;

    if let Some(pins) = pin_mask(node, "azoteq,rx-enable", 4, 4)? {
      self.image.modify(grp, 0, 3, |w| (w & !0x0F00) | (pins as u16) << 8);
    }

    if let Some(pins) = pin_mask(node, "azoteq,tx-enable", 9, 9)? {
      self.image.modify(grp, 0, 4, |w| (w & !0x01FF) | pins as u16);
    }

    for (i, name) in PXS_EVENTS.iter().enumerate() {
      self.image.modify(events, i, 4, |w| w & !0x00FF);

      let Some(event) = node.child(name) else {
        continue;
      };

      apply(&PROPS, self.image.row_mut(events, i), events.key(), event)?;

      if !event.has("azoteq,trigger-disable") {
        self.channels[ch].events |= 1 << i;
      }

      let track = event.has("azoteq,lta-track");
      self.image.modify(grp, 0, 0, |w| if track { w | 1 << (i + 3) } else { w & !(1 << (i + 3)) });

      let Some(gpio) = read_max(event, "azoteq,gpio-select", u32::MAX)? else {
        continue;
      };

      if !GPIOS.contains(&gpio) {
        error!("invalid {} GPIO selection: {}", event.name(), gpio);
        return Err(ConfigError::OutOfRange { name: "azoteq,gpio-select", value: gpio });
      }

      let mut bits = 1 << gpio;
      if event.has("drive-open-drain") {
        bits |= GPIO_OPEN_DRAIN;
      } else if event.has("azoteq,invert-enable") {
        bits |= GPIO_ACTIVE_HIGH;
      }
      self.image.modify(events, i, 4, |w| w | bits);

      // Every selectable GPIO shares a pin with the bus or RDY.
      self.intf = Interface::Standalone;
    }

    if let Some(scan) = read_max(node, "azoteq,scan-mux", Scan::ALL.len() as u32 - 1)? {
      self.channels[ch].scan = Scan::ALL[scan as usize];
    }

    Ok(())
  }
}
