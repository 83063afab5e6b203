use super::regs::*;
use super::{Events, Iqs323};
use crate::config::{apply, pin_mask, read_max, ConfigError, PropertySource};

const SCOPES: [Grp; 9] = [Grp::Snsr, Grp::Chan, Grp::Sldr, Grp::Gest, Grp::Filt, Grp::Sys, Grp::Gen, Grp::Gpio, Grp::Rel];

impl<I, P, D> Iqs323<I, P, D> {
  /// Fold `config` into the register image.
  pub(crate) fn parse<S>(&mut self, config: &S) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    self.events = Events::default();

    self.image.set_word(Grp::Gen, 0, 0, 0);
    self.image.modify(Grp::Gen, 0, 3, |w| (w & !EVENT_MASK_ALL) | EVENT_MASK_ATI);

    for ch in 0..NUM_CHAN {
      self.image.modify(Grp::Snsr, ch, 0, |w| w & !SNSR_SETUP_0_CHAN_EN);
    }
    self.image.modify(Grp::Sldr, 0, 0, |w| w & !SLDR_SETUP_0_CHAN_CNT);

    for grp in SCOPES {
      for row in 0..self.desc.rows(grp) {
        let node = match grp {
          Grp::Snsr | Grp::Chan => config.child(CHANNEL_NODES[row]),
          Grp::Sldr => config.child("slider"),
          Grp::Gpio => config.child("gpio"),
          Grp::Rel => config.child("release"),
          _ => Some(config),
        };

        if let Some(node) = node {
          self.parse_props(node, grp, row, Key::None)?;

          match grp {
            Grp::Snsr => self.parse_snsr(node, row)?,
            Grp::Chan => self.parse_chan(node, row)?,
            Grp::Sldr => self.parse_sldr(node)?,
            Grp::Gpio => self.parse_gpio(node),
            _ => {}
          }
        }
      }
    }

    self.restrict_ulp();

    Ok(())
  }

  fn parse_props<S>(&mut self, node: &S, grp: Grp, row: usize, key: Key) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    // Release settings live in the general setup row.
    let target = match grp {
      Grp::Gpio => return Ok(()),
      Grp::Rel => self.image.row_mut(Grp::Gen, 0),
      _ => self.image.row_mut(grp, row),
    };

    apply(&PROPS, target, (grp, key), node)
  }

  fn parse_event<S>(&mut self, node: &S, grp: Grp, row: usize, key: Key, mask: u16) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    self.parse_props(node, grp, row, key)?;
    self.parse_props(node, Grp::Gen, 0, key)?;

    if node.has("azoteq,gpio-select") {
      self.image.modify(Grp::Gen, 0, 0, |w| w | mask);
    }

    Ok(())
  }

  fn parse_snsr<S>(&mut self, node: &S, ch: usize) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    self.image.modify(Grp::Snsr, ch, 0, |w| w | SNSR_SETUP_0_CHAN_EN);
    self.image.modify(Grp::Snsr, ch, 5, |w| w & !SNSR_SETUP_5_WAVE_SEL);

    for pin in PINS.iter() {
      let Some(pins) = pin_mask(node, pin.name, pin.count, pin.count as u32)? else {
        continue;
      };

      let field = (((1u32 << pin.width) - 1) << pin.shift) as u16;
      let bits = (pins << pin.shift) as u16;
      self.image.modify(Grp::Snsr, ch, pin.offset, |w| (w & !field) | bits);
    }

    // Without explicit patterns both follow from the sensing mode.
    if !node.has("azoteq,wave-pattern-0") {
      let mode = self.image.word(Grp::Snsr, ch, 2) & SNSR_SETUP_2_SENSE_MODE;

      let Some(i) = SENSE_MODES.iter().position(|&m| m == mode) else {
        error!("invalid {} sensing mode: {}", node.name(), mode);
        return Err(ConfigError::Invalid { name: "azoteq,sense-mode" });
      };

      self.image.modify(Grp::Snsr, ch, 4, |w| (w & !SNSR_SETUP_4_WAVE_PAT_0) | WAVE_PATTERNS[i]);
    }

    if !node.has("azoteq,wave-pattern-1") {
      self.image.modify(Grp::Snsr, ch, 4, |w| w & !SNSR_SETUP_4_WAVE_PAT_1);
    }

    Ok(())
  }

  fn parse_chan<S>(&mut self, node: &S, ch: usize) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    let shift = ch * 2 + 8;

    if let Some(sel) = read_max(node, "azoteq,ref-select", NUM_CHAN as u32 - 1)? {
      // This channel follows the selected one...
      self.image.modify(Grp::Chan, ch, 0, |w| {
        (w & !(CHAN_SETUP_0_REF_MODE | CHAN_SETUP_0_REF_SEL)) | REF_MODE_FOLLOW | (sel as u16) << 4
      });

      if let Some(weight) = read_max(node, "azoteq,ref-weight", u16::MAX as u32)? {
        self.image.set_word(Grp::Chan, ch, 3, weight as u16);
      }

      // ...which in turn serves as its reference.
      self.image.modify(Grp::Chan, sel as usize, 0, |w| {
        (w & !CHAN_SETUP_0_REF_MODE) | REF_MODE_REF | (EVENT_MASK_TOUCH | EVENT_MASK_PROX) << shift
      });
    }

    let release = self.desc.release && node.has("azoteq,release-enable");
    self.image.modify(Grp::Snsr, ch, 0, |w| if release { w | SNSR_SETUP_0_MOV_EN } else { w & !SNSR_SETUP_0_MOV_EN });

    for ev in KP_EVENTS.iter() {
      if ev.key == Key::Mov && !self.desc.is_mov() {
        continue;
      }

      let Some(child) = node.child(ev.name) else {
        continue;
      };

      if ev.key == Key::Mov {
        self.image.modify(Grp::Snsr, ch, 0, |w| w | SNSR_SETUP_0_MOV_EN);
      }

      let mask = ev.mask << shift;
      if child.has("azoteq,wear-select") {
        self.events.wear |= mask;
      }

      self.parse_event(child, Grp::Chan, ch, ev.key, mask)?;

      self.events.keys |= mask;
      self.image.modify(Grp::Gen, 0, 3, |w| w | ev.enable);
    }

    let disable = node.has("azoteq,timeout-press-disable");
    self.image.modify(Grp::Sys, 0, 0, |w| if disable { w | 1 << (ch + 8) } else { w & !(1 << (ch + 8)) });

    Ok(())
  }

  fn parse_sldr<S>(&mut self, node: &S) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    const NAME: &str = "azoteq,channel-select";

    let mut buf = [0u32; NUM_CHAN];
    let sel = match node.read_u32_array(NAME, &mut buf) {
      Ok(Some(sel)) => sel,
      _ => {
        error!("invalid {} channels", node.name());
        return Err(ConfigError::Invalid { name: NAME });
      }
    };

    self.image.modify(Grp::Sldr, 0, 0, |w| w | sel.len() as u16);
    self.image.modify(Grp::Sldr, 0, 4, |w| w & !((1 << NUM_CHAN) - 1));

    for i in 0..NUM_CHAN {
      self.image.set_word(Grp::Sldr, 0, 6 + i, 0);

      let Some(&chan) = sel.get(i) else {
        continue;
      };
      if chan == u8::MAX as u32 {
        continue;
      }
      if chan >= NUM_CHAN as u32 {
        error!("invalid {} channel: {}", node.name(), chan);
        return Err(ConfigError::OutOfRange { name: NAME, value: chan });
      }

      // Participating channels and their relative placement.
      self.image.modify(Grp::Sldr, 0, 4, |w| w | 1 << chan);
      self.image.set_word(Grp::Sldr, 0, 6 + i, self.desc.delta_links[chan as usize]);
    }

    self.image.set_word(Grp::Sldr, 0, 5, self.desc.touch_link);

    if self.image.word(Grp::Sldr, 0, 3) == 0 {
      error!("undefined {} size", node.name());
      return Err(ConfigError::Invalid { name: "azoteq,slider-size" });
    }

    // Granular coordinates need streaming while touched, which in turn
    // needs touch interrupts.
    if node.has("linux,axis") {
      self.events.position = true;
      self.image.modify(Grp::Gen, 0, 3, |w| w | EVENT_MASK_TOUCH);
    }

    let enables = SL_EVENTS.iter().fold(0, |acc, ev| acc | ev.enable);
    self.image.modify(Grp::Gest, 0, 0, |w| w & !enables);

    for (i, ev) in SL_EVENTS.iter().enumerate() {
      let Some(child) = node.child(ev.name) else {
        continue;
      };

      self.parse_event(child, Grp::Gest, 0, ev.key, ev.mask & !SLDR_STATUS_BUSY)?;

      self.events.slider |= 1 << i;
      self.image.modify(Grp::Gest, 0, 0, |w| w | ev.enable);

      // Press/release follows the coordinate and swipes and holds end on
      // release, all of which rely on touch interrupts.
      let mut unmask = 0;
      if ev.enable != 0 {
        unmask |= EVENT_MASK_SLDR;
      }
      if ev.enable == 0 || ev.mask & SLDR_STATUS_BUSY != 0 {
        unmask |= EVENT_MASK_TOUCH;
      }
      self.image.modify(Grp::Gen, 0, 3, |w| w | unmask);
    }

    Ok(())
  }

  fn parse_gpio<S>(&mut self, node: &S)
  where
    S: PropertySource + ?Sized,
  {
    if node.has("output-high") {
      self.image.set_word(Grp::Gen, 0, 0, GEN_SETUP_0_GPIO_SET);
    } else if node.has("azoteq,invert-enable") {
      self.image.modify(Grp::Gen, 0, 0, |w| w | GEN_SETUP_0_GPIO_INV);
    }
  }

  /// ULP is off limits while movement detection or press timeouts are in
  /// use; fall back to LP.
  fn restrict_ulp(&mut self) {
    let mut setup = SysSetup::from_bits(self.image.word(Grp::Sys, 0, 0));

    let fallback = match PowerMode::from_bits(setup.power_mode()) {
      Some(PowerMode::UltraLow) => PowerMode::Low,
      Some(PowerMode::Auto) => PowerMode::AutoNoUltraLow,
      _ => return,
    };

    let moving = self.desc.is_mov()
      && (0..NUM_CHAN).any(|ch| self.image.word(Grp::Snsr, ch, 0) & SNSR_SETUP_0_MOV_EN != 0);

    if moving || self.image.word(Grp::Gen, 0, 2) != 0 {
      warn!("ULP mode is restricted");
      setup.set_power_mode(fallback.into_bits());
      self.image.set_word(Grp::Sys, 0, 0, setup.into_bits());
    }
  }
}
