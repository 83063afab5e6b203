use super::regs::*;
use super::Iqs9150;
use crate::config::{apply_indexed, read_array, read_max, ConfigError, PropertySource};

impl<I, P, D, R> Iqs9150<I, P, D, R> {
  /// Fold `config` into the register image.
  pub(crate) fn parse<S>(&mut self, config: &S) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    self.events = 0;
    self.eng = None;

    for scope in Scope::ALL {
      let node = match scope.node() {
        Some(name) => config.child(name),
        None => Some(config),
      };

      if let Some(node) = node {
        self.parse_scope(node, scope)?;
      }
    }

    // 0xFFFF marks an idle contact slot, so the largest coordinate is one less.
    for (name, reg) in [("touchscreen-size-x", X_RES), ("touchscreen-size-y", Y_RES)] {
      match read_max(config, name, u32::from(u16::MAX))? {
        Some(0) => {
          error!("invalid trackpad size: 0");
          return Err(ConfigError::OutOfRange { name, value: 0 });
        }
        Some(size) => self.set_word(reg, (size - 1) as u16),
        None => {}
      }
    }

    Ok(())
  }

  fn apply<S>(&mut self, node: &S, scope: Scope, key: Key, index: usize) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    apply_indexed(&PROPS, self.image.row_mut(Grp::Settings, 0), (scope, key), node, index)
  }

  fn parse_scope<S>(&mut self, node: &S, scope: Scope) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    self.apply(node, scope, Key::None, 0)?;

    match scope {
      Scope::Trackpad => self.parse_trackpad(node)?,
      Scope::Alp => self.parse_alp(node)?,
      Scope::System => self.parse_engineering(node)?,
      _ => {}
    }

    let mut setup = self.word(CONFIG);

    for (i, desc) in EVENTS.iter().enumerate().filter(|(_, d)| d.scope == scope) {
      let event = match desc.name {
        Some(name) => node.child(name),
        None => Some(node),
      };

      let Some(event) = event else {
        continue;
      };

      self.parse_event(event, desc)?;
      self.events |= 1 << i;

      if let Some(reg) = scope.enable_reg() {
        self.set_word(reg, self.word(reg) | desc.enable);
      }
      setup |= scope.event_mask();
    }

    self.set_word(CONFIG, setup);

    Ok(())
  }

  fn parse_event<S>(&mut self, node: &S, desc: &EventDesc) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    self.apply(node, desc.scope, desc.key, 0)?;

    let Some(reg) = desc.key.angle_reg() else {
      return Ok(());
    };

    if let Some(angle) = read_max(node, "azoteq,gesture-angle", GESTURE_ANGLE.len() as u32 - 1)? {
      self.set_reg(reg, GESTURE_ANGLE[angle as usize]);
    }

    Ok(())
  }

  /// RX/TX channel map, per-sensor ATI words and the channel arrays. All of
  /// it is skipped unless `azoteq,rx-enable` is given.
  fn parse_trackpad<S>(&mut self, node: &S) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    let desc = self.desc;

    let mut rx_buf = [0u32; NUM_RX];
    let Some(rx) = read_array(node, "azoteq,rx-enable", &mut rx_buf[..desc.num_rx])? else {
      return Ok(());
    };

    for (i, &pin) in rx.iter().enumerate() {
      if pin as usize >= desc.num_rx {
        error!("invalid {} RX pin: {}", node.name(), pin);
        return Err(ConfigError::OutOfRange { name: "azoteq,rx-enable", value: pin });
      }
      self.set_reg(RX_TX_MAP + i as u16, pin as u8);
    }

    let mut tx_buf = [0u32; NUM_TX];
    let Some(tx) = read_array(node, "azoteq,tx-enable", &mut tx_buf[..desc.num_tx])? else {
      error!("missing {} TX pins", node.name());
      return Err(ConfigError::Invalid { name: "azoteq,tx-enable" });
    };

    for (i, &pin) in tx.iter().enumerate() {
      tx_pin(node, desc, pin)?;

      if rx.contains(&pin) {
        error!("conflicting {} TX pin: {}", node.name(), pin);
        return Err(ConfigError::Invalid { name: "azoteq,tx-enable" });
      }
      self.set_reg(RX_TX_MAP + (rx.len() + i) as u16, pin as u8);
    }

    self.set_reg(TOTAL_RX, rx.len() as u8);
    self.set_reg(TOTAL_TX, tx.len() as u8);

    self.apply(node, Scope::Trackpad, Key::Span, 0)?;

    for array in ARRAYS.iter() {
      self.parse_array(node, array, rx.len())?;
    }

    Ok(())
  }

  fn parse_array<S>(&mut self, node: &S, array: &ArrayDesc, total_rx: usize) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    let mut buf = [0u32; NUM_CHANNELS];
    let Some(vals) = read_array(node, array.name, &mut buf)? else {
      return Ok(());
    };

    let invalid = ConfigError::Invalid { name: array.name };
    let start = usize::from(array.addr - BUF_START);
    let region = self.image.row_mut(Grp::Settings, 0).get_mut(start..start + array.len).ok_or(invalid)?;
    region.fill(0);

    for (i, &val) in vals.iter().enumerate() {
      let out_of_range = ConfigError::OutOfRange { name: array.name, value: val };
      if val > array.max {
        error!("invalid {} {}: {}", node.name(), array.name, val);
        return Err(out_of_range);
      }

      if !array.bitmap {
        *region.get_mut(i).ok_or(invalid)? = val as u8;
        continue;
      }

      if total_rx == 0 {
        error!("{} {} needs RX pins", node.name(), array.name);
        return Err(invalid);
      }

      // One 32-bit row of RX bits per TX.
      let (row, col) = (val as usize / total_rx, val as usize % total_rx);
      let Some(b) = region.get_mut(row * 4 + col / 8) else {
        error!("invalid {} {}: {}", node.name(), array.name, val);
        return Err(out_of_range);
      };
      *b |= 1 << (col % 8);
    }

    Ok(())
  }

  fn parse_alp<S>(&mut self, node: &S) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    let desc = self.desc;

    let mut buf = [0u32; NUM_RX];
    if let Some(pins) = read_array(node, "azoteq,rx-enable", &mut buf[..desc.num_rx])? {
      // The last two RX bits share a byte with ALP_SETUP.
      self.modify_reg(ALP_SETUP, |b| b & !0x03);
      for addr in ALP_RX_ENABLE..ALP_SETUP {
        self.set_reg(addr, 0);
      }

      for &pin in pins {
        if pin as usize >= desc.num_rx {
          error!("invalid {} RX pin: {}", node.name(), pin);
          return Err(ConfigError::OutOfRange { name: "azoteq,rx-enable", value: pin });
        }
        self.modify_reg(ALP_RX_ENABLE + (pin / 8) as u16, |b| b | 1 << (pin % 8));
      }
    }

    let mut buf = [0u32; NUM_TX];
    if let Some(pins) = read_array(node, "azoteq,tx-enable", &mut buf[..desc.num_tx])? {
      for addr in ALP_TX_ENABLE..=ALP_TX_ENABLE + (MAX_TX / 8) as u16 {
        self.set_reg(addr, 0);
      }

      for &pin in pins {
        tx_pin(node, desc, pin)?;
        self.modify_reg(ALP_TX_ENABLE + (pin / 8) as u16, |b| b | 1 << (pin % 8));
      }
    }

    let mut index = 0;
    while let Some(sensor) = node.child_at(index) {
      let Some(offset) = read_max(sensor, "reg", u32::MAX)? else {
        error!("missing {} offset", sensor.name());
        return Err(ConfigError::Invalid { name: "reg" });
      };

      self.apply(sensor, Scope::Alp, Key::Span, offset as usize)?;
      index += 1;
    }

    self.modify_reg(ALP_SETUP, |b| b | ALP_SETUP_ENABLE);

    Ok(())
  }

  fn parse_engineering<S>(&mut self, node: &S) -> Result<(), ConfigError>
  where
    S: PropertySource + ?Sized,
  {
    const NAME: &str = "azoteq,eng-settings";

    let mut buf = [0u32; ENG_LEN];
    let Some(vals) = read_array(node, NAME, &mut buf)? else {
      return Ok(());
    };

    if vals.len() != ENG_LEN {
      error!("invalid number of {} engineering settings", node.name());
      return Err(ConfigError::Invalid { name: NAME });
    }

    let mut eng = [0u8; ENG_LEN];
    for (b, &val) in eng.iter_mut().zip(vals) {
      *b = u8::try_from(val).map_err(|_| ConfigError::OutOfRange { name: NAME, value: val })?;
    }

    // A leading sentinel would read back as "not ready".
    if u16::from_le_bytes([eng[0], eng[1]]) == crate::rw::COMMS_ERROR {
      error!("invalid {} engineering settings", node.name());
      return Err(ConfigError::Invalid { name: NAME });
    }

    self.eng = Some(eng);

    Ok(())
  }
}

fn tx_pin<S>(node: &S, desc: &Desc, pin: u32) -> Result<(), ConfigError>
where
  S: PropertySource + ?Sized,
{
  if pin > MAX_TX || pin == RDY_TX || pin < desc.min_tx {
    error!("invalid {} TX pin: {}", node.name(), pin);
    return Err(ConfigError::OutOfRange { name: "azoteq,tx-enable", value: pin });
  }

  Ok(())
}
