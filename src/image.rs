use core::ops::Range;

use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::i2c::{I2c, SevenBitAddress};

use crate::rw::Transport;
use crate::Error;

/// One logical block of configuration registers.
///
/// A group with `stride == None` is contiguous on the device and moves in a
/// single burst. Otherwise each row lives at `base + row * stride` and is
/// transferred on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GroupDescriptor<G> {
  pub(crate) id: G,
  pub(crate) base: u16,
  pub(crate) rows: u8,
  pub(crate) cols: u16,
  pub(crate) stride: Option<u16>,
}

impl<G> GroupDescriptor<G> {
  pub(crate) const fn packed(id: G, base: u16, rows: u8, cols: u16) -> Self {
    Self { id, base, rows, cols, stride: None }
  }

  pub(crate) const fn strided(id: G, base: u16, rows: u8, cols: u16, stride: u16) -> Self {
    Self { id, base, rows, cols, stride: Some(stride) }
  }

  const fn len(&self) -> usize {
    self.rows as usize * self.cols as usize * 2
  }
}

/// Direction of a full image transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Access {
  Read,
  Write,
}

/// In-memory mirror of every configuration group of one device.
///
/// Words are kept little-endian, exactly as they travel on the bus, so a row
/// can be handed to the transport without conversion. `N` is the capacity in
/// bytes; the active group table decides how much of it is used.
pub(crate) struct RegisterImage<G: 'static, const N: usize> {
  groups: &'static [GroupDescriptor<G>],
  buf: [u8; N],
}

impl<G: Copy + PartialEq, const N: usize> RegisterImage<G, N> {
  pub(crate) const fn new(groups: &'static [GroupDescriptor<G>]) -> Self {
    Self { groups, buf: [0; N] }
  }

  fn group_range(&self, id: G) -> Option<(Range<usize>, &'static GroupDescriptor<G>)> {
    let mut start = 0;
    for g in self.groups {
      if g.id == id {
        let end = start + g.len();
        return (end <= N).then_some((start..end, g));
      }
      start += g.len();
    }
    None
  }

  fn row_range(&self, id: G, row: usize) -> Option<Range<usize>> {
    let (range, g) = self.group_range(id)?;
    if row >= g.rows as usize {
      return None;
    }
    let width = g.cols as usize * 2;
    let start = range.start + row * width;
    Some(start..start + width)
  }

  /// Raw little-endian bytes of one row.
  pub(crate) fn row(&self, id: G, row: usize) -> &[u8] {
    match self.row_range(id, row) {
      Some(r) => &self.buf[r],
      None => &[],
    }
  }

  pub(crate) fn row_mut(&mut self, id: G, row: usize) -> &mut [u8] {
    match self.row_range(id, row) {
      Some(r) => &mut self.buf[r],
      None => &mut [],
    }
  }

  pub(crate) fn word(&self, id: G, row: usize, col: usize) -> u16 {
    word(self.row(id, row), col)
  }

  pub(crate) fn set_word(&mut self, id: G, row: usize, col: usize, val: u16) {
    set_word(self.row_mut(id, row), col, val)
  }

  pub(crate) fn modify<F: FnOnce(u16) -> u16>(&mut self, id: G, row: usize, col: usize, f: F) {
    let row = self.row_mut(id, row);
    set_word(row, col, f(word(row, col)))
  }

  /// Move every group between the device and the image.
  pub(crate) async fn sync<I, E, P, D>(&mut self, bus: &mut Transport<I, P, D>, dir: Access) -> Result<(), Error<E>>
  where
    I: I2c<SevenBitAddress, Error = E>,
    P: InputPin + Wait,
    D: DelayNs,
  {
    for g in self.groups {
      let (range, _) = self.group_range(g.id).ok_or(Error::BufferOverflow)?;

      match g.stride {
        None => self.transfer(bus, dir, g.base, range).await?,
        Some(stride) => {
          let width = g.cols as usize * 2;
          for r in 0..g.rows as usize {
            let start = range.start + r * width;
            self.transfer(bus, dir, g.base + r as u16 * stride, start..start + width).await?;
          }
        }
      }
    }

    Ok(())
  }

  async fn transfer<I, E, P, D>(
    &mut self,
    bus: &mut Transport<I, P, D>,
    dir: Access,
    addr: u16,
    range: Range<usize>,
  ) -> Result<(), Error<E>>
  where
    I: I2c<SevenBitAddress, Error = E>,
    P: InputPin + Wait,
    D: DelayNs,
  {
    match dir {
      Access::Read => bus.read_burst(addr, &mut self.buf[range]).await,
      Access::Write => bus.write_burst(addr, &self.buf[range]).await,
    }
  }
}

/// Little-endian word `col` of a row, zero past the end.
pub(crate) fn word(row: &[u8], col: usize) -> u16 {
  match row.get(col * 2..col * 2 + 2) {
    Some(b) => u16::from_le_bytes([b[0], b[1]]),
    None => 0,
  }
}

pub(crate) fn set_word(row: &mut [u8], col: usize, val: u16) {
  if let Some(b) = row.get_mut(col * 2..col * 2 + 2) {
    b.copy_from_slice(&val.to_le_bytes());
  }
}
