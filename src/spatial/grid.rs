use crate::error::{LayerError, LayerResult};
use crate::spatial::gid::{TileFlags, TileId};

/// Dense row-major cell storage: index = x + y * width.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u32,
    height: u32,
    cells: Option<Vec<u32>>,
}

impl TileGrid {
    /// Wraps `cells`, or `None` when it does not hold exactly
    /// `width * height` words. Flag bits on an empty gid are dropped.
    pub fn new(width: u32, height: u32, mut cells: Vec<u32>) -> Option<Self> {
        if cells.len() != width as usize * height as usize {
            return None;
        }
        for cell in cells.iter_mut().filter(|c| TileId(**c).is_empty()) {
            *cell = 0;
        }
        Some(TileGrid {
            width,
            height,
            cells: Some(cells),
        })
    }

    pub fn empty(width: u32, height: u32) -> Self {
        TileGrid {
            width,
            height,
            cells: Some(vec![0; width as usize * height as usize]),
        }
    }

    #[inline] pub fn width(&self) -> u32 { self.width }
    #[inline] pub fn height(&self) -> u32 { self.height }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.cells.is_none()
    }

    /// Linear z-key of an in-bounds coordinate.
    pub fn z_of(&self, x: u32, y: u32) -> LayerResult<usize> {
        if x >= self.width || y >= self.height {
            return Err(LayerError::OutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(x as usize + y as usize * self.width as usize)
    }

    /// Packed identifier at `(x, y)`.
    pub fn raw(&self, x: u32, y: u32) -> LayerResult<TileId> {
        let cells = self.cells()?;
        let z = self.z_of(x, y)?;
        Ok(TileId(cells[z]))
    }

    /// `(gid, flags)` at `(x, y)`.
    pub fn get(&self, x: u32, y: u32) -> LayerResult<(u32, TileFlags)> {
        let id = self.raw(x, y)?;
        Ok((id.clean(), id.flags()))
    }

    /// Overwrites the packed word. The atlas index is the caller's business.
    pub fn set(&mut self, x: u32, y: u32, id: TileId) -> LayerResult<()> {
        if self.is_released() {
            return Err(LayerError::ReleasedState);
        }
        let z = self.z_of(x, y)?;
        let cells = self.cells.as_mut().ok_or(LayerError::ReleasedState)?;
        cells[z] = id.raw();
        Ok(())
    }

    pub fn occupied_count(&self) -> LayerResult<usize> {
        Ok(self.cells()?.iter().filter(|&&c| !TileId(c).is_empty()).count())
    }

    /// Occupied cells in raster order as `(x, y, id)`.
    pub fn iter_occupied(&self) -> LayerResult<impl Iterator<Item = (u32, u32, TileId)> + '_> {
        let width = self.width as usize;
        let cells = self.cells()?;
        Ok(cells.iter().enumerate().filter_map(move |(z, &c)| {
            let id = TileId(c);
            (!id.is_empty()).then(|| ((z % width) as u32, (z / width) as u32, id))
        }))
    }

    pub fn cells(&self) -> LayerResult<&[u32]> {
        self.cells.as_deref().ok_or(LayerError::ReleasedState)
    }

    pub fn release(&mut self) {
        self.cells = None;
    }
}
