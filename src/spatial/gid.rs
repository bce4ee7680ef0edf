use std::ops::{BitOr, BitOrAssign};

pub const FLIP_H: u32 = 0x8000_0000; // bit 31
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
pub const FLIP_ALL: u32 = FLIP_H | FLIP_V | FLIP_D;
pub const GID_MASK: u32 = !FLIP_ALL; // lower 29 bits

/// Flip/rotation bits stored in the top of a packed tile identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileFlags(u32);

impl TileFlags {
    pub const NONE: TileFlags = TileFlags(0);
    pub const HORIZONTAL: TileFlags = TileFlags(FLIP_H);
    pub const VERTICAL: TileFlags = TileFlags(FLIP_V);
    pub const DIAGONAL: TileFlags = TileFlags(FLIP_D);

    /// Keeps only the flag bits of `bits`.
    #[inline]
    pub fn from_bits_truncate(bits: u32) -> Self {
        TileFlags(bits & FLIP_ALL)
    }

    #[inline]
    pub fn from_parts(horizontal: bool, vertical: bool, diagonal: bool) -> Self {
        let mut flags = TileFlags::NONE;
        if horizontal {
            flags |= TileFlags::HORIZONTAL;
        }
        if vertical {
            flags |= TileFlags::VERTICAL;
        }
        if diagonal {
            flags |= TileFlags::DIAGONAL;
        }
        flags
    }

    #[inline] pub fn bits(self) -> u32 { self.0 }
    #[inline] pub fn is_empty(self) -> bool { self.0 == 0 }
    #[inline] pub fn contains(self, other: TileFlags) -> bool { self.0 & other.0 == other.0 }
    #[inline] pub fn horizontal(self) -> bool { self.0 & FLIP_H != 0 }
    #[inline] pub fn vertical(self) -> bool { self.0 & FLIP_V != 0 }
    #[inline] pub fn diagonal(self) -> bool { self.0 & FLIP_D != 0 }
}

impl BitOr for TileFlags {
    type Output = TileFlags;

    fn bitor(self, rhs: TileFlags) -> TileFlags {
        TileFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for TileFlags {
    fn bitor_assign(&mut self, rhs: TileFlags) {
        self.0 |= rhs.0;
    }
}

/// A packed cell identifier: gid in the low bits, flip flags in the high bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileId(pub u32);

impl TileId {
    pub const EMPTY: TileId = TileId(0);

    #[inline]
    pub fn encode(gid: u32, flags: TileFlags) -> Self {
        TileId((gid & GID_MASK) | flags.bits())
    }

    /// Splits into `(gid, horizontal, vertical, diagonal)`.
    #[inline]
    pub fn decode(self) -> (u32, bool, bool, bool) {
        (self.clean(), self.flip_h(), self.flip_v(), self.flip_d())
    }

    #[inline] pub fn raw(self) -> u32 { self.0 }
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    #[inline] pub fn flags(self) -> TileFlags { TileFlags::from_bits_truncate(self.0) }
    #[inline] pub fn is_empty(self) -> bool { self.clean() == 0 }
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }
}
