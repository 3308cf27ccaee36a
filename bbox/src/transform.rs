use super::Rect;
use crate::common::*;

/// Per-axis scaling followed by translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transform<T> {
    pub sy: T,
    pub sx: T,
    pub ty: T,
    pub tx: T,
}

impl<T> Transform<T>
where
    T: Copy + Num + PartialOrd,
{
    pub fn from_translation(ty: T, tx: T) -> Self {
        Self {
            sy: T::one(),
            sx: T::one(),
            ty,
            tx,
        }
    }

    /// The transform that moves coordinates into the local frame of `rect`.
    pub fn to_local<R>(rect: &R) -> Self
    where
        R: Rect<Type = T>,
    {
        let zero = T::zero();
        Self::from_translation(zero - rect.t(), zero - rect.l())
    }

    /// Apply the transform on a point given in `[x, y]` order.
    pub fn apply_xy(&self, xy: [T; 2]) -> [T; 2] {
        let [x, y] = xy;
        [x * self.sx + self.tx, y * self.sy + self.ty]
    }
}
