use crate::{common::*, TLBR};

/// Height and width of an image or region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HW<T> {
    h: T,
    w: T,
}

impl<T> HW<T>
where
    T: Num + PartialOrd + Copy,
{
    pub fn try_from_hw(hw: [T; 2]) -> Result<Self> {
        let [h, w] = hw;
        let zero = T::zero();
        ensure!(
            h > zero && w > zero,
            "height and width parameters must be positive"
        );
        Ok(Self { h, w })
    }

    pub fn from_hw(hw: [T; 2]) -> Self {
        Self::try_from_hw(hw).unwrap()
    }

    pub fn area(&self) -> T {
        self.w * self.h
    }

    pub fn h(&self) -> T {
        self.h
    }

    pub fn w(&self) -> T {
        self.w
    }

    /// The rectangle covering the whole region, anchored at the origin.
    pub fn to_rect(&self) -> TLBR<T> {
        let zero = T::zero();
        TLBR {
            t: zero,
            l: zero,
            b: self.h,
            r: self.w,
        }
    }
}
