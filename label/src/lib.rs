//! Labeled bounding boxes and category vocabularies.

mod label_set;
pub use label_set::*;

use bbox::{Rect, TLBR};
use num_traits::{Num, NumCast};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label<R, C>
where
    R: Rect,
{
    pub rect: R,
    pub class: C,
}

impl<T> Label<TLBR<T>, usize>
where
    T: Copy + Num + PartialOrd + NumCast,
{
    /// Flatten into `[xmin, ymin, xmax, ymax, class]`.
    ///
    /// Returns `None` if the class index is not representable in `T`.
    pub fn to_xyxyc(&self) -> Option<[T; 5]> {
        let Self { ref rect, class } = *self;
        let class = T::from(class)?;
        Some([rect.l(), rect.t(), rect.r(), rect.b(), class])
    }
}
