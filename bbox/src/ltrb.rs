use super::{CxCyWH, Rect};
use crate::common::*;

/// Bounding box in LTRB (corner) format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LTRB<T> {
    pub(crate) l: T,
    pub(crate) t: T,
    pub(crate) r: T,
    pub(crate) b: T,
}

impl<T> Rect for LTRB<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn l(&self) -> Self::Type {
        self.l
    }

    fn t(&self) -> Self::Type {
        self.t
    }

    fn r(&self) -> Self::Type {
        self.r
    }

    fn b(&self) -> Self::Type {
        self.b
    }

    fn cx(&self) -> Self::Type {
        let two = T::one() + T::one();
        self.l + self.w() / two
    }

    fn cy(&self) -> Self::Type {
        let two = T::one() + T::one();
        self.t + self.h() / two
    }

    fn w(&self) -> Self::Type {
        self.r - self.l
    }

    fn h(&self) -> Self::Type {
        self.b - self.t
    }

    fn try_from_ltrb(ltrb: [T; 4]) -> Result<Self> {
        let [l, t, r, b] = ltrb;
        ensure!(l <= r && t <= b, "box width and height must be non-negative");
        Ok(Self { l, t, r, b })
    }

    fn try_from_cxcywh(cxcywh: [T; 4]) -> Result<Self> {
        let [cx, cy, w, h] = cxcywh;
        let zero = T::zero();
        let two = T::one() + T::one();
        ensure!(
            w >= zero && h >= zero,
            "box width and height must be non-negative"
        );

        Ok(Self {
            l: cx - w / two,
            t: cy - h / two,
            r: cx + w / two,
            b: cy + h / two,
        })
    }
}

impl<T> From<&CxCyWH<T>> for LTRB<T>
where
    T: Copy + Num + PartialOrd,
{
    fn from(from: &CxCyWH<T>) -> Self {
        Self {
            l: from.l(),
            t: from.t(),
            r: from.r(),
            b: from.b(),
        }
    }
}

impl<T> From<CxCyWH<T>> for LTRB<T>
where
    T: Copy + Num + PartialOrd,
{
    fn from(from: CxCyWH<T>) -> Self {
        Self::from(&from)
    }
}
