use super::{CxCyWH, LTRB};
use crate::common::*;

/// The generic rectangle in x-first image coordinates.
pub trait Rect {
    type Type;

    fn l(&self) -> Self::Type;
    fn t(&self) -> Self::Type;
    fn r(&self) -> Self::Type;
    fn b(&self) -> Self::Type;
    fn cx(&self) -> Self::Type;
    fn cy(&self) -> Self::Type;
    fn w(&self) -> Self::Type;
    fn h(&self) -> Self::Type;

    fn try_from_ltrb(ltrb: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;

    fn try_from_cxcywh(cxcywh: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;
}

pub trait RectNum: Rect
where
    Self::Type: Num + PartialOrd,
{
    fn cxcywh(&self) -> [Self::Type; 4] {
        [self.cx(), self.cy(), self.w(), self.h()]
    }

    fn ltrb(&self) -> [Self::Type; 4] {
        [self.l(), self.t(), self.r(), self.b()]
    }

    fn to_cxcywh(&self) -> CxCyWH<Self::Type> {
        CxCyWH {
            cx: self.cx(),
            cy: self.cy(),
            w: self.w(),
            h: self.h(),
        }
    }

    fn to_ltrb(&self) -> LTRB<Self::Type> {
        LTRB {
            l: self.l(),
            t: self.t(),
            r: self.r(),
            b: self.b(),
        }
    }

    fn area(&self) -> Self::Type {
        self.w() * self.h()
    }
}

pub trait RectFloat: RectNum
where
    Self::Type: Float,
{
    /// Compute the overlapping region, or `None` if the rectangles are
    /// disjoint or only share an edge.
    fn intersect_with<R>(&self, other: &R) -> Option<LTRB<Self::Type>>
    where
        R: Rect<Type = Self::Type>,
    {
        let l = self.l().max(other.l());
        let t = self.t().max(other.t());
        let r = self.r().min(other.r());
        let b = self.b().min(other.b());
        (r > l && b > t).then(|| LTRB { l, t, r, b })
    }

    fn intersection_area_with<R>(&self, other: &R) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        self.intersect_with(other)
            .map(|rect| rect.area())
            .unwrap_or_else(Self::Type::zero)
    }

    fn iou_with<R>(&self, other: &R, epsilon: Self::Type) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        let inter_area = self.intersection_area_with(other);
        let union_area = self.area() + other.w() * other.h() - inter_area + epsilon;
        inter_area / union_area
    }

    /// Euclidean distance between the `[cx, cy, w, h]` vectors of two rectangles.
    fn distance_to<R>(&self, other: &R) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        let dx = self.cx() - other.cx();
        let dy = self.cy() - other.cy();
        let dw = self.w() - other.w();
        let dh = self.h() - other.h();
        (dx * dx + dy * dy + dw * dw + dh * dh).sqrt()
    }
}

impl<T> RectNum for T
where
    T: Rect,
    T::Type: Num + PartialOrd,
{
}

impl<T> RectFloat for T
where
    T: Rect,
    T::Type: Float,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn iou_of_identical_rects_is_one() {
        let rect = CxCyWH::try_from_cxcywh([10.0f32, 20.0, 4.0, 6.0]).unwrap();
        assert_abs_diff_eq!(rect.iou_with(&rect, 0.0), 1.0);
    }

    #[test]
    fn iou_of_half_overlap() {
        let lhs = LTRB::try_from_ltrb([0.0f64, 0.0, 2.0, 2.0]).unwrap();
        let rhs = LTRB::try_from_ltrb([1.0f64, 0.0, 3.0, 2.0]).unwrap();
        // intersection 2, union 6
        assert_abs_diff_eq!(lhs.iou_with(&rhs, 0.0), 1.0 / 3.0);
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let lhs = LTRB::try_from_ltrb([0.0f32, 0.0, 1.0, 1.0]).unwrap();
        let rhs = LTRB::try_from_ltrb([1.0f32, 0.0, 2.0, 1.0]).unwrap();
        assert!(lhs.intersect_with(&rhs).is_none());
        assert_eq!(lhs.iou_with(&rhs, 0.0), 0.0);
    }

    #[test]
    fn disjoint_rects_have_zero_intersection_area() {
        let lhs = CxCyWH::try_from_cxcywh([0.0f32, 0.0, 2.0, 2.0]).unwrap();
        let rhs = CxCyWH::try_from_cxcywh([10.0f32, 10.0, 2.0, 2.0]).unwrap();
        assert_eq!(lhs.intersection_area_with(&rhs), 0.0);

        let rhs = CxCyWH::try_from_cxcywh([1.0f32, 0.0, 2.0, 2.0]).unwrap();
        assert_abs_diff_eq!(lhs.intersection_area_with(&rhs), 2.0);
    }

    #[test]
    fn distance_uses_all_four_components() {
        let lhs = CxCyWH::try_from_cxcywh([0.0f32, 0.0, 1.0, 1.0]).unwrap();
        let rhs = CxCyWH::try_from_cxcywh([1.0f32, 1.0, 2.0, 2.0]).unwrap();
        assert_abs_diff_eq!(lhs.distance_to(&rhs), 2.0);
    }
}
