use anyhow::Result;
use bbox::{CxCyWH, Rect};
use num_traits::Num;

/// A rectangle tagged with a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label<R, C>
where
    R: Rect,
{
    pub rect: R,
    pub class: C,
}

/// The ground-truth box stored in record files, in absolute pixel units.
pub type BBoxLabel = Label<CxCyWH<f32>, i32>;

impl<T, C> Label<CxCyWH<T>, C>
where
    T: Copy + Num + PartialOrd,
{
    pub fn try_from_fields(cxcywh: [T; 4], class: C) -> Result<Self> {
        Ok(Self {
            rect: CxCyWH::try_from_cxcywh(cxcywh)?,
            class,
        })
    }

    pub fn cxcywh(&self) -> [T; 4] {
        [self.rect.cx(), self.rect.cy(), self.rect.w(), self.rect.h()]
    }
}

impl BBoxLabel {
    pub fn center_x(&self) -> f32 {
        self.rect.cx()
    }

    pub fn center_y(&self) -> f32 {
        self.rect.cy()
    }

    pub fn width(&self) -> f32 {
        self.rect.w()
    }

    pub fn height(&self) -> f32 {
        self.rect.h()
    }

    pub fn class_id(&self) -> i32 {
        self.class
    }
}
