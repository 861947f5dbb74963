pub use anyhow::{bail, ensure, Context as _, Error, Result};
pub use bbox::{prelude::*, CxCyWH, LTRB};
pub use image::DynamicImage;
pub use indexmap::IndexSet;
pub use itertools::{iproduct, Itertools as _};
pub use label::BBoxLabel;
pub use log::{debug, info, warn};
pub use ndarray::{s, Array3, Array4, ArrayViewMut3};
pub use noisy_float::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{
    collections::HashSet,
    fmt::{self, Debug, Display},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
