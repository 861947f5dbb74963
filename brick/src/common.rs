pub use crate::error::{Error, Result};
pub use byteorder::{ByteOrder, LittleEndian, WriteBytesExt as _};
pub use label::BBoxLabel;
pub use log::{debug, info, warn};
pub use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Cursor, Read, Write},
    path::Path,
};
