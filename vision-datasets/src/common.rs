//! Common imports from external crates.

pub use anyhow::{Context as _, Error, Result};
pub use bbox::{prelude::*, Transform, HW, TLBR};
pub use itertools::Itertools as _;
pub use label::{Label, LabelSet, LabelSetError};
pub use log::{debug, info, warn};
pub use ndarray::{s, Array1, Array2, Array3, ArrayD, Axis};
pub use serde::{Deserialize, Serialize};
pub use std::{
    collections::HashSet,
    convert::TryFrom,
    fmt::{self, Debug, Display},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
