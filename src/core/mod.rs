pub mod banners;
pub mod etl;
pub mod imaging;
pub mod links;
pub mod normalize;
pub mod pipeline;

pub use crate::domain::model::{BannerWorkbook, LoadReport, RawInputs};
pub use crate::domain::ports::{BackgroundRemover, ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
