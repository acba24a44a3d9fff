pub mod collage;
pub mod excise;
pub mod plots;
pub mod report;
pub mod unpack;

pub use collage::{CollageOptions, create_collage, designation_slug, save_prompt_collages};
pub use excise::{DEFAULT_EXCISED_WORDS, excise_captions, excise_line};
pub use plots::plot_hue_by_race;
pub use report::{HueReport, RaceHue, hue_report, save_report};
pub use unpack::{TrainingLayout, parquet_files, unpack_for_training};
