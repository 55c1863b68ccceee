pub const DEFAULT_PARALLEL: u32 = 5;
pub const MAX_IMAGE_SCALE: f64 = 10.0;
pub const DEFAULT_IMAGE_SCALE: f64 = 1.0;
pub const DEFAULT_PPTX_IMAGE_SCALE: f64 = 2.0;
pub const DEFAULT_JPEG_QUALITY: u8 = 85;
pub const DEFAULT_TEMPLATE: &str = "bespoke";
pub const DEFAULT_ENGINE: &str = "builtin";
pub const STDOUT_SENTINEL: &str = "-";
pub const AUTO_BROWSER: &str = "auto";

pub const ENV_BROWSER_PATH: &str = "MDECK_BROWSER_PATH";
pub const ENV_BROWSER_TIMEOUT: &str = "MDECK_BROWSER_TIMEOUT";

pub const PACKAGE_JSON_KEY: &str = "mdeck";
