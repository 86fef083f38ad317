pub mod speed_result;
pub mod wifi_status;

pub use speed_result::{SpeedReport, SpeedResult};
pub use wifi_status::{WifiReport, WifiStatus};
