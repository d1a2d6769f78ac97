/// Offsets of the six ten minute blocks of a line
pub const BLOCK_STARTS: [usize; 6] = [19, 100, 181, 262, 343, 424];
/// 10 seesaw values of 3 chars per block
pub const WIPPE_LEN: usize = 30;
/// 10 drop counter values of 4 chars per block
pub const TROPFER_LEN: usize = 40;
pub const WIPPE_WIDTH: usize = 3;
pub const TROPFER_WIDTH: usize = 4;

pub const WIPPE_NODATA: &str = "-99";
pub const WIPPE_ZERO: [&str; 2] = ["-01", "000"];
pub const TROPFER_NODATA: &str = "-999";
pub const TROPFER_ZERO: [&str; 2] = ["-001", "0000"];

pub const WIPPE_SCALE: f32 = 0.1; // mm
pub const TROPFER_SCALE: f32 = 0.01; // mm

pub const MINUTES_PER_LINE: usize = 60;
pub const AGGREGATION_MINUTES: i64 = 5;
/// Start of the hour (hh-1:50) and MEZ to UTC
pub const UTC_SHIFT_MINUTES: i64 = 70;

pub const SUMMARY_FILE_NAME: &str = "metadata_summary.txt";
pub const STATION_PREFIX: &str = "Station=";
