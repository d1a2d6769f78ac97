pub const CLASS_COUNT: usize = 16;

pub const CLASS_LABELS: [&str; CLASS_COUNT] = [
    "0",
    "0.01 - 0.99",
    "1.00 - 1.99",
    "2.00 - 2.99",
    "3.00 - 3.99",
    "4.00 - 4.99",
    "5.00 - 5.99",
    "6.00 - 6.99",
    "7.00 - 7.99",
    "8.00 - 8.99",
    "9.00 - 9.99",
    "10.00 - 14.99",
    "15.00 - 19.99",
    "20.00 - 39.99",
    ">= 40",
    "NaN",
];

/// Exclusive upper bounds [mm] of the classes between `0` and `>= 40`
pub const CLASS_UPPER_BOUNDS: [f32; 13] = [
    1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 15.0, 20.0, 40.0,
];

pub const ZERO_CLASS: usize = 0;
pub const MAX_CLASS: usize = 14;
pub const NAN_CLASS: usize = 15;
