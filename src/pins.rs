//! GPIO pin assignments for the bell tower controller board.
//!
//! `main` wires the matching peripherals; the numbers here are what the
//! boot log reports.

// ---------------------------------------------------------------------------
// Bell strikers (relay-driven solenoids, active HIGH)
// ---------------------------------------------------------------------------

/// Large bell, used for the hour count.
pub const BELL_1_GPIO: i32 = 26;
/// Small bell, used for quarters and the half hour.
pub const BELL_2_GPIO: i32 = 25;

/// Striker outputs in bell-index order.
pub const BELL_GPIOS: [i32; 2] = [BELL_1_GPIO, BELL_2_GPIO];

// ---------------------------------------------------------------------------
// Heating
// ---------------------------------------------------------------------------

/// Heating contactor relay (active HIGH).
pub const HEATING_GPIO: i32 = 33;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Mount point of the SPIFFS data partition holding the JSON documents.
pub const STORAGE_BASE_PATH: &str = "/spiffs";
/// Label of the data partition in the partition table.
pub const STORAGE_PARTITION: &str = "spiffs";
