//! Test constants
//!
//! Shows, topics and expected statistics served by the fake forum.

// ============================================================================
// Timing
// ============================================================================

/// Maximum time to wait for a spawned server to answer, in milliseconds
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Delay between readiness probes, in milliseconds
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Timeout of every request made by the test client, in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Fake forum
// ============================================================================

/// Topics listed on each listing page of the fake forum
pub const FORUM_PAGE_SIZE: usize = 2;

/// Forum-wide announcement, linked from every listing page
pub const ANNOUNCEMENT_TOPIC_ID: &str = "32146";

// ============================================================================
// Show with every transcript available
// ============================================================================

pub const SHOW_ID: &str = "159";
pub const SHOW_TITLE: &str = "Friends";

pub const TOPIC_1X01: &str = "101";
pub const TOPIC_1X02: &str = "102";
pub const TOPIC_2X01: &str = "103";
pub const TOPIC_GAG_REEL: &str = "104";

pub const TITLE_1X01: &str = "01x01 - The One Where Monica Gets a Roommate";
pub const TITLE_1X02: &str = "01x02 - The One With the Sonogram";
pub const TITLE_2X01: &str = "02x01 - The One With Ross's New Sh*tty Girlfriend";
pub const TITLE_GAG_REEL: &str = "Gag Reel";

/// Title of episode 2x01 as stored after uncensoring
pub const UNCENSORED_TITLE_2X01: &str = "02x01 - The One With Ross's New Shitty Girlfriend";

/// Occurrences of `coffee_NOUN` in the whole show
pub const SHOW_COFFEE_COUNT: u64 = 5;

/// Occurrences of `coffee_NOUN` in season 01
pub const SEASON_1_COFFEE_COUNT: u64 = 4;

// ============================================================================
// Show with a missing transcript
// ============================================================================

pub const BROKEN_SHOW_ID: &str = "200";
pub const BROKEN_SHOW_TITLE: &str = "Seinfeld";

/// Linked from the listing but answered with 404
pub const MISSING_TOPIC_ID: &str = "201";
pub const AVAILABLE_TOPIC_ID: &str = "202";

// ============================================================================
// Unknown show
// ============================================================================

/// Forum the fake forum does not know about
pub const UNKNOWN_SHOW_ID: &str = "999";
